//! Tokenizer
//!
//! Splits a byte buffer into text fields on a single delimiter byte.

/// A single decoded text token. Zero length is valid.
pub type Field = String;

/// Split `buffer` on every occurrence of `delimiter`.
///
/// Empty fields are preserved, including a trailing one when the buffer ends
/// with the delimiter. An empty buffer yields a single empty field, so the
/// result always has `delimiter count + 1` elements.
///
/// Non-UTF-8 bytes are replaced per field rather than rejected.
pub fn split(buffer: &[u8], delimiter: u8) -> Vec<Field> {
    buffer
        .split(|&b| b == delimiter)
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}
