//! Embedded browser page
//!
//! The UI is stored pre-compressed; it is sent as-is with a gzip marker.

use super::http::HttpResponse;

/// Gzip-compressed HTML of the config editor
pub static CONFIG_PAGE_GZ: &[u8] = include_bytes!("../../assets/config.html.gz");

/// 200 response carrying the compressed page
pub fn page_response() -> HttpResponse {
    HttpResponse::ok()
        .with_header("Content-Encoding", "gzip")
        .with_body("text/html", CONFIG_PAGE_GZ.to_vec())
}
