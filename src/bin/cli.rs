//! webconfig CLI Client
//!
//! Command-line interface for a device running webconfig.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use webconfig::network::WsClient;
use webconfig::protocol::Update;
use webconfig::{Credentials, Result};

/// webconfig CLI
#[derive(Parser, Debug)]
#[command(name = "webconfig-cli")]
#[command(about = "CLI for a webconfig device")]
struct Args {
    /// Socket URL
    #[arg(short, long, default_value = "ws://127.0.0.1:8080/configws")]
    url: String,

    /// Username (empty sends no credentials)
    #[arg(long, default_value = "")]
    username: String,

    /// Password
    #[arg(long, default_value = "")]
    password: String,

    /// How long to wait for device replies (milliseconds)
    #[arg(short, long, default_value = "1000")]
    wait_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the config snapshot
    Show,

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Send a raw command frame to the device application
    Send {
        /// Frame text
        raw: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let credentials = if args.username.is_empty() {
        None
    } else {
        Some(Credentials::new(&args.username, &args.password))
    };
    let wait = Duration::from_millis(args.wait_ms);

    let mut client = WsClient::connect(&args.url, credentials.as_ref())?;

    match &args.command {
        Commands::Show => {}
        Commands::Set { key, value } => {
            if value.is_empty() {
                eprintln!("warning: an empty value deletes '{}'", key);
            }
            client.set(key, value)?;
        }
        Commands::Del { key } => client.set(key, "")?,
        Commands::Send { raw } => client.send_text(raw)?,
    }

    let show = matches!(args.command, Commands::Show);
    let mut seen_snapshot = false;

    // Print whatever the device says until it goes quiet
    while let Some(update) = client.recv_update(wait)? {
        match update {
            Update::Snapshot(config) => {
                seen_snapshot = true;
                if show {
                    for (key, value) in &config {
                        println!("{} = {}", key, value);
                    }
                }
            }
            Update::Status(text) => println!("{}", text),
            Update::Unknown(text) => println!("? {}", text),
        }
    }

    // The device sends no snapshot for an empty map
    if show && !seen_snapshot {
        println!("(no entries)");
    }

    client.close()
}
