//! webconfig Server Binary
//!
//! Demo device application: serves a config map and answers a couple of
//! commands typed into the page.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use webconfig::{store, Config, ConfigMap, WebConfig};

/// webconfig Server
#[derive(Parser, Debug)]
#[command(name = "webconfig-server")]
#[command(about = "Browser-editable device configuration over WebSocket")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Path of the config page; the socket is served at <base-path>ws
    #[arg(short, long, default_value = "/config")]
    base_path: String,

    /// Username for the page and socket (empty disables the check)
    #[arg(short, long, default_value = "")]
    username: String,

    /// Password for the page and socket
    #[arg(short, long, default_value = "")]
    password: String,

    /// Initial entry as key=value (repeatable)
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    entries: Vec<String>,

    /// Peers kept open by housekeeping
    #[arg(long, default_value = "8")]
    max_clients: usize,

    /// Housekeeping interval in milliseconds
    #[arg(long, default_value = "1000")]
    cleanup_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,webconfig=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("webconfig Server v{}", webconfig::VERSION);

    let mut map = ConfigMap::new();
    for entry in &args.entries {
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                map.insert(key.to_string(), value.to_string());
            }
            _ => {
                tracing::error!("Invalid --set {:?}, expected KEY=VALUE", entry);
                std::process::exit(2);
            }
        }
    }
    tracing::info!("Initial config: {} entries", map.len());

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .base_path(&args.base_path)
        .credentials(&args.username, &args.password)
        .max_clients(args.max_clients)
        .cleanup_interval_ms(args.cleanup_ms)
        .build();

    let web = match WebConfig::begin(config, store::shared(map)) {
        Ok(web) => web,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    let notifier = web.notifier();
    let shared = Arc::clone(web.shared());
    web.on_cmd(move |data| {
        let command = String::from_utf8_lossy(data);
        match command.as_ref() {
            "ping" => notifier.msg("pong"),
            "dump" => {
                for (key, value) in shared.read().iter() {
                    notifier.msg(format!("{} = {}", key, value));
                }
            }
            other => tracing::info!("Command from page: {:?} ({} bytes)", other, data.len()),
        }
    });

    // Main loop: housekeeping on a fixed cadence
    let interval = Duration::from_millis(args.cleanup_ms.max(1));
    loop {
        thread::sleep(interval);
        web.cleanup();
    }
}
