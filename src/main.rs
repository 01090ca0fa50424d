//! cn-serial-io - Gateway daemon for the control node serial link
//!
//! Reads text commands on stdin, drives the control node over its binary
//! serial protocol, prints command replies on stdout and decodes the
//! measurement frames the node streams back.

use cn_serial_io::app::App;
use cn_serial_io::config::AppConfig;
use cn_serial_io::error::Result;
use std::env;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `cn-serial-io <path>` (positional)
/// - `cn-serial-io --config <path>` (flag-based)
/// - `cn-serial-io -c <path>` (short flag)
///
/// Defaults to `/etc/cn-serial-io.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    // Default path
    "/etc/cn-serial-io.toml".to_string()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("cn-serial-io starting...");

    let config_path = parse_config_path();
    log::info!("Using config: {}", config_path);
    let config = AppConfig::from_file(&config_path)?;

    let mut app = App::new(&config)?;
    app.run()?;

    log::info!("cn-serial-io stopped");
    Ok(())
}
