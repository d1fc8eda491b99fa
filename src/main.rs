mod config;
mod constants;
mod core_auth;
mod core_cli;
mod core_ftpcommand;
mod core_network;
mod helpers;
mod server;
mod session;

use crate::core_cli::Cli;
use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use std::io::Write;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Load configuration from the JSON files
    let server_config = config::load_server_config(&args.server)?;
    let users = config::load_users(&args.users)?;

    // Run the FTP server
    server::run(server_config, users).await
}
