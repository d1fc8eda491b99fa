use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ferroftpd", about = "A minimal passive-mode FTP server written in Rust.")]
pub struct Cli {
    /// Path to the server configuration file
    #[arg(long, default_value = "server.json")]
    pub server: String,

    /// Path to the users file
    #[arg(long, default_value = "users.json")]
    pub users: String,
}
