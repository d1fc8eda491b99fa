use anyhow::{ensure, Context, Result};
use log::warn;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

/// Server-wide settings, immutable once loaded.
///
/// Field names follow the JSON document layout (`server.json`); every field
/// has a default so an empty document (or a missing file) yields a runnable
/// configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    #[serde(rename = "Root")]
    pub root: PathBuf,
    #[serde(rename = "Bind")]
    pub bind: IpAddr,
    #[serde(rename = "ControlPort")]
    pub control_port: u16,
    #[serde(rename = "PasvMin")]
    pub pasv_min: u16,
    #[serde(rename = "PasvMax")]
    pub pasv_max: u16,
    #[serde(rename = "PreLoginIdleSeconds")]
    pub pre_login_idle_seconds: u64,
    #[serde(rename = "PostLoginIdleSeconds")]
    pub post_login_idle_seconds: u64,
    #[serde(rename = "AllowAnonymous")]
    pub allow_anonymous: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            root: PathBuf::from("./ftp_root"),
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            control_port: 21,
            pasv_min: 50000,
            pasv_max: 50100,
            pre_login_idle_seconds: 120,
            post_login_idle_seconds: 300,
            allow_anonymous: true,
        }
    }
}

/// One account in the users file. Usernames are case-sensitive and passwords
/// are compared by exact equality.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
}

/// Loads `server.json`, applies defaults, and prepares the server root.
///
/// The root directory is created if missing and canonicalized to an absolute
/// path so the jail check always compares against a stable prefix. A missing
/// config file falls back to all defaults; an unreadable or unparsable file
/// is a startup error.
pub fn load_server_config(path: &str) -> Result<ServerConfig> {
    let mut config = if Path::new(path).exists() {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        serde_json::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?
    } else {
        warn!("Configuration file {} not found, using defaults", path);
        ServerConfig::default()
    };

    ensure!(
        config.pasv_min <= config.pasv_max,
        "Passive port range is empty: {}..{}",
        config.pasv_min,
        config.pasv_max
    );

    fs::create_dir_all(&config.root)
        .with_context(|| format!("Failed to create server root: {}", config.root.display()))?;
    config.root = fs::canonicalize(&config.root)
        .with_context(|| format!("Failed to canonicalize server root: {}", config.root.display()))?;

    Ok(config)
}

/// Loads `users.json`. A missing file is treated as an empty user list, which
/// is valid: anonymous access is governed separately by `AllowAnonymous`.
pub fn load_users(path: &str) -> Result<Vec<UserRecord>> {
    if !Path::new(path).exists() {
        warn!("Users file {} not found, starting with no accounts", path);
        return Ok(Vec::new());
    }
    let users_str =
        fs::read_to_string(path).with_context(|| format!("Failed to read users file: {}", path))?;
    let users: Vec<UserRecord> = serde_json::from_str(&users_str)
        .with_context(|| format!("Failed to parse users file: {}", path))?;
    Ok(users)
}
