use crate::constants::DATA_ACCEPT_TIMEOUT_SECS;
use crate::core_network::port_pool::PortPool;
use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

/// Per-connection state: login progress, the user's root jail, the virtual
/// working directory, and the (at most one) outstanding passive listener.
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub logged_in: bool,
    pub pending_user: String,
    pub username: String,
    pub root_path: PathBuf,
    pub current_dir: String,
    pasv: Option<(TcpListener, u16)>,
    port_pool: Arc<PortPool>,
    bind_addr: IpAddr,
    control_local_ip: IpAddr,
}

impl Session {
    pub fn new(
        id: u64,
        root_path: PathBuf,
        port_pool: Arc<PortPool>,
        bind_addr: IpAddr,
        control_local_ip: IpAddr,
    ) -> Self {
        Session {
            id,
            logged_in: false,
            pending_user: String::new(),
            username: String::new(),
            root_path,
            current_dir: String::from("/"),
            pasv: None,
            port_pool,
            bind_addr,
            control_local_ip,
        }
    }

    /// Switches the session to the authenticated user's jail. The virtual
    /// working directory resets to "/" whenever the root changes.
    pub fn login(&mut self, username: &str, home: PathBuf) {
        self.logged_in = true;
        self.username = username.to_string();
        self.root_path = home;
        self.current_dir = String::from("/");
    }

    /// The IPv4 address advertised in PASV replies.
    ///
    /// Starts from the local endpoint of the control connection, prefers a
    /// concrete configured bind address, and falls back to loopback rather
    /// than ever advertising a wildcard.
    pub fn passive_reply_addr(&self) -> Ipv4Addr {
        let mut ip = self.control_local_ip;
        if !self.bind_addr.is_unspecified() {
            ip = self.bind_addr;
        }
        if ip.is_unspecified() {
            ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        }
        match ip {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(v6) => v6.to_ipv4().unwrap_or(Ipv4Addr::LOCALHOST),
        }
    }

    /// Opens a passive listener on a pooled port and remembers it.
    ///
    /// Ports that fail to bind are skipped and handed back to the pool once a
    /// listener is open (or the pool runs dry), so a stuck port cannot be
    /// retried in a tight loop.
    pub async fn try_open_pasv(&mut self) -> Option<u16> {
        let bind_ip = if self.bind_addr.is_unspecified() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            self.bind_addr
        };

        let mut skipped = Vec::new();
        let mut opened = None;
        while let Some(port) = self.port_pool.try_acquire() {
            match TcpListener::bind((bind_ip, port)).await {
                Ok(listener) => {
                    opened = Some((listener, port));
                    break;
                }
                Err(e) => {
                    debug!(
                        "[session {}] passive port {} unavailable: {}",
                        self.id, port, e
                    );
                    skipped.push(port);
                }
            }
        }
        for port in skipped {
            self.port_pool.release(port);
        }

        let (listener, port) = opened?;
        debug!("[session {}] passive listener on port {}", self.id, port);
        self.pasv = Some((listener, port));
        Some(port)
    }

    /// Awaits the single inbound data connection on the armed listener.
    ///
    /// Whatever the outcome, the listener is closed and its port released
    /// before returning; a session never holds a passive port across
    /// commands.
    pub async fn accept_data(&mut self) -> Option<TcpStream> {
        let (listener, port) = self.pasv.take()?;

        let accepted = match timeout(
            Duration::from_secs(DATA_ACCEPT_TIMEOUT_SECS),
            listener.accept(),
        )
        .await
        {
            Ok(Ok((stream, peer))) => {
                debug!("[session {}] data connection from {}", self.id, peer);
                Some(stream)
            }
            Ok(Err(e)) => {
                warn!("[session {}] data accept failed: {}", self.id, e);
                None
            }
            Err(_) => {
                warn!(
                    "[session {}] no data connection within {}s",
                    self.id, DATA_ACCEPT_TIMEOUT_SECS
                );
                None
            }
        };

        drop(listener);
        self.port_pool.release(port);
        accepted
    }

    /// Drops any outstanding passive listener and releases its port.
    /// Idempotent; runs on PASV reissue, after every data command, and at
    /// session end.
    pub fn close_pasv(&mut self) {
        if let Some((listener, port)) = self.pasv.take() {
            drop(listener);
            self.port_pool.release(port);
            debug!("[session {}] passive port {} released", self.id, port);
        }
    }

    pub fn has_pasv(&self) -> bool {
        self.pasv.is_some()
    }
}
