use crate::config::ServerConfig;
use crate::core_auth::UserDirectory;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::handlers::{dispatch_command, SessionFlow};
use crate::core_network::port_pool::PortPool;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::timeout;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Binds the control port and accepts clients until interrupted.
///
/// Each accepted connection becomes an independent session task. On SIGINT
/// the acceptor stops taking new connections and waits for the in-flight
/// sessions to finish naturally.
pub async fn start_server(config: Arc<ServerConfig>, users: Arc<UserDirectory>) -> Result<()> {
    let bind_addr = SocketAddr::new(config.bind, config.control_port);
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind control socket on {}", bind_addr))?;
    info!("Server listening on {}", bind_addr);

    let port_pool = Arc::new(PortPool::new(config.pasv_min, config.pasv_max));
    let mut sessions: JoinSet<()> = JoinSet::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("Accept failed: {}", e);
                        continue;
                    }
                };
                if let Err(e) = socket.set_nodelay(true) {
                    debug!("Could not disable Nagle for {}: {}", peer, e);
                }

                let session_id = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
                info!("[session {}] new connection from {}", session_id, peer);

                let config = Arc::clone(&config);
                let users = Arc::clone(&users);
                let port_pool = Arc::clone(&port_pool);
                sessions.spawn(async move {
                    if let Err(e) =
                        handle_connection(socket, session_id, config, users, port_pool).await
                    {
                        warn!("[session {}] ended with error: {}", session_id, e);
                    }
                    info!("[session {}] closed ({})", session_id, peer);
                });

                // Reap finished sessions so the set does not grow unbounded.
                while sessions.try_join_next().is_some() {}
            }
            _ = &mut shutdown => {
                info!(
                    "Interrupt received, draining {} active session(s)",
                    sessions.len()
                );
                break;
            }
        }
    }

    drop(listener);
    while sessions.join_next().await.is_some() {}
    info!("Server stopped");
    Ok(())
}

/// Runs one control connection to completion.
///
/// Whatever path ends the session (QUIT, EOF, timeout, error), the passive
/// listener is closed and its port returned to the pool before the task
/// exits.
pub async fn handle_connection(
    socket: TcpStream,
    session_id: u64,
    config: Arc<ServerConfig>,
    users: Arc<UserDirectory>,
    port_pool: Arc<PortPool>,
) -> io::Result<()> {
    let local_ip = socket.local_addr()?.ip();
    let peer = socket.peer_addr()?;
    let (read_half, write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let writer: ControlWriter = Arc::new(Mutex::new(write_half));

    let session = Arc::new(Mutex::new(Session::new(
        session_id,
        config.root.clone(),
        port_pool,
        config.bind,
        local_ip,
    )));

    send_response(&writer, b"220 Server ready\r\n").await?;

    let result = control_loop(&mut reader, &writer, &config, &users, &session, peer).await;

    if result.is_err() {
        // Best effort; the connection may already be gone.
        let _ = send_response(&writer, b"421 Server error, closing connection\r\n").await;
    }
    session.lock().await.close_pasv();
    result
}

async fn control_loop(
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &ControlWriter,
    config: &Arc<ServerConfig>,
    users: &Arc<UserDirectory>,
    session: &Arc<Mutex<Session>>,
    peer: SocketAddr,
) -> io::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();

        let idle_seconds = if session.lock().await.logged_in {
            config.post_login_idle_seconds
        } else {
            config.pre_login_idle_seconds
        };

        let session_id = session.lock().await.id;
        let n = match timeout(
            Duration::from_secs(idle_seconds),
            reader.read_line(&mut line),
        )
        .await
        {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                info!(
                    "[session {}] idle for {}s, closing {}",
                    session_id, idle_seconds, peer
                );
                let _ = send_response(writer, b"421 Timeout - closing control connection\r\n")
                    .await;
                return Ok(());
            }
        };
        if n == 0 {
            debug!("[session {}] client {} closed the connection", session_id, peer);
            return Ok(());
        }

        let trimmed = line.trim();
        let (cmd_token, arg) = match trimmed.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (trimmed, ""),
        };
        debug!("[session {}] command: {}", session_id, cmd_token);

        let Some(cmd) = FtpCommand::from_str(cmd_token) else {
            send_response(writer, b"502 Command not implemented\r\n").await?;
            continue;
        };

        match dispatch_command(cmd, arg.to_string(), writer, config, users, session).await {
            Ok(SessionFlow::Continue) => {}
            Ok(SessionFlow::Quit) => return Ok(()),
            Err(CommandError::Reply(reply)) => {
                send_response(writer, format!("{}\r\n", reply).as_bytes()).await?;
            }
            Err(CommandError::Io(e)) => {
                error!("[session {}] command failed: {}", session_id, e);
                let _ =
                    send_response(writer, b"421 Server error, closing connection\r\n").await;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserRecord;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader as TokioBufReader};
    use tokio::net::tcp::OwnedReadHalf as ClientReadHalf;
    use tokio::net::tcp::OwnedWriteHalf as ClientWriteHalf;

    struct TestClient {
        reader: TokioBufReader<ClientReadHalf>,
        writer: ClientWriteHalf,
    }

    impl TestClient {
        async fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).await.unwrap();
            let (read_half, write_half) = stream.into_split();
            TestClient {
                reader: TokioBufReader::new(read_half),
                writer: write_half,
            }
        }

        async fn send(&mut self, line: &str) {
            self.writer
                .write_all(format!("{}\r\n", line).as_bytes())
                .await
                .unwrap();
        }

        async fn reply(&mut self) -> String {
            let mut line = String::new();
            self.reader.read_line(&mut line).await.unwrap();
            line.trim_end().to_string()
        }

        async fn expect(&mut self, wanted: &str) {
            assert_eq!(self.reply().await, wanted);
        }
    }

    async fn start_test_server(
        allow_anonymous: bool,
        users: Vec<UserRecord>,
    ) -> (SocketAddr, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();

        let mut config = ServerConfig::default();
        config.root = root;
        config.bind = "127.0.0.1".parse().unwrap();
        config.pasv_min = 49152;
        config.pasv_max = 49900;
        config.allow_anonymous = allow_anonymous;
        let config = Arc::new(config);

        let users = Arc::new(UserDirectory::new(users, allow_anonymous));
        let port_pool = Arc::new(PortPool::new(config.pasv_min, config.pasv_max));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let session_id = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
                let config = Arc::clone(&config);
                let users = Arc::clone(&users);
                let port_pool = Arc::clone(&port_pool);
                tokio::spawn(async move {
                    let _ =
                        handle_connection(socket, session_id, config, users, port_pool).await;
                });
            }
        });
        (addr, dir)
    }

    fn parse_pasv_port(reply: &str) -> u16 {
        let inside = reply
            .split('(')
            .nth(1)
            .and_then(|rest| rest.split(')').next())
            .unwrap();
        let octets: Vec<u16> = inside.split(',').map(|o| o.parse().unwrap()).collect();
        assert_eq!(octets.len(), 6);
        octets[4] * 256 + octets[5]
    }

    async fn login_anonymous(client: &mut TestClient) {
        client.expect("220 Server ready").await;
        client.send("USER anonymous").await;
        client
            .expect("331 Anonymous login ok, send any password")
            .await;
        client.send("PASS x@y").await;
        client.expect("230 Logged in.").await;
    }

    #[tokio::test]
    async fn anonymous_login_and_pwd() {
        let (addr, _root) = start_test_server(true, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        login_anonymous(&mut client).await;
        client.send("PWD").await;
        client.expect("257 \"/\" is current directory").await;
        client.send("QUIT").await;
        client.expect("221 Bye").await;
    }

    #[tokio::test]
    async fn anonymous_can_be_disabled() {
        let (addr, _root) = start_test_server(false, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        client.expect("220 Server ready").await;
        client.send("USER anonymous").await;
        client.expect("530 Anonymous access denied").await;
    }

    #[tokio::test]
    async fn named_user_login() {
        let users = vec![UserRecord {
            username: "alice".to_string(),
            password: "secret".to_string(),
        }];
        let (addr, _root) = start_test_server(false, users).await;
        let mut client = TestClient::connect(addr).await;
        client.expect("220 Server ready").await;

        client.send("USER alice").await;
        client.expect("331 Password required").await;
        client.send("PASS wrong").await;
        client.expect("530 Login incorrect").await;

        client.send("USER alice").await;
        client.expect("331 Password required").await;
        client.send("PASS secret").await;
        client.expect("230 Logged in.").await;
    }

    #[tokio::test]
    async fn pre_login_commands_and_gate() {
        let (addr, _root) = start_test_server(true, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        client.expect("220 Server ready").await;

        client.send("LIST").await;
        client.expect("530 Please login with USER and PASS").await;
        client.send("FOO bar").await;
        client.expect("502 Command not implemented").await;
        client.send("SYST").await;
        client.expect("215 UNIX Type: L8").await;
        client.send("TYPE A").await;
        client.expect("504 Only TYPE I supported").await;
        client.send("TYPE i").await;
        client.expect("200 Type set to I").await;
        client.send("NOOP").await;
        client.expect("200 NOOP ok").await;
        client.send("OPTS UTF8 ON").await;
        client.expect("200 OPTS ok").await;

        client.send("FEAT").await;
        client.expect("211-Features").await;
        client.expect(" PASV").await;
        client.expect(" UTF8").await;
        client.expect("211 End").await;
    }

    #[tokio::test]
    async fn jail_keeps_traversal_inside_root() {
        let (addr, _root) = start_test_server(true, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        login_anonymous(&mut client).await;

        client.send("CWD ../../..").await;
        client.expect("250 Directory successfully changed").await;
        client.send("PWD").await;
        client.expect("257 \"/\" is current directory").await;

        client.send("RETR ../../etc/passwd").await;
        client.expect("550 File not found").await;
    }

    #[tokio::test]
    async fn mkd_cwd_rmd_round_trip() {
        let (addr, _root) = start_test_server(true, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        login_anonymous(&mut client).await;

        client.send("MKD reports").await;
        client.expect("257 \"reports\" directory created").await;
        client.send("MKD reports").await;
        client.expect("550 Directory already exists").await;

        client.send("CWD reports").await;
        client.expect("250 Directory successfully changed").await;
        client.send("PWD").await;
        client.expect("257 \"/reports\" is current directory").await;
        client.send("CDUP").await;
        client.expect("200 OK").await;

        client.send("RMD reports").await;
        client.expect("250 Directory removed").await;
        client.send("RMD reports").await;
        client.expect("550 Directory not found").await;
    }

    #[tokio::test]
    async fn stor_then_retr_round_trip() {
        let (addr, _root) = start_test_server(true, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        login_anonymous(&mut client).await;

        let content: Vec<u8> = (0..100_000u32).flat_map(|i| i.to_be_bytes()).collect();

        client.send("PASV").await;
        let reply = client.reply().await;
        assert!(reply.starts_with("227 Entering Passive Mode ("), "{}", reply);
        let port = parse_pasv_port(&reply);

        let mut data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        client.send("STOR payload.bin").await;
        client
            .expect("150 Opening data connection for upload")
            .await;
        data.write_all(&content).await.unwrap();
        data.shutdown().await.unwrap();
        drop(data);
        client.expect("226 Transfer complete").await;

        client.send("PASV").await;
        let reply = client.reply().await;
        let port = parse_pasv_port(&reply);
        let mut data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        client.send("RETR payload.bin").await;
        client
            .expect("150 Opening data connection for payload.bin")
            .await;
        let mut received = Vec::new();
        data.read_to_end(&mut received).await.unwrap();
        client.expect("226 Transfer complete").await;
        assert_eq!(received, content);

        client.send("DELE payload.bin").await;
        client.expect("250 File deleted").await;
        client.send("DELE payload.bin").await;
        client.expect("550 File not found").await;
    }

    #[tokio::test]
    async fn list_shows_directories_before_files() {
        let (addr, root) = start_test_server(true, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        login_anonymous(&mut client).await;

        // The anonymous home exists once login completed.
        let home = std::fs::canonicalize(root.path()).unwrap().join("anonymous");
        std::fs::write(home.join("note.txt"), b"hello").unwrap();
        std::fs::create_dir(home.join("docs")).unwrap();

        client.send("PASV").await;
        let reply = client.reply().await;
        let port = parse_pasv_port(&reply);
        let mut data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        client.send("LIST").await;
        client.expect("150 Opening data connection for LIST").await;
        let mut listing = String::new();
        data.read_to_string(&mut listing).await.unwrap();
        client.expect("226 Transfer complete").await;

        let lines: Vec<&str> = listing.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("drwxr-xr-x"), "{}", lines[0]);
        assert!(lines[0].ends_with(" docs"), "{}", lines[0]);
        assert!(lines[1].starts_with("-rw-r--r--"), "{}", lines[1]);
        assert!(lines[1].ends_with(" note.txt"), "{}", lines[1]);
    }

    #[tokio::test]
    async fn data_command_without_pasv_is_refused() {
        let (addr, _root) = start_test_server(true, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        login_anonymous(&mut client).await;

        client.send("LIST").await;
        client.expect("425 Can't open data connection").await;
    }

    #[tokio::test]
    async fn stor_without_pasv_leaves_existing_file_intact() {
        let (addr, root) = start_test_server(true, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        login_anonymous(&mut client).await;

        let home = std::fs::canonicalize(root.path()).unwrap().join("anonymous");
        std::fs::write(home.join("keep.txt"), b"precious").unwrap();

        client.send("STOR keep.txt").await;
        client.expect("425 Can't open data connection").await;

        let content = std::fs::read(home.join("keep.txt")).unwrap();
        assert_eq!(content, b"precious");
    }

    #[tokio::test]
    async fn mkd_does_not_create_missing_parents() {
        let (addr, root) = start_test_server(true, Vec::new()).await;
        let mut client = TestClient::connect(addr).await;
        login_anonymous(&mut client).await;

        client.send("MKD missing/child").await;
        client.expect("550 Create directory failed").await;

        let home = std::fs::canonicalize(root.path()).unwrap().join("anonymous");
        assert!(!home.join("missing").exists());
    }
}
