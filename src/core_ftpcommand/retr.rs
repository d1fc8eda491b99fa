use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::resolve_path;
use crate::core_network::data::copy_file_to_socket;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::fs::File;
use tokio::sync::Mutex;

/// Handles the RETR (Retrieve File) FTP command.
///
/// The path is resolved and the file opened read-only before the data
/// connection is consumed, so a bad filename costs the client its armed
/// listener but never a partial transfer. The download itself is binary.
///
/// # Arguments
///
/// * `writer` - Shared write half of the control connection.
/// * `session` - The session owning the jail, cwd, and passive listener.
/// * `arg` - The file to download.
pub async fn handle_retr_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), CommandError> {
    let filename = arg.trim();
    if filename.is_empty() {
        send_response(&writer, b"501 Filename required\r\n").await?;
        return Ok(());
    }

    let (target, session_id) = {
        let session = session.lock().await;
        (
            resolve_path(&session.root_path, &session.current_dir, filename),
            session.id,
        )
    };
    let Some(path) = target else {
        send_response(&writer, b"550 File not found\r\n").await?;
        return Ok(());
    };
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            send_response(&writer, b"550 File not found\r\n").await?;
            return Ok(());
        }
    }
    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(_) => {
            send_response(&writer, b"550 File not found\r\n").await?;
            return Ok(());
        }
    };

    let data = {
        let mut session = session.lock().await;
        session.accept_data().await
    };
    let Some(mut data) = data else {
        send_response(&writer, b"425 Can't open data connection\r\n").await?;
        return Ok(());
    };

    let basename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let preliminary = format!("150 Opening data connection for {}\r\n", basename);
    send_response(&writer, preliminary.as_bytes()).await?;

    match copy_file_to_socket(&mut file, &mut data).await {
        Ok(bytes) => {
            info!(
                "[session {}] sent {} ({} bytes)",
                session_id, basename, bytes
            );
            send_response(&writer, b"226 Transfer complete\r\n").await?;
        }
        Err(e) => {
            warn!("[session {}] RETR {} failed: {}", session_id, basename, e);
            send_response(&writer, b"451 Local error in processing\r\n").await?;
        }
    }
    Ok(())
}
