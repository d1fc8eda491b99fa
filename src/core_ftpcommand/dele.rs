use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::resolve_path;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the DELE (Delete File) FTP command.
pub async fn handle_dele_command(
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

    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            info!("[session {}] deleted {}", session_id, path.display());
            send_response(&writer, b"250 File deleted\r\n").await?;
        }
        Err(e) => {
            warn!(
                "[session {}] DELE {} failed: {}",
                session_id,
                path.display(),
                e
            );
            send_response(&writer, b"450 Delete failed\r\n").await?;
        }
    }
    Ok(())
}
