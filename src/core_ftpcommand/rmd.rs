use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::resolve_path;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RMD (Remove Directory) FTP command. Only empty directories
/// are removed.
pub async fn handle_rmd_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), CommandError> {
    let dirname = arg.trim();
    if dirname.is_empty() {
        send_response(&writer, b"501 Directory name required\r\n").await?;
        return Ok(());
    }

    let (target, session_id) = {
        let session = session.lock().await;
        (
            resolve_path(&session.root_path, &session.current_dir, dirname),
            session.id,
        )
    };
    let Some(path) = target else {
        send_response(&writer, b"550 Directory not found\r\n").await?;
        return Ok(());
    };
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => {}
        _ => {
            send_response(&writer, b"550 Directory not found\r\n").await?;
            return Ok(());
        }
    }

    let mut entries = match tokio::fs::read_dir(&path).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "[session {}] RMD cannot read {}: {}",
                session_id,
                path.display(),
                e
            );
            send_response(&writer, b"550 Remove directory failed\r\n").await?;
            return Ok(());
        }
    };
    if matches!(entries.next_entry().await, Ok(Some(_))) {
        send_response(&writer, b"550 Directory not empty\r\n").await?;
        return Ok(());
    }
    drop(entries);

    match tokio::fs::remove_dir(&path).await {
        Ok(()) => {
            info!("[session {}] removed {}", session_id, path.display());
            send_response(&writer, b"250 Directory removed\r\n").await?;
        }
        Err(e) => {
            warn!(
                "[session {}] RMD {} failed: {}",
                session_id,
                path.display(),
                e
            );
            send_response(&writer, b"550 Remove directory failed\r\n").await?;
        }
    }
    Ok(())
}
