use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::resolve_path;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the MKD (Make Directory) FTP command.
///
/// Only the single named directory is created; a missing parent fails the
/// command rather than being created implicitly. The 257 reply quotes the
/// argument as the client gave it, not the resolved virtual path.
pub async fn handle_mkd_command(
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
        send_response(&writer, b"550 Invalid path\r\n").await?;
        return Ok(());
    };
    if tokio::fs::metadata(&path).await.is_ok() {
        send_response(&writer, b"550 Directory already exists\r\n").await?;
        return Ok(());
    }

    match tokio::fs::create_dir(&path).await {
        Ok(()) => {
            info!("[session {}] created {}", session_id, path.display());
            let reply = format!("257 \"{}\" directory created\r\n", dirname);
            send_response(&writer, reply.as_bytes()).await?;
        }
        Err(e) => {
            warn!(
                "[session {}] MKD {} failed: {}",
                session_id,
                path.display(),
                e
            );
            send_response(&writer, b"550 Create directory failed\r\n").await?;
        }
    }
    Ok(())
}
