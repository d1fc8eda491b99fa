use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::resolve_path;
use crate::core_network::data::copy_socket_to_file;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::fs::File;
use tokio::sync::Mutex;

/// Handles the STOR (Store File) FTP command.
///
/// The target is resolved against the jail and opened create-or-truncate
/// before the data connection is consumed. A parent directory that does not
/// exist is not created; the upload is refused instead. The upload itself is
/// binary and runs until the client closes its end of the data connection.
///
/// # Arguments
///
/// * `writer` - Shared write half of the control connection.
/// * `session` - The session owning the jail, cwd, and passive listener.
/// * `arg` - The file to create or overwrite.
pub async fn handle_stor_command(
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
        send_response(&writer, b"550 Invalid path\r\n").await?;
        return Ok(());
    };

    let data = {
        let mut session = session.lock().await;
        session.accept_data().await
    };
    let Some(mut data) = data else {
        send_response(&writer, b"425 Can't open data connection\r\n").await?;
        return Ok(());
    };

    // Open (and truncate) only once the data connection exists; a failed
    // accept must not destroy an existing target.
    let mut file = match File::create(&path).await {
        Ok(file) => file,
        Err(e) => {
            warn!(
                "[session {}] STOR cannot open {}: {}",
                session_id,
                path.display(),
                e
            );
            send_response(&writer, b"550 Invalid path\r\n").await?;
            return Ok(());
        }
    };

    send_response(&writer, b"150 Opening data connection for upload\r\n").await?;

    match copy_socket_to_file(&mut data, &mut file).await {
        Ok(bytes) => {
            info!(
                "[session {}] stored {} ({} bytes)",
                session_id,
                path.display(),
                bytes
            );
            send_response(&writer, b"226 Transfer complete\r\n").await?;
        }
        Err(e) => {
            warn!(
                "[session {}] STOR {} failed: {}",
                session_id,
                path.display(),
                e
            );
            send_response(&writer, b"451 Local error in processing\r\n").await?;
        }
    }
    Ok(())
}
