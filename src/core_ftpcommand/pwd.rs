use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PWD FTP command: reports the virtual working directory.
pub async fn handle_pwd_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), CommandError> {
    let current_dir = session.lock().await.current_dir.clone();
    let reply = format!("257 \"{}\" is current directory\r\n", current_dir);
    send_response(&writer, reply.as_bytes()).await?;
    Ok(())
}
