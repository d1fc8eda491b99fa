use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::try_change_dir;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the CDUP FTP command: CWD to the parent directory. At "/" the
/// parent is "/" itself, which still succeeds.
pub async fn handle_cdup_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), CommandError> {
    let mut session = session.lock().await;
    let changed = try_change_dir(&mut session, "..").await;
    drop(session);

    if changed {
        send_response(&writer, b"200 OK\r\n").await?;
    } else {
        send_response(&writer, b"550 Failed\r\n").await?;
    }
    Ok(())
}
