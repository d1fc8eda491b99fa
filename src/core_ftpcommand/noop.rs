use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};

/// Handles the NOOP (No Operation) FTP command.
pub async fn handle_noop_command(writer: ControlWriter) -> Result<(), CommandError> {
    send_response(&writer, b"200 NOOP ok\r\n").await?;
    Ok(())
}
