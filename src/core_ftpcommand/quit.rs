use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};

/// Handles the QUIT FTP command. The dispatch loop closes the session after
/// the farewell is written.
pub async fn handle_quit_command(writer: ControlWriter) -> Result<(), CommandError> {
    send_response(&writer, b"221 Bye\r\n").await?;
    Ok(())
}
