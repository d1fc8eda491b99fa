use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};

/// Handles the SYST (System) FTP command.
///
/// Always reports a UNIX system type; clients use this to pick their LIST
/// parser.
pub async fn handle_syst_command(writer: ControlWriter) -> Result<(), CommandError> {
    send_response(&writer, b"215 UNIX Type: L8\r\n").await?;
    Ok(())
}
