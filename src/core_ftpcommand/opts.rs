use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};

/// Handles the OPTS FTP command. Every option is acknowledged and none
/// changes behavior; clients commonly send `OPTS UTF8 ON` right after the
/// greeting.
pub async fn handle_opts_command(
    writer: ControlWriter,
    _arg: String,
) -> Result<(), CommandError> {
    send_response(&writer, b"200 OPTS ok\r\n").await?;
    Ok(())
}
