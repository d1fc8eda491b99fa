use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};

/// Handles the TYPE FTP command. Only binary (`TYPE I`) is supported; the
/// ASCII type is refused so line-ending translation never happens.
pub async fn handle_type_command(
    writer: ControlWriter,
    arg: String,
) -> Result<(), CommandError> {
    if arg.trim().eq_ignore_ascii_case("I") {
        send_response(&writer, b"200 Type set to I\r\n").await?;
    } else {
        send_response(&writer, b"504 Only TYPE I supported\r\n").await?;
    }
    Ok(())
}
