use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};

/// Handles the FEAT FTP command.
///
/// The multi-line block goes out in a single write so another reply can
/// never interleave with it.
pub async fn handle_feat_command(writer: ControlWriter) -> Result<(), CommandError> {
    send_response(
        &writer,
        b"211-Features\r\n PASV\r\n UTF8\r\n211 End\r\n",
    )
    .await?;
    Ok(())
}
