use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PASV (Passive Mode) FTP command.
///
/// Any previously armed listener is torn down first: a session never holds
/// more than one passive port. The reply advertises the session's passive
/// address and the pooled port in the RFC 959 six-octet form.
pub async fn handle_pasv_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), CommandError> {
    let mut session = session.lock().await;
    session.close_pasv();

    match session.try_open_pasv().await {
        Some(port) => {
            let addr = session.passive_reply_addr();
            let session_id = session.id;
            drop(session);

            let [a, b, c, d] = addr.octets();
            let reply = format!(
                "227 Entering Passive Mode ({},{},{},{},{},{})\r\n",
                a,
                b,
                c,
                d,
                port / 256,
                port % 256
            );
            info!("[session {}] PASV on {}:{}", session_id, addr, port);
            send_response(&writer, reply.as_bytes()).await?;
        }
        None => {
            drop(session);
            send_response(&writer, b"421 Can't open passive connection\r\n").await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    // The PASV reply encoding (p1 = port / 256, p2 = port % 256) is covered
    // here; listener lifecycle is covered by the session tests.
    #[test]
    fn port_splits_into_octet_pair() {
        let port: u16 = 50123;
        assert_eq!(port / 256, 195);
        assert_eq!(port % 256, 203);
        assert_eq!(195 * 256 + 203, 50123);
    }
}
