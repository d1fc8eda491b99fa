use crate::constants::{DATA_IO_TIMEOUT_SECS, TRANSFER_BUFFER_SIZE};
use std::io;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

fn data_timeout() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "data connection timed out")
}

fn io_deadline() -> Duration {
    Duration::from_secs(DATA_IO_TIMEOUT_SECS)
}

/// Streams a file to the data socket in binary, then shuts the socket down
/// so the client sees a clean end of transfer. Socket operations carry a
/// per-operation deadline; a stalled client turns into an I/O error.
pub async fn copy_file_to_socket(file: &mut File, socket: &mut TcpStream) -> io::Result<u64> {
    let mut buffer = vec![0u8; TRANSFER_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        timeout(io_deadline(), socket.write_all(&buffer[..n]))
            .await
            .map_err(|_| data_timeout())??;
        total += n as u64;
    }
    timeout(io_deadline(), socket.shutdown())
        .await
        .map_err(|_| data_timeout())??;
    Ok(total)
}

/// Drains the data socket into a file until the client closes its end.
pub async fn copy_socket_to_file(socket: &mut TcpStream, file: &mut File) -> io::Result<u64> {
    let mut buffer = vec![0u8; TRANSFER_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = timeout(io_deadline(), socket.read(&mut buffer))
            .await
            .map_err(|_| data_timeout())??;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n]).await?;
        total += n as u64;
    }
    file.flush().await?;
    Ok(total)
}

/// Writes a prebuilt payload (a directory listing) to the data socket and
/// shuts it down.
pub async fn send_payload(socket: &mut TcpStream, payload: &[u8]) -> io::Result<()> {
    timeout(io_deadline(), socket.write_all(payload))
        .await
        .map_err(|_| data_timeout())??;
    timeout(io_deadline(), socket.shutdown())
        .await
        .map_err(|_| data_timeout())??;
    Ok(())
}
