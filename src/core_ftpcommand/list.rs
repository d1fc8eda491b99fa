use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::resolve_path;
use crate::core_network::data::send_payload;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use chrono::{DateTime, Utc};
use log::warn;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;

/// Formats one child entry in the fixed Unix-style layout clients parse:
///
/// ```text
/// drwxr-xr-x   1    owner    group          0 Jun 05 13:37 docs
/// ```
///
/// Permissions, link count, owner and group are literals; only the type bit,
/// size, date and name vary. The month abbreviation is always English.
pub fn unix_list_line(name: &str, is_dir: bool, size: u64, modified: SystemTime) -> String {
    let perms = if is_dir { "drwxr-xr-x" } else { "-rw-r--r--" };
    let size = if is_dir { 0 } else { size };
    let date = DateTime::<Utc>::from(modified).format("%b %d %H:%M");
    format!(
        "{} {:>3} {:>8} {:>8} {:>10} {} {}",
        perms, 1, "owner", "group", size, date, name
    )
}

/// Lists the immediate children of `dir`: directories first, then files,
/// each group in filesystem order.
pub async fn unix_list_lines(dir: &Path) -> io::Result<Vec<String>> {
    let mut dir_lines = Vec::new();
    let mut file_lines = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let meta = match entry.metadata().await {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let line = unix_list_line(&name, meta.is_dir(), meta.len(), modified);
        if meta.is_dir() {
            dir_lines.push(line);
        } else {
            file_lines.push(line);
        }
    }

    dir_lines.append(&mut file_lines);
    Ok(dir_lines)
}

/// Handles the LIST FTP command.
///
/// The optional argument is resolved like any other path; anything that is
/// not an existing directory inside the jail produces an empty listing
/// rather than an error, so the reply sequence is the same either way.
pub async fn handle_list_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), CommandError> {
    let (target, session_id) = {
        let session = session.lock().await;
        (
            resolve_path(&session.root_path, &session.current_dir, arg.trim()),
            session.id,
        )
    };

    let data = {
        let mut session = session.lock().await;
        session.accept_data().await
    };
    let Some(mut data) = data else {
        send_response(&writer, b"425 Can't open data connection\r\n").await?;
        return Ok(());
    };

    send_response(&writer, b"150 Opening data connection for LIST\r\n").await?;

    let lines = match listing_for(target.as_deref()).await {
        Ok(lines) => lines,
        Err(e) => {
            warn!("[session {}] LIST failed: {}", session_id, e);
            send_response(&writer, b"451 Local error in processing\r\n").await?;
            return Ok(());
        }
    };

    let mut payload = String::new();
    for line in &lines {
        payload.push_str(line);
        payload.push_str("\r\n");
    }

    match send_payload(&mut data, payload.as_bytes()).await {
        Ok(()) => {
            send_response(&writer, b"226 Transfer complete\r\n").await?;
        }
        Err(e) => {
            warn!("[session {}] LIST transfer failed: {}", session_id, e);
            send_response(&writer, b"451 Local error in processing\r\n").await?;
        }
    }
    Ok(())
}

async fn listing_for(target: Option<&Path>) -> io::Result<Vec<String>> {
    let Some(path) = target else {
        return Ok(Vec::new());
    };
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => unix_list_lines(path).await,
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn at(secs_since_epoch: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs_since_epoch)
    }

    #[test]
    fn file_line_is_golden() {
        // 2024-06-05 13:37:00 UTC
        let line = unix_list_line("report.txt", false, 1234, at(1_717_594_620));
        assert_eq!(
            line,
            "-rw-r--r--   1    owner    group       1234 Jun 05 13:37 report.txt"
        );
    }

    #[test]
    fn directory_line_is_golden() {
        let line = unix_list_line("docs", true, 4096, at(0));
        assert_eq!(
            line,
            "drwxr-xr-x   1    owner    group          0 Jan 01 00:00 docs"
        );
    }

    #[test]
    fn day_is_zero_padded() {
        // 2024-01-03 14:22:00 UTC
        let line = unix_list_line("a", false, 0, at(1_704_291_720));
        assert!(line.contains("Jan 03 14:22"), "line was: {}", line);
    }

    #[tokio::test]
    async fn directories_are_listed_before_files() {
        let root = tempfile::tempdir().unwrap();
        tokio::fs::write(root.path().join("zz.txt"), b"data")
            .await
            .unwrap();
        tokio::fs::create_dir(root.path().join("aa")).await.unwrap();
        tokio::fs::write(root.path().join("bb.txt"), b"data")
            .await
            .unwrap();
        tokio::fs::create_dir(root.path().join("yy")).await.unwrap();

        let lines = unix_list_lines(root.path()).await.unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with('d'));
        assert!(lines[1].starts_with('d'));
        assert!(lines[2].starts_with('-'));
        assert!(lines[3].starts_with('-'));
    }

    #[tokio::test]
    async fn missing_directory_yields_nothing() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("nope");
        assert!(unix_list_lines(&target).await.is_err());
        assert!(listing_for(Some(&target)).await.unwrap().is_empty());
        assert!(listing_for(None).await.unwrap().is_empty());
    }
}
