use crate::session::Session;
use std::path::{Component, Path, PathBuf};

/// Normalizes an FTP path argument against a virtual working directory.
///
/// Absolute arguments replace the base entirely. The result is always a
/// canonical virtual path: it starts with "/", contains no empty, "." or ".."
/// segments, and ".." never climbs above "/".
pub fn virtual_join(base: &str, arg: &str) -> String {
    let combined = if arg.starts_with('/') {
        arg.to_string()
    } else {
        format!("{}/{}", base, arg)
    };

    let mut stack: Vec<&str> = Vec::new();
    for segment in combined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }

    format!("/{}", stack.join("/"))
}

/// Maps an FTP path argument to a physical path under `root`.
///
/// The virtual path is appended to `root`, lexically normalized, and checked
/// against the jail. Paths that land outside the root resolve to `None`; the
/// caller reports them exactly like a missing file.
pub fn resolve_path(root: &Path, cwd: &str, arg: &str) -> Option<PathBuf> {
    let virtual_path = virtual_join(cwd, arg);
    let relative = virtual_path.trim_start_matches('/');

    let mut physical = root.to_path_buf();
    if !relative.is_empty() {
        physical.push(relative);
    }
    let physical = normalize_lexically(&physical);

    if is_within_root(root, &physical) {
        Some(physical)
    } else {
        None
    }
}

/// Returns the "/"-rooted virtual form of a physical path under `root`.
pub fn virtual_path_of(root: &Path, physical: &Path) -> Option<String> {
    let relative = physical.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        segments.push(component.as_os_str().to_str()?.to_string());
    }
    Some(format!("/{}", segments.join("/")))
}

/// Resolves `arg` and, when it names an existing directory, updates the
/// session's virtual working directory. Returns false otherwise.
pub async fn try_change_dir(session: &mut Session, arg: &str) -> bool {
    let Some(physical) = resolve_path(&session.root_path, &session.current_dir, arg) else {
        return false;
    };
    match tokio::fs::metadata(&physical).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return false,
    }
    let Some(virtual_path) = virtual_path_of(&session.root_path, &physical) else {
        return false;
    };
    session.current_dir = virtual_path;
    true
}

/// Resolves `.` and `..` segments and drops redundant separators without
/// touching the filesystem. Unlike `fs::canonicalize` this works for paths
/// that do not exist yet (STOR and MKD targets).
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Jail check: `candidate` must equal `root` or extend it past a separator.
/// The comparison is case-insensitive to match the behavior of the reference
/// deployment filesystem.
fn is_within_root(root: &Path, candidate: &Path) -> bool {
    let root_str = root.to_string_lossy().to_lowercase();
    let candidate_str = candidate.to_string_lossy().to_lowercase();

    if candidate_str == root_str {
        return true;
    }
    let mut prefix = root_str;
    if !prefix.ends_with(std::path::MAIN_SEPARATOR) {
        prefix.push(std::path::MAIN_SEPARATOR);
    }
    candidate_str.starts_with(&prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn join_relative_segments() {
        assert_eq!(virtual_join("/", "docs"), "/docs");
        assert_eq!(virtual_join("/docs", "reports/2024"), "/docs/reports/2024");
    }

    #[test]
    fn join_absolute_argument_replaces_base() {
        assert_eq!(virtual_join("/docs/reports", "/uploads"), "/uploads");
    }

    #[test]
    fn join_skips_dot_and_empty_segments() {
        assert_eq!(virtual_join("/", "a/./b//c"), "/a/b/c");
        assert_eq!(virtual_join("/a", "."), "/a");
    }

    #[test]
    fn join_dotdot_pops_and_stops_at_root() {
        assert_eq!(virtual_join("/a/b", ".."), "/a");
        assert_eq!(virtual_join("/a/b", "../c"), "/a/c");
        assert_eq!(virtual_join("/", ".."), "/");
        assert_eq!(virtual_join("/", "../../.."), "/");
        assert_eq!(virtual_join("/a", "../../etc/passwd"), "/etc/passwd");
    }

    #[test]
    fn join_of_root_and_path_matches_join_of_any_cwd_and_absolute_path() {
        for cwd in ["/", "/a", "/a/b/c", "/deep/nested/dir"] {
            for p in ["x", "x/y", "x/../y", ""] {
                let absolute = format!("/{}", p);
                assert_eq!(
                    virtual_join("/", p),
                    virtual_join(cwd, &absolute),
                    "cwd={} p={}",
                    cwd,
                    p
                );
            }
        }
    }

    #[test]
    fn resolve_stays_inside_root() {
        let root = Path::new("/srv/ftp/alice");
        assert_eq!(
            resolve_path(root, "/", "notes.txt"),
            Some(PathBuf::from("/srv/ftp/alice/notes.txt"))
        );
        assert_eq!(
            resolve_path(root, "/docs", "../pics/cat.jpg"),
            Some(PathBuf::from("/srv/ftp/alice/pics/cat.jpg"))
        );
    }

    #[test]
    fn traversal_collapses_to_root() {
        let root = Path::new("/srv/ftp/alice");
        // "../../etc/passwd" normalizes to "/etc/passwd" virtually, which
        // maps back under the root rather than escaping it.
        assert_eq!(
            resolve_path(root, "/", "../../etc/passwd"),
            Some(PathBuf::from("/srv/ftp/alice/etc/passwd"))
        );
        assert_eq!(resolve_path(root, "/", "/.."), Some(root.to_path_buf()));
    }

    #[test]
    fn jail_prefix_is_case_insensitive() {
        let root = Path::new("/SRV/Ftp/Alice");
        assert!(is_within_root(root, Path::new("/srv/ftp/alice/file")));
        assert!(is_within_root(root, root));
    }

    #[test]
    fn jail_prefix_requires_separator_boundary() {
        let root = Path::new("/srv/ftp/alice");
        assert!(!is_within_root(root, Path::new("/srv/ftp/alice-evil/f")));
        assert!(!is_within_root(root, Path::new("/srv/ftp")));
    }

    #[test]
    fn virtual_path_round_trip() {
        let root = Path::new("/srv/ftp/alice");
        let physical = resolve_path(root, "/docs", "reports").unwrap();
        assert_eq!(
            virtual_path_of(root, &physical),
            Some("/docs/reports".to_string())
        );
        assert_eq!(virtual_path_of(root, root), Some("/".to_string()));
    }
}
