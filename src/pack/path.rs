//! Containment check for relative paths taken from a pack.

use std::path::{Component, Path, PathBuf};

use super::error::InstallError;

/// Joins `relative` onto `root`, refusing anything that could land outside.
///
/// Rejected: empty paths, absolute paths, drive or UNC prefixes, and any
/// `..` that climbs above the root at that point of the walk. `.` segments are
/// dropped and `a/../b` collapses to `b`. The check is lexical; symlinks
/// already inside `root` are not followed.
///
/// # Errors
///
/// Returns [`InstallError::PathEscape`] carrying `relative` unchanged.
pub fn resolve_inside(root: &Path, relative: &str) -> Result<PathBuf, InstallError> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(InstallError::path_escape(relative));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(InstallError::path_escape(relative));
            }
        }
    }
    if parts.is_empty() {
        return Err(InstallError::path_escape(relative));
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(parts);
    Ok(resolved)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_relative_path() {
        let path = resolve_inside(Path::new("/srv/mc"), "mods/a.jar").unwrap();
        assert_eq!(path, Path::new("/srv/mc/mods/a.jar"));
    }

    #[test]
    fn test_dot_segments_collapse() {
        let path = resolve_inside(Path::new("/srv/mc"), "./config/../mods/./b.jar").unwrap();
        assert_eq!(path, Path::new("/srv/mc/mods/b.jar"));
    }

    #[test]
    fn test_escape_rejected() {
        for bad in [
            "../../etc/passwd",
            "..",
            "mods/../../x",
            "/etc/passwd",
            "",
            ".",
            "mods/..",
        ] {
            let err = resolve_inside(Path::new("/srv/mc"), bad).unwrap_err();
            match err {
                InstallError::PathEscape { path } => assert_eq!(path, bad),
                other => panic!("Expected PathEscape for {bad:?}, got: {other:?}"),
            }
        }
    }

    #[cfg(windows)]
    #[test]
    fn test_drive_prefix_rejected() {
        assert!(resolve_inside(Path::new("C:\\srv"), "D:\\evil.dll").is_err());
        assert!(resolve_inside(Path::new("C:\\srv"), "\\\\host\\share\\x").is_err());
    }
}
