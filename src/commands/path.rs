use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use log::debug;

/// Names of executable files in every directory of a `PATH`-style value.
/// Symlinks are followed; unreadable directories are skipped.
pub fn executables(path: &OsStr) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for dir in std::env::split_paths(path) {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("skipping PATH entry {}: {e}", dir.display());
                continue;
            }
        };
        for entry in entries.flatten() {
            if !is_executable(&entry.path()) {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.insert(name);
            }
        }
    }
    names
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    pub(crate) fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "shellweave-{tag}-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[cfg(unix)]
    pub(crate) fn touch(dir: &Path, name: &str, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        let file = dir.join(name);
        fs::write(&file, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn only_executable_files() {
        let dir = scratch_dir("exec");
        touch(&dir, "tool", 0o755);
        touch(&dir, "notes.txt", 0o644);
        touch(&dir, "owner-only", 0o700);
        fs::create_dir(dir.join("subdir")).unwrap();
        let names = executables(dir.as_os_str());
        assert!(names.contains("tool"));
        assert!(names.contains("owner-only"));
        assert!(!names.contains("notes.txt"));
        assert!(!names.contains("subdir"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_followed() {
        let dir = scratch_dir("link");
        touch(&dir, "real", 0o755);
        std::os::unix::fs::symlink(dir.join("real"), dir.join("alias")).unwrap();
        std::os::unix::fs::symlink(dir.join("missing"), dir.join("dangling")).unwrap();
        let names = executables(dir.as_os_str());
        assert!(names.contains("alias"));
        assert!(!names.contains("dangling"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directories_skipped() {
        let names = executables(OsStr::new("/nonexistent/shellweave/bin"));
        assert!(names.is_empty());
    }
}
