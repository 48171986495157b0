//! Step 1 of the bundle update task: recursively walk a source directory.
//!
//! Symlinks are skipped (logged at `warn!`) rather than followed, the
//! conservative default for a content-addressed store.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// POSIX-separated path relative to the source root.
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub size: u64,
}

pub fn scan_source_dir(src_dir: &Path) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(src_dir).follow_links(false) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;

        if entry.path_is_symlink() {
            warn!(path = %entry.path().display(), "skipping symlink during scan");
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(|e| std::io::Error::other(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");
        let size = entry.metadata().map_err(|e| std::io::Error::other(e.to_string()))?.len();

        files.push(ScannedFile { rel_path, abs_path: entry.path().to_path_buf(), size });
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn scans_files_recursively_with_posix_paths() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"hello").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b"), b"world").unwrap();

        let mut files = scan_source_dir(dir.path()).unwrap();
        files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].rel_path, "a");
        assert_eq!(files[0].size, 5);
        assert_eq!(files[1].rel_path, "sub/b");
    }

    #[cfg(unix)]
    #[test]
    fn skips_symlinks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"hello").unwrap();
        std::os::unix::fs::symlink(dir.path().join("a"), dir.path().join("link")).unwrap();

        let files = scan_source_dir(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, "a");
    }
}
