//! Scratch directories for tests that write files.

use std::path::{Path, PathBuf};

/// A fresh temporary directory, removed when dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("wind-compare-test-")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// `path` relative to `dir`, with any missing parents created.
pub fn scratch_path(dir: &Path, relative: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create scratch directory");
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_path_creates_parents() {
        let dir = temp_test_dir();
        let path = scratch_path(dir.path(), "nested/out/figure.png");
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
        assert!(dir.path().file_name().unwrap().to_string_lossy().starts_with("wind-compare-test-"));
    }
}
