//! Emptiness Policy
//!
//! A directory may be pruned only when it has no entries at all. Hidden files
//! occupy a directory like any other entry, so sidecar files kept next to
//! objects keep their directory alive.

use std::fs;
use std::io;
use std::path::Path;

pub fn is_empty_dir(dir: &Path) -> io::Result<bool> {
    // read_dir never yields the "." and ".." entries.
    match fs::read_dir(dir)?.next() {
        None => Ok(true),
        Some(entry) => entry.map(|_| false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_directory_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        assert!(is_empty_dir(temp.path()).unwrap());
    }

    #[test]
    fn visible_file_occupies_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("file.rb"), b"x").unwrap();
        assert!(!is_empty_dir(temp.path()).unwrap());
    }

    #[test]
    fn hidden_file_occupies_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(".file.rb"), b"x").unwrap();
        assert!(!is_empty_dir(temp.path()).unwrap());
    }

    #[test]
    fn subdirectory_occupies_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("child")).unwrap();
        assert!(!is_empty_dir(temp.path()).unwrap());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = is_empty_dir(&temp.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
