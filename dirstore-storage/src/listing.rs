//! Read-side operations: object metadata, bodies and directory listings.

use crate::pruner::is_absent;
use crate::writer::is_staging_name;
use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// Metadata about a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    /// Object key relative to its directory, `/`-separated.
    pub key: String,
    /// Size in bytes
    pub content_length: u64,
    pub last_modified: DateTime<Utc>,
}

/// An object read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub metadata: ObjectMetadata,
    pub body: Vec<u8>,
}

fn metadata_for(key: String, meta: &fs::Metadata) -> ObjectMetadata {
    let modified = meta.modified().unwrap_or(UNIX_EPOCH);
    ObjectMetadata {
        key,
        content_length: meta.len(),
        last_modified: DateTime::<Utc>::from(modified),
    }
}

/// Metadata of the object at `path`, or `None` if there is no such file.
pub fn head(path: &Path, key: &str) -> Result<Option<ObjectMetadata>, StorageError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if is_absent(&err) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if meta.is_dir() {
        return Err(StorageError::NotAFile(path.to_path_buf()));
    }
    Ok(Some(metadata_for(key.to_string(), &meta)))
}

pub fn get(path: &Path, key: &str) -> Result<Option<StoredObject>, StorageError> {
    let Some(metadata) = head(path, key)? else {
        return Ok(None);
    };
    match fs::read(path) {
        Ok(body) => Ok(Some(StoredObject {
            // Length of what was actually read, in case of a concurrent replace.
            metadata: ObjectMetadata {
                content_length: body.len() as u64,
                ..metadata
            },
            body,
        })),
        Err(err) if is_absent(&err) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Every object beneath `dir`, sorted by key. A missing directory lists as
/// empty.
pub fn list(dir: &Path) -> Result<Vec<ObjectMetadata>, StorageError> {
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => return Err(StorageError::NotADirectory(dir.to_path_buf())),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    }

    let mut results = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(|e| StorageError::Io(e.into()))?;
        if !entry.file_type().is_file() || is_staging_name(entry.file_name()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| StorageError::InvalidPath(e.to_string()))?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let meta = entry.metadata().map_err(|e| StorageError::Io(e.into()))?;
        results.push(metadata_for(key, &meta));
    }
    results.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_and_get_missing_object() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing.txt");
        assert_eq!(head(&path, "missing.txt").unwrap(), None);
        assert_eq!(get(&path, "missing.txt").unwrap(), None);
    }

    #[test]
    fn get_reads_body_and_metadata() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("file.txt");
        fs::write(&path, b"tempfile").unwrap();

        let object = get(&path, "file.txt").unwrap().unwrap();
        assert_eq!(object.body, b"tempfile");
        assert_eq!(object.metadata.key, "file.txt");
        assert_eq!(object.metadata.content_length, 8);
        assert!(object.metadata.last_modified > DateTime::<Utc>::from(UNIX_EPOCH));
    }

    #[test]
    fn key_beneath_a_file_is_missing() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("a");
        fs::write(&file, b"object").unwrap();
        assert_eq!(head(&file.join("b"), "a/b").unwrap(), None);
        assert_eq!(get(&file.join("b"), "a/b").unwrap(), None);
    }

    #[test]
    fn head_of_directory_is_not_a_file() {
        let temp = tempfile::tempdir().unwrap();
        assert!(matches!(
            head(temp.path(), "dir"),
            Err(StorageError::NotAFile(_))
        ));
    }

    #[test]
    fn list_is_recursive_sorted_and_skips_staging_files() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();
        fs::create_dir_all(dir.join("a/b")).unwrap();
        fs::write(dir.join("z.txt"), b"1").unwrap();
        fs::write(dir.join("a/.hidden"), b"22").unwrap();
        fs::write(dir.join("a/b/file.rb"), b"333").unwrap();
        fs::write(dir.join("a/.dirstore-XYZ.tmp"), b"partial").unwrap();

        let listed = list(dir).unwrap();
        let keys: Vec<_> = listed.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["a/.hidden", "a/b/file.rb", "z.txt"]);
        assert_eq!(listed[1].content_length, 3);
    }

    #[test]
    fn list_of_missing_directory_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        assert!(list(&temp.path().join("nope")).unwrap().is_empty());
    }
}
