//! Object storage emulated on a local directory tree.
//!
//! Objects are addressed by a directory key and an object key and live at
//! `root/<directory key>/<object key>`. The directory hierarchy itself is the
//! index: directories appear when the first object beneath them is saved and
//! are pruned when the last one beneath them is destroyed.

pub mod body;
pub mod listing;
pub mod mapper;
pub mod policy;
pub mod pruner;
pub mod writer;

pub use body::Body;
pub use dirstore_core::{ConfigError, DirectoryKey, KeyError, ObjectKey, StorageConfig};
pub use listing::{ObjectMetadata, StoredObject};
pub use pruner::PruneReport;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Raw filesystem error, passed through unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid key: {0}")]
    Key(#[from] KeyError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0} is a directory, not an object")]
    NotAFile(PathBuf),

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl StorageError {
    /// Kind of the underlying filesystem error, if this is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            StorageError::Io(err) => Some(err.kind()),
            _ => None,
        }
    }
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

/// A connection to a storage root on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    config: StorageConfig,
}

impl LocalStorage {
    /// Validate `config` and create the storage root if it does not exist.
    pub fn open(config: StorageConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.root)?;
        info!(root = %config.root.display(), endpoint = ?config.public_endpoint(), "opened local storage");
        Ok(Self { config })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Handle bound to one directory key. Nothing is created on disk.
    pub fn directory(&self, key: &str) -> Result<Directory<'_>> {
        Ok(Directory {
            storage: self,
            key: DirectoryKey::new(key)?,
        })
    }

    pub fn path_for(&self, directory: &str, key: &str) -> Result<PathBuf> {
        self.directory(directory)?.path_for(key)
    }

    pub fn public_url(&self, directory: &str, key: &str) -> Result<Option<String>> {
        self.directory(directory)?.public_url(key)
    }

    pub fn save(&self, directory: &str, key: &str, body: impl Into<Body>) -> Result<u64> {
        self.directory(directory)?.save(key, body)
    }

    pub fn destroy(&self, directory: &str, key: &str) -> Result<PruneReport> {
        self.directory(directory)?.destroy(key)
    }

    pub fn get(&self, directory: &str, key: &str) -> Result<Option<StoredObject>> {
        self.directory(directory)?.get(key)
    }

    pub fn head(&self, directory: &str, key: &str) -> Result<Option<ObjectMetadata>> {
        self.directory(directory)?.head(key)
    }

    pub fn exists(&self, directory: &str, key: &str) -> Result<bool> {
        self.directory(directory)?.exists(key)
    }

    pub fn list(&self, directory: &str) -> Result<Vec<ObjectMetadata>> {
        self.directory(directory)?.list()
    }
}

/// A directory key within a [`LocalStorage`].
#[derive(Debug, Clone)]
pub struct Directory<'s> {
    storage: &'s LocalStorage,
    key: DirectoryKey,
}

impl<'s> Directory<'s> {
    pub fn key(&self) -> &DirectoryKey {
        &self.key
    }

    pub fn path(&self) -> PathBuf {
        mapper::directory_path(self.storage.root(), &self.key)
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let key = ObjectKey::new(key)?;
        Ok(mapper::resolve(self.storage.root(), &self.key, &key))
    }

    pub fn public_url(&self, key: &str) -> Result<Option<String>> {
        let key = ObjectKey::new(key)?;
        Ok(mapper::public_url(
            self.storage.config.public_endpoint(),
            &self.key,
            &key,
        ))
    }

    /// Atomically store `body` under `key`, returning the bytes written.
    pub fn save(&self, key: &str, body: impl Into<Body>) -> Result<u64> {
        let path = self.path_for(key)?;
        let written = writer::write_atomic(&path, body.into(), self.storage.config.sync_writes)?;
        Ok(written)
    }

    /// Remove the object and prune the directories beneath this directory
    /// key that are left empty. The directory-key folder itself, and therefore
    /// the storage root, is kept. Destroying a missing object succeeds.
    pub fn destroy(&self, key: &str) -> Result<PruneReport> {
        let path = self.path_for(key)?;
        if fs::symlink_metadata(&path).is_ok_and(|meta| meta.is_dir()) {
            return Err(StorageError::NotAFile(path));
        }
        Ok(pruner::destroy(&self.path(), &path)?)
    }

    pub fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        listing::get(&self.path_for(key)?, key)
    }

    pub fn head(&self, key: &str) -> Result<Option<ObjectMetadata>> {
        listing::head(&self.path_for(key)?, key)
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.head(key)?.is_some())
    }

    pub fn list(&self) -> Result<Vec<ObjectMetadata>> {
        listing::list(&self.path())
    }
}
