//! Shared types for dirstore: object keys and storage configuration.

mod config;
mod key;

pub use config::{
    ConfigError, StorageConfig, CONFIG_ENV, ENDPOINT_ENV, ROOT_ENV, SYNC_WRITES_ENV,
};
pub use key::{
    is_staging_name, DirectoryKey, KeyError, ObjectKey, STAGING_PREFIX, STAGING_SUFFIX,
};
