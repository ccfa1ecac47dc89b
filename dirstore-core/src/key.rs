//! Directory and object keys.
//!
//! A key is a caller-supplied string of `/`-separated segments. Keys are
//! validated once, at construction, so that every key value in the system maps
//! to a path lexically beneath the storage root.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("key must contain at least one path segment")]
    Empty,

    #[error("key {0:?} escapes the storage root")]
    Traversal(String),

    #[error("key {0:?} is absolute")]
    Absolute(String),

    #[error("key contains invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("key segment {0:?} uses the reserved staging-file name pattern")]
    Reserved(String),
}

/// Name prefix of in-flight staging files written next to objects.
pub const STAGING_PREFIX: &str = ".dirstore-";
/// Name suffix of in-flight staging files.
pub const STAGING_SUFFIX: &str = ".tmp";

/// Whether `name` looks like an in-flight staging file.
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX) && name.ends_with(STAGING_SUFFIX)
}

fn validate(raw: &str) -> Result<(), KeyError> {
    if raw.contains('\0') {
        return Err(KeyError::InvalidCharacter('\0'));
    }
    if raw.starts_with('/') {
        return Err(KeyError::Absolute(raw.to_string()));
    }
    for component in Path::new(raw).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(KeyError::Absolute(raw.to_string()))
            }
            Component::ParentDir => return Err(KeyError::Traversal(raw.to_string())),
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    if raw.split('/').any(|segment| segment == "..") {
        return Err(KeyError::Traversal(raw.to_string()));
    }
    if let Some(segment) = segments_of(raw).find(|segment| is_staging_name(segment)) {
        return Err(KeyError::Reserved(segment.to_string()));
    }
    if segments_of(raw).next().is_none() {
        return Err(KeyError::Empty);
    }
    Ok(())
}

fn segments_of(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
}

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Result<Self, KeyError> {
                let raw = raw.into();
                validate(&raw)?;
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Normal path segments of the key, in order.
            pub fn segments(&self) -> impl Iterator<Item = &str> {
                segments_of(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = KeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = KeyError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = KeyError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(key: $name) -> Self {
                key.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

key_type!(
    /// Prefix portion of a storage path: the bucket name plus any virtual
    /// subfolders.
    DirectoryKey
);

key_type!(
    /// Suffix portion of a storage path, naming one object beneath a
    /// [`DirectoryKey`].
    ObjectKey
);
