//! Path Mapper
//!
//! Turns a storage root plus a (directory key, object key) pair into a
//! filesystem path, and derives the public URL of an object.

use dirstore_core::{DirectoryKey, ObjectKey};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};

/// Everything except RFC 3986 unreserved characters is escaped. `/` is never
/// encoded because keys are encoded segment by segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Path of the directory `root/directory`.
pub fn directory_path(root: &Path, directory: &DirectoryKey) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(directory.segments());
    path
}

/// Path of the object `root/directory/key`.
///
/// Keys are validated on construction, so the result is always lexically
/// beneath `root`.
pub fn resolve(root: &Path, directory: &DirectoryKey, key: &ObjectKey) -> PathBuf {
    let mut path = directory_path(root, directory);
    path.extend(key.segments());
    path
}

/// `endpoint/<escaped directory>/<escaped key>`, or `None` without an endpoint.
pub fn public_url(
    endpoint: Option<&str>,
    directory: &DirectoryKey,
    key: &ObjectKey,
) -> Option<String> {
    let endpoint = endpoint.map(str::trim).filter(|e| !e.is_empty())?;
    let mut url = endpoint.trim_end_matches('/').to_string();
    for segment in directory.segments().chain(key.segments()) {
        url.push('/');
        url.extend(utf8_percent_encode(segment, SEGMENT));
    }
    Some(url)
}
