//! Atomic Writer
//!
//! Objects are staged in a temporary file next to their final path and renamed
//! into place once the whole body has been written. Readers therefore see
//! either the previous object or the complete new one, never a partial file.

use crate::body::Body;
use dirstore_core::{STAGING_PREFIX, STAGING_SUFFIX};
use metrics::counter;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

/// Whether `name` looks like an in-flight staging file.
pub(crate) fn is_staging_name(name: &OsStr) -> bool {
    name.to_str().map_or(false, dirstore_core::is_staging_name)
}

/// Write `body` to `target`, creating missing parent directories first.
///
/// Parent directories stay behind even when the write fails. On failure the
/// staging file is removed before the original error is returned.
pub fn write_atomic(target: &Path, body: Body, sync: bool) -> io::Result<u64> {
    let result = stage_and_publish(target, body, sync);
    match &result {
        Ok(written) => {
            counter!("dirstore_objects_saved_total").increment(1);
            counter!("dirstore_bytes_written_total").increment(*written);
            debug!(path = %target.display(), bytes = written, "object saved");
        }
        Err(err) => {
            counter!("dirstore_save_failures_total").increment(1);
            debug!(path = %target.display(), error = %err, "object save failed");
        }
    }
    result
}

fn stage_and_publish(target: &Path, body: Body, sync: bool) -> io::Result<u64> {
    let parent = target.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", target.display()),
        )
    })?;
    fs::create_dir_all(parent)?;

    // make_in hands back the open error untouched, errno included.
    let mut staged = Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .make_in(parent, open_staging)?;
    let written = match fill(&mut staged, body, sync) {
        Ok(written) => written,
        Err(err) => {
            discard(staged);
            return Err(err);
        }
    };

    if let Err(err) = staged.persist(target) {
        discard(err.file);
        return Err(err.error);
    }

    if sync {
        sync_dir(parent);
    }
    Ok(written)
}

// Published objects get the usual umask-filtered mode, not 0600.
#[cfg(unix)]
fn open_staging(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o666)
        .open(path)
}

#[cfg(not(unix))]
fn open_staging(path: &Path) -> io::Result<File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}

fn fill(staged: &mut NamedTempFile, body: Body, sync: bool) -> io::Result<u64> {
    let file = staged.as_file_mut();
    let written = body.write_to(file)?;
    file.flush()?;
    if sync {
        file.sync_all()?;
    }
    Ok(written)
}

fn discard(staged: NamedTempFile) {
    let path = staged.path().to_path_buf();
    if let Err(err) = staged.close() {
        warn!(path = %path.display(), error = %err, "failed to remove staging file");
    }
}

/// Flush the directory entry of a freshly renamed object. Failures are logged:
/// the object is already published at this point.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(err) = File::open(dir).and_then(|d| d.sync_all()) {
        warn!(dir = %dir.display(), error = %err, "failed to sync directory");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
