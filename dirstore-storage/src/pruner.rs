//! Directory Pruner
//!
//! Deleting an object removes the file, then walks from its parent toward a
//! boundary directory removing every directory left empty. The walk stops at
//! the first occupied directory and never removes the boundary itself, which
//! is the object's directory-key folder and so always lies inside the storage
//! root. Only absolute paths are used; the process working directory is never
//! consulted.

use crate::policy::is_empty_dir;
use metrics::counter;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a destroy call changed on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Whether an object file existed and was removed.
    pub object_removed: bool,
    /// Directories removed, innermost first.
    pub pruned: Vec<PathBuf>,
}

/// Remove the object at `target` (a missing object is not an error) and prune
/// the empty directories above it, up to but excluding `boundary`.
pub fn destroy(boundary: &Path, target: &Path) -> io::Result<PruneReport> {
    let object_removed = match fs::remove_file(target) {
        Ok(()) => true,
        Err(err) if is_absent(&err) => {
            debug!(path = %target.display(), "object already absent");
            false
        }
        Err(err) => return Err(err),
    };
    if object_removed {
        counter!("dirstore_objects_destroyed_total").increment(1);
    }

    let pruned = prune_empty_parents(boundary, target.parent())?;
    Ok(PruneReport {
        object_removed,
        pruned,
    })
}

/// A path that runs through a regular file names no object either.
pub(crate) fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Remove `start` and its ancestors while they are empty, stopping at the first
/// occupied directory or at `boundary`.
pub fn prune_empty_parents(boundary: &Path, start: Option<&Path>) -> io::Result<Vec<PathBuf>> {
    let mut pruned = Vec::new();
    let mut current = start;

    while let Some(dir) = current {
        if dir == boundary || !dir.starts_with(boundary) {
            break;
        }
        match is_empty_dir(dir) {
            Ok(true) => {}
            Ok(false) => {
                debug!(dir = %dir.display(), "directory occupied, stopping");
                break;
            }
            // Nothing to remove at this level; keep climbing.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                current = dir.parent();
                continue;
            }
            // A file occupies this level.
            Err(err) if err.kind() == io::ErrorKind::NotADirectory => break,
            Err(err) => return Err(err),
        }
        match fs::remove_dir(dir) {
            Ok(()) => {
                counter!("dirstore_directories_pruned_total").increment(1);
                debug!(dir = %dir.display(), "pruned empty directory");
                pruned.push(dir.to_path_buf());
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            // A concurrent save filled the directory after the emptiness check.
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::DirectoryNotEmpty | io::ErrorKind::AlreadyExists
                ) =>
            {
                break;
            }
            Err(err) => return Err(err),
        }
        current = dir.parent();
    }

    Ok(pruned)
}
