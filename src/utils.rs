//! Path helpers: collision-safe allocation and destination naming

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Get a unique path for a file or folder, handling collisions according to the specified action
///
/// Only checks existence; nothing is created. Two callers racing on the same
/// candidate can both receive it, since the check and the later create are
/// not atomic.
///
/// # Arguments
///
/// * `path` - The desired path
/// * `action` - How to handle collisions
///
/// # Returns
///
/// Returns the final path to use. For Rename action, this may have a suffix added.
/// For Skip action, returns an error if the path already exists.
/// For Overwrite action, returns the original path unchanged.
///
/// # Examples
///
/// ```
/// use ez_unzip::utils::get_unique_path;
/// use ez_unzip::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/report.zip");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// // If /tmp/report.zip exists, returns /tmp/report (1).zip
/// // If that exists too, returns /tmp/report (2).zip, etc.
/// ```
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(Error::Collision {
                    path: path.to_path_buf(),
                    reason: "path already exists and collision action is Skip".to_string(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| Error::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "cannot extract file stem".to_string(),
                })?;

            let extension = path.extension().and_then(|e| e.to_str());

            let parent = path.parent().ok_or_else(|| Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "cannot extract parent directory".to_string(),
            })?;

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    debug!(original = ?path, unique = ?new_path, "resolved path collision");
                    return Ok(new_path);
                }
            }

            Err(Error::Collision {
                path: path.to_path_buf(),
                reason: format!(
                    "could not find a unique name after {} attempts",
                    MAX_RENAME_ATTEMPTS
                ),
            })
        }
    }
}

/// Base name of an input with its last extension removed
///
/// `report.zip` -> `report`, `data.tar.gz` -> `data.tar`, `notes` -> `notes`.
pub fn archive_stem(input: &Path) -> Result<String> {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .ok_or_else(|| Error::InvalidPath {
            path: input.to_path_buf(),
            reason: "cannot extract file stem".to_string(),
        })
}

/// Unallocated destination folder for extracting `input` into `output`
pub fn destination_candidate(input: &Path, output: &Path) -> Result<PathBuf> {
    Ok(output.join(archive_stem(input)?))
}

/// Folder a previous extraction of `input` into `output` would have produced
///
/// Returns `None` when nothing exists there. Only the un-suffixed name is
/// checked; `report (1)` from a later collision is not found.
pub fn last_destination(input: &Path, output: &Path) -> Option<PathBuf> {
    let candidate = destination_candidate(input, output).ok()?;
    candidate.exists().then_some(candidate)
}

/// Keep only the normal components of an archive entry path
///
/// Drops `..`, root and prefix components so an entry can never escape the
/// destination folder. Returns `None` when nothing is left.
pub fn sanitize_entry_path(entry: &Path) -> Option<PathBuf> {
    let sanitized = entry
        .components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .collect::<PathBuf>();
    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}
