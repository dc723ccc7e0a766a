use crate::config::FileCollisionAction;
use crate::error::{CodecError, Result};
use crate::types::FormatKind;
use crate::utils::get_unique_path;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Detect archive type by file extension
///
/// Total: any path without a recognised extension is [`FormatKind::Unknown`].
/// The content is never inspected.
pub fn detect_format_kind(path: &Path) -> FormatKind {
    path.extension()
        .and_then(|e| e.to_str())
        .map(FormatKind::from_extension)
        .unwrap_or(FormatKind::Unknown)
}

/// Check if a file is an archive the engine can decode, based on its extension
pub fn is_archive(path: &Path) -> bool {
    detect_format_kind(path).is_archive()
}

/// Immediate children of a directory, split into the parts the unwinder needs
#[derive(Debug, Default)]
pub struct DirectoryScan {
    /// Regular files with a decodable archive extension
    pub archives: Vec<PathBuf>,
    /// Subdirectories (symlinks are not followed)
    pub subdirs: Vec<PathBuf>,
}

/// List the immediate children of `dir`, sorted by name
pub fn scan_directory(dir: &Path) -> Result<DirectoryScan> {
    let entries = std::fs::read_dir(dir).map_err(|e| CodecError::directory_scan(dir, e))?;

    let mut scan = DirectoryScan::default();
    for entry in entries {
        let entry = entry.map_err(|e| CodecError::directory_scan(dir, e))?;
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        let path = entry.path();

        if file_type.is_dir() {
            scan.subdirs.push(path);
        } else if file_type.is_file() && is_archive(&path) {
            scan.archives.push(path);
        }
    }

    scan.archives.sort();
    scan.subdirs.sort();
    debug!(
        ?dir,
        archives = scan.archives.len(),
        subdirs = scan.subdirs.len(),
        "scanned directory"
    );
    Ok(scan)
}

/// Create a destination directory (and its parents)
pub(crate) fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| CodecError::directory_creation(path, e))?;
    Ok(())
}

/// Write one entry's bytes to `target`, resolving collisions first
///
/// Returns the path actually written and the number of bytes copied.
pub(crate) fn write_entry<R: Read + ?Sized>(
    reader: &mut R,
    target: &Path,
    collision: FileCollisionAction,
) -> Result<(PathBuf, u64)> {
    if let Some(parent) = target.parent() {
        create_dir(parent)?;
    }

    let target = get_unique_path(target, collision)?;

    let mut outfile = File::create(&target).map_err(|e| CodecError::io(&target, e))?;
    let size = io::copy(reader, &mut outfile).map_err(|e| CodecError::io(&target, e))?;

    Ok((target, size))
}

/// Restore the unix mode bits recorded in an archive; failures are logged, not fatal
#[cfg(unix)]
pub(crate) fn apply_unix_mode(path: &Path, mode: Option<u32>) {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777)) {
            warn!(?path, mode, error = %e, "failed to restore file permissions");
        }
    }
}

#[cfg(not(unix))]
pub(crate) fn apply_unix_mode(_path: &Path, _mode: Option<u32>) {}
