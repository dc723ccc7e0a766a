//! Capability interface implemented by every codec adapter

use crate::config::FileCollisionAction;
use crate::types::{ExtractSummary, FormatKind};
use std::path::Path;

/// Trait for archive codec adapters
///
/// One adapter handles one [`FormatKind`]. Adapters are blocking and hold no
/// per-call state, so a single instance can be shared across threads.
///
/// # Examples
///
/// ```no_run
/// use ez_unzip::config::FileCollisionAction;
/// use ez_unzip::extraction::{CodecAdapter, ZipExtractor};
/// use std::path::Path;
///
/// let summary = ZipExtractor
///     .extract(
///         Path::new("report.zip"),
///         Path::new("/tmp/report"),
///         FileCollisionAction::Rename,
///     )
///     .expect("extraction failed");
/// println!("wrote {} files", summary.files.len());
/// ```
pub trait CodecAdapter: Send + Sync {
    /// The format this adapter decodes
    fn kind(&self) -> FormatKind;

    /// Extract `archive_path` into the existing directory `dest_path`
    ///
    /// Every file written goes through
    /// [`get_unique_path`](crate::utils::get_unique_path) with `collision`.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`](crate::error::CodecError) when the archive is
    /// missing or corrupt, uses a feature the codec does not support, or an
    /// output file cannot be written.
    fn extract(
        &self,
        archive_path: &Path,
        dest_path: &Path,
        collision: FileCollisionAction,
    ) -> crate::Result<ExtractSummary>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
