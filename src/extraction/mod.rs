//! Archive codec adapters
//!
//! One adapter per [`FormatKind`]: ZIP, RAR and tar containers, plus the
//! gzip, bzip2 and xz single-stream decoders. ZIP is also the only format the
//! engine writes. Adapters are looked up through a [`CodecRegistry`] so hosts
//! can swap one out.

mod rar;
mod shared;
mod stream;
mod tar;
mod traits;
mod zip;


// Re-exports
pub use rar::RarExtractor;
pub use shared::{DirectoryScan, detect_format_kind, is_archive, scan_directory};
pub use stream::StreamExtractor;
pub use tar::TarExtractor;
pub use traits::CodecAdapter;
pub use zip::ZipExtractor;

pub(crate) use shared::create_dir;

use crate::config::FileCollisionAction;
use crate::error::{CodecError, Result};
use crate::types::{ExtractSummary, FormatKind};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Lookup table from [`FormatKind`] to the adapter that decodes it
#[derive(Clone)]
pub struct CodecRegistry {
    adapters: HashMap<FormatKind, Arc<dyn CodecAdapter>>,
}

impl CodecRegistry {
    /// Registry with no adapters
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Install `adapter` for its kind, returning the adapter it replaced
    pub fn register(&mut self, adapter: Arc<dyn CodecAdapter>) -> Option<Arc<dyn CodecAdapter>> {
        self.adapters.insert(adapter.kind(), adapter)
    }

    /// Adapter for `kind`, if one is installed
    pub fn get(&self, kind: FormatKind) -> Option<&Arc<dyn CodecAdapter>> {
        self.adapters.get(&kind)
    }

    /// Route an extraction to the adapter for `kind`
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedFormat`] when no adapter is installed for
    /// `kind` (always the case for [`FormatKind::Unknown`]), otherwise whatever
    /// the adapter reports.
    pub fn extract(
        &self,
        kind: FormatKind,
        archive_path: &Path,
        dest_path: &Path,
        collision: FileCollisionAction,
    ) -> Result<ExtractSummary> {
        let adapter = self.get(kind).ok_or_else(|| CodecError::UnsupportedFormat {
            archive: archive_path.to_path_buf(),
            reason: format!("no codec adapter for {kind}"),
        })?;

        info!(
            ?archive_path,
            ?dest_path,
            %kind,
            adapter = adapter.name(),
            "dispatching extraction to codec adapter"
        );

        adapter.extract(archive_path, dest_path, collision)
    }
}

impl Default for CodecRegistry {
    /// Registry with every built-in adapter installed
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ZipExtractor));
        registry.register(Arc::new(StreamExtractor::GZIP));
        registry.register(Arc::new(StreamExtractor::BZIP2));
        registry.register(Arc::new(StreamExtractor::XZ));
        registry.register(Arc::new(TarExtractor));
        registry.register(Arc::new(RarExtractor));
        registry
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.adapters.keys().map(|k| k.to_string()).collect();
        kinds.sort();
        f.debug_struct("CodecRegistry").field("adapters", &kinds).finish()
    }
}

/// Unified archive extraction dispatcher
///
/// Detects the archive type from the extension and routes to the built-in
/// adapter. Unlike the engine entry points, an unknown extension is an error
/// here rather than a fallback to compression.
///
/// # Example
/// ```no_run
/// use ez_unzip::extraction::extract_archive;
/// use ez_unzip::config::FileCollisionAction;
/// use std::path::Path;
///
/// let summary = extract_archive(
///     Path::new("movie.rar"),
///     Path::new("/tmp/extract"),
///     FileCollisionAction::Rename,
/// )?;
/// println!("Extracted {} files", summary.files.len());
/// # Ok::<(), ez_unzip::Error>(())
/// ```
pub fn extract_archive(
    archive_path: &Path,
    dest_path: &Path,
    collision: FileCollisionAction,
) -> Result<ExtractSummary> {
    let kind = detect_format_kind(archive_path);
    CodecRegistry::default().extract(kind, archive_path, dest_path, collision)
}
