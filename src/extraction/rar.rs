use crate::config::FileCollisionAction;
use crate::error::{CodecError, Error, Result};
use crate::types::{ExtractSummary, FormatKind};
use crate::utils::{get_unique_path, sanitize_entry_path};
use std::path::Path;
use tracing::{debug, info};

use super::shared::create_dir;
use super::traits::CodecAdapter;

/// Archive extractor for RAR files
pub struct RarExtractor;

impl RarExtractor {
    /// Convert an unrar error to our error type
    ///
    /// Encrypted archives are reported as unsupported rather than corrupt.
    fn convert_unrar_error(e: unrar::error::UnrarError, archive_path: &Path) -> Error {
        let err_str = e.to_string();
        if err_str.contains("password") || err_str.contains("encrypted") {
            Error::Codec(CodecError::UnsupportedFormat {
                archive: archive_path.to_path_buf(),
                reason: format!("password-protected RAR archives are not supported: {err_str}"),
            })
        } else {
            Error::Codec(CodecError::decode(archive_path, err_str))
        }
    }

    /// Extract all files of a RAR archive into `dest_path`
    pub fn try_extract(
        archive_path: &Path,
        dest_path: &Path,
        collision: FileCollisionAction,
    ) -> Result<ExtractSummary> {
        debug!(?archive_path, ?dest_path, "attempting RAR extraction");

        create_dir(dest_path)?;

        let processor = unrar::Archive::new(archive_path)
            .open_for_processing()
            .map_err(|e| Self::convert_unrar_error(e, archive_path))?;

        let mut summary = ExtractSummary::default();

        // Process each entry using the state machine interface
        let mut at_header = processor;
        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(entry_processor)) => entry_processor,
                Ok(None) => break,
                Err(e) => return Err(Self::convert_unrar_error(e, archive_path)),
            };

            let header = at_file.entry();

            let Some(rel) = sanitize_entry_path(Path::new(&header.filename)) else {
                at_header = at_file
                    .skip()
                    .map_err(|e| CodecError::decode(archive_path, format!("failed to skip unsafe entry: {e}")))?;
                continue;
            };

            if header.is_directory() {
                create_dir(&dest_path.join(&rel))?;
                at_header = at_file
                    .skip()
                    .map_err(|e| CodecError::decode(archive_path, format!("failed to skip directory: {e}")))?;
                continue;
            }

            let target = dest_path.join(&rel);
            if let Some(parent) = target.parent() {
                create_dir(parent)?;
            }
            let target = get_unique_path(&target, collision)?;

            at_header = at_file
                .extract_to(&target)
                .map_err(|e| Self::convert_unrar_error(e, archive_path))?;

            let size = std::fs::metadata(&target).map(|m| m.len()).unwrap_or(0);
            summary.push(target, size);
        }

        info!(
            ?archive_path,
            extracted_count = summary.files.len(),
            total_bytes = summary.total_bytes,
            "RAR extraction successful"
        );

        Ok(summary)
    }
}

impl CodecAdapter for RarExtractor {
    fn kind(&self) -> FormatKind {
        FormatKind::Rar
    }

    fn extract(
        &self,
        archive_path: &Path,
        dest_path: &Path,
        collision: FileCollisionAction,
    ) -> Result<ExtractSummary> {
        Self::try_extract(archive_path, dest_path, collision)
    }

    fn name(&self) -> &'static str {
        "rar"
    }
}
