use crate::config::FileCollisionAction;
use crate::error::{CodecError, Result};
use crate::types::{ExtractSummary, FormatKind};
use crate::utils::sanitize_entry_path;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use super::shared::{apply_unix_mode, create_dir, write_entry};
use super::traits::CodecAdapter;

/// Archive extractor for plain tar containers
pub struct TarExtractor;

impl TarExtractor {
    /// Extract every regular file and directory of a tar container
    ///
    /// Entry paths are kept relative to `dest_path`. Links and special files
    /// are skipped.
    pub fn try_extract(
        archive_path: &Path,
        dest_path: &Path,
        collision: FileCollisionAction,
    ) -> Result<ExtractSummary> {
        debug!(?archive_path, ?dest_path, "attempting TAR extraction");

        create_dir(dest_path)?;

        let file = File::open(archive_path).map_err(|e| CodecError::io(archive_path, e))?;
        let mut archive = tar::Archive::new(BufReader::new(file));

        let mut summary = ExtractSummary::default();

        let entries = archive
            .entries()
            .map_err(|e| CodecError::decode(archive_path, e))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| CodecError::decode(archive_path, e))?;
            let entry_path = entry
                .path()
                .map_err(|e| CodecError::decode(archive_path, e))?
                .into_owned();

            let Some(rel) = sanitize_entry_path(&entry_path) else {
                debug!(?entry_path, "skipping entry with unsafe path");
                continue;
            };
            let target = dest_path.join(rel);

            let entry_type = entry.header().entry_type();
            if entry_type.is_dir() {
                create_dir(&target)?;
            } else if entry_type.is_file() {
                let mode = entry.header().mode().ok();
                let (written, size) = write_entry(&mut entry, &target, collision)?;
                apply_unix_mode(&written, mode);
                summary.push(written, size);
            } else {
                debug!(?entry_path, ?entry_type, "skipping non-regular tar entry");
            }
        }

        info!(
            ?archive_path,
            extracted_count = summary.files.len(),
            total_bytes = summary.total_bytes,
            "TAR extraction successful"
        );

        Ok(summary)
    }
}

impl CodecAdapter for TarExtractor {
    fn kind(&self) -> FormatKind {
        FormatKind::Tar
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
        "tar"
    }
}
