//! Single-stream decoders: gzip, bzip2 and xz
//!
//! These formats carry exactly one unnamed payload. The whole input is
//! decoded in memory and written as one file named after the archive with
//! its last extension removed (`notes.txt.gz` -> `notes.txt`).

use crate::config::FileCollisionAction;
use crate::error::{CodecError, Error, Result};
use crate::types::{ExtractSummary, FormatKind};
use crate::utils::archive_stem;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::shared::{create_dir, write_entry};
use super::traits::CodecAdapter;

/// Decoder for one of the single-stream compression formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamExtractor {
    kind: FormatKind,
}

impl StreamExtractor {
    /// Gzip (.gz) decoder
    pub const GZIP: Self = Self {
        kind: FormatKind::Gzip,
    };
    /// Bzip2 (.bz2) decoder
    pub const BZIP2: Self = Self {
        kind: FormatKind::Bzip2,
    };
    /// XZ (.xz) decoder
    pub const XZ: Self = Self {
        kind: FormatKind::Xz,
    };

    /// Decoder for `kind`, `None` unless it is a single-stream format
    pub fn for_kind(kind: FormatKind) -> Option<Self> {
        match kind {
            FormatKind::Gzip | FormatKind::Bzip2 | FormatKind::Xz => Some(Self { kind }),
            _ => None,
        }
    }

    /// Decode a whole compressed buffer
    pub fn decode(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self.kind {
            FormatKind::Gzip => {
                flate2::read::MultiGzDecoder::new(data).read_to_end(&mut out)?;
            }
            FormatKind::Bzip2 => {
                bzip2::read::MultiBzDecoder::new(data).read_to_end(&mut out)?;
            }
            FormatKind::Xz => {
                xz2::read::XzDecoder::new_multi_decoder(data).read_to_end(&mut out)?;
            }
            other => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    format!("{other} is not a single-stream format"),
                ));
            }
        }
        Ok(out)
    }

    /// Decode `archive_path` and write its payload into `dest_path`
    pub fn try_extract(
        &self,
        archive_path: &Path,
        dest_path: &Path,
        collision: FileCollisionAction,
    ) -> Result<ExtractSummary> {
        debug!(?archive_path, ?dest_path, kind = %self.kind, "attempting stream decode");

        if Self::for_kind(self.kind).is_none() {
            return Err(Error::Codec(CodecError::UnsupportedFormat {
                archive: archive_path.to_path_buf(),
                reason: format!("{} is not a single-stream format", self.kind),
            }));
        }

        create_dir(dest_path)?;

        let data = std::fs::read(archive_path).map_err(|e| CodecError::io(archive_path, e))?;
        let decoded = self
            .decode(&data)
            .map_err(|e| CodecError::decode(archive_path, e))?;

        let target = dest_path.join(archive_stem(archive_path)?);
        let (written, size) = write_entry(&mut decoded.as_slice(), &target, collision)?;

        info!(
            ?archive_path,
            output = ?written,
            compressed_bytes = data.len(),
            total_bytes = size,
            "{} decode successful",
            self.kind
        );

        let mut summary = ExtractSummary::default();
        summary.push(written, size);
        Ok(summary)
    }
}

impl CodecAdapter for StreamExtractor {
    fn kind(&self) -> FormatKind {
        self.kind
    }

    fn extract(
        &self,
        archive_path: &Path,
        dest_path: &Path,
        collision: FileCollisionAction,
    ) -> Result<ExtractSummary> {
        self.try_extract(archive_path, dest_path, collision)
    }

    fn name(&self) -> &'static str {
        match self.kind {
            FormatKind::Gzip => "gzip",
            FormatKind::Bzip2 => "bzip2",
            FormatKind::Xz => "xz",
            _ => "stream",
        }
    }
}
