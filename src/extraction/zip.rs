use crate::config::{FileCollisionAction, ZipMethod};
use crate::error::{CodecError, Error, Result};
use crate::types::{ExtractSummary, FormatKind};
use crate::utils::get_unique_path;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::shared::{apply_unix_mode, create_dir, write_entry};
use super::traits::CodecAdapter;

/// Archive extractor for ZIP files, and the only archive writer
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        mut file: zip::read::ZipFile,
        dest_path: &Path,
        collision: FileCollisionAction,
    ) -> Result<Option<(PathBuf, u64)>> {
        let file_path = match file.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                warn!(entry = file.name(), "skipping entry with unsafe path");
                return Ok(None);
            }
        };

        if file.is_dir() {
            create_dir(&file_path)?;
            return Ok(None);
        }

        let mode = file.unix_mode();
        let (written, size) = write_entry(&mut file, &file_path, collision)?;
        apply_unix_mode(&written, mode);
        Ok(Some((written, size)))
    }

    /// Extract every entry of a ZIP archive into `dest_path`
    ///
    /// The archive's internal directory structure is preserved.
    pub fn try_extract(
        archive_path: &Path,
        dest_path: &Path,
        collision: FileCollisionAction,
    ) -> Result<ExtractSummary> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        create_dir(dest_path)?;

        let file = File::open(archive_path).map_err(|e| CodecError::io(archive_path, e))?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| CodecError::decode(archive_path, format!("failed to read ZIP archive: {}", e)))?;

        let mut summary = ExtractSummary::default();

        for i in 0..archive.len() {
            let file = archive.by_index(i).map_err(|e| {
                CodecError::decode(archive_path, format!("failed to read ZIP entry: {}", e))
            })?;

            if let Some((path, size)) = Self::extract_zip_entry(file, dest_path, collision)? {
                summary.push(path, size);
            }
        }

        info!(
            ?archive_path,
            extracted_count = summary.files.len(),
            total_bytes = summary.total_bytes,
            "ZIP extraction successful"
        );

        Ok(summary)
    }

    /// Pack a file or folder into `<output_dir>/<name>.zip`
    ///
    /// `input` becomes the single top-level entry of the archive: a file keeps
    /// its name, a folder keeps its name as the root of every entry path. The
    /// archive path is allocated with `collision` before anything is written.
    ///
    /// Returns the path of the created archive.
    pub fn compress(
        input: &Path,
        output_dir: &Path,
        collision: FileCollisionAction,
        method: ZipMethod,
    ) -> Result<PathBuf> {
        let file_name = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidPath {
                path: input.to_path_buf(),
                reason: "cannot extract file name".to_string(),
            })?;
        let base = input.parent().ok_or_else(|| Error::InvalidPath {
            path: input.to_path_buf(),
            reason: "cannot extract parent directory".to_string(),
        })?;

        if !input.exists() {
            return Err(CodecError::io(input, "input does not exist").into());
        }

        create_dir(output_dir)?;
        let zip_path = get_unique_path(&output_dir.join(format!("{}.zip", file_name)), collision)?;

        debug!(?input, ?zip_path, ?method, "attempting ZIP compression");

        let out = File::create(&zip_path).map_err(|e| CodecError::io(&zip_path, e))?;
        let mut writer = zip::ZipWriter::new(BufWriter::new(out));
        let options =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::from(method));

        let mut files_count = 0usize;
        for entry in WalkDir::new(input).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| CodecError::directory_scan(input, e))?;
            let path = entry.path();

            // Packing a folder into itself must not pick up the archive being written
            if path == zip_path {
                continue;
            }

            let rel = path
                .strip_prefix(base)
                .map_err(|e| CodecError::io(path, e))?;
            let mut name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let file_type = entry.file_type();
            if file_type.is_dir() {
                name.push('/');
                writer
                    .add_directory(name, options)
                    .map_err(|e| CodecError::io(&zip_path, e))?;
            } else if file_type.is_file() {
                let entry_options = Self::entry_options(options, path);
                writer
                    .start_file(name, entry_options)
                    .map_err(|e| CodecError::io(&zip_path, e))?;
                let mut src = File::open(path).map_err(|e| CodecError::io(path, e))?;
                io::copy(&mut src, &mut writer).map_err(|e| CodecError::io(&zip_path, e))?;
                files_count += 1;
            } else {
                debug!(?path, "skipping non-regular entry during compression");
            }
        }

        let mut out = writer
            .finish()
            .map_err(|e| CodecError::io(&zip_path, e))?;
        out.flush().map_err(|e| CodecError::io(&zip_path, e))?;

        info!(?input, ?zip_path, files_count, "ZIP compression successful");
        Ok(zip_path)
    }

    #[cfg(unix)]
    fn entry_options(options: zip::write::FileOptions, path: &Path) -> zip::write::FileOptions {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(path) {
            Ok(meta) => options.unix_permissions(meta.permissions().mode() & 0o7777),
            Err(_) => options,
        }
    }

    #[cfg(not(unix))]
    fn entry_options(options: zip::write::FileOptions, _path: &Path) -> zip::write::FileOptions {
        options
    }
}

impl CodecAdapter for ZipExtractor {
    fn kind(&self) -> FormatKind {
        FormatKind::Zip
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
        "zip"
    }
}
