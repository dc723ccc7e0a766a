//! Dispatch entry points
//!
//! [`Engine`] ties the pieces together: the input's [`FormatKind`] picks a
//! codec adapter, the destination folder is allocated next to the output,
//! junk is removed, and nested archives are unwound. The plain entry points
//! always return a terminal [`TaskState`]; the `try_*` variants expose the
//! typed error and the full [`Outcome`].

use crate::cleanup::JunkFilter;
use crate::config::Config;
use crate::error::{CodecError, Result};
use crate::extraction::{CodecRegistry, ZipExtractor, create_dir, detect_format_kind};
use crate::selection::ActiveSelectionProvider;
use crate::task::TaskStateMachine;
use crate::types::{ExtractSummary, FormatKind, Stage, TaskState};
use crate::unwind::{self, Scope, UnwindReport};
use crate::utils::{destination_candidate, get_unique_path};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

/// Callback told about each stage as the engine enters it
///
/// The path is the folder being extracted into, cleaned or unwound, or the
/// input being compressed.
pub type StageObserver<'a> = dyn Fn(Stage, &Path) + 'a;

/// What a successful invocation produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An archive was expanded into `destination`
    Extracted {
        /// Format of the top-level input
        kind: FormatKind,
        /// Folder the input was expanded into
        destination: PathBuf,
        /// Files written by the top-level adapter
        summary: ExtractSummary,
        /// Nested archives found below `destination`
        unwind: UnwindReport,
    },
    /// The input was packed into `archive`
    Compressed {
        /// The created zip
        archive: PathBuf,
    },
}

impl Outcome {
    /// Path the invocation produced
    pub fn path(&self) -> &Path {
        match self {
            Outcome::Extracted { destination, .. } => destination,
            Outcome::Compressed { archive } => archive,
        }
    }

    /// Human-readable completion message, as carried by [`TaskState::Done`]
    pub fn message(&self) -> String {
        match self {
            Outcome::Extracted {
                kind,
                destination,
                unwind,
                ..
            } => {
                let mut message = format!("Decompressed {kind} to {}", destination.display());
                if !unwind.failed.is_empty() {
                    message.push_str(&format!(
                        " ({} nested archive(s) could not be expanded)",
                        unwind.failed.len()
                    ));
                }
                message
            }
            Outcome::Compressed { archive } => format!("Compressed to {}", archive.display()),
        }
    }
}

/// The archive processing engine
///
/// Synchronous: every call blocks on filesystem and codec work. Run it on a
/// blocking thread, or go through [`TaskTracker`](crate::task::TaskTracker).
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    codecs: CodecRegistry,
    junk: JunkFilter,
}

impl Engine {
    /// Engine with every built-in codec adapter
    pub fn new(config: Config) -> Self {
        Self::with_codecs(config, CodecRegistry::default())
    }

    /// Engine using a custom adapter registry
    pub fn with_codecs(config: Config, codecs: CodecRegistry) -> Self {
        let junk = JunkFilter::from_config(&config.cleanup);
        Self {
            config,
            codecs,
            junk,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Installed codec adapters
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Decode `input` into a new folder inside `output`
    ///
    /// Inputs with an unrecognised extension are packed into a zip instead,
    /// exactly as [`Engine::compress`] would. Never panics or returns an
    /// error: every failure ends up in [`TaskState::Error`].
    pub fn decompress_file(&self, input: &Path, output: &Path) -> TaskState {
        self.decompress_with(input, output, &|_, _| {})
    }

    /// Like [`Engine::decompress_file`], returning the typed result
    ///
    /// # Errors
    ///
    /// Any allocation, codec or directory failure of the top-level input.
    /// Nested archive failures are reported in [`Outcome::Extracted`].
    pub fn try_decompress_file(&self, input: &Path, output: &Path) -> Result<Outcome> {
        self.decompress_observed(input, output, &|_, _| {})
    }

    /// Pack `input` (file or folder) into a uniquely named zip inside `output`
    pub fn compress(&self, input: &Path, output: &Path) -> TaskState {
        self.compress_with(input, output, &|_, _| {})
    }

    /// Like [`Engine::compress`], returning the typed result
    ///
    /// # Errors
    ///
    /// Missing input, allocation failure, or any write error.
    pub fn try_compress(&self, input: &Path, output: &Path) -> Result<Outcome> {
        self.compress_observed(input, output, &|_, _| {})
    }

    /// Expand every nested archive below an already-extracted folder
    ///
    /// # Errors
    ///
    /// Only when `root` itself cannot be listed.
    pub fn unwind(&self, root: &Path) -> Result<UnwindReport> {
        unwind::unwind(self, root, Scope::All, &|_, _| {})
    }

    /// Decompress whatever the host currently has selected
    ///
    /// The result lands next to the selected file. Returns `None` when
    /// nothing is selected.
    pub fn decompress_selection(&self, selection: &dyn ActiveSelectionProvider) -> Option<TaskState> {
        let (input, output) = Self::selection_paths(selection)?;
        Some(self.decompress_file(&input, &output))
    }

    /// Compress whatever the host currently has selected
    ///
    /// The zip lands next to the selected file or folder. Returns `None` when
    /// nothing is selected.
    pub fn compress_selection(&self, selection: &dyn ActiveSelectionProvider) -> Option<TaskState> {
        let (input, output) = Self::selection_paths(selection)?;
        Some(self.compress(&input, &output))
    }

    fn selection_paths(selection: &dyn ActiveSelectionProvider) -> Option<(PathBuf, PathBuf)> {
        let Some(input) = selection.selected_path() else {
            debug!("no active selection, nothing to do");
            return None;
        };
        let Some(output) = input.parent().map(Path::to_path_buf) else {
            warn!(?input, "selected path has no parent directory");
            return None;
        };
        Some((input, output))
    }

    /// Run a decompression through a fresh [`TaskStateMachine`]
    pub(crate) fn decompress_with(
        &self,
        input: &Path,
        output: &Path,
        observer: &StageObserver<'_>,
    ) -> TaskState {
        if detect_format_kind(input) == FormatKind::Unknown {
            debug!(?input, "no decoder for extension, compressing instead");
            return self.compress_with(input, output, observer);
        }

        let mut task = TaskStateMachine::new();
        task.start();
        match self.decompress_observed(input, output, observer) {
            Ok(outcome) => task.complete(outcome.message()),
            Err(e) => {
                warn!(?input, error = %e, "decompression failed");
                task.fail(format!("Decompression failed: {e}"))
            }
        };
        task.into_state()
    }

    /// Run a compression through a fresh [`TaskStateMachine`]
    pub(crate) fn compress_with(
        &self,
        input: &Path,
        output: &Path,
        observer: &StageObserver<'_>,
    ) -> TaskState {
        let mut task = TaskStateMachine::new();
        task.start();
        match self.compress_observed(input, output, observer) {
            Ok(outcome) => task.complete(outcome.message()),
            Err(e) => {
                warn!(?input, error = %e, "compression failed");
                task.fail(format!("Compression failed: {e}"))
            }
        };
        task.into_state()
    }

    pub(crate) fn decompress_observed(
        &self,
        input: &Path,
        output: &Path,
        observer: &StageObserver<'_>,
    ) -> Result<Outcome> {
        let kind = detect_format_kind(input);
        if kind == FormatKind::Unknown {
            return self.compress_observed(input, output, observer);
        }

        if !input.is_file() {
            return Err(CodecError::io(input, "input archive does not exist").into());
        }

        info!(?input, ?output, %kind, "decompressing");

        let (destination, summary) = self.expand(kind, input, output, observer)?;

        observer(Stage::Unwind, &destination);
        let scope = Scope::Produced {
            input,
            files: &summary.files,
        };
        let unwind = unwind::unwind(self, &destination, scope, observer)?;

        info!(
            ?input,
            ?destination,
            files = summary.files.len(),
            nested = unwind.expanded.len(),
            "decompression complete"
        );

        Ok(Outcome::Extracted {
            kind,
            destination,
            summary,
            unwind,
        })
    }

    pub(crate) fn compress_observed(
        &self,
        input: &Path,
        output: &Path,
        observer: &StageObserver<'_>,
    ) -> Result<Outcome> {
        info!(?input, ?output, "compressing");
        observer(Stage::Compress, input);

        let archive = ZipExtractor::compress(
            input,
            output,
            self.config.extraction.file_collision,
            self.config.compression.method,
        )?;

        Ok(Outcome::Compressed { archive })
    }

    /// Extract one archive into a freshly allocated folder inside `parent`
    ///
    /// Shared by the top-level entry point and the unwinder. Returns the
    /// folder and what the adapter wrote.
    pub(crate) fn expand(
        &self,
        kind: FormatKind,
        archive: &Path,
        parent: &Path,
        observer: &StageObserver<'_>,
    ) -> Result<(PathBuf, ExtractSummary)> {
        let collision = self.config.extraction.file_collision;
        let candidate = destination_candidate(archive, parent)?;
        let destination = get_unique_path(&candidate, collision)?;

        observer(Stage::Extract, &destination);
        create_dir(&destination)?;
        let summary = self.codecs.extract(kind, archive, &destination, collision)?;

        if self.config.cleanup.enabled {
            observer(Stage::Clean, &destination);
            let report = self.junk.clean(&destination);
            if report.failures > 0 {
                warn!(?destination, failures = report.failures, "junk cleanup left entries behind");
            }
        }

        Ok((destination, summary))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
