//! Core types for ez-unzip

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Codec family of an archive, derived from its file extension only
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// ZIP archive (.zip)
    Zip,
    /// Gzip stream (.gz)
    Gzip,
    /// Bzip2 stream (.bz2)
    Bzip2,
    /// XZ stream (.xz)
    Xz,
    /// Tar container (.tar)
    Tar,
    /// RAR archive (.rar)
    Rar,
    /// Anything else, including no extension
    Unknown,
}

impl FormatKind {
    /// Every decodable kind, in dispatch-table order
    pub const ARCHIVES: [FormatKind; 6] = [
        FormatKind::Zip,
        FormatKind::Gzip,
        FormatKind::Bzip2,
        FormatKind::Xz,
        FormatKind::Tar,
        FormatKind::Rar,
    ];

    /// Map an extension (without the dot, any case) to a kind
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "zip" => FormatKind::Zip,
            "gz" => FormatKind::Gzip,
            "bz2" => FormatKind::Bzip2,
            "xz" => FormatKind::Xz,
            "tar" => FormatKind::Tar,
            "rar" => FormatKind::Rar,
            _ => FormatKind::Unknown,
        }
    }

    /// Canonical extension, `None` for [`FormatKind::Unknown`]
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            FormatKind::Zip => Some("zip"),
            FormatKind::Gzip => Some("gz"),
            FormatKind::Bzip2 => Some("bz2"),
            FormatKind::Xz => Some("xz"),
            FormatKind::Tar => Some("tar"),
            FormatKind::Rar => Some("rar"),
            FormatKind::Unknown => None,
        }
    }

    /// Whether a decode adapter exists for this kind
    pub fn is_archive(&self) -> bool {
        !matches!(self, FormatKind::Unknown)
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormatKind::Zip => "ZIP",
            FormatKind::Gzip => "GZIP",
            FormatKind::Bzip2 => "BZIP2",
            FormatKind::Xz => "XZ",
            FormatKind::Tar => "TAR",
            FormatKind::Rar => "RAR",
            FormatKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Coarse state of one archive task
///
/// Moves `Idle -> Doing -> Done | Error`. `Done` and `Error` are terminal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum TaskState {
    /// No task has run yet
    #[default]
    Idle,
    /// A codec adapter is running
    Doing,
    /// Finished; the message names the produced path
    Done(String),
    /// Failed; the message describes the underlying failure
    Error(String),
}

impl TaskState {
    /// `Done` or `Error`
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done(_) | TaskState::Error(_))
    }

    /// Message carried by a terminal state
    pub fn message(&self) -> Option<&str> {
        match self {
            TaskState::Done(msg) | TaskState::Error(msg) => Some(msg),
            TaskState::Idle | TaskState::Doing => None,
        }
    }
}

/// Identifier of a task submitted to a [`TaskTracker`](crate::task::TaskTracker)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Get the inner value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage reported while a task runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// A codec adapter is extracting an archive
    Extract,
    /// Junk entries are being removed
    Clean,
    /// Nested archives are being searched for and expanded
    Unwind,
    /// A file or folder is being packed into a zip
    Compress,
}

/// Event emitted by the [`TaskTracker`](crate::task::TaskTracker)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task accepted
    Queued {
        /// Task ID
        id: TaskId,
        /// Input path handed to the engine
        input: PathBuf,
    },

    /// Archive extraction started (top-level or nested)
    Extracting {
        /// Task ID
        id: TaskId,
        /// Folder the archive is being extracted into
        path: PathBuf,
    },

    /// Junk cleanup started
    Cleaning {
        /// Task ID
        id: TaskId,
        /// Root of the tree being cleaned
        path: PathBuf,
    },

    /// Nested archive scan started
    Unwinding {
        /// Task ID
        id: TaskId,
        /// Root of the tree being scanned
        path: PathBuf,
    },

    /// Zip creation started
    Compressing {
        /// Task ID
        id: TaskId,
        /// File or folder being packed
        path: PathBuf,
    },

    /// Task finished successfully
    Done {
        /// Task ID
        id: TaskId,
        /// Completion message
        message: String,
    },

    /// Task failed
    Failed {
        /// Task ID
        id: TaskId,
        /// Error message
        error: String,
    },
}

/// Result of running one codec adapter
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Files written, in archive order
    pub files: Vec<PathBuf>,
    /// Total bytes written
    pub total_bytes: u64,
}

impl ExtractSummary {
    /// Record one written file
    pub fn push(&mut self, path: PathBuf, bytes: u64) {
        self.files.push(path);
        self.total_bytes += bytes;
    }
}
