//! # ez-unzip
//!
//! Archive processing engine: unpacks and packs archives dropped or selected
//! by a user.
//!
//! ## Design Philosophy
//!
//! ez-unzip is designed to be:
//! - **Non-destructive** - Existing files and folders are never overwritten by default
//! - **Format-agnostic** - ZIP, RAR, tar, gzip, bzip2 and xz behind one entry point
//! - **Library-first** - No UI, hotkeys or settings store, purely a Rust crate for embedding
//! - **Event-driven** - Async hosts subscribe to task events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use ez_unzip::{Config, Engine, TaskState};
//! use std::path::Path;
//!
//! let engine = Engine::new(Config::default());
//!
//! match engine.decompress_file(Path::new("report.zip"), Path::new("/tmp/out")) {
//!     TaskState::Done(message) => println!("{message}"),
//!     TaskState::Error(message) => eprintln!("{message}"),
//!     _ => unreachable!("entry points always return a terminal state"),
//! }
//! ```
//!
//! Async hosts go through [`TaskTracker`]:
//!
//! ```no_run
//! use ez_unzip::{Engine, TaskTracker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tracker = TaskTracker::new(Engine::default());
//!
//!     let mut events = tracker.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = tracker.decompress_file("report.zip", "/tmp/out").await;
//!     println!("{:?}", report.state);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Junk entry removal
pub mod cleanup;
/// Configuration types
pub mod config;
/// Dispatch entry points
pub mod engine;
/// Error types
pub mod error;
/// Archive codec adapters
pub mod extraction;
/// Host selection capability
pub mod selection;
/// Task state model and async tracking
pub mod task;
/// Core types
pub mod types;
/// Nested archive expansion
pub mod unwind;
/// Path helpers and destination allocation
pub mod utils;

// Re-export commonly used types
pub use cleanup::{CleanReport, JunkFilter};
pub use config::{CleanupConfig, CompressionConfig, Config, ExtractionConfig, FileCollisionAction, ZipMethod};
pub use engine::{Engine, Outcome};
pub use error::{CodecError, Error, Result};
pub use extraction::{CodecAdapter, CodecRegistry, detect_format_kind, extract_archive};
pub use selection::{ActiveSelectionProvider, FixedSelection};
pub use task::{TaskHandle, TaskReport, TaskStateMachine, TaskTracker};
pub use types::{Event, ExtractSummary, FormatKind, Stage, TaskId, TaskState};
pub use unwind::{NestedExtraction, NestedFailure, UnwindReport};
pub use utils::{get_unique_path, last_destination};
