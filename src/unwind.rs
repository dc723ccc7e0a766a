//! Expansion of archives found inside an already-extracted folder
//!
//! Works from an explicit queue of `(directory, depth)` items instead of
//! recursing, so stack use does not grow with archive nesting. Plain
//! subdirectories keep their parent's depth; the folder produced by a nested
//! archive is one level deeper.

use crate::engine::{Engine, StageObserver};
use crate::error::Result;
use crate::extraction::{detect_format_kind, scan_directory};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One nested archive that was expanded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedExtraction {
    /// The archive that was found
    pub archive: PathBuf,
    /// Folder it was expanded into
    pub destination: PathBuf,
    /// Nesting depth of `destination` (1 = archive inside the top-level result)
    pub depth: u32,
    /// Number of files the adapter wrote
    pub files: usize,
}

/// One nested archive that could not be expanded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedFailure {
    /// The archive (or directory) that failed
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// What an unwinding pass did
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnwindReport {
    /// Nested archives expanded, in processing order
    pub expanded: Vec<NestedExtraction>,
    /// Nested archives or subdirectories that failed; the outer task still succeeds
    pub failed: Vec<NestedFailure>,
    /// Archives left alone because they sit deeper than the configured limit
    pub depth_limited: Vec<PathBuf>,
}

/// Which archives below the root an unwinding pass may expand and delete
#[derive(Debug, Clone, Copy)]
pub(crate) enum Scope<'a> {
    /// Every archive found below the root
    All,
    /// Only files written by the current invocation; `input` is never touched
    Produced {
        /// The archive the invocation started from
        input: &'a Path,
        /// Files the top-level adapter wrote
        files: &'a [PathBuf],
    },
}

fn path_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Find and expand every nested archive below `root`
///
/// Each archive is extracted into a uniquely named sibling folder, junk
/// cleaned, and deleted afterwards when configured. An archive is expanded at
/// most once per pass (visited set of canonical paths), and nothing deeper
/// than `max_recursion_depth` is expanded. With [`Scope::Produced`], archives
/// that were already on disk before the invocation are left alone even when
/// `Overwrite` reused a populated folder.
///
/// # Errors
///
/// Only a failure to list `root` itself is returned. Failures further down
/// are recorded in [`UnwindReport::failed`].
pub(crate) fn unwind(
    engine: &Engine,
    root: &Path,
    scope: Scope<'_>,
    observer: &StageObserver<'_>,
) -> Result<UnwindReport> {
    let extraction = &engine.config().extraction;
    let max_depth = extraction.max_recursion_depth;
    let mut report = UnwindReport::default();

    if max_depth == 0 {
        debug!(?root, "unwinding disabled (max_recursion_depth = 0)");
        return Ok(report);
    }

    let mut queue: VecDeque<(PathBuf, u32)> = VecDeque::from([(root.to_path_buf(), 0)]);
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut produced: Option<HashSet<PathBuf>> = match scope {
        Scope::All => None,
        Scope::Produced { input, files } => {
            visited.insert(path_key(input));
            Some(files.iter().map(|f| path_key(f)).collect())
        }
    };

    while let Some((dir, depth)) = queue.pop_front() {
        let scan = match scan_directory(&dir) {
            Ok(scan) => scan,
            // The root must be readable; anything below only degrades the report
            Err(e) if dir == root => return Err(e),
            Err(e) => {
                warn!(?dir, error = %e, "failed to scan directory while unwinding");
                report.failed.push(NestedFailure {
                    path: dir,
                    error: e.to_string(),
                });
                continue;
            }
        };

        queue.extend(scan.subdirs.into_iter().map(|sub| (sub, depth)));

        for archive in scan.archives {
            let key = path_key(&archive);
            if produced.as_ref().is_some_and(|set| !set.contains(&key)) {
                debug!(?archive, "archive predates this run, leaving it alone");
                continue;
            }
            if !visited.insert(key) {
                continue;
            }

            if depth >= max_depth {
                warn!(
                    ?archive,
                    depth,
                    max_depth,
                    "reached maximum recursion depth, not extracting nested archive"
                );
                report.depth_limited.push(archive);
                continue;
            }

            info!(?archive, depth, "found nested archive, extracting");

            let kind = detect_format_kind(&archive);
            match engine.expand(kind, &archive, &dir, observer) {
                Ok((destination, summary)) => {
                    if let Some(set) = produced.as_mut() {
                        set.extend(summary.files.iter().map(|f| path_key(f)));
                    }
                    if extraction.delete_nested_archives {
                        if let Err(e) = std::fs::remove_file(&archive) {
                            warn!(?archive, error = %e, "failed to delete expanded nested archive");
                        }
                    }
                    report.expanded.push(NestedExtraction {
                        archive,
                        destination: destination.clone(),
                        depth: depth + 1,
                        files: summary.files.len(),
                    });
                    queue.push_back((destination, depth + 1));
                }
                Err(e) => {
                    // One bad nested archive does not fail the whole task
                    warn!(
                        ?archive,
                        error = %e,
                        "failed to extract nested archive, continuing with other files"
                    );
                    report.failed.push(NestedFailure {
                        path: archive,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    info!(
        ?root,
        expanded = report.expanded.len(),
        failed = report.failed.len(),
        depth_limited = report.depth_limited.len(),
        "unwinding complete"
    );

    Ok(report)
}
