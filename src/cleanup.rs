//! Removal of platform metadata entries (`__MACOSX`, `.DS_Store`, ...)
//! from extracted trees

use crate::config::CleanupConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of one cleanup pass
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Junk files and folders that were deleted
    pub removed: Vec<PathBuf>,
    /// Number of directories that could not be read or entries that could
    /// not be deleted
    pub failures: usize,
}

/// Deletes junk entries wherever they appear under a root
#[derive(Debug, Clone)]
pub struct JunkFilter {
    names: Vec<String>,
}

impl JunkFilter {
    /// Filter matching exactly the given entry names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter built from the cleanup config
    pub fn from_config(config: &CleanupConfig) -> Self {
        Self::new(config.junk_names.iter().cloned())
    }

    /// Whether an entry name is junk (exact, case-sensitive match)
    pub fn is_junk(&self, name: &str) -> bool {
        self.names.iter().any(|junk| junk == name)
    }

    /// Remove every junk entry below `root`
    ///
    /// Walks depth-first through the whole tree. A junk folder is deleted
    /// with all its content and not descended into. Read and delete failures
    /// are logged and counted but never stop the walk. Running it twice
    /// removes nothing the second time. `root` itself is never removed.
    pub fn clean(&self, root: &Path) -> CleanReport {
        debug!(?root, "cleaning junk entries");

        let mut report = CleanReport::default();

        if std::fs::symlink_metadata(root).is_err() {
            debug!(?root, "cleanup root does not exist, skipping");
            return report;
        }

        self.clean_dir(root, &mut report);

        info!(
            ?root,
            removed = report.removed.len(),
            failures = report.failures,
            "junk cleanup complete"
        );
        report
    }

    fn clean_dir(&self, dir: &Path, report: &mut CleanReport) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(?dir, error = %e, "failed to read directory during cleanup");
                report.failures += 1;
                return;
            }
        };

        let mut children: Vec<_> = entries.filter_map(|entry| entry.ok()).collect();
        children.sort_by_key(|entry| entry.file_name());

        for entry in children {
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    warn!(?path, error = %e, "failed to stat entry during cleanup");
                    report.failures += 1;
                    continue;
                }
            };

            let is_junk = entry.file_name().to_str().is_some_and(|n| self.is_junk(n));

            if is_junk {
                let result = if file_type.is_dir() {
                    std::fs::remove_dir_all(&path)
                } else {
                    std::fs::remove_file(&path)
                };
                match result {
                    Ok(()) => {
                        debug!(?path, "deleted junk entry");
                        report.removed.push(path);
                    }
                    Err(e) => {
                        warn!(?path, error = %e, "failed to delete junk entry");
                        report.failures += 1;
                    }
                }
            } else if file_type.is_dir() {
                self.clean_dir(&path, report);
            }
        }
    }
}

impl Default for JunkFilter {
    fn default() -> Self {
        Self::from_config(&CleanupConfig::default())
    }
}
