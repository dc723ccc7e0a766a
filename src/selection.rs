//! Host "active selection" capability
//!
//! A host file browser knows which item the user has selected. The engine
//! only needs that one path, so the integration is a single-method trait.

use std::path::PathBuf;

/// Something that can report the currently selected file or folder
pub trait ActiveSelectionProvider: Send + Sync {
    /// The selected path, `None` when nothing is selected
    fn selected_path(&self) -> Option<PathBuf>;
}

/// Provider that always reports the same selection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedSelection(pub Option<PathBuf>);

impl FixedSelection {
    /// Selection of `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    /// Nothing selected
    pub fn none() -> Self {
        Self(None)
    }
}

impl ActiveSelectionProvider for FixedSelection {
    fn selected_path(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

impl<F> ActiveSelectionProvider for F
where
    F: Fn() -> Option<PathBuf> + Send + Sync,
{
    fn selected_path(&self) -> Option<PathBuf> {
        self()
    }
}
