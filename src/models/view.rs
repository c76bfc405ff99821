use std::path::PathBuf;

use super::task::ViewId;
use crate::migrations::matcher;

/// An open buffer in the host; tasks are keyed by its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub id: ViewId,
    pub file: Option<PathBuf>,
}

impl View {
    pub fn new(id: ViewId, file: Option<PathBuf>) -> Self {
        Self { id, file }
    }

    pub fn is_migration(&self) -> bool {
        self.file
            .as_deref()
            .is_some_and(matcher::is_migration_file)
    }

    /// Version of the migration shown in this view, if it is one.
    pub fn migration_version(&self) -> Option<String> {
        let file = self.file.as_deref()?;
        if !matcher::is_migration_file(file) {
            return None;
        }
        matcher::extract_version(file)
    }
}
