use std::path::{Path, PathBuf};

use crate::{
    migrations::actions::MigrationLink,
    models::{task::ViewId, view::View},
};

/// The surfaces the surrounding editor or terminal provides.
pub trait Host {
    /// Open project folders, in priority order.
    fn folders(&self) -> Vec<PathBuf>;

    fn active_view(&self) -> Option<View>;

    /// Blocking notice for aborted operations.
    fn message_dialog(&mut self, message: &str);

    /// Appends a block of text to the output panel and reveals it.
    fn show_output(&mut self, text: &str);

    /// Overwrites the status entry `key` of `view`.
    fn set_status(&mut self, view: ViewId, key: &str, text: &str);

    /// Replaces the inline links of `view`; an empty slice clears them.
    fn show_links(&mut self, view: ViewId, links: &[MigrationLink]);

    fn open_file(&mut self, path: &Path);
}
