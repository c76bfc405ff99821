use std::{
    collections::{BTreeMap, HashMap},
    io::{self, IsTerminal, Write},
    path::{Path, PathBuf},
};

use crossterm::{
    cursor, queue,
    style::{Print, PrintStyledContent, Stylize},
    terminal::{self, ClearType},
};
use log::warn;

use super::host::Host;
use crate::{
    migrations::actions::MigrationLink,
    models::{task::ViewId, view::View},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Raw-mode shell: the status is drawn on the prompt line.
    Interactive,
    /// Single command: the spinner is drawn on stderr when it is a terminal.
    OneShot,
}

/// Host backed by the terminal: views are opened by path, the output panel is
/// stdout and the status line is redrawn in place.
pub struct TerminalHost {
    folders: Vec<PathBuf>,
    views: BTreeMap<ViewId, View>,
    active: Option<ViewId>,
    next_id: ViewId,
    statuses: HashMap<ViewId, String>,
    mode: Mode,
    dirty: bool,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    animate: bool,
}

impl TerminalHost {
    pub fn new(folders: Vec<PathBuf>, mode: Mode) -> Self {
        let animate = io::stderr().is_terminal();
        Self::with_writers(folders, mode, Box::new(io::stdout()), Box::new(io::stderr()), animate)
    }

    pub fn with_writers(
        folders: Vec<PathBuf>,
        mode: Mode,
        out: Box<dyn Write>,
        err: Box<dyn Write>,
        animate: bool,
    ) -> Self {
        Self {
            folders,
            views: BTreeMap::new(),
            active: None,
            next_id: 0,
            statuses: HashMap::new(),
            mode,
            dirty: true,
            out,
            err,
            animate,
        }
    }

    /// Opens `file` (or a scratch view for `None`) and makes it active. A file
    /// that is already open is focused instead of opened twice.
    pub fn open(&mut self, file: Option<PathBuf>) -> View {
        if let Some(path) = file.as_ref() {
            if let Some(existing) = self.views.values().find(|v| v.file.as_ref() == Some(path)) {
                let existing = existing.clone();
                self.active = Some(existing.id);
                self.dirty = true;
                return existing;
            }
        }
        self.next_id += 1;
        let view = View::new(self.next_id, file);
        self.views.insert(view.id, view.clone());
        self.active = Some(view.id);
        self.dirty = true;
        view
    }

    pub fn switch(&mut self, id: ViewId) -> Option<View> {
        let view = self.views.get(&id)?.clone();
        self.active = Some(id);
        self.dirty = true;
        Some(view)
    }

    /// Closes a view; the most recently opened remaining view becomes active.
    pub fn close(&mut self, id: ViewId) -> Option<View> {
        let view = self.views.remove(&id)?;
        self.statuses.remove(&id);
        if self.active == Some(id) {
            self.active = self.views.keys().next_back().copied();
        }
        self.dirty = true;
        Some(view)
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn active_id(&self) -> Option<ViewId> {
        self.active
    }

    pub fn active_status(&self) -> Option<&str> {
        self.statuses.get(&self.active?).map(String::as_str)
    }

    /// True once after anything that needs the prompt line redrawn.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Redraws the prompt line with the active view's status in front of it.
    pub fn draw_prompt(&mut self, input: &str) -> io::Result<()> {
        queue!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine)
        )?;
        if let Some(status) = self.active_status().map(str::to_string) {
            queue!(self.out, PrintStyledContent(format!("[{}] ", status).dark_grey()))?;
        }
        queue!(self.out, Print(">>> "), Print(input))?;
        self.out.flush()
    }

    /// Ends the one-shot spinner line so the shell prompt starts clean.
    pub fn finish_status_line(&mut self) {
        if self.mode == Mode::OneShot && self.animate && !self.statuses.is_empty() {
            if let Err(e) = writeln!(self.err) {
                warn!("Failed to end status line: {}", e);
            }
        }
    }

    /// Prints a block of text above the prompt.
    pub fn print_block(&mut self, text: &str) {
        if let Err(e) = self.write_block(text) {
            warn!("Failed to write to terminal: {}", e);
        }
        self.dirty = true;
    }

    fn write_block(&mut self, text: &str) -> io::Result<()> {
        match self.mode {
            Mode::Interactive => {
                queue!(
                    self.out,
                    cursor::MoveToColumn(0),
                    terminal::Clear(ClearType::CurrentLine),
                    Print(text.replace('\n', "\r\n")),
                    Print("\r\n")
                )?;
            }
            Mode::OneShot => {
                if self.animate {
                    queue!(
                        self.err,
                        cursor::MoveToColumn(0),
                        terminal::Clear(ClearType::CurrentLine)
                    )?;
                    self.err.flush()?;
                }
                writeln!(self.out, "{}", text)?;
            }
        }
        self.out.flush()
    }

    fn write_status(&mut self, text: &str) -> io::Result<()> {
        if self.mode != Mode::OneShot || !self.animate {
            return Ok(());
        }
        queue!(
            self.err,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            PrintStyledContent(text.to_string().cyan())
        )?;
        self.err.flush()
    }
}

impl Host for TerminalHost {
    fn folders(&self) -> Vec<PathBuf> {
        self.folders.clone()
    }

    fn active_view(&self) -> Option<View> {
        self.views.get(&self.active?).cloned()
    }

    fn message_dialog(&mut self, message: &str) {
        match self.mode {
            Mode::Interactive => {
                let notice = format!("! {}", message).yellow().to_string();
                self.print_block(&notice);
            }
            Mode::OneShot => {
                if let Err(e) = writeln!(self.err, "{}", message) {
                    warn!("Failed to write to terminal: {}", e);
                }
            }
        }
    }

    fn show_output(&mut self, text: &str) {
        self.print_block(text);
    }

    fn set_status(&mut self, view: ViewId, _key: &str, text: &str) {
        self.statuses.insert(view, text.to_string());
        if self.active == Some(view) {
            self.dirty = true;
        }
        if let Err(e) = self.write_status(text) {
            warn!("Failed to draw status line: {}", e);
        }
    }

    fn show_links(&mut self, view: ViewId, links: &[MigrationLink]) {
        if self.mode != Mode::Interactive || links.is_empty() {
            return;
        }
        let rendered: Vec<String> = links
            .iter()
            .map(|link| format!("{} (link {})", link.label(), link.href()))
            .collect();
        self.print_block(&format!("[{}] {}", view, rendered.join("   ").cyan()));
    }

    fn open_file(&mut self, path: &Path) {
        let view = self.open(Some(path.to_path_buf()));
        if self.mode == Mode::Interactive {
            self.print_block(&format!("Opened [{}] {}", view.id, path.display()));
        } else {
            self.print_block(&path.display().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> TerminalHost {
        TerminalHost::with_writers(
            vec![PathBuf::from("/srv/app")],
            Mode::Interactive,
            Box::new(io::sink()),
            Box::new(io::sink()),
            false,
        )
    }

    #[test]
    fn reopening_a_file_focuses_existing_view() {
        let mut host = host();
        let first = host.open(Some(PathBuf::from("/srv/app/Gemfile")));
        host.open(None);
        let again = host.open(Some(PathBuf::from("/srv/app/Gemfile")));

        assert_eq!(first.id, again.id);
        assert_eq!(host.views().count(), 2);
        assert_eq!(host.active_id(), Some(first.id));
    }

    #[test]
    fn closing_active_view_focuses_latest_remaining() {
        let mut host = host();
        let a = host.open(None);
        let b = host.open(None);
        let c = host.open(None);

        host.switch(c.id);
        assert!(host.close(c.id).is_some());
        assert_eq!(host.active_id(), Some(b.id));
        host.close(b.id);
        host.close(a.id);
        assert_eq!(host.active_view(), None);
        assert!(host.close(a.id).is_none());
    }

    #[test]
    fn status_belongs_to_its_view() {
        let mut host = host();
        let a = host.open(None);
        let b = host.open(None);

        host.set_status(a.id, "rails_migration_boy", "Rails Migration: rails db:migrate ⠙");
        assert_eq!(host.active_status(), None);
        host.switch(a.id);
        assert_eq!(host.active_status(), Some("Rails Migration: rails db:migrate ⠙"));

        host.close(a.id);
        host.switch(b.id);
        assert!(host.take_dirty());
        assert!(!host.take_dirty());
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn write_failures_are_logged_not_raised() {
        let mut host = TerminalHost::with_writers(
            Vec::new(),
            Mode::OneShot,
            Box::new(Broken),
            Box::new(Broken),
            true,
        );
        let view = host.open(None);

        host.set_status(view.id, "rails_migration_boy", "Rails Migration: rails db:migrate ⠋");
        host.show_output("Command: rails db:migrate");
        host.message_dialog("No file open.");
        host.finish_status_line();

        assert_eq!(
            host.statuses.get(&view.id).map(String::as_str),
            Some("Rails Migration: rails db:migrate ⠋")
        );
    }
}
