pub mod cli;
pub mod event_loop;
pub mod host;
pub mod plugin;
pub mod shell;
pub mod terminal;
