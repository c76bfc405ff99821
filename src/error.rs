use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No file open.")]
    NoActiveView,

    #[error("Could not find Rails project root.")]
    NoProjectRoot,

    #[error("Migration directory not found.")]
    MigrationDirMissing,

    #[error("No migration files found.")]
    NoMigrations,

    #[error("{} is not a migration file", .0.display())]
    NotAMigrationFile(PathBuf),

    #[error("unknown migration link '{0}'")]
    UnknownLink(String),

    #[error("failed to {operation} {}: {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

impl Error {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
