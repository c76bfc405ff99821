use std::{fmt, path::PathBuf};

use super::{matcher, project};
use crate::{
    error::{Error, Result},
    models::view::View,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Redo,
}

/// User-facing commands, as listed in the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MigrateAll,
    Migrate(Direction),
    OpenLatest,
}

/// A resolved `rails db:migrate` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationCommand {
    All,
    Step { direction: Direction, version: String },
}

/// Inline link shown under an open migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationLink {
    pub direction: Direction,
    pub version: String,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Up, Direction::Down, Direction::Redo];

    pub fn name(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Redo => "redo",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Redo => "Redo",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::MigrateAll,
        Action::Migrate(Direction::Up),
        Action::Migrate(Direction::Down),
        Action::Migrate(Direction::Redo),
        Action::OpenLatest,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Action::MigrateAll => "migrate",
            Action::Migrate(direction) => direction.name(),
            Action::OpenLatest => "latest",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Action::MigrateAll => "Rails Migration: Migrate All",
            Action::Migrate(Direction::Up) => "Rails Migration: Migrate Up",
            Action::Migrate(Direction::Down) => "Rails Migration: Migrate Down",
            Action::Migrate(Direction::Redo) => "Rails Migration: Migrate Redo",
            Action::OpenLatest => "Rails Migration: Open Latest Migration",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    /// Whether the palette should offer this action right now.
    pub fn is_enabled(&self, active: Option<&View>, folders: &[PathBuf]) -> bool {
        match self {
            Action::MigrateAll => true,
            Action::Migrate(_) => active.is_some_and(View::is_migration),
            Action::OpenLatest => project::find_project_root(folders).is_some(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl MigrationCommand {
    /// Resolves a step command against the migration shown in `view`.
    pub fn step(direction: Direction, view: &View) -> Result<Self> {
        let version = view.migration_version().ok_or_else(|| {
            Error::NotAMigrationFile(view.file.clone().unwrap_or_default())
        })?;
        Ok(MigrationCommand::Step { direction, version })
    }

    pub fn to_command_line(&self, rails: &str) -> String {
        match self {
            MigrationCommand::All => format!("{} db:migrate", rails),
            MigrationCommand::Step { direction, version } => {
                format!("{} db:migrate:{} VERSION={}", rails, direction.name(), version)
            }
        }
    }
}

impl MigrationLink {
    pub fn href(&self) -> String {
        format!("{}:{}", self.direction.name(), self.version)
    }

    pub fn label(&self) -> &'static str {
        self.direction.label()
    }

    pub fn parse(href: &str) -> Result<Self> {
        let unknown = || Error::UnknownLink(href.to_string());
        let (action, version) = href.split_once(':').ok_or_else(unknown)?;
        let direction = Direction::from_name(action).ok_or_else(unknown)?;
        if version.len() != 14 || !version.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unknown());
        }
        Ok(Self {
            direction,
            version: version.to_string(),
        })
    }
}

/// Links to attach to a view; empty unless it shows a migration file.
pub fn links_for(view: &View) -> Vec<MigrationLink> {
    let Some(file) = view.file.as_deref() else {
        return Vec::new();
    };
    if !matcher::is_migration_file(file) {
        return Vec::new();
    }
    match matcher::extract_version(file) {
        Some(version) => Direction::ALL
            .into_iter()
            .map(|direction| MigrationLink {
                direction,
                version: version.clone(),
            })
            .collect(),
        None => Vec::new(),
    }
}
