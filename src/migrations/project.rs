use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;

use super::matcher;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub path: PathBuf,
    pub version: String,
}

pub fn migrations_dir(root: &Path) -> PathBuf {
    root.join("db").join("migrate")
}

/// First candidate, in order, that holds a `db/migrate` directory.
pub fn find_project_root<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|candidate| candidate.as_ref())
        .find(|root| migrations_dir(root).is_dir())
        .map(Path::to_path_buf)
}

/// Migration files under `<root>/db/migrate`, ordered by version.
pub fn list_migrations(root: &Path) -> Result<Vec<Migration>> {
    let dir = migrations_dir(root);
    if !dir.is_dir() {
        debug!("{} is not a directory", dir.display());
        return Err(Error::MigrationDirMissing);
    }

    let entries = fs::read_dir(&dir).map_err(|e| Error::io("read", &dir, e))?;
    let mut migrations = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io("read", &dir, e))?.path();
        if !matcher::is_migration_file(&path) {
            continue;
        }
        if let Some(version) = matcher::extract_version(&path) {
            migrations.push(Migration { path, version });
        }
    }
    migrations.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.path.cmp(&b.path)));
    debug!("Found {} migrations in {}", migrations.len(), dir.display());
    Ok(migrations)
}

/// 14-digit versions order the same lexicographically and numerically.
pub fn latest_migration(migrations: &[Migration]) -> Option<&Migration> {
    migrations.iter().max_by(|a, b| a.version.cmp(&b.version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rails_project(files: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let migrate = migrations_dir(dir.path());
        fs::create_dir_all(&migrate).unwrap();
        for file in files {
            fs::write(migrate.join(file), "class Foo < ActiveRecord::Migration[7.1]; end\n").unwrap();
        }
        dir
    }

    #[test]
    fn no_candidates_means_no_root() {
        let empty: [PathBuf; 0] = [];
        assert_eq!(find_project_root(&empty), None);
    }

    #[test]
    fn finds_root_with_migration_dir() {
        let project = rails_project(&[]);
        assert_eq!(
            find_project_root(&[project.path()]),
            Some(project.path().to_path_buf())
        );
    }

    #[test]
    fn rejects_root_without_migration_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_project_root(&[dir.path()]), None);
    }

    #[test]
    fn first_qualifying_candidate_wins() {
        let plain = tempfile::tempdir().unwrap();
        let first = rails_project(&[]);
        let second = rails_project(&[]);
        let candidates = [plain.path(), first.path(), second.path()];

        assert_eq!(
            find_project_root(&candidates),
            Some(first.path().to_path_buf())
        );
    }

    #[test]
    fn latest_migration_picks_greatest_version() {
        let project = rails_project(&[
            "20230101000000_create_users.rb",
            "20230102000000_add_email.rb",
            "20221231000000_create_posts.rb",
            "README.md",
            "schema_notes.rb",
        ]);

        let migrations = list_migrations(project.path()).unwrap();
        assert_eq!(migrations.len(), 3);

        let latest = latest_migration(&migrations).unwrap();
        assert_eq!(latest.version, "20230102000000");
        assert!(latest.path.ends_with("20230102000000_add_email.rb"));
    }

    #[test]
    fn missing_migration_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_migrations(dir.path()),
            Err(Error::MigrationDirMissing)
        ));
    }

    #[test]
    fn empty_listing_has_no_latest() {
        assert_eq!(latest_migration(&[]), None);
    }
}
