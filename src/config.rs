use std::{env, path::PathBuf, time::Duration};

use crate::{
    app::cli::Cli,
    error::{Error, Result},
    status::animator::{DEFAULT_LABEL, DEFAULT_TICK, STATUS_KEY},
    worker::worker::ShellLauncher,
};

pub const DEFAULT_RAILS: &str = "rails";

#[derive(Debug, Clone)]
pub struct Config {
    /// Candidate project roots, first match wins.
    pub folders: Vec<PathBuf>,
    pub rails: String,
    pub shell: ShellLauncher,
    pub label: String,
    pub status_key: String,
    pub tick_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            rails: DEFAULT_RAILS.to_string(),
            shell: ShellLauncher::default(),
            label: DEFAULT_LABEL.to_string(),
            status_key: STATUS_KEY.to_string(),
            tick_interval: DEFAULT_TICK,
        }
    }
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let folders = if cli.folders.is_empty() {
            let cwd = env::current_dir().map_err(|e| Error::io("resolve", ".", e))?;
            vec![cwd]
        } else {
            cli.folders.clone()
        };

        Ok(Self {
            folders,
            rails: cli.rails.clone(),
            shell: cli.shell.clone().unwrap_or_default(),
            label: cli.label.clone(),
            status_key: STATUS_KEY.to_string(),
            tick_interval: Duration::from_millis(cli.tick_ms.max(1)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_follow_rails_conventions() {
        let cli = Cli::parse_from(["rails-migration-boy", "--folder", "/srv/app", "migrate"]);
        let config = Config::from_cli(&cli).unwrap();

        assert_eq!(config.folders, [PathBuf::from("/srv/app")]);
        assert_eq!(config.rails, "rails");
        assert_eq!(config.label, "Rails Migration");
        assert_eq!(config.tick_interval, Duration::from_millis(100));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "rails-migration-boy",
            "--folder",
            "/a",
            "--folder",
            "/b",
            "--rails",
            "bin/rails",
            "--shell",
            "bash -lc",
            "--tick-ms",
            "250",
            "latest",
        ]);
        let config = Config::from_cli(&cli).unwrap();

        assert_eq!(config.folders, [PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(config.rails, "bin/rails");
        assert_eq!(config.shell, ShellLauncher::parse("bash -lc").unwrap());
        assert_eq!(config.tick_interval, Duration::from_millis(250));
    }

    #[test]
    fn no_folder_means_current_directory() {
        let cli = Cli::parse_from(["rails-migration-boy"]);
        let config = Config::from_cli(&cli).unwrap();
        assert_eq!(config.folders, [env::current_dir().unwrap()]);
    }
}
