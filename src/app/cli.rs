use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::{ArgAction, Parser, Subcommand};
use log::debug;

use super::{
    plugin::MigrationBoy,
    shell,
    terminal::{Mode, TerminalHost},
};
use crate::{
    config::{Config, DEFAULT_RAILS},
    error::Result,
    migrations::actions::{Action, Direction},
    models::result::CommandResult,
    status::animator::DEFAULT_LABEL,
    worker::worker::{Launcher, ShellLauncher},
};

#[derive(Debug, Parser)]
#[command(
    name = "rails-migration-boy",
    version,
    about = "Run Rails migrations with a live status line"
)]
pub struct Cli {
    /// Project folder to look for db/migrate in (repeatable, first match wins)
    #[arg(long = "folder", value_name = "DIR", global = true)]
    pub folders: Vec<PathBuf>,

    /// Rails executable used to build the db:migrate command lines
    #[arg(long, env = "RAILS_MIGRATION_BOY_RAILS", default_value = DEFAULT_RAILS, global = true)]
    pub rails: String,

    /// Shell the command line is handed to, e.g. "bash -lc"
    #[arg(long, env = "RAILS_MIGRATION_BOY_SHELL", value_parser = parse_shell, global = true)]
    pub shell: Option<ShellLauncher>,

    /// Prefix of the status line
    #[arg(long, default_value = DEFAULT_LABEL, global = true)]
    pub label: String,

    /// Spinner refresh interval in milliseconds
    #[arg(long, default_value_t = 100, global = true)]
    pub tick_ms: u64,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// rails db:migrate
    Migrate,
    /// rails db:migrate:up for one migration file
    Up { file: PathBuf },
    /// rails db:migrate:down for one migration file
    Down { file: PathBuf },
    /// rails db:migrate:redo for one migration file
    Redo { file: PathBuf },
    /// Print the path of the newest migration
    Latest,
    /// Interactive shell (default)
    Shell,
}

fn parse_shell(invocation: &str) -> std::result::Result<ShellLauncher, String> {
    ShellLauncher::parse(invocation).ok_or_else(|| "shell must name a program".to_string())
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::from_cli(&cli)?;
    let launcher: Arc<dyn Launcher> = Arc::new(config.shell.clone());

    match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            let host = TerminalHost::new(config.folders.clone(), Mode::Interactive);
            shell::run_shell(MigrationBoy::new(host, config, launcher))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Migrate => Ok(one_shot(config, launcher, None, Action::MigrateAll)),
        Command::Up { file } => Ok(one_shot(
            config,
            launcher,
            Some(file),
            Action::Migrate(Direction::Up),
        )),
        Command::Down { file } => Ok(one_shot(
            config,
            launcher,
            Some(file),
            Action::Migrate(Direction::Down),
        )),
        Command::Redo { file } => Ok(one_shot(
            config,
            launcher,
            Some(file),
            Action::Migrate(Direction::Redo),
        )),
        Command::Latest => Ok(one_shot(config, launcher, None, Action::OpenLatest)),
    }
}

fn one_shot(
    config: Config,
    launcher: Arc<dyn Launcher>,
    file: Option<PathBuf>,
    action: Action,
) -> ExitCode {
    let mut host = TerminalHost::new(config.folders.clone(), Mode::OneShot);
    host.open(file);
    let mut boy = MigrationBoy::new(host, config, launcher);

    if let Err(e) = boy.run(action) {
        debug!("{} aborted: {}", action.title(), e);
        return ExitCode::FAILURE;
    }
    let results = boy.run_until_idle();
    boy.host_mut().finish_status_line();

    if results.iter().all(CommandResult::success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
