mod app;
mod config;
mod error;
mod manager;
mod migrations;
mod models;
mod status;
mod worker;

use std::process::ExitCode;

use app::cli::{self, Cli};
use clap::Parser;
use env_logger::Env;
use log::error;

fn main() -> ExitCode {
    let args = Cli::parse();
    init_logging(args.verbose);

    match cli::run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
