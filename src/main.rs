use std::env;
use std::process::ExitCode;

use clap::Parser;

use crate::cli::{main_cli, Args, CliError};

mod cli;
mod drivers;

fn main() -> ExitCode {
    let log_level = match env::var("LOG_LEVEL") {
        Ok(value) => value,
        Err(_) => "warn".to_string(),
    };
    env::set_var("RUST_LOG", log_level);
    env_logger::init();

    let args = Args::parse();
    match main_cli(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(err)) => err.exit(),
        Err(err) => {
            log::debug!("Command failed: {err:?}");
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
