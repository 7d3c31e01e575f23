mod app;
mod cli;
mod config;
mod console;
mod effects;
mod logging;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match app::run(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("receipt-sorter: {err:#}");
            ExitCode::FAILURE
        }
    }
}
