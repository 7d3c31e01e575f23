//! Logger setup for the binary.
//!
//! Always writes to `./receipt_sorter.log` in the current working directory.
//! With `-v` the same records also go to the terminal (stderr).

use std::fs::File;
use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use sorter_logging::level_for_verbosity;

pub const LOG_FILE: &str = "./receipt_sorter.log";

pub fn initialize(verbosity: u8) {
    let config = build_config();
    let level = level_for_verbosity(verbosity);

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if let Some(file_logger) = create_file_logger(level, config.clone()) {
        loggers.push(file_logger);
    }
    if verbosity > 0 {
        loggers.push(TermLogger::new(
            level,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("rustls")
        .build()
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    let log_path = PathBuf::from(LOG_FILE);
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}
