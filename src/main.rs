#![allow(non_snake_case)]

use std::env;
use std::process::ExitCode;

use bookingBot::cli;
use bookingBot::config::{AppConfig, Settings};
use bookingBot::logging;
use bookingBot::runtime;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match env::var("CONFIG_FILE") {
        Ok(path) => match AppConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Ignoring config file {}: {}", path, e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    };

    let get_prop = |key: &str| -> Option<String> { config.get(key).or_else(|| env::var(key).ok()) };

    let settings = match Settings::from_lookup(get_prop) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init_logger(settings.log_format);

    let result = match settings.run_mode.as_str() {
        "api" => runtime::run_api(settings).await,
        "discord" => runtime::run_discord(settings).await,
        "cli" => cli::cli(settings).await,
        other => {
            eprintln!("Invalid run mode {}", other);
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}
