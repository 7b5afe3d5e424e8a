use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use budget_tracker::cli;
use budget_tracker::config::{self, Args, Config};
use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal belongs to the UI: without a log file there is no logging.
    let Some(log_file) = log_dirs().into_iter().find_map(|dir| {
        fs::create_dir_all(&dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("budget.log"))
            .ok()
    }) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(false)
        .init();
}

fn log_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = config::config_dir().map(|d| d.join("logs")).into_iter().collect();
    dirs.push(PathBuf::from(".budget").join("logs"));
    dirs
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();
    let config = Config::load(&args)?;
    init_tracing(&config);

    cli::run(config).await
}
