use std::io::{BufWriter, Write, stdout};
use std::process::ExitCode;

use clap::Parser;
use debt_ledger::{
    app::{self, Cli},
    common::config::Config,
};
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::WARN)
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let stdout = stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = app::run(cli, config, &mut out).await;
    if let Err(e) = out.flush() {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
