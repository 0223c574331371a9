mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use std::process::ExitCode;

use tokengraph_core::GraphConfig;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path).map_err(|source| CliError::EnvFile {
                path: path.clone(),
                source,
            })?;
        }
        None => {
            // A missing ./.env is normal.
            dotenvy::dotenv().ok();
        }
    }

    logging::init(cli.log_format)?;
    let config = GraphConfig::from_env()?;

    commands::run(&cli, config).await?;
    Ok(ExitCode::SUCCESS)
}
