mod history;
mod once;
mod run;
mod tokens;

use std::sync::Arc;

use tokengraph_core::{
    read_api_key, DataSourceClient, GraphConfig, HttpDataSource, Pipeline, PipelineSettings,
    ReqwestHttpClient,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli, config: GraphConfig) -> Result<(), CliError> {
    match &cli.command {
        Command::Run(args) => run::run(args, config).await,
        Command::Once(args) => once::run(args, config).await,
        Command::Tokens(args) => tokens::run(args, config).await,
        Command::History(args) => history::run(args, config).await,
    }
}

/// Authenticated production data source for `config`.
fn data_source(config: &GraphConfig) -> Result<Arc<dyn DataSourceClient>, CliError> {
    let api_key = read_api_key(&config.api_key_file)?;
    let http = ReqwestHttpClient::new()?;
    let source = HttpDataSource::new(Arc::new(http), api_key, config.source.clone())?;
    Ok(Arc::new(source))
}

fn pipeline(config: &GraphConfig) -> Result<Pipeline, CliError> {
    config.validate()?;
    Ok(Pipeline::new(data_source(config)?, PipelineSettings::from(config)))
}
