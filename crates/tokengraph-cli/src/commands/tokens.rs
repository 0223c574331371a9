use serde::Serialize;
use tokengraph_core::{GraphConfig, Token, TokenUniverse, Unit};

use crate::cli::TokensArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokensResponse<'a> {
    tokens: Vec<&'a Token>,
    rejected_rows: usize,
    ticker_collisions: Vec<Collision>,
}

#[derive(Debug, Serialize)]
struct Collision {
    ticker: String,
    units: Vec<Unit>,
}

pub async fn run(args: &TokensArgs, config: GraphConfig) -> Result<(), CliError> {
    let limit = args.limit.unwrap_or(config.token_count);
    let source = super::data_source(&config)?;

    let universe = TokenUniverse::fetch(source.as_ref(), limit).await?;
    let response = TokensResponse {
        tokens: universe.tokens().collect(),
        rejected_rows: universe.rejected_rows(),
        ticker_collisions: universe
            .ticker_collisions()
            .into_iter()
            .map(|(ticker, units)| Collision { ticker, units })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
