//! Liquidity-ranked token universe.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::data_source::{ApiEndpoint, DataSourceClient, QueryParams, SourceError};
use crate::{CoreError, Token, Unit, ValidationError};

/// Snapshot of the top-N tokens by liquidity, keyed by [`Unit`].
///
/// Built by [`TokenUniverse::fetch`]; [`TokenUniverse::refresh`] swaps the
/// snapshot only once a new one has been fully decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenUniverse {
    tokens: BTreeMap<Unit, Token>,
    rejected_rows: usize,
}

#[derive(Debug, Deserialize)]
struct TopLiquidityRow {
    unit: String,
    #[serde(default)]
    ticker: Option<String>,
    price: Option<f64>,
    liquidity: Option<f64>,
}

impl TokenUniverse {
    /// Fetches the `limit` most liquid tokens.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ZeroTokenCount`] when `limit == 0`; no request is made.
    /// - [`CoreError::DataSource`] on transport, status, or payload failure.
    pub async fn fetch(client: &dyn DataSourceClient, limit: usize) -> Result<Self, CoreError> {
        if limit == 0 {
            return Err(ValidationError::ZeroTokenCount.into());
        }

        let params = QueryParams::new().with("page", 1).with("perPage", limit);
        let body = client.get(ApiEndpoint::TopLiquidity, params).await?;
        let universe = Self::from_payload(body)?;

        info!(
            tokens = universe.len(),
            requested = limit,
            rejected = universe.rejected_rows,
            "token universe fetched"
        );
        for (ticker, units) in universe.ticker_collisions() {
            warn!(
                ticker = %ticker,
                units = ?units.iter().map(Unit::as_str).collect::<Vec<_>>(),
                "ticker shared by several units; units stay distinct"
            );
        }

        Ok(universe)
    }

    /// Replaces this snapshot with a freshly fetched one. On error the current
    /// snapshot is left untouched.
    pub async fn refresh(
        &mut self,
        client: &dyn DataSourceClient,
        limit: usize,
    ) -> Result<(), CoreError> {
        let next = Self::fetch(client, limit).await?;
        *self = next;
        Ok(())
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut map = BTreeMap::new();
        for token in tokens {
            map.entry(token.unit.clone()).or_insert(token);
        }
        Self {
            tokens: map,
            rejected_rows: 0,
        }
    }

    fn from_payload(body: Value) -> Result<Self, SourceError> {
        let Value::Array(rows) = body else {
            return Err(SourceError::malformed_response(
                "token/top/liquidity response must be a JSON array",
            ));
        };

        let mut tokens: BTreeMap<Unit, Token> = BTreeMap::new();
        let mut rejected_rows = 0;

        for (rank, row) in rows.into_iter().enumerate() {
            match decode_row(row) {
                Ok(token) => {
                    if tokens.contains_key(&token.unit) {
                        // Rows arrive ranked, so the first occurrence wins.
                        debug!(unit = %token.unit, rank, "duplicate unit in liquidity ranking");
                        rejected_rows += 1;
                    } else {
                        tokens.insert(token.unit.clone(), token);
                    }
                }
                Err(reason) => {
                    warn!(rank, reason = %reason, "dropping invalid liquidity row");
                    rejected_rows += 1;
                }
            }
        }

        Ok(Self {
            tokens,
            rejected_rows,
        })
    }

    pub fn token(&self, unit: &str) -> Result<&Token, CoreError> {
        self.tokens
            .get(unit)
            .ok_or_else(|| CoreError::not_found(unit))
    }

    pub fn ticker(&self, unit: &str) -> Result<&str, CoreError> {
        self.token(unit).map(|token| token.ticker.as_str())
    }

    pub fn price(&self, unit: &str) -> Result<f64, CoreError> {
        self.token(unit).map(|token| token.price)
    }

    pub fn liquidity(&self, unit: &str) -> Result<f64, CoreError> {
        self.token(unit).map(|token| token.liquidity)
    }

    /// All units, sorted by id.
    pub fn units(&self) -> Vec<Unit> {
        self.tokens.keys().cloned().collect()
    }

    /// Tokens in unit order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Rows dropped while decoding the last payload.
    pub fn rejected_rows(&self) -> usize {
        self.rejected_rows
    }

    /// Tickers carried by more than one unit, sorted by ticker.
    pub fn ticker_collisions(&self) -> Vec<(String, Vec<Unit>)> {
        let mut by_ticker: BTreeMap<&str, Vec<Unit>> = BTreeMap::new();
        for token in self.tokens.values() {
            by_ticker
                .entry(token.ticker.as_str())
                .or_default()
                .push(token.unit.clone());
        }

        by_ticker
            .into_iter()
            .filter(|(_, units)| units.len() > 1)
            .map(|(ticker, units)| (ticker.to_owned(), units))
            .collect()
    }
}

fn decode_row(row: Value) -> Result<Token, String> {
    let row: TopLiquidityRow = serde_json::from_value(row).map_err(|e| e.to_string())?;
    let unit = Unit::parse(&row.unit).map_err(|e| e.to_string())?;
    let price = row.price.ok_or_else(|| String::from("missing price"))?;
    let liquidity = row.liquidity.ok_or_else(|| String::from("missing liquidity"))?;
    let ticker = row.ticker.unwrap_or_default();

    Token::new(unit, ticker, price, liquidity).map_err(|e| e.to_string())
}
