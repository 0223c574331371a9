//! One refresh cycle: universe, histories, correlation graph.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::GraphConfig;
use crate::data_source::{DataSourceClient, SourceError};
use crate::graph::{CorrelationGraphBuilder, EdgeMode, Graph};
use crate::history::PriceHistory;
use crate::universe::TokenUniverse;
use crate::{CoreError, SampleInterval, Unit};

/// Cycle parameters taken from [`GraphConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub token_count: usize,
    pub interval: SampleInterval,
    pub samples: usize,
    /// Histories fetched at once; `1` fetches sequentially.
    pub fetch_concurrency: usize,
    pub edge_mode: EdgeMode,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&GraphConfig::default())
    }
}

impl From<&GraphConfig> for PipelineSettings {
    fn from(config: &GraphConfig) -> Self {
        Self {
            token_count: config.token_count,
            interval: config.interval,
            samples: config.samples,
            fetch_concurrency: config.fetch_concurrency,
            edge_mode: config.edge_mode,
        }
    }
}

/// A universe member that did not make it into the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedToken {
    pub unit: Unit,
    pub ticker: String,
    pub code: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerCollision {
    pub ticker: String,
    pub units: Vec<Unit>,
}

/// Everything one cycle produced.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub generated_at: OffsetDateTime,
    pub universe_size: usize,
    pub graph: Graph,
    pub skipped: Vec<SkippedToken>,
    pub ticker_collisions: Vec<TickerCollision>,
}

/// Machine-readable digest of a [`CycleReport`], without the graph body.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary<'a> {
    pub cycle_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub universe_size: usize,
    pub nodes: usize,
    pub links: usize,
    pub skipped: &'a [SkippedToken],
    pub ticker_collisions: &'a [TickerCollision],
}

impl CycleReport {
    pub fn summary(&self) -> CycleSummary<'_> {
        CycleSummary {
            cycle_id: self.cycle_id,
            generated_at: self.generated_at,
            universe_size: self.universe_size,
            nodes: self.graph.nodes.len(),
            links: self.graph.edges.len(),
            skipped: &self.skipped,
            ticker_collisions: &self.ticker_collisions,
        }
    }
}

#[derive(Clone)]
pub struct Pipeline {
    client: Arc<dyn DataSourceClient>,
    settings: PipelineSettings,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(client: Arc<dyn DataSourceClient>, settings: PipelineSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Builds a fresh graph.
    ///
    /// # Errors
    ///
    /// Only universe failures are fatal: a token whose history cannot be
    /// fetched or yields no usable returns is listed in
    /// [`CycleReport::skipped`] and the cycle carries on without it.
    pub async fn run_cycle(&self) -> Result<CycleReport, CoreError> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("cycle", cycle_id = %cycle_id);
        self.run_cycle_with_id(cycle_id).instrument(span).await
    }

    async fn run_cycle_with_id(&self, cycle_id: Uuid) -> Result<CycleReport, CoreError> {
        info!(
            tokens = self.settings.token_count,
            interval = %self.settings.interval,
            samples = self.settings.samples,
            "cycle started"
        );

        let universe = TokenUniverse::fetch(self.client.as_ref(), self.settings.token_count)
            .await
            .inspect_err(|err| error!(error = %err, code = err.code(), "universe refresh failed"))?;

        let mut histories = self.fetch_histories(&universe).await;

        let mut builder = CorrelationGraphBuilder::new(self.settings.edge_mode);
        let mut skipped = Vec::new();
        for token in universe.tokens() {
            let outcome = histories
                .remove(&token.unit)
                .unwrap_or_else(|| {
                    Err(SourceError::internal("history fetch task did not complete").into())
                })
                .and_then(|history| {
                    let returns = history.log_returns();
                    if returns.skipped_points() > 0 {
                        debug!(
                            unit = %token.unit,
                            skipped_points = returns.skipped_points(),
                            "log-returns skipped for non-positive midpoints"
                        );
                    }
                    builder.add(token.clone(), returns)
                });

            if let Err(err) = outcome {
                warn!(
                    unit = %token.unit,
                    ticker = %token.ticker,
                    code = err.code(),
                    error = %err,
                    "token skipped for this cycle"
                );
                skipped.push(SkippedToken {
                    unit: token.unit.clone(),
                    ticker: token.ticker.clone(),
                    code: err.code(),
                    reason: err.to_string(),
                });
            }
        }

        let graph = builder.build();
        let ticker_collisions = universe
            .ticker_collisions()
            .into_iter()
            .map(|(ticker, units)| TickerCollision { ticker, units })
            .collect();

        info!(
            nodes = graph.nodes.len(),
            links = graph.edges.len(),
            skipped = skipped.len(),
            "cycle finished"
        );

        Ok(CycleReport {
            cycle_id,
            generated_at: OffsetDateTime::now_utc(),
            universe_size: universe.len(),
            graph,
            skipped,
            ticker_collisions,
        })
    }

    async fn fetch_histories(
        &self,
        universe: &TokenUniverse,
    ) -> BTreeMap<Unit, Result<PriceHistory, CoreError>> {
        let PipelineSettings {
            interval,
            samples,
            fetch_concurrency,
            ..
        } = self.settings;

        let mut results = BTreeMap::new();
        if fetch_concurrency <= 1 {
            for unit in universe.units() {
                let history =
                    PriceHistory::fetch(self.client.as_ref(), &unit, interval, samples).await;
                results.insert(unit, history);
            }
            return results;
        }

        let permits = Arc::new(Semaphore::new(fetch_concurrency));
        let mut tasks = JoinSet::new();
        for unit in universe.units() {
            let client = Arc::clone(&self.client);
            let permits = Arc::clone(&permits);
            tasks.spawn(
                async move {
                    let history = match permits.acquire_owned().await {
                        Ok(_permit) => {
                            PriceHistory::fetch(client.as_ref(), &unit, interval, samples).await
                        }
                        Err(_) => Err(SourceError::internal("history fetch limiter closed").into()),
                    };
                    (unit, history)
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((unit, history)) => {
                    results.insert(unit, history);
                }
                Err(err) => error!(error = %err, "history fetch task failed"),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let config = GraphConfig {
            token_count: 7,
            samples: 12,
            fetch_concurrency: 3,
            edge_mode: EdgeMode::Directed,
            ..GraphConfig::default()
        };

        let settings = PipelineSettings::from(&config);

        assert_eq!(settings.token_count, 7);
        assert_eq!(settings.samples, 12);
        assert_eq!(settings.fetch_concurrency, 3);
        assert_eq!(settings.edge_mode, EdgeMode::Directed);
        assert_eq!(settings.interval, SampleInterval::TwelveHours);
    }
}
