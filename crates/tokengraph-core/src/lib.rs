//! # Tokengraph Core
//!
//! Correlation graph pipeline over a liquidity-ranked token universe.
//!
//! ## Overview
//!
//! Each cycle ranks tokens by liquidity, pulls every token's OHLCV history,
//! turns midpoints into log-returns, correlates every pair of return series on
//! their shared timestamps, and renders the result as a node/link JSON
//! document for the front end.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | `TOKENGRAPH_*` settings and API key file |
//! | [`correlation`] | Timestamp merge join and Pearson accumulator |
//! | [`data_source`] | Data source trait and the API-key HTTP implementation |
//! | [`domain`] | Domain models (Unit, Token, OhlcSample, ReturnSeries) |
//! | [`error`] | Core error types |
//! | [`graph`] | Graph model and all-pairs builder |
//! | [`history`] | Per-token OHLCV history |
//! | [`http_client`] | HTTP client abstraction |
//! | [`pipeline`] | One refresh cycle end to end |
//! | [`retry`] | Backoff between failed cycles |
//! | [`scheduler`] | Supervising loop with stop signal |
//! | [`serializer`] | Graph document and atomic artifact writes |
//! | [`throttling`] | Client-side request pacing |
//! | [`universe`] | Top-N tokens by liquidity |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Scheduler      │────▶│ Pipeline         │
//! └─────────────────┘     └────────┬─────────┘
//!                                  │
//!          ┌───────────────────────┼───────────────────────┐
//!          ▼                       ▼                       ▼
//! ┌─────────────────┐     ┌──────────────────┐    ┌──────────────────┐
//! │ TokenUniverse   │     │ PriceHistory     │    │ Graph builder    │
//! └────────┬────────┘     └────────┬─────────┘    └────────┬─────────┘
//!          └───────────┬───────────┘                       ▼
//!                      ▼                          ┌──────────────────┐
//!             ┌─────────────────┐                 │ Serializer       │
//!             │ Data Source     │                 └──────────────────┘
//!             │ + HTTP Client   │
//!             └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! A token whose history fails is skipped and reported; only a universe
//! failure aborts the cycle:
//!
//! ```rust
//! use tokengraph_core::{CoreError, SourceError};
//!
//! fn describe(error: &CoreError) -> &'static str {
//!     match error {
//!         CoreError::Validation(_) => "fix the configuration",
//!         CoreError::DataSource(source) if source.retryable() => "retry later",
//!         CoreError::NumericDegenerate { .. } => "token skipped",
//!         _ => "cycle failed",
//!     }
//! }
//!
//! let error = CoreError::from(SourceError::rate_limited("slow down"));
//! assert_eq!(describe(&error), "retry later");
//! assert_eq!(error.code(), "source.rate_limited");
//! ```
//!
//! ## Security
//!
//! - The API key is read from a local file and never logged
//! - All HTTP requests use TLS via rustls

pub mod config;
pub mod correlation;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod graph;
pub mod history;
pub mod http_client;
pub mod pipeline;
pub mod retry;
pub mod scheduler;
pub mod serializer;
pub mod throttling;
pub mod universe;

// Configuration
pub use config::{read_api_key, GraphConfig};

// Correlation
pub use correlation::{correlate, AlignedPairs, Correlation, PearsonAccumulator};

// Data source trait and types
pub use data_source::{
    ApiEndpoint, DataSourceClient, HttpDataSource, HttpDataSourceConfig, QueryParams, SourceError,
    SourceErrorKind,
};

// Domain models
pub use domain::{LogReturnPoint, OhlcSample, ReturnSeries, SampleInterval, Token, Unit};

// Error types
pub use error::{CoreError, ValidationError};

// Graph
pub use graph::{CorrelationGraphBuilder, EdgeMode, Graph, GraphEdge, GraphNode};
pub use history::PriceHistory;
pub use universe::TokenUniverse;

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Cycle and loop
pub use pipeline::{CycleReport, CycleSummary, Pipeline, PipelineSettings, SkippedToken};
pub use retry::{Backoff, BackoffKind, RetryPolicy};
pub use scheduler::{SchedulePolicy, Scheduler, SchedulerError, SchedulerStats, ShutdownHandle};

// Serialization
pub use serializer::{write_artifact, GraphDocument};

// Throttling
pub use throttling::RequestPacer;
