//! CLI argument definitions for tokengraph.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Rebuild the graph on the refresh interval until Ctrl-C |
//! | `once` | Build the graph once and write (or print) it |
//! | `tokens` | Print the liquidity-ranked token universe |
//! | `history` | Print one token's OHLCV history with log-returns as CSV |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--env-file` | `.env` if present | Seed environment variables from a file |
//! | `--log-format` | `LOG_FORMAT` or `json` | Log output format (json, pretty) |
//!
//! # Examples
//!
//! ```bash
//! tokengraph once --tokens 20 --interval 1d --samples 90 --output graph.json
//! tokengraph tokens --limit 10
//! tokengraph history <unit> --interval 12h --samples 30
//! LOG_FORMAT=pretty tokengraph run
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokengraph_core::{EdgeMode, GraphConfig, SampleInterval};

/// Token correlation graph builder.
///
/// Settings come from `TOKENGRAPH_*` environment variables; the flags below
/// override them for a single invocation.
#[derive(Debug, Parser)]
#[command(
    name = "tokengraph",
    author,
    version,
    about = "Builds a liquidity-ranked token correlation graph"
)]
pub struct Cli {
    /// Load environment variables from this file instead of `./.env`.
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Log output format; falls back to `LOG_FORMAT`.
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild the graph every refresh interval until interrupted.
    Run(RunArgs),

    /// Run a single cycle.
    ///
    /// Writes the artifact and prints a JSON cycle summary, or prints the
    /// graph itself with `--stdout`.
    Once(OnceArgs),

    /// Print the top tokens by liquidity as JSON.
    Tokens(TokensArgs),

    /// Print one token's OHLCV history as CSV with a log-return column.
    History(HistoryArgs),
}

/// Overrides shared by the graph-building commands.
#[derive(Debug, Clone, Default, Args)]
pub struct GraphOverrides {
    /// Number of tokens in the universe.
    #[arg(long)]
    pub tokens: Option<usize>,

    /// OHLCV interval (3m, 5m, 15m, 30m, 1h, 2h, 4h, 12h, 1d, 3d, 1w, 1M).
    #[arg(long)]
    pub interval: Option<SampleInterval>,

    /// OHLCV samples per token.
    #[arg(long)]
    pub samples: Option<usize>,

    /// Emit one link per pair (undirected) or one per direction (directed).
    #[arg(long)]
    pub edge_mode: Option<EdgeMode>,
}

impl GraphOverrides {
    pub fn apply(&self, config: &mut GraphConfig) {
        if let Some(tokens) = self.tokens {
            config.token_count = tokens;
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(edge_mode) = self.edge_mode {
            config.edge_mode = edge_mode;
        }
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: GraphOverrides,
}

#[derive(Debug, Args)]
pub struct OnceArgs {
    #[command(flatten)]
    pub overrides: GraphOverrides,

    /// Artifact path; defaults to `TOKENGRAPH_OUTPUT_PATH`.
    #[arg(long, conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Print the graph document instead of writing a file.
    #[arg(long, default_value_t = false)]
    pub stdout: bool,
}

#[derive(Debug, Args)]
pub struct TokensArgs {
    /// Number of tokens; defaults to `TOKENGRAPH_TOKEN_COUNT`.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Token unit (policy id + asset name).
    pub unit: String,

    #[arg(long)]
    pub interval: Option<SampleInterval>,

    #[arg(long)]
    pub samples: Option<usize>,
}
