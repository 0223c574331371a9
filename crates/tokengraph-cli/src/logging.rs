//! Tracing subscriber setup.
//!
//! - `LOG_FORMAT`: `json` (default) or `pretty`; `--log-format` wins
//! - `RUST_LOG`: filter directives (default: `tokengraph=info`)
//!
//! Logs go to stderr so stdout stays clean for JSON and CSV output.

use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;
use crate::error::CliError;

// Target prefixes match both `tokengraph` (the binary) and `tokengraph_core`.
const DEFAULT_FILTER: &str = "tokengraph=info";

pub fn init(flag: Option<LogFormat>) -> Result<(), CliError> {
    let format = resolve_format(flag, std::env::var("LOG_FORMAT").ok().as_deref());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|error| CliError::Logging(error.to_string()))
}

fn resolve_format(flag: Option<LogFormat>, env: Option<&str>) -> LogFormat {
    flag.unwrap_or(match env.map(str::trim) {
        Some(value) if value.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
        _ => LogFormat::Json,
    })
}
