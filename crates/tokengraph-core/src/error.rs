use thiserror::Error;

use crate::data_source::SourceError;

/// Validation and contract errors exposed by `tokengraph-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unit cannot be empty")]
    EmptyUnit,

    #[error("token count must be greater than zero")]
    ZeroTokenCount,
    #[error("sample count must be greater than zero")]
    ZeroSampleCount,
    #[error(
        "invalid interval '{value}', expected 3m, 5m, 15m, 30m, 1h, 2h, 4h, 12h, 1d, 3d, 1w, 1M"
    )]
    InvalidInterval { value: String },
    #[error("invalid edge mode '{value}', expected 'undirected' or 'directed'")]
    InvalidEdgeMode { value: String },
    #[error("invalid retry backoff '{value}', expected 'fixed' or 'exponential'")]
    InvalidBackoff { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("setting '{name}' must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("setting '{name}' must be greater than zero")]
    ZeroSetting { name: &'static str },
    #[error("api base url must start with http:// or https://: '{value}'")]
    InvalidBaseUrl { value: String },
    #[error("api key file is empty")]
    EmptyApiKey,
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("data source error: {0}")]
    DataSource(#[from] SourceError),

    #[error("unit '{unit}' is not part of the current token universe")]
    NotFound { unit: String },

    #[error("numeric degenerate input for '{unit}': {reason}")]
    NumericDegenerate { unit: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn not_found(unit: impl Into<String>) -> Self {
        Self::NotFound { unit: unit.into() }
    }

    pub fn numeric_degenerate(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NumericDegenerate {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, mirrors [`SourceError::code`].
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "core.validation",
            Self::DataSource(error) => error.code(),
            Self::NotFound { .. } => "core.not_found",
            Self::NumericDegenerate { .. } => "core.numeric_degenerate",
            Self::Serialization(_) => "core.serialization",
            Self::Io(_) => "core.io",
        }
    }
}
