use serde::{Deserialize, Serialize};

use super::validate_non_negative;
use crate::ValidationError;

/// OHLCV bar at an epoch-second timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcSample {
    pub time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcSample {
    /// Builds a sample; every price and the volume must be finite and non-negative.
    ///
    /// Upstream bars are not guaranteed to satisfy `low <= open/close <= high`,
    /// so only `high >= low` is left to the midpoint consumer.
    pub fn new(
        time: u64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;
        validate_non_negative("volume", volume)?;

        Ok(Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Midpoint price `(high + low) / 2`, the price measure used for returns.
    pub fn mid(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}
