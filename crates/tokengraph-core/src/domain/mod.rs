//! # Domain Models
//!
//! Canonical domain types for the correlation graph pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Unit`] | Stable token identifier, the primary key everywhere |
//! | [`Token`] | Liquidity-ranked token snapshot |
//! | [`OhlcSample`] | One OHLCV bar at an epoch-second timestamp |
//! | [`SampleInterval`] | Upstream OHLCV bucket size (`12h`, `1d`, ...) |
//! | [`LogReturnPoint`] | `ln(mid[i] / mid[i-1])` stamped with the later sample's time |
//! | [`ReturnSeries`] | A token's log-return points plus their mean |
//!
//! Constructors validate their invariants and return [`ValidationError`]
//! instead of building half-valid values:
//!
//! ```rust
//! use tokengraph_core::{OhlcSample, ValidationError};
//!
//! let sample = OhlcSample::new(0, 1.0, 2.0, 0.5, 1.5, 100.0).expect("valid");
//! assert_eq!(sample.mid(), 1.25);
//!
//! let bad = OhlcSample::new(0, 1.0, f64::NAN, 0.5, 1.5, 100.0);
//! assert!(matches!(bad, Err(ValidationError::NonFiniteValue { field: "high" })));
//! ```
//!
//! [`ValidationError`]: crate::ValidationError

mod interval;
mod ohlc;
mod returns;
mod token;

pub use interval::SampleInterval;
pub use ohlc::OhlcSample;
pub use returns::{LogReturnPoint, ReturnSeries};
pub use token::{Token, Unit};

use crate::ValidationError;

pub(crate) fn validate_non_negative(
    field: &'static str,
    value: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
