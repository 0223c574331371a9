//! Per-token OHLCV history and log-return derivation.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data_source::{ApiEndpoint, DataSourceClient, QueryParams, SourceError};
use crate::{CoreError, OhlcSample, ReturnSeries, SampleInterval, Unit, ValidationError};

/// Time-sorted OHLCV samples for one token.
///
/// Samples are strictly increasing in `time`: the stable sort keeps arrival
/// order among equal timestamps and the last sample received for a timestamp
/// replaces the earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    unit: Unit,
    samples: Vec<OhlcSample>,
    rejected_rows: usize,
    collapsed_duplicates: usize,
}

#[derive(Debug, Deserialize)]
struct OhlcvRow {
    time: u64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

impl PriceHistory {
    /// Fetches `num_intervals` bars of `interval` for `unit`.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ZeroSampleCount`] when `num_intervals == 0`.
    /// - [`CoreError::DataSource`] on transport, status, or payload failure.
    pub async fn fetch(
        client: &dyn DataSourceClient,
        unit: &Unit,
        interval: SampleInterval,
        num_intervals: usize,
    ) -> Result<Self, CoreError> {
        if num_intervals == 0 {
            return Err(ValidationError::ZeroSampleCount.into());
        }

        let params = QueryParams::new()
            .with("unit", unit.as_str())
            .with("interval", interval.as_str())
            .with("numIntervals", num_intervals);
        let body = client.get(ApiEndpoint::Ohlcv, params).await?;

        let history = Self::from_payload(unit.clone(), body)?;
        debug!(
            unit = %unit,
            samples = history.len(),
            rejected = history.rejected_rows,
            collapsed = history.collapsed_duplicates,
            "price history fetched"
        );
        Ok(history)
    }

    /// Re-fetches in place; the current samples survive a failed refresh.
    pub async fn refresh(
        &mut self,
        client: &dyn DataSourceClient,
        interval: SampleInterval,
        num_intervals: usize,
    ) -> Result<(), CoreError> {
        let next = Self::fetch(client, &self.unit, interval, num_intervals).await?;
        *self = next;
        Ok(())
    }

    pub fn from_samples(unit: Unit, samples: Vec<OhlcSample>) -> Self {
        let mut history = Self {
            unit,
            samples: Vec::new(),
            rejected_rows: 0,
            collapsed_duplicates: 0,
        };
        history.install(samples);
        history
    }

    fn from_payload(unit: Unit, body: Value) -> Result<Self, SourceError> {
        let Value::Array(rows) = body else {
            return Err(SourceError::malformed_response(format!(
                "token/ohlcv response for '{unit}' must be a JSON array"
            )));
        };

        let mut samples = Vec::with_capacity(rows.len());
        let mut rejected_rows = 0;
        for row in rows {
            match decode_row(row) {
                Ok(sample) => samples.push(sample),
                Err(reason) => {
                    rejected_rows += 1;
                    debug!(unit = %unit, reason = %reason, "dropping invalid ohlcv row");
                }
            }
        }
        if rejected_rows > 0 {
            warn!(unit = %unit, rejected = rejected_rows, "ohlcv rows dropped during decoding");
        }

        let mut history = Self::from_samples(unit, samples);
        history.rejected_rows = rejected_rows;
        Ok(history)
    }

    fn install(&mut self, mut samples: Vec<OhlcSample>) {
        samples.sort_by_key(|sample| sample.time);

        let mut deduped: Vec<OhlcSample> = Vec::with_capacity(samples.len());
        let mut collapsed = 0;
        for sample in samples {
            match deduped.last_mut() {
                Some(last) if last.time == sample.time => {
                    *last = sample;
                    collapsed += 1;
                }
                _ => deduped.push(sample),
            }
        }

        self.samples = deduped;
        self.collapsed_duplicates = collapsed;
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn samples(&self) -> &[OhlcSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn rejected_rows(&self) -> usize {
        self.rejected_rows
    }

    pub fn collapsed_duplicates(&self) -> usize {
        self.collapsed_duplicates
    }

    /// Log-returns over consecutive midpoints, see [`ReturnSeries::from_samples`].
    pub fn log_returns(&self) -> ReturnSeries {
        ReturnSeries::from_samples(&self.samples)
    }
}

fn decode_row(row: Value) -> Result<OhlcSample, String> {
    let row: OhlcvRow = serde_json::from_value(row).map_err(|e| e.to_string())?;
    OhlcSample::new(
        row.time,
        row.open,
        row.high,
        row.low,
        row.close,
        row.volume.unwrap_or(0.0),
    )
    .map_err(|e| e.to_string())
}
