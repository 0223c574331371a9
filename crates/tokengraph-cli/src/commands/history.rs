use std::collections::BTreeMap;
use std::io::{self, Write};

use tokengraph_core::{GraphConfig, PriceHistory, Unit};

use crate::cli::HistoryArgs;
use crate::error::CliError;

const HEADER: &str = "time,open,high,low,close,volume,mid,log_return";

pub async fn run(args: &HistoryArgs, config: GraphConfig) -> Result<(), CliError> {
    let unit = Unit::parse(&args.unit)?;
    let interval = args.interval.unwrap_or(config.interval);
    let samples = args.samples.unwrap_or(config.samples);
    let source = super::data_source(&config)?;

    let history = PriceHistory::fetch(source.as_ref(), &unit, interval, samples).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_csv(&mut out, &history)?;
    out.flush()?;
    Ok(())
}

/// One row per sample; `log_return` is empty where no return ends at that time.
fn write_csv(out: &mut impl Write, history: &PriceHistory) -> io::Result<()> {
    let returns = history.log_returns();
    let by_time: BTreeMap<u64, f64> = returns
        .points()
        .iter()
        .map(|point| (point.time, point.value))
        .collect();

    writeln!(out, "{HEADER}")?;
    for sample in history.samples() {
        let log_return = by_time
            .get(&sample.time)
            .map(|value| value.to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            sample.time,
            sample.open,
            sample.high,
            sample.low,
            sample.close,
            sample.volume,
            sample.mid(),
            log_return
        )?;
    }
    Ok(())
}
