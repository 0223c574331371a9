use tokengraph_core::{write_artifact, GraphConfig, Scheduler};
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::error::CliError;

pub async fn run(args: &RunArgs, mut config: GraphConfig) -> Result<(), CliError> {
    args.overrides.apply(&mut config);
    let pipeline = super::pipeline(&config)?;

    let scheduler = Scheduler::new(config.schedule_policy());
    let shutdown = scheduler.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                shutdown.trigger();
            }
            Err(err) => error!(error = %err, "cannot listen for ctrl-c"),
        }
    });

    let pipeline = &pipeline;
    let output = config.output_path.as_path();
    info!(
        output = %output.display(),
        tokens = config.token_count,
        interval = %config.interval,
        refresh_secs = config.refresh_interval.as_secs(),
        "supervising loop starting"
    );

    let stats = scheduler
        .run(move || async move {
            let report = pipeline.run_cycle().await?;
            write_artifact(output, &report.graph)?;
            if !report.skipped.is_empty() {
                info!(
                    cycle_id = %report.cycle_id,
                    skipped = report.skipped.len(),
                    "cycle completed with skipped tokens"
                );
            }
            Ok(())
        })
        .await?;

    info!(
        cycles = stats.cycles,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "supervising loop finished"
    );
    Ok(())
}
