//! Supervising loop that re-runs the pipeline cycle on a fixed period.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::retry::RetryPolicy;
use crate::CoreError;

/// Period and failure handling for [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulePolicy {
    /// Wait after a successful cycle.
    pub interval: Duration,
    pub retry: RetryPolicy,
}

impl SchedulePolicy {
    /// Retries failed cycles after the same `interval`, forever.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            retry: RetryPolicy::fixed(interval),
        }
    }
}

/// Counters returned when the loop stops on request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub cycles: u64,
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("giving up after {consecutive} consecutive failed cycles: {last}")]
    TooManyFailures {
        consecutive: u32,
        stats: SchedulerStats,
        #[source]
        last: CoreError,
    },
}

/// Cloneable trigger for the scheduler's stop signal.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }
}

#[derive(Debug)]
pub struct Scheduler {
    policy: SchedulePolicy,
    stop: Arc<watch::Sender<bool>>,
}

impl Scheduler {
    pub fn new(policy: SchedulePolicy) -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            policy,
            stop: Arc::new(sender),
        }
    }

    pub fn policy(&self) -> &SchedulePolicy {
        &self.policy
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: Arc::clone(&self.stop),
        }
    }

    /// Runs `cycle` until the stop signal fires or the retry policy gives up.
    ///
    /// A stop request interrupts both the wait between cycles and a cycle in
    /// flight; an interrupted cycle is dropped and not counted.
    pub async fn run<F, Fut>(&self, mut cycle: F) -> Result<SchedulerStats, SchedulerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let mut stop = self.stop.subscribe();
        let mut stats = SchedulerStats::default();
        let mut consecutive_failures: u32 = 0;

        info!(
            interval_secs = self.policy.interval.as_secs_f64(),
            max_consecutive_failures = ?self.policy.retry.max_consecutive_failures,
            "scheduler started"
        );

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            let outcome = tokio::select! {
                biased;
                _ = stop.wait_for(|stopped| *stopped) => break,
                outcome = cycle() => outcome,
            };
            stats.cycles += 1;

            let delay = match outcome {
                Ok(()) => {
                    stats.succeeded += 1;
                    consecutive_failures = 0;
                    self.policy.interval
                }
                Err(err) => {
                    stats.failed += 1;
                    consecutive_failures = consecutive_failures.saturating_add(1);

                    if self.policy.retry.is_exhausted(consecutive_failures) {
                        error!(
                            error = %err,
                            code = err.code(),
                            consecutive_failures,
                            "cycle failed, retry budget exhausted"
                        );
                        return Err(SchedulerError::TooManyFailures {
                            consecutive: consecutive_failures,
                            stats,
                            last: err,
                        });
                    }

                    let delay = self.policy.retry.delay_after(consecutive_failures);
                    warn!(
                        error = %err,
                        code = err.code(),
                        consecutive_failures,
                        retry_in_ms = delay.as_millis() as u64,
                        "cycle failed"
                    );
                    delay
                }
            };

            tokio::select! {
                biased;
                _ = stop.wait_for(|stopped| *stopped) => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        info!(
            cycles = stats.cycles,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "scheduler stopped"
        );
        Ok(stats)
    }
}
