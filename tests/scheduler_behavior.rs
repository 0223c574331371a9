//! Behavior-driven tests for the supervising loop
//!
//! Durations are kept in the millisecond range; every test bounds the loop
//! with an outer timeout so a regression hangs no longer than a few seconds.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokengraph_core::{
    Backoff, CoreError, RetryPolicy, SchedulePolicy, Scheduler, SchedulerError, SourceError,
};

const GUARD: Duration = Duration::from_secs(5);

fn failing() -> CoreError {
    SourceError::unavailable("upstream down").into()
}

// =============================================================================
// Scheduler: Stop Signal
// =============================================================================

#[tokio::test]
async fn when_stop_is_triggered_during_the_wait_loop_returns_promptly() {
    // Given: a one-hour interval and a stop request shortly after start
    let scheduler = Scheduler::new(SchedulePolicy::fixed(Duration::from_secs(3600)));
    let handle = scheduler.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.trigger();
    });

    // When: the loop runs
    let started = Instant::now();
    let stats = tokio::time::timeout(GUARD, scheduler.run(|| async { Ok(()) }))
        .await
        .expect("loop must not wait out the interval")
        .expect("clean stop");

    // Then: exactly one cycle ran and the wait was cut short
    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.succeeded, 1);
    assert!(started.elapsed() < GUARD);
}

#[tokio::test]
async fn when_stop_is_triggered_inside_a_cycle_no_further_cycle_runs() {
    // Given: a cycle that asks the loop to stop on its third run
    let scheduler = Scheduler::new(SchedulePolicy::fixed(Duration::from_millis(1)));
    let handle = scheduler.shutdown_handle();
    let runs = Arc::new(AtomicU32::new(0));

    // When: the loop runs
    let counter = Arc::clone(&runs);
    let stats = tokio::time::timeout(
        GUARD,
        scheduler.run(move || {
            let counter = Arc::clone(&counter);
            let handle = handle.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                    handle.trigger();
                }
                Ok(())
            }
        }),
    )
    .await
    .expect("loop stops")
    .expect("clean stop");

    // Then: three cycles ran, all successful
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert_eq!(stats.cycles, 3);
    assert_eq!(stats.failed, 0);
}

// =============================================================================
// Scheduler: Failures
// =============================================================================

#[tokio::test]
async fn when_failures_reach_the_cap_loop_gives_up_with_last_error() {
    // Given: every cycle fails and the policy allows three in a row
    let policy = SchedulePolicy {
        interval: Duration::from_secs(3600),
        retry: RetryPolicy::fixed(Duration::from_millis(1)).with_max_consecutive_failures(3),
    };
    let scheduler = Scheduler::new(policy);
    let runs = Arc::new(AtomicU32::new(0));

    // When: the loop runs
    let counter = Arc::clone(&runs);
    let err = tokio::time::timeout(
        GUARD,
        scheduler.run(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(failing()) }
        }),
    )
    .await
    .expect("loop gives up")
    .expect_err("must give up");

    // Then: it stopped on the third failure and kept the cause
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    let SchedulerError::TooManyFailures {
        consecutive,
        stats,
        last,
    } = err;
    assert_eq!(consecutive, 3);
    assert_eq!(stats.failed, 3);
    assert_eq!(last.code(), "source.unavailable");
}

#[tokio::test]
async fn when_a_cycle_succeeds_the_failure_count_resets() {
    // Given: fail, fail, succeed, repeated; the cap is three in a row
    let policy = SchedulePolicy {
        interval: Duration::from_millis(1),
        retry: RetryPolicy::fixed(Duration::from_millis(1)).with_max_consecutive_failures(3),
    };
    let scheduler = Scheduler::new(policy);
    let handle = scheduler.shutdown_handle();
    let runs = Arc::new(AtomicU32::new(0));

    // When: nine cycles run before the test stops the loop
    let counter = Arc::clone(&runs);
    let stats = tokio::time::timeout(
        GUARD,
        scheduler.run(move || {
            let run = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let handle = handle.clone();
            async move {
                if run == 9 {
                    handle.trigger();
                }
                if run % 3 == 0 {
                    Ok(())
                } else {
                    Err(failing())
                }
            }
        }),
    )
    .await
    .expect("loop stops")
    .expect("never exhausts the retry budget");

    // Then: six failures were tolerated because none came three in a row
    assert_eq!(stats.cycles, 9);
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.failed, 6);
}

#[tokio::test]
async fn when_a_cycle_fails_the_loop_waits_the_backoff_not_the_interval() {
    // Given: a long success interval and a short fixed retry delay
    let policy = SchedulePolicy {
        interval: Duration::from_secs(3600),
        retry: RetryPolicy {
            backoff: Backoff::Fixed {
                delay: Duration::from_millis(30),
            },
            max_consecutive_failures: Some(2),
        },
    };
    let scheduler = Scheduler::new(policy);

    // When: two failures happen back to back
    let started = Instant::now();
    let result = tokio::time::timeout(GUARD, scheduler.run(|| async { Err(failing()) }))
        .await
        .expect("loop gives up");

    // Then: the retry used the backoff delay once, then the cap ended the loop
    assert!(result.is_err());
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(30), "{elapsed:?}");
    assert!(elapsed < GUARD);
}
