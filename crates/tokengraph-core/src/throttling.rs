use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side request pacing shared by every call a data source makes.
#[derive(Clone)]
pub struct RequestPacer {
    limiter: Arc<DirectRateLimiter>,
    requests_per_window: u32,
    window: Duration,
}

impl RequestPacer {
    pub fn new(window: Duration, requests_per_window: u32) -> Self {
        let safe_limit = requests_per_window.max(1);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(window, safe_limit))),
            requests_per_window: safe_limit,
            window,
        }
    }

    pub fn per_minute(requests: u32) -> Self {
        Self::new(Duration::from_secs(60), requests)
    }

    /// Non-blocking probe; `false` when the budget is exhausted.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Waits until the quota admits one more request.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    pub fn requests_per_window(&self) -> u32 {
        self.requests_per_window
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("requests_per_window", &self.requests_per_window)
            .field("window", &self.window)
            .finish()
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    // `limit` is clamped to >= 1 by the caller.
    let burst = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (window.as_secs_f64() / f64::from(limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
