use chrono::Utc;

/// Default epoch: 2024-01-01T00:00:00Z, in milliseconds since the Unix epoch.
pub const DEFAULT_EPOCH_MS: i64 = 1_704_067_200_000;

/// A source of wall-clock time in milliseconds since the Unix epoch.
///
/// Any `Fn() -> i64` closure is a clock, which is how tests drive the
/// generator through simulated time:
///
/// ```
/// use snowflake_id::Clock;
///
/// let fixed = || 1_704_067_200_000_i64;
/// assert_eq!(fixed.now_millis(), 1_704_067_200_000);
/// ```
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

impl<F> Clock for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now_millis(&self) -> i64 {
        self()
    }
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Poll `clock` until it reports a value strictly greater than `last`.
pub(crate) fn wait_past(clock: &dyn Clock, last: i64) -> i64 {
    loop {
        let now = clock.now_millis();
        if now > last {
            return now;
        }
        std::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn system_clock_is_after_default_epoch() {
        assert!(SystemClock.now_millis() > DEFAULT_EPOCH_MS);
    }

    #[test]
    fn wait_past_returns_first_later_reading() {
        let reads = AtomicI64::new(0);
        let clock = move || 100 + reads.fetch_add(1, Ordering::SeqCst) / 3;
        assert_eq!(wait_past(&clock, 101), 102);
    }
}
