use std::time::{Duration, Instant};

use tokio::time::sleep;

/// Shortest measurement window considered when computing the achieved rate.
/// Keeps the first chunk of a transfer from looking infinitely fast.
const MIN_MEASURE_WINDOW: f64 = 0.01;

/// Feedback limiter for a single transfer direction.
///
/// After every chunk the caller reports how many bytes the current window
/// has moved. If the achieved rate is above the ceiling, the limiter sleeps
/// just long enough that the average over the window drops back to the
/// ceiling, then starts a fresh window.
#[derive(Debug)]
pub struct RateLimiter {
    max_rate: u64,
    window_start: Instant,
    window_bytes: u64,
}

impl RateLimiter {
    /// `max_rate` is in bytes per second; 0 disables limiting.
    pub fn new(max_rate: u64) -> Self {
        Self {
            max_rate,
            window_start: Instant::now(),
            window_bytes: 0,
        }
    }

    /// Accounts for `bytes` just transferred and pauses if the transfer is
    /// running ahead of the ceiling.
    pub async fn throttle(&mut self, bytes: u64) {
        if self.max_rate == 0 {
            return;
        }
        self.window_bytes += bytes;
        if let Some(pause) =
            pause_duration(self.window_bytes, self.window_start.elapsed(), self.max_rate)
        {
            sleep(pause).await;
            self.window_start = Instant::now();
            self.window_bytes = 0;
        }
    }
}

/// How long a transfer must pause so that `bytes` over `elapsed` averages
/// out to at most `max_rate`. `None` means the transfer is within bounds.
pub fn pause_duration(bytes: u64, elapsed: Duration, max_rate: u64) -> Option<Duration> {
    if max_rate == 0 {
        return None;
    }
    let elapsed_secs = elapsed.as_secs_f64().max(MIN_MEASURE_WINDOW);
    let rate = bytes as f64 / elapsed_secs;
    if rate <= max_rate as f64 {
        return None;
    }
    let pause_secs = (rate / max_rate as f64 - 1.0) * elapsed_secs;
    if pause_secs > 0.0 {
        Some(Duration::from_secs_f64(pause_secs))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ceiling_never_pauses() {
        assert_eq!(pause_duration(1 << 30, Duration::from_millis(1), 0), None);
    }

    #[test]
    fn under_the_ceiling_never_pauses() {
        assert_eq!(pause_duration(500, Duration::from_secs(1), 1000), None);
        // Exactly at the ceiling counts as within bounds.
        assert_eq!(pause_duration(1000, Duration::from_secs(1), 1000), None);
    }

    #[test]
    fn overshoot_pauses_for_the_excess() {
        // 2000 bytes in 1 s against a 1000 B/s ceiling: one extra second
        // brings the average back to the ceiling.
        let pause = pause_duration(2000, Duration::from_secs(1), 1000).unwrap();
        assert!((pause.as_secs_f64() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tiny_windows_are_clamped() {
        // A zero-length window must not divide by zero; the clamp makes the
        // rate finite and the pause proportional to the clamped window.
        let pause = pause_duration(1000, Duration::ZERO, 1000).unwrap();
        let expected = (1000.0 / 0.01 / 1000.0 - 1.0) * 0.01;
        assert!((pause.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn throttle_is_a_noop_without_a_ceiling() {
        let mut limiter = RateLimiter::new(0);
        let start = Instant::now();
        limiter.throttle(10 << 20).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn throttle_slows_an_overshooting_transfer() {
        let mut limiter = RateLimiter::new(1 << 20);
        let start = Instant::now();
        // Report far more than a megabyte immediately; the limiter has to
        // sleep a measurable amount to amortize it.
        limiter.throttle(2 << 20).await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
