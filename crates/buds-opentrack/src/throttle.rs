use std::time::{Duration, Instant};

/// Minimum spacing between sent frames.
///
/// Frames arriving too early are dropped, never queued.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_sent: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
        }
    }

    /// Throttle for `target_hz` frames per second. Zero is treated as 1 Hz.
    pub fn from_rate_hz(target_hz: u32) -> Self {
        Self::new(Duration::from_micros(1_000_000 / u64::from(target_hz.max(1))))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Whether a frame may go out at `now`. The first frame always may.
    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_sent {
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
            None => true,
        }
    }

    /// Restart the interval from `now`. Call only after a successful send.
    pub fn mark_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_from_rate() {
        assert_eq!(Throttle::from_rate_hz(100).min_interval(), Duration::from_millis(10));
        assert_eq!(Throttle::from_rate_hz(200).min_interval(), Duration::from_millis(5));
        assert_eq!(Throttle::from_rate_hz(0).min_interval(), Duration::from_secs(1));
    }

    #[test]
    fn first_frame_passes() {
        let throttle = Throttle::from_rate_hz(100);
        assert!(throttle.is_ready(Instant::now()));
    }

    #[test]
    fn drops_until_interval_elapsed() {
        let mut throttle = Throttle::from_rate_hz(100);
        let t0 = Instant::now();
        throttle.mark_sent(t0);

        assert!(!throttle.is_ready(t0));
        assert!(!throttle.is_ready(t0 + Duration::from_millis(9)));
        assert!(throttle.is_ready(t0 + Duration::from_millis(10)));
        assert!(throttle.is_ready(t0 + Duration::from_millis(250)));
    }

    #[test]
    fn unsent_frames_do_not_restart_interval() {
        let mut throttle = Throttle::from_rate_hz(100);
        let t0 = Instant::now();
        throttle.mark_sent(t0);
        // Checking readiness alone never moves the clock.
        let _ = throttle.is_ready(t0 + Duration::from_millis(5));
        assert!(throttle.is_ready(t0 + Duration::from_millis(10)));
    }
}
