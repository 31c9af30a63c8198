use std::time::{Duration, Instant};

/// Decides which appends should trigger a chart redraw.
///
/// An append notifies when at least `interval` has passed since the last
/// interval-triggered notification, and the final append always notifies.
/// Forcing the final append does not restart the interval.
#[derive(Debug, Clone)]
pub struct RedrawThrottle {
    interval: Duration,
    last_redraw: Instant,
}

impl RedrawThrottle {
    /// Start the throttle window at `start`, typically when the run loop begins
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_redraw: start,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether an append happening at `now` should notify observers
    pub fn should_notify(&mut self, now: Instant, is_last: bool) -> bool {
        let mut notify = false;

        if now.saturating_duration_since(self.last_redraw) >= self.interval {
            notify = true;
            self.last_redraw = now;
        }

        notify || is_last
    }
}
