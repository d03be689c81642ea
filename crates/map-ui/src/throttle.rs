//! Rate limiting for extent publication.
//!
//! Viewport changes arrive in bursts while the user pans or zooms. The first
//! change of a burst is published immediately; further changes inside the
//! interval are coalesced and the latest one is published when the interval
//! has elapsed (leading and trailing delivery).
//!
//! ```text
//!          offer (idle)              interval elapsed, nothing pending
//!   Idle --------------> Cooling ------------------------------> Idle
//!                        |     ^
//!        offer (cooling) |     | poll after interval: emit pending
//!                        v     |
//!                        Pending
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use map_common::BoundingBox;

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for replays and tests. Clones share one time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy)]
enum ThrottleState {
    /// Nothing published within the last interval.
    Idle,
    /// Published at `emitted_at`; nothing waiting.
    Cooling { emitted_at: Instant },
    /// Published at `emitted_at`; `extent` waits for the interval to pass.
    Pending {
        emitted_at: Instant,
        extent: BoundingBox,
    },
}

/// Leading and trailing throttle over extents.
#[derive(Debug)]
pub struct ExtentThrottle {
    interval: Duration,
    state: ThrottleState,
}

impl ExtentThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: ThrottleState::Idle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offer a new extent. Returns it when it should be published now.
    pub fn offer(&mut self, extent: BoundingBox, now: Instant) -> Option<BoundingBox> {
        match self.state {
            ThrottleState::Cooling { emitted_at } | ThrottleState::Pending { emitted_at, .. }
                if now.saturating_duration_since(emitted_at) < self.interval =>
            {
                self.state = ThrottleState::Pending { emitted_at, extent };
                None
            }
            _ => {
                self.state = ThrottleState::Cooling { emitted_at: now };
                Some(extent)
            }
        }
    }

    /// Advance time. Returns the coalesced extent once its interval has
    /// elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<BoundingBox> {
        match self.state {
            ThrottleState::Pending { emitted_at, extent }
                if now.saturating_duration_since(emitted_at) >= self.interval =>
            {
                self.state = ThrottleState::Cooling { emitted_at: now };
                Some(extent)
            }
            ThrottleState::Cooling { emitted_at }
                if now.saturating_duration_since(emitted_at) >= self.interval =>
            {
                self.state = ThrottleState::Idle;
                None
            }
            _ => None,
        }
    }

    /// Instant at which [`poll`](Self::poll) will release the pending
    /// extent, if one is waiting.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ThrottleState::Pending { emitted_at, .. } => Some(emitted_at + self.interval),
            _ => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        matches!(self.state, ThrottleState::Pending { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(500);

    fn extent(x: f64) -> BoundingBox {
        BoundingBox::new(x, 0.0, x + 10.0, 10.0)
    }

    #[test]
    fn test_leading_edge_publishes_immediately() {
        let mut throttle = ExtentThrottle::new(INTERVAL);
        let t0 = Instant::now();
        assert_eq!(throttle.offer(extent(1.0), t0), Some(extent(1.0)));
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_burst_coalesces_to_latest() {
        let mut throttle = ExtentThrottle::new(INTERVAL);
        let t0 = Instant::now();
        throttle.offer(extent(1.0), t0);
        assert_eq!(throttle.offer(extent(2.0), t0 + Duration::from_millis(100)), None);
        assert_eq!(throttle.offer(extent(3.0), t0 + Duration::from_millis(200)), None);
        assert_eq!(throttle.deadline(), Some(t0 + INTERVAL));

        assert_eq!(throttle.poll(t0 + Duration::from_millis(400)), None);
        assert_eq!(throttle.poll(t0 + INTERVAL), Some(extent(3.0)));
        assert_eq!(throttle.poll(t0 + INTERVAL), None);
    }

    #[test]
    fn test_trailing_emission_restarts_interval() {
        let mut throttle = ExtentThrottle::new(INTERVAL);
        let t0 = Instant::now();
        throttle.offer(extent(1.0), t0);
        throttle.offer(extent(2.0), t0 + Duration::from_millis(100));
        let t1 = t0 + INTERVAL;
        assert_eq!(throttle.poll(t1), Some(extent(2.0)));

        assert_eq!(throttle.offer(extent(3.0), t1 + Duration::from_millis(100)), None);
        assert_eq!(throttle.poll(t1 + INTERVAL), Some(extent(3.0)));
    }

    #[test]
    fn test_quiet_period_returns_to_leading_edge() {
        let mut throttle = ExtentThrottle::new(INTERVAL);
        let t0 = Instant::now();
        throttle.offer(extent(1.0), t0);
        assert_eq!(throttle.poll(t0 + INTERVAL), None);

        let later = t0 + Duration::from_secs(2);
        assert_eq!(throttle.offer(extent(4.0), later), Some(extent(4.0)));
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = clock.now();
        other.advance(INTERVAL);
        assert_eq!(clock.now(), start + INTERVAL);
    }
}
