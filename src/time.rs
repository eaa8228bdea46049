//! Frame timing.

use instant::{Duration, Instant};

/// Produces the per-frame delta time, clamped so a debugger pause or a
/// minimised window does not teleport every entity.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(100))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            dt_min,
            dt_max,
        }
    }

    /// Restarts timing so the next tick does not count the time away.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;
        dt.as_secs_f32()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_is_clamped() {
        let mut clock =
            FrameClock::with_clamps(Duration::from_millis(5), Duration::from_millis(20));
        assert!((clock.tick() - 0.005).abs() < 1e-6);

        std::thread::sleep(Duration::from_millis(40));
        assert!((clock.tick() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn reset_forgets_the_time_away() {
        let mut clock =
            FrameClock::with_clamps(Duration::from_millis(1), Duration::from_secs(10));
        std::thread::sleep(Duration::from_millis(50));
        clock.reset();
        assert!(clock.tick() < 0.04);
    }
}
