//! Lateral lanes and the eased movement between them.

use serde::{Deserialize, Serialize};

/// Easing curve of a lane switch. Both are monotonic with `ease(0) = 0` and
/// `ease(1) = 1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// Smoothstep: slow start, slow end.
    #[default]
    Cubic,
}

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Cubic => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Lateral position `elapsed` seconds into a switch from `start` to `target`.
///
/// Once `elapsed >= duration` the result is exactly `target`.
pub fn lane_position(start: f32, target: f32, elapsed: f32, duration: f32, easing: Easing) -> f32 {
    if duration <= 0.0 || elapsed >= duration {
        return target;
    }
    start + (target - start) * easing.apply(elapsed / duration)
}

/// The fixed set of lateral offsets, indexed left to right in world x.
#[derive(Clone, Debug, PartialEq)]
pub struct Lanes {
    offsets: Vec<f32>,
}

impl Lanes {
    /// An empty offset list falls back to a single centre lane.
    pub fn new(offsets: Vec<f32>) -> Self {
        let offsets = if offsets.is_empty() {
            log::warn!("no lane offsets configured, using a single centre lane");
            vec![0.0]
        } else {
            offsets
        };
        Self { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offset(&self, lane: usize) -> f32 {
        self.offsets[lane.min(self.offsets.len() - 1)]
    }

    pub fn centre(&self) -> usize {
        self.offsets.len() / 2
    }

    /// Lane whose offset is closest to `x`.
    pub fn nearest(&self, x: f32) -> usize {
        self.offsets
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - x).abs().total_cmp(&(*b - x).abs()))
            .map_or(0, |(lane, _)| lane)
    }

    /// One lane towards +x, clamped at the edge.
    pub fn step_up(&self, lane: usize) -> usize {
        (lane + 1).min(self.offsets.len() - 1)
    }

    /// One lane towards -x, clamped at the edge.
    pub fn step_down(&self, lane: usize) -> usize {
        lane.saturating_sub(1)
    }
}

/// An in-progress move between two lateral positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneSwitch {
    pub start: f32,
    pub target: f32,
    pub elapsed: f32,
    pub duration: f32,
    pub easing: Easing,
}

impl LaneSwitch {
    pub fn new(start: f32, target: f32, duration: f32, easing: Easing) -> Self {
        Self {
            start,
            target,
            elapsed: 0.0,
            duration,
            easing,
        }
    }

    /// Advances by `dt` and returns the new lateral position.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt;
        lane_position(
            self.start,
            self.target,
            self.elapsed,
            self.duration,
            self.easing,
        )
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_lane_rounds_to_closest_offset() {
        let lanes = Lanes::new(vec![-2.0, 0.0, 2.0]);
        assert_eq!(lanes.nearest(-1.2), 0);
        assert_eq!(lanes.nearest(0.9), 1);
        assert_eq!(lanes.nearest(7.0), 2);
        assert_eq!(lanes.step_up(2), 2);
        assert_eq!(lanes.step_down(0), 0);
    }
}
