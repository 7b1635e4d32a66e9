//! Rolling window of recent wrist positions.
//!
//! Positions are kept oldest-first.  Once the window holds `capacity`
//! entries every push evicts the oldest one.  Motion geometry is only
//! defined on a full window; partial windows give noisy estimates.

use std::collections::VecDeque;

use crate::landmark::Point3;

/// Default window length, in processed frames.
pub const DEFAULT_TRAJECTORY_LENGTH: usize = 10;

#[derive(Clone, Debug)]
pub struct TrajectoryBuffer {
    positions: VecDeque<Point3>,
    capacity:  usize,
}

impl TrajectoryBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        TrajectoryBuffer {
            positions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append the newest position, evicting the oldest once full.
    pub fn push(&mut self, position: Point3) {
        if self.positions.len() == self.capacity {
            self.positions.pop_front();
        }
        self.positions.push_back(position);
    }

    /// Discard the whole history.
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn is_full(&self) -> bool { self.positions.len() == self.capacity }
    pub fn is_empty(&self) -> bool { self.positions.is_empty() }
    pub fn len(&self) -> usize { self.positions.len() }
    pub fn capacity(&self) -> usize { self.capacity }

    pub fn first(&self) -> Option<Point3> { self.positions.front().copied() }
    pub fn last(&self) -> Option<Point3> { self.positions.back().copied() }

    /// Positions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Point3> + '_ {
        self.positions.iter()
    }

    /// Net movement across the window, `last − first`.  `None` until full.
    pub fn displacement(&self) -> Option<Point3> {
        if !self.is_full() { return None; }
        Some(self.last()? - self.first()?)
    }

    /// Distance between the sample at `⌊N/2⌋` and the midpoint of the
    /// straight line joining the endpoints.  `None` until full.
    pub fn curvature(&self) -> Option<f32> {
        if !self.is_full() { return None; }
        let mid = *self.positions.get(self.capacity / 2)?;
        let expected = self.first()?.midpoint(self.last()?);
        Some(mid.distance(expected))
    }
}

impl Default for TrajectoryBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRAJECTORY_LENGTH)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, step: f32) -> Vec<Point3> {
        (0..n).map(|i| Point3::planar(0.1 + step * i as f32, 0.5)).collect()
    }

    #[test]
    fn push_past_capacity_keeps_newest() {
        let mut buf = TrajectoryBuffer::with_capacity(10);
        for p in line(11, 0.01) { buf.push(p); }
        assert_eq!(buf.len(), 10);
        // the very first sample (x = 0.1) was evicted
        assert!((buf.first().unwrap().x - 0.11).abs() < 1e-6);
        assert!((buf.last().unwrap().x - 0.2).abs() < 1e-6);
    }

    #[test]
    fn cleared_then_partial_is_never_full() {
        let mut buf = TrajectoryBuffer::with_capacity(10);
        for p in line(10, 0.01) { buf.push(p); }
        assert!(buf.is_full());
        buf.clear();
        assert!(buf.is_empty());
        for p in line(9, 0.01) {
            buf.push(p);
            assert!(!buf.is_full());
        }
    }

    #[test]
    fn geometry_undefined_on_partial_window() {
        let mut buf = TrajectoryBuffer::with_capacity(10);
        for p in line(9, 0.05) { buf.push(p); }
        assert_eq!(buf.displacement(), None);
        assert_eq!(buf.curvature(), None);
    }

    #[test]
    fn straight_line_has_zero_curvature() {
        let mut buf = TrajectoryBuffer::with_capacity(11);
        for p in line(11, 0.05) { buf.push(p); }
        let c = buf.curvature().unwrap();
        assert!(c.abs() < 1e-6, "curvature of a line should vanish, got {}", c);
        assert!((buf.displacement().unwrap().x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn arc_has_positive_curvature() {
        let mut buf = TrajectoryBuffer::with_capacity(10);
        for i in 0..10 {
            let t = std::f32::consts::PI * i as f32 / 9.0;
            buf.push(Point3::planar(0.5 - 0.2 * t.cos(), 0.5 - 0.2 * t.sin()));
        }
        assert!(buf.curvature().unwrap() > 0.1);
    }

    #[test]
    fn iter_is_oldest_first() {
        let mut buf = TrajectoryBuffer::with_capacity(3);
        for i in 0..5 { buf.push(Point3::planar(i as f32, 0.0)); }
        let xs: Vec<f32> = buf.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }
}
