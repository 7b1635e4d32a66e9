//! Wrist motion analysis.
//!
//! Two strategies sit behind [`MotionAnalyzer`]:
//!
//! * [`MovementDetector`] — a yes/no "is the conductor moving" flag.
//! * [`SpeedTracker`] — a running speed with a direction-reversal latch,
//!   feeding the speed-tier feedback.
//!
//! Both only look at the trajectory once it is full, and both only update on
//! [`Gesture::ConductorsGesture`] frames.

use serde::Serialize;

use crate::classifier::Gesture;
use crate::config::{SessionConfig, Variant};
use crate::trajectory::TrajectoryBuffer;

// ════════════════════════════════════════════════════════════════════════════
// Direction
// ════════════════════════════════════════════════════════════════════════════

/// Horizontal sign of a sweep.  `Still` is its own sign, so going from a
/// rightward sweep to no horizontal motion counts as a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Left,
    Still,
    Right,
}

impl Direction {
    pub fn of(dx: f32) -> Self {
        if dx > 0.0 {
            Direction::Right
        } else if dx < 0.0 {
            Direction::Left
        } else {
            Direction::Still
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MotionReading
// ════════════════════════════════════════════════════════════════════════════

/// What an analyzer currently believes about the conductor's motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MotionReading {
    Moving { moving: bool },
    Speed {
        value: f32,
        /// True only on the frame where `value` was recomputed.
        updated: bool,
    },
}

impl MotionReading {
    pub fn is_moving(&self) -> bool {
        matches!(self, MotionReading::Moving { moving: true })
    }

    /// Freshly computed speed this frame, if any.
    pub fn fresh_speed(&self) -> Option<f32> {
        match *self {
            MotionReading::Speed { value, updated: true } => Some(value),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MotionAnalyzer trait
// ════════════════════════════════════════════════════════════════════════════

/// Per-frame motion strategy.
pub trait MotionAnalyzer {
    /// Fold one classified frame into the analyzer and return its reading.
    fn update(&mut self, gesture: Gesture, trajectory: &TrajectoryBuffer) -> MotionReading;

    /// Current reading without advancing (used on "no hand" frames).
    fn reading(&self) -> MotionReading;

    fn reset(&mut self);
}

/// Pick the strategy configured for the session.
pub fn analyzer_for(config: &SessionConfig) -> Box<dyn MotionAnalyzer> {
    match config.variant {
        Variant::GestureVocabulary => Box::new(MovementDetector::new(config.movement_threshold)),
        Variant::SpeedFeedback     => Box::new(SpeedTracker::new()),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MovementDetector — binary moving flag
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct MovementDetector {
    threshold:        f32,
    conductor_moving: bool,
}

impl MovementDetector {
    pub fn new(threshold: f32) -> Self {
        MovementDetector { threshold, conductor_moving: false }
    }
}

impl MotionAnalyzer for MovementDetector {
    fn update(&mut self, gesture: Gesture, trajectory: &TrajectoryBuffer) -> MotionReading {
        if gesture != Gesture::ConductorsGesture {
            self.conductor_moving = false;
        } else if let Some(d) = trajectory.displacement() {
            self.conductor_moving = d.norm() > self.threshold;
        }
        self.reading()
    }

    fn reading(&self) -> MotionReading {
        MotionReading::Moving { moving: self.conductor_moving }
    }

    fn reset(&mut self) {
        self.conductor_moving = false;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SpeedTracker — speed with reversal latch
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct SpeedTracker {
    conductor_speed: f32,
    last_direction:  Option<Direction>,
    updated:         bool,
}

impl SpeedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the tracker, e.g. to resume from a known state.
    pub fn with_state(conductor_speed: f32, last_direction: Option<Direction>) -> Self {
        SpeedTracker { conductor_speed, last_direction, updated: false }
    }

    pub fn conductor_speed(&self) -> f32 { self.conductor_speed }
    pub fn last_direction(&self) -> Option<Direction> { self.last_direction }

    /// Fold in one full-window sweep `(dx, dy)`.
    ///
    /// On a direction reversal the higher of the old and new magnitudes is
    /// kept; otherwise the new magnitude replaces the old.
    fn fold(&mut self, dx: f32, dy: f32) {
        let magnitude = (dx * dx + dy * dy).sqrt();
        let direction = Direction::of(dx);
        let reversed = matches!(self.last_direction, Some(prev) if prev != direction);
        self.conductor_speed = if reversed {
            self.conductor_speed.max(magnitude)
        } else {
            magnitude
        };
        self.last_direction = Some(direction);
    }
}

impl MotionAnalyzer for SpeedTracker {
    fn update(&mut self, gesture: Gesture, trajectory: &TrajectoryBuffer) -> MotionReading {
        self.updated = false;
        if gesture == Gesture::ConductorsGesture {
            if let Some(d) = trajectory.displacement() {
                self.fold(d.x, d.y);
                self.updated = true;
            }
        }
        self.reading()
    }

    fn reading(&self) -> MotionReading {
        MotionReading::Speed { value: self.conductor_speed, updated: self.updated }
    }

    fn reset(&mut self) {
        *self = SpeedTracker::default();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Point3;

    /// Full 10-sample window from `from` to `to` in a straight line.
    fn sweep(from: (f32, f32), to: (f32, f32)) -> TrajectoryBuffer {
        let mut buf = TrajectoryBuffer::with_capacity(10);
        for i in 0..10 {
            let t = i as f32 / 9.0;
            buf.push(Point3::planar(
                from.0 + (to.0 - from.0) * t,
                from.1 + (to.1 - from.1) * t,
            ));
        }
        buf
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::of(0.2), Direction::Right);
        assert_eq!(Direction::of(-0.2), Direction::Left);
        assert_eq!(Direction::of(0.0), Direction::Still);
    }

    #[test]
    fn moving_flag_set_above_threshold() {
        let mut m = MovementDetector::new(0.03);
        let r = m.update(Gesture::ConductorsGesture, &sweep((0.2, 0.5), (0.4, 0.5)));
        assert!(r.is_moving());
    }

    #[test]
    fn moving_flag_retained_on_partial_window() {
        let mut m = MovementDetector::new(0.03);
        m.update(Gesture::ConductorsGesture, &sweep((0.2, 0.5), (0.4, 0.5)));
        let mut partial = TrajectoryBuffer::with_capacity(10);
        partial.push(Point3::planar(0.5, 0.5));
        assert!(m.update(Gesture::ConductorsGesture, &partial).is_moving());
    }

    #[test]
    fn moving_flag_forced_off_by_other_labels() {
        let mut m = MovementDetector::new(0.03);
        let buf = sweep((0.2, 0.5), (0.4, 0.5));
        m.update(Gesture::ConductorsGesture, &buf);
        assert!(!m.update(Gesture::OpenPalm, &buf).is_moving());
    }

    #[test]
    fn small_sweep_is_not_moving() {
        let mut m = MovementDetector::new(0.03);
        let r = m.update(Gesture::ConductorsGesture, &sweep((0.5, 0.5), (0.51, 0.51)));
        assert!(!r.is_moving());
    }

    #[test]
    fn speed_replaced_without_reversal() {
        let mut s = SpeedTracker::with_state(0.3, Some(Direction::Right));
        let r = s.update(Gesture::ConductorsGesture, &sweep((0.2, 0.5), (0.3, 0.5)));
        assert!((r.fresh_speed().unwrap() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn reversal_latches_higher_speed() {
        let mut s = SpeedTracker::with_state(0.05, Some(Direction::Right));
        let r = s.update(Gesture::ConductorsGesture, &sweep((0.54, 0.5), (0.5, 0.5)));
        assert!((r.fresh_speed().unwrap() - 0.05).abs() < 1e-6);
        assert_eq!(s.last_direction(), Some(Direction::Left));
    }

    #[test]
    fn reversal_takes_new_speed_when_faster() {
        let mut s = SpeedTracker::with_state(0.05, Some(Direction::Right));
        s.update(Gesture::ConductorsGesture, &sweep((0.7, 0.5), (0.4, 0.5)));
        assert!((s.conductor_speed() - 0.3).abs() < 1e-5);
    }

    #[test]
    fn speed_untouched_on_partial_window_or_other_label() {
        let mut s = SpeedTracker::with_state(0.2, Some(Direction::Left));
        let mut partial = TrajectoryBuffer::with_capacity(10);
        partial.push(Point3::planar(0.5, 0.5));
        let r = s.update(Gesture::ConductorsGesture, &partial);
        assert_eq!(r, MotionReading::Speed { value: 0.2, updated: false });
        let r = s.update(Gesture::Unrecognized, &sweep((0.1, 0.1), (0.9, 0.9)));
        assert_eq!(r, MotionReading::Speed { value: 0.2, updated: false });
        assert_eq!(s.last_direction(), Some(Direction::Left));
    }

    #[test]
    fn first_sweep_has_no_reversal() {
        let mut s = SpeedTracker::new();
        s.update(Gesture::ConductorsGesture, &sweep((0.5, 0.5), (0.45, 0.5)));
        assert!((s.conductor_speed() - 0.05).abs() < 1e-5);
    }
}
