//! Per-frame pipeline.
//!
//! `ConductorSession` owns everything that persists between frames (the
//! trajectory, the previous label, the motion strategy's state, the feedback
//! timers) and runs one frame at a time:
//!
//! ```text
//! normalize → count fingers → push wrist → classify → fist side effects
//!           → motion update → speed feedback → timed message
//! ```
//!
//! A frame without a hand leaves all of that untouched; only the timed
//! message keeps ageing.

use std::time::Instant;

use serde::Serialize;

use crate::classifier::{Classification, Gesture, GestureClassifier};
use crate::config::{SessionConfig, Variant};
use crate::feedback::{Feedback, SpeedFeedback, TimedMessage, NOT_MY_TEMPO};
use crate::landmark::{normalize, open_finger_count, Point3, RawHand};
use crate::motion::{analyzer_for, MotionAnalyzer, MotionReading};
use crate::trajectory::TrajectoryBuffer;

// ════════════════════════════════════════════════════════════════════════════
// FrameReport
// ════════════════════════════════════════════════════════════════════════════

/// Everything a renderer needs for one frame.  Pure data.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    /// Index of this frame since the session started.
    pub frame:          u64,
    pub hand_detected:  bool,
    /// Label for this frame; `None` when no hand was seen.
    pub gesture:        Option<Gesture>,
    pub open_fingers:   Option<u8>,
    pub motion:         MotionReading,
    /// Speed tier or timed message.  A live timed message wins.
    pub feedback:       Option<Feedback>,
    /// `last − first` over a full trajectory, for the motion-vector overlay.
    pub displacement:   Option<Point3>,
    pub trajectory_len: usize,
}

// ════════════════════════════════════════════════════════════════════════════
// ConductorSession
// ════════════════════════════════════════════════════════════════════════════

pub struct ConductorSession {
    config:     SessionConfig,
    trajectory: TrajectoryBuffer,
    classifier: GestureClassifier,
    motion:     Box<dyn MotionAnalyzer>,
    speed:      SpeedFeedback,
    message:    TimedMessage,
    frames:     u64,
}

impl ConductorSession {
    pub fn new(config: SessionConfig) -> Self {
        let trajectory = TrajectoryBuffer::with_capacity(config.trajectory_length);
        let classifier = GestureClassifier::new(
            config.finger_set(),
            config.movement_threshold,
            config.curvature_threshold,
        );
        let motion  = analyzer_for(&config);
        let speed   = SpeedFeedback::new(config.speed_threshold, config.speedy_threshold);
        let message = TimedMessage::new(NOT_MY_TEMPO, config.message_duration());

        log::debug!(
            "session started: variant={} window={} dims={:?}",
            config.variant.name(), config.trajectory_length, config.dimensions()
        );

        ConductorSession {
            config,
            trajectory,
            classifier,
            motion,
            speed,
            message,
            frames: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig { &self.config }
    pub fn trajectory(&self) -> &TrajectoryBuffer { &self.trajectory }
    pub fn last_gesture(&self) -> Option<Gesture> { self.classifier.last_gesture() }
    pub fn reading(&self) -> MotionReading { self.motion.reading() }
    pub fn frames(&self) -> u64 { self.frames }

    /// Process one input frame.  `hand` is the detector's single hand, if any;
    /// `now` is the frame's capture time.
    pub fn process_frame(&mut self, hand: Option<&RawHand>, now: Instant) -> FrameReport {
        let index = self.frames;
        self.frames += 1;

        let Some(frame) = normalize(hand, self.config.min_confidence) else {
            return self.idle_report(index, now);
        };

        let open = open_finger_count(&frame, self.config.finger_set());
        self.trajectory.push(frame.wrist.project(self.config.dimensions()));

        let classification = self.classifier.classify(open, &self.trajectory);
        self.apply_transition(&classification, now);

        let gesture = classification.gesture;
        let motion = self.motion.update(gesture, &self.trajectory);
        let speed = match self.config.variant {
            Variant::SpeedFeedback     => self.speed.update(gesture, motion.fresh_speed()),
            Variant::GestureVocabulary => None,
        };
        let timed = self.message.poll(now);

        FrameReport {
            frame:          index,
            hand_detected:  true,
            gesture:        Some(gesture),
            open_fingers:   Some(open),
            motion,
            feedback:       timed.or(speed),
            displacement:   self.trajectory.displacement(),
            trajectory_len: self.trajectory.len(),
        }
    }

    /// Drop all history, as on a fresh start.
    pub fn reset(&mut self) {
        self.trajectory.clear();
        self.classifier.reset();
        self.motion.reset();
        self.speed.reset();
        self.message.reset();
        log::debug!("session reset after {} frames", self.frames);
    }

    fn apply_transition(&mut self, c: &Classification, now: Instant) {
        if c.changed() {
            log::debug!(
                "gesture: {} -> {}",
                c.previous.map(Gesture::label).unwrap_or("none"),
                c.gesture
            );
        }
        if c.gesture == Gesture::Fist {
            self.trajectory.clear();
            if c.is_fist_after_arc() {
                log::info!("fist after semicircle: showing \"{}\"", NOT_MY_TEMPO);
                self.message.arm(now);
            }
        }
    }

    fn idle_report(&mut self, index: u64, now: Instant) -> FrameReport {
        let speed = match self.config.variant {
            Variant::SpeedFeedback     => self.speed.feedback(),
            Variant::GestureVocabulary => None,
        };
        FrameReport {
            frame:          index,
            hand_detected:  false,
            gesture:        None,
            open_fingers:   None,
            motion:         stale(self.motion.reading()),
            feedback:       self.message.poll(now).or(speed),
            displacement:   self.trajectory.displacement(),
            trajectory_len: self.trajectory.len(),
        }
    }
}

/// The analyzer's last reading, without claiming a fresh measurement.
fn stale(reading: MotionReading) -> MotionReading {
    match reading {
        MotionReading::Speed { value, .. } => MotionReading::Speed { value, updated: false },
        other => other,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{synthetic_hand, Finger};
    use std::time::Duration;

    const CONDUCTOR: &[Finger] = &[Finger::Index, Finger::Middle];
    const PALM: &[Finger] = &[Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];
    const FIST: &[Finger] = &[];

    fn ms(t0: Instant, n: u64) -> Instant {
        t0 + Duration::from_millis(n)
    }

    /// Wrist positions along a half circle, `n` samples.
    fn arc_points(n: usize) -> Vec<Point3> {
        (0..n)
            .map(|i| {
                let t = std::f32::consts::PI * i as f32 / (n - 1) as f32;
                Point3::new(0.5 - 0.2 * t.cos(), 0.5 - 0.2 * t.sin(), 0.0)
            })
            .collect()
    }

    #[test]
    fn no_hand_leaves_state_untouched() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::default());
        s.process_frame(Some(&synthetic_hand(Point3::planar(0.5, 0.5), CONDUCTOR)), t0);
        let r = s.process_frame(None, ms(t0, 33));
        assert!(!r.hand_detected);
        assert_eq!(r.gesture, None);
        assert_eq!(s.trajectory().len(), 1);
        assert_eq!(s.last_gesture(), Some(Gesture::ConductorsGesture));
        assert_eq!(r.frame, 1);
    }

    #[test]
    fn fist_clears_full_buffer() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::default());
        for i in 0..10 {
            let hand = synthetic_hand(Point3::planar(0.3 + 0.01 * i as f32, 0.5), PALM);
            s.process_frame(Some(&hand), ms(t0, i * 33));
        }
        assert!(s.trajectory().is_full());
        let r = s.process_frame(Some(&synthetic_hand(Point3::planar(0.4, 0.5), FIST)), ms(t0, 400));
        assert_eq!(r.open_fingers, Some(0));
        assert_eq!(r.gesture, Some(Gesture::Fist));
        assert_eq!(r.trajectory_len, 0);
        assert_eq!(r.displacement, None);
    }

    #[test]
    fn semicircle_then_fist_arms_message_once() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::default());
        let mut t = 0;
        let mut last = None;
        for p in arc_points(10) {
            last = Some(s.process_frame(Some(&synthetic_hand(p, PALM)), ms(t0, t)));
            t += 10;
        }
        assert_eq!(last.unwrap().gesture, Some(Gesture::SemiCircularMotion));

        // Frame 1 of the fist: message armed at t_arm.
        let t_arm = t;
        let fist = synthetic_hand(Point3::planar(0.7, 0.5), FIST);
        let r = s.process_frame(Some(&fist), ms(t0, t_arm));
        assert_eq!(r.feedback.as_ref().map(|f| f.text), Some(NOT_MY_TEMPO));
        assert_eq!(r.feedback.unwrap().remaining, Some(Duration::from_secs(1)));

        // Frames 2–5 keep showing it but never restart the clock.
        for k in 1..5u64 {
            let r = s.process_frame(Some(&fist), ms(t0, t_arm + k * 200));
            let f = r.feedback.expect("message still live");
            assert_eq!(f.remaining, Some(Duration::from_millis(1000 - k * 200)));
        }

        // Exactly one time unit after arming it is gone.
        let r = s.process_frame(Some(&fist), ms(t0, t_arm + 1000));
        assert!(r.feedback.is_none());
    }

    #[test]
    fn timed_message_ages_through_no_hand_frames() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::default());
        for (i, p) in arc_points(10).into_iter().enumerate() {
            s.process_frame(Some(&synthetic_hand(p, PALM)), ms(t0, i as u64));
        }
        s.process_frame(Some(&synthetic_hand(Point3::planar(0.7, 0.5), FIST)), ms(t0, 100));
        assert!(s.process_frame(None, ms(t0, 600)).feedback.is_some());
        assert!(s.process_frame(None, ms(t0, 1100)).feedback.is_none());
    }

    #[test]
    fn straight_sweep_is_never_semicircle() {
        // Samples on a line with sample 5 exactly halfway between the ends.
        let ts = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.7, 0.8, 0.9, 1.0];
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::default());
        let mut r = None;
        for (i, t) in ts.iter().enumerate() {
            let p = Point3::planar(0.1 + 0.8 * t, 0.2 + 0.6 * t);
            r = Some(s.process_frame(Some(&synthetic_hand(p, PALM)), ms(t0, i as u64)));
        }
        let r = r.unwrap();
        assert!(s.trajectory().curvature().unwrap() < 1e-5);
        assert!(r.displacement.unwrap().norm() > 0.9);
        assert_eq!(r.gesture, Some(Gesture::OpenPalm));
    }

    #[test]
    fn conductor_moving_needs_full_window() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::default());
        for i in 0..9 {
            let p = Point3::planar(0.2 + 0.05 * i as f32, 0.5);
            let r = s.process_frame(Some(&synthetic_hand(p, CONDUCTOR)), ms(t0, i));
            assert!(!r.motion.is_moving());
            assert_eq!(r.displacement, None);
        }
        let r = s.process_frame(Some(&synthetic_hand(Point3::planar(0.65, 0.5), CONDUCTOR)), ms(t0, 9));
        assert!(r.motion.is_moving());
        assert!(r.displacement.is_some());
    }

    #[test]
    fn depth_counts_in_spatial_mode() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::default());
        let mut r = None;
        for i in 0..10 {
            let p = Point3::new(0.5, 0.5, -0.01 * i as f32);
            r = Some(s.process_frame(Some(&synthetic_hand(p, CONDUCTOR)), ms(t0, i)));
        }
        assert!(r.unwrap().motion.is_moving());
    }

    #[test]
    fn speed_variant_reports_tiers_and_blanks() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::for_variant(Variant::SpeedFeedback));
        let mut r = None;
        for i in 0..10 {
            // 0.3 across the window → "Good Boy!"
            let p = Point3::new(0.2 + 0.3 * i as f32 / 9.0, 0.5, 0.4);
            r = Some(s.process_frame(Some(&synthetic_hand(p, CONDUCTOR)), ms(t0, i)));
        }
        let r = r.unwrap();
        assert_eq!(r.feedback.unwrap().text, "Good Boy!");
        assert_eq!(r.displacement.unwrap().z, 0.0);

        // No hand: the message stays up, the speed is not re-measured.
        let idle = s.process_frame(None, ms(t0, 20));
        assert_eq!(idle.feedback.unwrap().text, "Good Boy!");
        assert_eq!(idle.motion.fresh_speed(), None);

        // One finger: blanked, and there is no fist in this vocabulary.
        let r = s.process_frame(Some(&synthetic_hand(Point3::planar(0.5, 0.5), &[Finger::Index])), ms(t0, 21));
        assert_eq!(r.gesture, Some(Gesture::Unrecognized));
        assert!(r.feedback.is_none());
        assert_eq!(r.trajectory_len, 10);
    }

    #[test]
    fn speed_variant_never_arms_timed_message() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::for_variant(Variant::SpeedFeedback));
        for (i, p) in arc_points(10).into_iter().enumerate() {
            s.process_frame(Some(&synthetic_hand(p, PALM)), ms(t0, i as u64));
        }
        let r = s.process_frame(Some(&synthetic_hand(Point3::planar(0.5, 0.5), FIST)), ms(t0, 11));
        assert_eq!(r.gesture, Some(Gesture::Unrecognized));
        assert!(r.feedback.is_none());
    }

    #[test]
    fn reset_forgets_everything() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::default());
        for i in 0..10 {
            s.process_frame(Some(&synthetic_hand(Point3::planar(0.5, 0.5), CONDUCTOR)), ms(t0, i));
        }
        s.reset();
        assert!(s.trajectory().is_empty());
        assert_eq!(s.last_gesture(), None);
        assert!(!s.reading().is_moving());
    }

    #[test]
    fn report_serializes_to_json() {
        let t0 = Instant::now();
        let mut s = ConductorSession::new(SessionConfig::default());
        let r = s.process_frame(Some(&synthetic_hand(Point3::planar(0.5, 0.5), CONDUCTOR)), t0);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["gesture"], "ConductorsGesture");
        assert_eq!(v["motion"]["kind"], "moving");
        assert_eq!(v["open_fingers"], 2);
    }
}
