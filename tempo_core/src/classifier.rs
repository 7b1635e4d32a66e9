//! Gesture state machine.
//!
//! The label for a frame is a function of the open-finger count, plus the
//! trajectory geometry for the open-palm family.  The only memory the
//! classifier keeps is the previous frame's label, which is what makes the
//! "fist right after a semicircle" transition detectable.

use serde::Serialize;

use crate::landmark::FingerSet;
use crate::trajectory::TrajectoryBuffer;

// ════════════════════════════════════════════════════════════════════════════
// Tone — display colour hint carried alongside labels and messages
// ════════════════════════════════════════════════════════════════════════════

/// Colour a renderer should use for a label or message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    Cyan,
    Green,
    Blue,
    Red,
    Yellow,
    White,
}

impl Tone {
    /// Packed `0xAARRGGBB`.
    pub fn argb(self) -> u32 {
        match self {
            Tone::Cyan   => 0xFF00FFFF,
            Tone::Green  => 0xFF00FF00,
            Tone::Blue   => 0xFF3060FF,
            Tone::Red    => 0xFFFF3030,
            Tone::Yellow => 0xFFFFFF00,
            Tone::White  => 0xFFFFFFFF,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Gesture
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Gesture {
    /// Exactly two fingers raised.
    ConductorsGesture,
    /// Three or more fingers raised, no arc.
    OpenPalm,
    /// Open palm sweeping through a wide arc.
    SemiCircularMotion,
    /// Zero or one finger raised (four-finger vocabulary only).
    Fist,
    /// Anything else in the two-finger vocabulary.
    Unrecognized,
}

impl Gesture {
    pub fn label(self) -> &'static str {
        match self {
            Gesture::ConductorsGesture  => "Conductor's Gesture",
            Gesture::OpenPalm           => "Open Palm",
            Gesture::SemiCircularMotion => "Semi-Circular Motion",
            Gesture::Fist               => "Fist",
            Gesture::Unrecognized       => "Unrecognized",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Gesture::ConductorsGesture  => Tone::Cyan,
            Gesture::OpenPalm           => Tone::Green,
            Gesture::SemiCircularMotion => Tone::Blue,
            Gesture::Fist               => Tone::Red,
            Gesture::Unrecognized       => Tone::White,
        }
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of classifying one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub gesture:  Gesture,
    /// Label of the previous frame with a hand, if any.
    pub previous: Option<Gesture>,
}

impl Classification {
    /// A fist closing right after a semicircle: the cue for the timed message.
    pub fn is_fist_after_arc(&self) -> bool {
        self.gesture == Gesture::Fist && self.previous == Some(Gesture::SemiCircularMotion)
    }

    /// True when the label differs from the previous frame's.
    pub fn changed(&self) -> bool {
        self.previous != Some(self.gesture)
    }
}

#[derive(Clone, Debug)]
pub struct GestureClassifier {
    vocabulary:          FingerSet,
    movement_threshold:  f32,
    curvature_threshold: f32,
    last_gesture:        Option<Gesture>,
}

impl GestureClassifier {
    pub fn new(vocabulary: FingerSet, movement_threshold: f32, curvature_threshold: f32) -> Self {
        GestureClassifier {
            vocabulary,
            movement_threshold,
            curvature_threshold,
            last_gesture: None,
        }
    }

    pub fn last_gesture(&self) -> Option<Gesture> { self.last_gesture }

    /// Label this frame and remember it for the next one.
    ///
    /// The buffer is only read here; clearing it on [`Gesture::Fist`] is the
    /// caller's job, done right after classification.
    pub fn classify(&mut self, open_fingers: u8, trajectory: &TrajectoryBuffer) -> Classification {
        let gesture = self.label_for(open_fingers, trajectory);
        let previous = self.last_gesture.replace(gesture);
        Classification { gesture, previous }
    }

    pub fn reset(&mut self) {
        self.last_gesture = None;
    }

    fn label_for(&self, open_fingers: u8, trajectory: &TrajectoryBuffer) -> Gesture {
        match (self.vocabulary, open_fingers) {
            (_, 2) => Gesture::ConductorsGesture,
            (FingerSet::Pair, _) => Gesture::Unrecognized,
            (FingerSet::Quad, n) if n >= 3 => {
                if self.is_arc(trajectory) {
                    Gesture::SemiCircularMotion
                } else {
                    Gesture::OpenPalm
                }
            }
            (FingerSet::Quad, _) => Gesture::Fist,
        }
    }

    fn is_arc(&self, trajectory: &TrajectoryBuffer) -> bool {
        match (trajectory.displacement(), trajectory.curvature()) {
            (Some(d), Some(c)) => d.norm() > self.movement_threshold && c > self.curvature_threshold,
            _ => false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
