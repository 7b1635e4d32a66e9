//! Landmark extraction and finger-state evaluation.
//!
//! The external detector hands us, per frame, zero or one [`RawHand`]: 21
//! normalized points in image coordinates (origin top-left, `y` grows
//! downward).  [`normalize`] pulls out the handful of joints the classifier
//! cares about, and [`open_finger_count`] turns fingertip/pip pairs into the
//! integer the gesture state machine runs on.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Point3
// ════════════════════════════════════════════════════════════════════════════

/// A normalized landmark position.  `z` is the detector's relative depth and
/// is only meaningful in [`Dimensions::Spatial`] mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Point3 { x, y, z }
    }

    pub fn planar(x: f32, y: f32) -> Self {
        Point3 { x, y, z: 0.0 }
    }

    pub fn scale(self, k: f32) -> Self {
        Point3 { x: self.x * k, y: self.y * k, z: self.z * k }
    }

    /// Euclidean length.
    pub fn norm(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Point3) -> f32 {
        (self - other).norm()
    }

    pub fn midpoint(self, other: Point3) -> Point3 {
        (self + other).scale(0.5)
    }

    /// Drop depth when running in planar mode.
    pub fn project(self, dims: Dimensions) -> Point3 {
        match dims {
            Dimensions::Planar  => Point3 { z: 0.0, ..self },
            Dimensions::Spatial => self,
        }
    }
}

impl Add for Point3 {
    type Output = Point3;
    fn add(self, rhs: Point3) -> Point3 {
        Point3 { x: self.x + rhs.x, y: self.y + rhs.y, z: self.z + rhs.z }
    }
}

impl Sub for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Point3) -> Point3 {
        Point3 { x: self.x - rhs.x, y: self.y - rhs.y, z: self.z - rhs.z }
    }
}

/// Which coordinates of the wrist feed the trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimensions {
    /// `(x, y)` only.
    Planar,
    /// `(x, y, z)`.
    Spatial,
}

// ════════════════════════════════════════════════════════════════════════════
// HandJoint — MediaPipe hand landmark indices
// ════════════════════════════════════════════════════════════════════════════

/// Landmark slots of the 21-point hand model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum HandJoint {
    Wrist       = 0,
    ThumbCmc    = 1,
    ThumbMcp    = 2,
    ThumbIp     = 3,
    ThumbTip    = 4,
    IndexMcp    = 5,
    IndexPip    = 6,
    IndexDip    = 7,
    IndexTip    = 8,
    MiddleMcp   = 9,
    MiddlePip   = 10,
    MiddleDip   = 11,
    MiddleTip   = 12,
    RingMcp     = 13,
    RingPip     = 14,
    RingDip     = 15,
    RingTip     = 16,
    PinkyMcp    = 17,
    PinkyPip    = 18,
    PinkyDip    = 19,
    PinkyTip    = 20,
}

/// Number of points in a complete detector hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

impl HandJoint {
    pub fn index(self) -> usize { self as usize }
}

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

/// The four tracked fingers.  The thumb is never evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// `(tip, pip)` joints for this finger.
    pub fn joints(self) -> (HandJoint, HandJoint) {
        match self {
            Finger::Index  => (HandJoint::IndexTip,  HandJoint::IndexPip),
            Finger::Middle => (HandJoint::MiddleTip, HandJoint::MiddlePip),
            Finger::Ring   => (HandJoint::RingTip,   HandJoint::RingPip),
            Finger::Pinky  => (HandJoint::PinkyTip,  HandJoint::PinkyPip),
        }
    }

    fn slot(self) -> usize {
        match self {
            Finger::Index  => 0,
            Finger::Middle => 1,
            Finger::Ring   => 2,
            Finger::Pinky  => 3,
        }
    }
}

/// Which fingers count toward the open-finger total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FingerSet {
    /// Index and middle.
    Pair,
    /// Index, middle, ring and pinky.
    Quad,
}

impl FingerSet {
    pub fn fingers(self) -> &'static [Finger] {
        match self {
            FingerSet::Pair => &Finger::ALL[..2],
            FingerSet::Quad => &Finger::ALL,
        }
    }

    pub fn len(self) -> usize { self.fingers().len() }
}

// ════════════════════════════════════════════════════════════════════════════
// RawHand — detector output
// ════════════════════════════════════════════════════════════════════════════

/// One hand as reported by the landmark detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawHand {
    /// Detector-specific "Left" / "Right".
    #[serde(default)]
    pub handedness: String,
    /// Detection confidence 0.0–1.0.
    #[serde(default = "full_confidence")]
    pub score: f32,
    pub landmarks: Vec<Point3>,
}

fn full_confidence() -> f32 { 1.0 }

impl RawHand {
    pub fn new(landmarks: Vec<Point3>, score: f32) -> Self {
        RawHand { handedness: String::new(), score, landmarks }
    }

    pub fn joint(&self, joint: HandJoint) -> Option<Point3> {
        self.landmarks.get(joint.index()).copied()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkFrame — the normalized per-frame view
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FingerJoints {
    pub tip: Point3,
    pub pip: Point3,
}

impl FingerJoints {
    /// Image `y` grows downward, so an extended finger has its tip above
    /// (strictly smaller `y` than) its pip joint.
    pub fn is_open(&self) -> bool {
        self.tip.y < self.pip.y
    }
}

/// The named points the classifier reads from one detected hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkFrame {
    pub wrist:   Point3,
    pub fingers: [FingerJoints; 4],
}

impl LandmarkFrame {
    pub fn finger(&self, finger: Finger) -> &FingerJoints {
        &self.fingers[finger.slot()]
    }
}

/// Extract a [`LandmarkFrame`] from the detector output for this frame.
///
/// Returns `None` ("no hand") when nothing was detected, when the detection
/// is below `min_confidence`, or when the hand is missing landmarks.
pub fn normalize(hand: Option<&RawHand>, min_confidence: f32) -> Option<LandmarkFrame> {
    let hand = hand?;
    if hand.score < min_confidence {
        log::trace!("hand below confidence ({:.2} < {:.2})", hand.score, min_confidence);
        return None;
    }
    if hand.landmarks.len() < HAND_LANDMARK_COUNT {
        log::warn!(
            "Expected {} landmarks, got {}; treating frame as no hand",
            HAND_LANDMARK_COUNT, hand.landmarks.len()
        );
        return None;
    }

    let pick = |j: HandJoint| hand.landmarks[j.index()];
    let pair = |f: Finger| {
        let (tip, pip) = f.joints();
        FingerJoints { tip: pick(tip), pip: pick(pip) }
    };

    Some(LandmarkFrame {
        wrist:   pick(HandJoint::Wrist),
        fingers: Finger::ALL.map(pair),
    })
}

/// Number of open fingers among `set`, in `0..=set.len()`.
pub fn open_finger_count(frame: &LandmarkFrame, set: FingerSet) -> u8 {
    set.fingers()
        .iter()
        .filter(|&&f| frame.finger(f).is_open())
        .count() as u8
}

// ════════════════════════════════════════════════════════════════════════════
// Synthetic hands (demo binary, simulation source, tests)
// ════════════════════════════════════════════════════════════════════════════

/// Build a plausible 21-point hand with its wrist at `wrist` and exactly the
/// fingers in `open` raised.  Closed fingers have their tips folded below the
/// pip joint.
pub fn synthetic_hand(wrist: Point3, open: &[Finger]) -> RawHand {
    const PALM: f32 = 0.10;
    const PHALANX: f32 = 0.03;

    let mut pts = vec![wrist; HAND_LANDMARK_COUNT];
    let spread = [-0.03_f32, -0.01, 0.01, 0.03];

    for (slot, finger) in Finger::ALL.iter().enumerate() {
        let x = wrist.x + spread[slot];
        let mcp_y = wrist.y - PALM;
        let pip_y = mcp_y - PHALANX;
        let extended = open.contains(finger);
        let (dip_y, tip_y) = if extended {
            (pip_y - PHALANX, pip_y - 2.0 * PHALANX)
        } else {
            (pip_y + PHALANX * 0.5, pip_y + PHALANX)
        };
        let base = 5 + slot * 4;
        pts[base]     = Point3::new(x, mcp_y, wrist.z);
        pts[base + 1] = Point3::new(x, pip_y, wrist.z);
        pts[base + 2] = Point3::new(x, dip_y, wrist.z);
        pts[base + 3] = Point3::new(x, tip_y, wrist.z);
    }

    // Thumb: resting to the side, irrelevant to the count.
    for (i, slot) in (1..=4).enumerate() {
        pts[slot] = Point3::new(wrist.x - 0.04 - 0.01 * i as f32, wrist.y - 0.02 * i as f32, wrist.z);
    }

    RawHand { handedness: "Right".into(), score: 0.95, landmarks: pts }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
