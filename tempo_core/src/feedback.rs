//! Feedback messages shown to the conductor.
//!
//! * [`SpeedFeedback`] — a continuous speed-tier message, recomputed every
//!   time a fresh speed is available and blanked when the hand leaves the
//!   conductor's pose.
//! * [`TimedMessage`] — a one-shot message with a fixed lifetime, armed by a
//!   gesture transition.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::classifier::{Gesture, Tone};

/// One line of feedback for the renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Feedback {
    pub text: &'static str,
    pub tone: Tone,
    /// Time left on screen for timed messages; `None` for continuous ones.
    #[serde(with = "opt_secs")]
    pub remaining: Option<Duration>,
}

// ════════════════════════════════════════════════════════════════════════════
// SpeedTier
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SpeedTier {
    Faster,
    EvenFaster,
    GoodBoy,
}

impl SpeedTier {
    /// Both thresholds are strict upper bounds: a speed exactly at a
    /// threshold lands in the tier above it.
    pub fn classify(speed: f32, speed_threshold: f32, speedy_threshold: f32) -> Self {
        if speed < speed_threshold {
            SpeedTier::Faster
        } else if speed < speedy_threshold {
            SpeedTier::EvenFaster
        } else {
            SpeedTier::GoodBoy
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SpeedTier::Faster     => "Faster!",
            SpeedTier::EvenFaster => "Even Faster!",
            SpeedTier::GoodBoy    => "Good Boy!",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            SpeedTier::Faster | SpeedTier::EvenFaster => Tone::Red,
            SpeedTier::GoodBoy                        => Tone::Green,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SpeedFeedback
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct SpeedFeedback {
    speed_threshold:  f32,
    speedy_threshold: f32,
    current:          Option<SpeedTier>,
}

impl SpeedFeedback {
    pub fn new(speed_threshold: f32, speedy_threshold: f32) -> Self {
        SpeedFeedback { speed_threshold, speedy_threshold, current: None }
    }

    pub fn tier(&self) -> Option<SpeedTier> { self.current }

    /// Fold in one frame with a hand.  `fresh_speed` is `Some` only when the
    /// analyzer recomputed the speed this frame; otherwise the last message
    /// stays up (unless the pose changed).
    pub fn update(&mut self, gesture: Gesture, fresh_speed: Option<f32>) -> Option<Feedback> {
        if gesture != Gesture::ConductorsGesture {
            self.current = None;
        } else if let Some(speed) = fresh_speed {
            self.current = Some(SpeedTier::classify(speed, self.speed_threshold, self.speedy_threshold));
        }
        self.feedback()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.current.map(|tier| Feedback {
            text:      tier.message(),
            tone:      tier.tone(),
            remaining: None,
        })
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TimedMessage
// ════════════════════════════════════════════════════════════════════════════

pub const NOT_MY_TEMPO: &str = "Not Quite My Tempo";

#[derive(Clone, Debug)]
pub struct TimedMessage {
    text:       &'static str,
    duration:   Duration,
    started_at: Option<Instant>,
}

impl TimedMessage {
    pub fn new(text: &'static str, duration: Duration) -> Self {
        TimedMessage { text, duration, started_at: None }
    }

    /// Start (or restart) the message at `now`.
    pub fn arm(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    pub fn is_armed(&self) -> bool { self.started_at.is_some() }

    /// The message, if still within its lifetime at `now`.  Once expired it
    /// is dropped for good until the next [`arm`](Self::arm).
    pub fn poll(&mut self, now: Instant) -> Option<Feedback> {
        let started = self.started_at?;
        let elapsed = now.saturating_duration_since(started);
        if elapsed < self.duration {
            Some(Feedback {
                text:      self.text,
                tone:      Tone::Yellow,
                remaining: Some(self.duration - elapsed),
            })
        } else {
            self.started_at = None;
            None
        }
    }

    pub fn reset(&mut self) {
        self.started_at = None;
    }
}

/// `Option<Duration>` as fractional seconds.
mod opt_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None    => s.serialize_none(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
