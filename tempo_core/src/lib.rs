//! # tempo_core
//!
//! Frame-by-frame classifier for a conductor's hand: turns a stream of hand
//! landmarks into a gesture label, wrist-motion readings and feedback
//! messages.  No pixels and no I/O: landmarks in, [`FrameReport`]s out.
//!
//! ## Pipeline (one call to [`ConductorSession::process_frame`])
//!
//! | Stage | Module | Output |
//! |---|---|---|
//! | Landmark normalizer | [`landmark`] | wrist + fingertip/pip pairs, or "no hand" |
//! | Finger-state evaluator | [`landmark`] | open-finger count |
//! | Trajectory buffer | [`trajectory`] | last N wrist positions |
//! | Gesture classifier | [`classifier`] | label, previous label |
//! | Motion analyzer | [`motion`] | moving flag or running speed |
//! | Feedback emitter | [`feedback`] | speed tier or timed message |
//!
//! ## Variants
//!
//! | [`Variant`] | Fingers | Wrist | Motion | Feedback |
//! |---|---|---|---|---|
//! | `gesture-vocabulary` | index, middle, ring, pinky | x, y, z | moving flag | "Not Quite My Tempo" after a semicircle closes into a fist |
//! | `speed-feedback` | index, middle | x, y | speed with reversal latch | "Faster!" / "Even Faster!" / "Good Boy!" |
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Instant;
//! use tempo_core::{ConductorSession, SessionConfig, Variant, Gesture};
//! use tempo_core::landmark::{synthetic_hand, Finger, Point3};
//!
//! let mut session = ConductorSession::new(SessionConfig::for_variant(Variant::SpeedFeedback));
//! let hand = synthetic_hand(Point3::planar(0.5, 0.5), &[Finger::Index, Finger::Middle]);
//! let report = session.process_frame(Some(&hand), Instant::now());
//! assert_eq!(report.gesture, Some(Gesture::ConductorsGesture));
//! ```

pub mod landmark;
pub mod trajectory;
pub mod classifier;
pub mod motion;
pub mod feedback;
pub mod config;
pub mod session;

pub use classifier::{Gesture, Tone};
pub use config::{SessionConfig, Variant};
pub use feedback::{Feedback, SpeedTier};
pub use landmark::{Point3, RawHand};
pub use motion::MotionReading;
pub use session::{ConductorSession, FrameReport};
