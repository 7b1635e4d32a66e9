//! Session configuration.
//!
//! A small set of numeric constants fixed at session start, plus the choice
//! of pipeline variant.  Loadable from TOML; every key is optional.
//!
//! ```toml
//! variant = "speed-feedback"
//! speed-threshold = 0.1
//! trajectory-length = 12
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::landmark::{Dimensions, FingerSet};
use crate::trajectory::DEFAULT_TRAJECTORY_LENGTH;

/// Which of the two pipelines to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Four-finger vocabulary (conductor, open palm, semicircle, fist),
    /// binary moving flag, 3D wrist, "Not Quite My Tempo" on fist-after-arc.
    #[default]
    GestureVocabulary,
    /// Two-finger vocabulary, speed tracking and speed-tier feedback, 2D wrist.
    SpeedFeedback,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Variant::GestureVocabulary => "gesture-vocabulary",
            Variant::SpeedFeedback     => "speed-feedback",
        }
    }

    pub fn finger_set(self) -> FingerSet {
        match self {
            Variant::GestureVocabulary => FingerSet::Quad,
            Variant::SpeedFeedback     => FingerSet::Pair,
        }
    }

    pub fn default_dimensions(self) -> Dimensions {
        match self {
            Variant::GestureVocabulary => Dimensions::Spatial,
            Variant::SpeedFeedback     => Dimensions::Planar,
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "gesture-vocabulary" | "gesture" => Ok(Variant::GestureVocabulary),
            "speed-feedback" | "speed"       => Ok(Variant::SpeedFeedback),
            other => Err(format!("unknown variant '{}'", other)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SessionConfig {
    pub variant:             Variant,
    /// Overrides the variant's wrist dimensionality when set.
    pub dimensions:          Option<Dimensions>,
    /// Minimum net wrist displacement over the window to count as motion.
    pub movement_threshold:  f32,
    /// Minimum midpoint deviation for an arc.
    pub curvature_threshold: f32,
    /// Below this speed: "Faster!".
    pub speed_threshold:     f32,
    /// Below this speed: "Even Faster!"; at or above: "Good Boy!".
    pub speedy_threshold:    f32,
    /// Trajectory window length, in frames.
    pub trajectory_length:   usize,
    /// How long the timed message stays up, in seconds.
    pub message_duration:    f32,
    /// Detections scored below this are treated as "no hand".
    pub min_confidence:      f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            variant:             Variant::GestureVocabulary,
            dimensions:          None,
            movement_threshold:  0.03,
            curvature_threshold: 0.05,
            speed_threshold:     0.125,
            speedy_threshold:    0.25,
            trajectory_length:   DEFAULT_TRAJECTORY_LENGTH,
            message_duration:    1.0,
            min_confidence:      0.7,
        }
    }
}

impl SessionConfig {
    pub fn for_variant(variant: Variant) -> Self {
        SessionConfig { variant, ..Self::default() }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: SessionConfig = toml::from_str(text).context("invalid session config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading session config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("movement-threshold",  self.movement_threshold),
            ("curvature-threshold", self.curvature_threshold),
            ("speed-threshold",     self.speed_threshold),
            ("speedy-threshold",    self.speedy_threshold),
        ];
        for (name, v) in thresholds {
            if !v.is_finite() || v < 0.0 {
                bail!("{} must be a non-negative number, got {}", name, v);
            }
        }
        if self.speed_threshold >= self.speedy_threshold {
            bail!(
                "speed-threshold ({}) must be below speedy-threshold ({})",
                self.speed_threshold, self.speedy_threshold
            );
        }
        if self.trajectory_length < 2 {
            bail!("trajectory-length must be at least 2, got {}", self.trajectory_length);
        }
        if !self.message_duration.is_finite() || self.message_duration <= 0.0 {
            bail!("message-duration must be positive, got {}", self.message_duration);
        }
        if Duration::try_from_secs_f32(self.message_duration).is_err() {
            bail!("message-duration {} is out of range", self.message_duration);
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            bail!("min-confidence must be within 0..=1, got {}", self.min_confidence);
        }
        Ok(())
    }

    pub fn finger_set(&self) -> FingerSet {
        self.variant.finger_set()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions.unwrap_or_else(|| self.variant.default_dimensions())
    }

    /// Zero for values `validate` would reject.
    pub fn message_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.message_duration).unwrap_or_default()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_constants() {
        let c = SessionConfig::default();
        assert_eq!(c.trajectory_length, 10);
        assert_eq!(c.movement_threshold, 0.03);
        assert_eq!(c.curvature_threshold, 0.05);
        assert_eq!(c.speed_threshold, 0.125);
        assert_eq!(c.speedy_threshold, 0.25);
        assert_eq!(c.message_duration(), Duration::from_secs(1));
        c.validate().unwrap();
    }

    #[test]
    fn variant_resolves_fingers_and_dimensions() {
        let speed = SessionConfig::for_variant(Variant::SpeedFeedback);
        assert_eq!(speed.finger_set(), FingerSet::Pair);
        assert_eq!(speed.dimensions(), Dimensions::Planar);

        let gesture = SessionConfig::default();
        assert_eq!(gesture.finger_set(), FingerSet::Quad);
        assert_eq!(gesture.dimensions(), Dimensions::Spatial);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = SessionConfig::from_toml_str(
            "variant = \"speed-feedback\"\ndimensions = \"spatial\"\ntrajectory-length = 12\n",
        ).unwrap();
        assert_eq!(c.variant, Variant::SpeedFeedback);
        assert_eq!(c.dimensions(), Dimensions::Spatial);
        assert_eq!(c.trajectory_length, 12);
        assert_eq!(c.speedy_threshold, 0.25);
    }

    #[test]
    fn inverted_speed_thresholds_rejected() {
        let err = SessionConfig::from_toml_str("speed-threshold = 0.5\n").unwrap_err();
        assert!(format!("{:#}", err).contains("speedy-threshold"));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(SessionConfig::from_toml_str("tempo = 120\n").is_err());
    }

    #[test]
    fn tiny_window_rejected() {
        assert!(SessionConfig::from_toml_str("trajectory-length = 1\n").is_err());
    }

    #[test]
    fn huge_message_duration_rejected() {
        let err = SessionConfig::from_toml_str("message-duration = 1e30\n").unwrap_err();
        assert!(format!("{:#}", err).contains("message-duration"));

        let c = SessionConfig { message_duration: 1e30, ..SessionConfig::default() };
        assert_eq!(c.message_duration(), Duration::ZERO);
    }

    #[test]
    fn load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "movement-threshold = 0.04").unwrap();
        writeln!(f, "message-duration = 2.5").unwrap();
        let c = SessionConfig::load(f.path()).unwrap();
        assert_eq!(c.movement_threshold, 0.04);
        assert_eq!(c.message_duration(), Duration::from_millis(2500));
    }

    #[test]
    fn missing_file_names_path() {
        let err = SessionConfig::load("/nonexistent/tempo.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/tempo.toml"));
    }

    #[test]
    fn variant_from_str() {
        assert_eq!("speed".parse::<Variant>().unwrap(), Variant::SpeedFeedback);
        assert!("waltz".parse::<Variant>().is_err());
    }
}
