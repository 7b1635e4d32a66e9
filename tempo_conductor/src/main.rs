//! Command-line entry point for `tempo_conductor`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tempo_conductor::app::{run, AppConfig, InputMode};
use tempo_core::{SessionConfig, Variant};

/// Conducting gesture feedback from hand landmarks.
#[derive(Parser, Debug)]
#[command(name = "tempo_conductor", version, about)]
struct Cli {
    /// Pipeline variant: gesture-vocabulary or speed-feedback.
    #[arg(long)]
    variant: Option<Variant>,

    /// Session config file (TOML).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read detector results as JSON lines from FILE ("-" for stdin).
    #[arg(long, value_name = "FILE", conflicts_with = "detector")]
    input: Option<PathBuf>,

    /// Run PROGRAM as the landmark detector; arguments follow `--`.
    #[arg(long, value_name = "PROGRAM")]
    detector: Option<String>,

    /// Arguments passed to the detector program.
    #[arg(last = true, requires = "detector")]
    detector_args: Vec<String>,

    /// No window; print one JSON report per frame.
    #[arg(long)]
    headless: bool,

    /// Use a LeapMotion controller.
    #[cfg(feature = "leap")]
    #[arg(long, conflicts_with_all = ["input", "detector"])]
    leap: bool,
}

impl Cli {
    fn into_app_config(self) -> Result<AppConfig> {
        let mut session = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None       => SessionConfig::default(),
        };
        if let Some(v) = self.variant {
            session.variant = v;
        }
        session.validate()?;

        #[cfg(feature = "leap")]
        if self.leap {
            return Ok(AppConfig { session, input: InputMode::Leap, headless: self.headless });
        }

        let input = match (self.input, self.detector) {
            (Some(path), _)   => InputMode::JsonLines(path),
            (None, Some(cmd)) => InputMode::Detector { program: cmd, args: self.detector_args },
            (None, None)      => InputMode::Simulation,
        };
        if self.headless && input == InputMode::Simulation {
            anyhow::bail!("--headless needs --input or --detector");
        }

        Ok(AppConfig { session, input, headless: self.headless })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = Cli::parse().into_app_config().context("invalid command line")?;
    log::info!(
        "variant {} — window {} frames, message {:.1}s",
        cfg.session.variant.name(),
        cfg.session.trajectory_length,
        cfg.session.message_duration,
    );

    run(cfg)
}
