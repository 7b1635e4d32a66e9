//! Top-level application loop.
//!
//! `AppState` owns the `ConductorSession` and the status line.  `run` opens
//! the landmark source, then drives one frame per iteration (fetch, classify,
//! render or print) until the window closes or the source runs dry.

use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

use anyhow::{Context, Result};

use tempo_core::{ConductorSession, FrameReport, SessionConfig};

use crate::source::{DetectorProcess, JsonLinesSource, LandmarkSource, SimLandmarkSource, SourceFrame};
use crate::visualizer::{UiAction, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where landmarks come from.
#[derive(Clone, Debug, PartialEq)]
pub enum InputMode {
    /// Mouse and keyboard in the feedback window.
    Simulation,
    /// JSON lines from a file, or stdin for `-`.
    JsonLines(PathBuf),
    /// An external detector process writing JSON lines to stdout.
    Detector { program: String, args: Vec<String> },
    /// LeapMotion hardware.
    #[cfg(feature = "leap")]
    Leap,
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub session:  SessionConfig,
    pub input:    InputMode,
    /// No window; one JSON report per frame on stdout.
    pub headless: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            session:  SessionConfig::default(),
            input:    InputMode::Simulation,
            headless: false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    session: ConductorSession,
    /// Origin for sources that carry their own timestamps.
    origin:  Instant,
    pub status: String,
}

impl AppState {
    pub fn new(config: SessionConfig) -> Self {
        let status = format!("Ready — variant {}", config.variant.name());
        AppState {
            session: ConductorSession::new(config),
            origin:  Instant::now(),
            status,
        }
    }

    pub fn session(&self) -> &ConductorSession { &self.session }

    /// Run one source frame through the session.  Fails only when the
    /// frame's timestamp lies beyond what the clock can represent.
    pub fn handle_frame(&mut self, frame: &SourceFrame) -> Result<FrameReport> {
        let now = match frame.offset {
            Some(offset) => self.origin.checked_add(offset).with_context(|| {
                format!("frame timestamp {:.3}s is out of range", offset.as_secs_f64())
            })?,
            None => Instant::now(),
        };
        let report = self.session.process_frame(frame.hand.as_ref(), now);
        self.status = status_line(&report);
        Ok(report)
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.status = "RESET — trajectory and feedback cleared".to_string();
    }
}

fn status_line(r: &FrameReport) -> String {
    match r.gesture {
        None => format!("frame {}  no hand", r.frame),
        Some(g) => format!(
            "frame {}  {}  fingers={}  window={}",
            r.frame,
            g.label(),
            r.open_fingers.unwrap_or(0),
            r.trajectory_len,
        ),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Source acquisition
// ════════════════════════════════════════════════════════════════════════════

/// Open the configured non-simulation source.
fn open_stream(input: &InputMode) -> Result<Box<dyn LandmarkSource>> {
    match input {
        InputMode::Simulation => anyhow::bail!("simulation input needs the feedback window"),
        InputMode::JsonLines(path) if path.as_os_str() == "-" => {
            let stdin = BufReader::new(io::stdin());
            Ok(Box::new(JsonLinesSource::new(stdin, "stdin")))
        }
        InputMode::JsonLines(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening landmark stream {}", path.display()))?;
            Ok(Box::new(JsonLinesSource::new(BufReader::new(file), path.display().to_string())))
        }
        InputMode::Detector { program, args } => Ok(Box::new(DetectorProcess::spawn(program, args)?)),
        #[cfg(feature = "leap")]
        InputMode::Leap => Ok(Box::new(crate::source::LeapLandmarkSource::open()?)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// The source is acquired before the loop and dropped after it on every exit
/// path, which stops an external detector process.
pub fn run(cfg: AppConfig) -> Result<()> {
    let mut app = AppState::new(cfg.session.clone());

    if cfg.headless {
        let mut source = open_stream(&cfg.input)?;
        let stdout = io::stdout();
        let frames = run_headless(&mut app, source.as_mut(), stdout.lock())?;
        log::info!("processed {} frames", frames);
        return Ok(());
    }

    let title = format!("Not Quite My Tempo — {}", cfg.session.variant.name());
    let (mut source, mut vis): (Box<dyn LandmarkSource>, Visualizer) = match cfg.input {
        InputMode::Simulation => {
            let (sim_tx, sim_rx) = mpsc::channel();
            let vis = Visualizer::new(&title, Some(sim_tx)).map_err(anyhow::Error::msg)?;
            let source: Box<dyn LandmarkSource> = Box::new(SimLandmarkSource::new(sim_rx));
            (source, vis)
        }
        ref other => {
            let source = open_stream(other)?;
            let vis = Visualizer::new(&title, None).map_err(anyhow::Error::msg)?;
            (source, vis)
        }
    };
    log::info!("reading landmarks from {}", source.describe());

    while vis.is_open() {
        match vis.poll_input() {
            UiAction::Quit     => break,
            UiAction::Reset    => app.reset(),
            UiAction::Continue => {}
        }

        let Some(frame) = source.next_frame()? else {
            log::info!("landmark source finished");
            break;
        };
        let report = app.handle_frame(&frame)?;
        vis.render(&report, app.session().trajectory(), &app.status);
    }

    Ok(())
}

/// Drain `source` without a window, writing one JSON report per line.
/// Returns the number of frames processed.
pub fn run_headless<W: Write>(
    app: &mut AppState,
    source: &mut dyn LandmarkSource,
    mut out: W,
) -> Result<u64> {
    let mut frames = 0;
    while let Some(frame) = source.next_frame()? {
        let report = app.handle_frame(&frame)?;
        serde_json::to_writer(&mut out, &report).context("encoding frame report")?;
        out.write_all(b"\n").context("writing frame report")?;
        frames += 1;
    }
    out.flush()?;
    Ok(frames)
}

/// Read a JSON-lines capture from any reader; used by tests and tooling.
pub fn replay<R: BufRead>(session: SessionConfig, reader: R) -> Result<Vec<FrameReport>> {
    let mut app = AppState::new(session);
    let mut source = JsonLinesSource::new(reader, "replay");
    let mut reports = Vec::new();
    while let Some(frame) = source.next_frame()? {
        reports.push(app.handle_frame(&frame)?);
    }
    Ok(reports)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
