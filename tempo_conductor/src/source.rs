//! Landmark sources — detector streams, keyboard/mouse simulation and
//! LeapMotion hardware behind one pull interface.
//!
//! The frame loop calls [`LandmarkSource::next_frame`] once per iteration;
//! that call is the loop's only blocking point.  Consumers don't need to
//! know where the hand came from.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use tempo_core::landmark::{synthetic_hand, Finger, Point3, RawHand};

// ════════════════════════════════════════════════════════════════════════════
// SourceFrame
// ════════════════════════════════════════════════════════════════════════════

/// One input frame: at most one hand.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceFrame {
    pub hand:   Option<RawHand>,
    /// Capture time relative to the start of the stream, when the source
    /// knows it.  Live sources leave this empty and the loop uses wall time.
    pub offset: Option<Duration>,
}

impl SourceFrame {
    pub fn no_hand() -> Self {
        SourceFrame::default()
    }

    pub fn with_hand(hand: RawHand) -> Self {
        SourceFrame { hand: Some(hand), offset: None }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver hand landmarks frame by frame.
pub trait LandmarkSource {
    /// Block until the next frame.  `Ok(None)` means the stream has ended.
    fn next_frame(&mut self) -> Result<Option<SourceFrame>>;

    /// Short human-readable description for the status bar.
    fn describe(&self) -> String;
}

// ════════════════════════════════════════════════════════════════════════════
// JsonLinesSource — one detector result per line
// ════════════════════════════════════════════════════════════════════════════

/// Wire shape of one detector result.
///
/// ```json
/// {"timestamp": 0.033, "hands": [{"handedness": "Right", "score": 0.93,
///   "landmarks": [{"x": 0.51, "y": 0.72, "z": 0.0}, ...]}]}
/// ```
#[derive(Deserialize, Debug)]
struct DetectionResult {
    #[serde(default)]
    hands: Vec<RawHand>,
    #[serde(default)]
    error: Option<String>,
    /// Seconds since the stream started.
    #[serde(default)]
    timestamp: Option<f64>,
}

pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    label:  String,
    line:   usize,
    buf:    String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        JsonLinesSource { reader, label: label.into(), line: 0, buf: String::new() }
    }

    fn decode(&self, text: &str) -> Result<SourceFrame> {
        let result: DetectionResult = serde_json::from_str(text)
            .with_context(|| format!("{}:{}: malformed detector line", self.label, self.line))?;

        if let Some(err) = result.error {
            log::warn!("{}:{}: detector error: {}", self.label, self.line, err);
            return Ok(SourceFrame::no_hand());
        }

        let offset = match result.timestamp {
            Some(t) if t >= 0.0 => match Duration::try_from_secs_f64(t) {
                Ok(d)  => Some(d),
                Err(_) => bail!("{}:{}: timestamp {} out of range", self.label, self.line, t),
            },
            Some(t) => bail!("{}:{}: invalid timestamp {}", self.label, self.line, t),
            None => None,
        };

        if result.hands.len() > 1 {
            log::trace!("{} hands in frame, tracking the first", result.hands.len());
        }

        Ok(SourceFrame { hand: result.hands.into_iter().next(), offset })
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)
                .with_context(|| format!("reading {}", self.label))?;
            if n == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return self.decode(text).map(Some);
        }
    }

    fn describe(&self) -> String {
        format!("stream {} (line {})", self.label, self.line)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectorProcess — external detector with JSON-lines stdout
// ════════════════════════════════════════════════════════════════════════════

/// An external landmark detector run as a child process.
///
/// The process is started on construction and killed when this value is
/// dropped, whichever way the frame loop exits.
pub struct DetectorProcess {
    child:  Child,
    stream: JsonLinesSource<BufReader<ChildStdout>>,
}

impl DetectorProcess {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        log::info!("Starting landmark detector: {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start detector '{}'", program))?;

        let stdout = child.stdout.take().context("detector has no stdout")?;
        let stream = JsonLinesSource::new(BufReader::new(stdout), program);

        Ok(DetectorProcess { child, stream })
    }
}

impl LandmarkSource for DetectorProcess {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        self.stream.next_frame()
    }

    fn describe(&self) -> String {
        format!("detector pid {} — {}", self.child.id(), self.stream.describe())
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        log::info!("Landmark detector stopped");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — keyboard/mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Cursor moved to a normalized window position.
    Cursor { x: f32, y: f32 },
    /// Number of raised fingers (index first), 0–4.
    Raise(u8),
    /// Hide or show the hand.
    ToggleHand,
}

/// Hand synthesized from [`SimInput`] events sent by the visualizer window.
///
/// The cursor plays the wrist; digit keys choose how many fingers are up.
pub struct SimLandmarkSource {
    rx:      Receiver<SimInput>,
    wrist:   Option<Point3>,
    raised:  u8,
    visible: bool,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimLandmarkSource { rx, wrist: None, raised: 2, visible: true }
    }

    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::Cursor { x, y } => {
                self.wrist = Some(Point3::planar(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)));
            }
            SimInput::Raise(n)  => self.raised = n.min(4),
            SimInput::ToggleHand => self.visible = !self.visible,
        }
    }

    /// Hand for the current simulated state.
    pub fn current_hand(&self) -> Option<RawHand> {
        if !self.visible {
            return None;
        }
        let wrist = self.wrist?;
        let open = &Finger::ALL[..self.raised as usize];
        Some(synthetic_hand(wrist, open))
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        loop {
            match self.rx.try_recv() {
                Ok(input) => self.apply(input),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(None),
            }
        }
        Ok(Some(SourceFrame { hand: self.current_hand(), offset: None }))
    }

    fn describe(&self) -> String {
        let hand = if self.visible { "shown" } else { "hidden" };
        format!("simulation — {} finger(s) up, hand {}", self.raised, hand)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// LeapMotion reports millimetres above the device with `y` pointing up;
/// joints are mapped into the detector's normalized image frame (origin top
/// left, `y` down) over a 400 mm interaction box.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource {
    connection: leaprs::Connection,
}

#[cfg(feature = "leap")]
impl LeapLandmarkSource {
    pub fn open() -> Result<Self> {
        use leaprs::*;
        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| anyhow::anyhow!("failed to create LeapC connection: {:?}", e))?;
        connection.open()
            .map_err(|e| anyhow::anyhow!("failed to open LeapMotion device: {:?}", e))?;
        log::info!("LeapMotion connection open");
        Ok(LeapLandmarkSource { connection })
    }
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        use leaprs::*;
        let msg = match self.connection.poll(100) {
            Ok(m)  => m,
            Err(_) => return Ok(Some(SourceFrame::no_hand())),
        };
        if let Event::Tracking(frame) = msg.event() {
            let hands: Vec<_> = frame.hands().collect();
            if let Some(hand) = hands.first() {
                return Ok(Some(SourceFrame::with_hand(leap_hand(hand))));
            }
        }
        Ok(Some(SourceFrame::no_hand()))
    }

    fn describe(&self) -> String {
        "LeapMotion".to_string()
    }
}

#[cfg(feature = "leap")]
fn leap_hand(hand: &leaprs::Hand) -> RawHand {
    const BOX_MM: f32 = 400.0;
    const FLOOR_MM: f32 = 80.0;
    let to_image = |x: f32, y: f32, z: f32| Point3::new(
        (x / BOX_MM + 0.5).clamp(0.0, 1.0),
        (1.0 - (y - FLOOR_MM) / BOX_MM).clamp(0.0, 1.0),
        z / BOX_MM,
    );

    let palm = hand.palm().position();
    let mut pts = vec![to_image(palm.x, palm.y, palm.z); tempo_core::landmark::HAND_LANDMARK_COUNT];

    // Thumb first, then index … pinky: 4 joints each, matching the 21-point layout.
    for (i, digit) in hand.digits().enumerate().take(5) {
        let base = 1 + i * 4;
        let joints = [
            digit.metacarpal().next_joint(),
            digit.proximal().next_joint(),
            digit.intermediate().next_joint(),
            digit.distal().next_joint(),
        ];
        for (k, j) in joints.iter().enumerate() {
            pts[base + k] = to_image(j.x, j.y, j.z);
        }
    }

    RawHand { handedness: format!("{:?}", hand.hand_type()), score: 1.0, landmarks: pts }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;
    use tempo_core::landmark::HandJoint;

    fn hand_json(wrist_x: f32) -> String {
        let hand = synthetic_hand(Point3::planar(wrist_x, 0.5), &[Finger::Index, Finger::Middle]);
        serde_json::to_string(&hand).unwrap()
    }

    #[test]
    fn json_lines_yield_hands_and_gaps() {
        let text = format!(
            "{{\"timestamp\":0.0,\"hands\":[{}]}}\n\n{{\"hands\":[]}}\n{{\"error\":\"camera busy\"}}\n",
            hand_json(0.4)
        );
        let mut src = JsonLinesSource::new(Cursor::new(text), "test");

        let f = src.next_frame().unwrap().unwrap();
        assert_eq!(f.offset, Some(Duration::ZERO));
        assert_eq!(f.hand.unwrap().joint(HandJoint::Wrist), Some(Point3::planar(0.4, 0.5)));

        assert_eq!(src.next_frame().unwrap().unwrap(), SourceFrame::no_hand());
        assert_eq!(src.next_frame().unwrap().unwrap(), SourceFrame::no_hand());
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn json_lines_take_first_of_several_hands() {
        let text = format!("{{\"hands\":[{},{}]}}\n", hand_json(0.2), hand_json(0.8));
        let mut src = JsonLinesSource::new(Cursor::new(text), "test");
        let hand = src.next_frame().unwrap().unwrap().hand.unwrap();
        assert_eq!(hand.joint(HandJoint::Wrist).unwrap().x, 0.2);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let text = "{\"hands\":[]}\nnot json\n";
        let mut src = JsonLinesSource::new(Cursor::new(text), "capture.jsonl");
        src.next_frame().unwrap();
        let err = src.next_frame().unwrap_err();
        assert!(format!("{:#}", err).contains("capture.jsonl:2"));
    }

    #[test]
    fn negative_timestamp_rejected() {
        let mut src = JsonLinesSource::new(Cursor::new("{\"timestamp\":-1.0}\n"), "t");
        assert!(src.next_frame().is_err());
    }

    #[test]
    fn oversized_timestamp_reports_line_number() {
        let text = "{\"hands\":[]}\n{\"timestamp\":1e30,\"hands\":[]}\n";
        let mut src = JsonLinesSource::new(Cursor::new(text), "capture.jsonl");
        src.next_frame().unwrap();
        let err = src.next_frame().unwrap_err();
        assert!(format!("{:#}", err).contains("capture.jsonl:2"));
    }

    #[test]
    fn sim_needs_cursor_before_hand_appears() {
        let (tx, rx) = mpsc::channel();
        let mut sim = SimLandmarkSource::new(rx);
        assert_eq!(sim.next_frame().unwrap().unwrap().hand, None);

        tx.send(SimInput::Cursor { x: 0.25, y: 0.75 }).unwrap();
        tx.send(SimInput::Raise(4)).unwrap();
        let hand = sim.next_frame().unwrap().unwrap().hand.unwrap();
        assert_eq!(hand.joint(HandJoint::Wrist), Some(Point3::planar(0.25, 0.75)));
        let tip = hand.joint(HandJoint::PinkyTip).unwrap();
        let pip = hand.joint(HandJoint::PinkyPip).unwrap();
        assert!(tip.y < pip.y);
    }

    #[test]
    fn sim_toggle_hides_hand() {
        let (tx, rx) = mpsc::channel();
        let mut sim = SimLandmarkSource::new(rx);
        tx.send(SimInput::Cursor { x: 0.5, y: 0.5 }).unwrap();
        tx.send(SimInput::ToggleHand).unwrap();
        assert_eq!(sim.next_frame().unwrap().unwrap().hand, None);
    }

    #[test]
    fn sim_ends_when_window_drops_sender() {
        let (tx, rx) = mpsc::channel::<SimInput>();
        let mut sim = SimLandmarkSource::new(rx);
        drop(tx);
        assert!(sim.next_frame().unwrap().is_none());
    }
}
