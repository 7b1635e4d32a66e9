//! Runs scripted synthetic hands through both pipeline variants.

use std::time::{Duration, Instant};

use tempo_core::landmark::{synthetic_hand, Finger, Point3};
use tempo_core::{ConductorSession, FrameReport, SessionConfig, Variant};

const FRAME: Duration = Duration::from_millis(33);

const CONDUCTOR: &[Finger] = &[Finger::Index, Finger::Middle];
const PALM: &[Finger] = &[Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

fn show(r: &FrameReport) {
    let gesture = r.gesture.map(|g| g.label()).unwrap_or("(no hand)");
    let feedback = r.feedback.as_ref().map(|f| f.text).unwrap_or("");
    let disp = r.displacement
        .map(|d| format!("dx={:+.3} dy={:+.3} dz={:+.3}", d.x, d.y, d.z))
        .unwrap_or_default();
    println!(
        "   #{:<3} {:<22} win={:<2} {:<28} {}",
        r.frame, gesture, r.trajectory_len, disp, feedback
    );
}

fn main() {
    println!("\n=== Conductor Classifier Demo ===\n");
    let t0 = Instant::now();
    let mut clock = 0u32;
    let mut tick = || { clock += 1; t0 + FRAME * clock };

    // ── 1. straight conductor sweep ───────────────────────────────────────
    println!("1. Conductor's gesture, straight sweep (gesture vocabulary)");
    let mut s = ConductorSession::new(SessionConfig::default());
    for i in 0..12 {
        let wrist = Point3::new(0.3 + 0.02 * i as f32, 0.5, 0.0);
        let r = s.process_frame(Some(&synthetic_hand(wrist, CONDUCTOR)), tick());
        show(&r);
    }
    println!("   moving: {}\n", s.reading().is_moving());

    // ── 2. semicircle closed into a fist ──────────────────────────────────
    println!("2. Open palm semicircle, then fist");
    let mut s = ConductorSession::new(SessionConfig::default());
    for i in 0..10 {
        let t = std::f32::consts::PI * i as f32 / 9.0;
        let wrist = Point3::new(0.5 - 0.2 * t.cos(), 0.5 - 0.2 * t.sin(), 0.0);
        show(&s.process_frame(Some(&synthetic_hand(wrist, PALM)), tick()));
    }
    for _ in 0..3 {
        show(&s.process_frame(Some(&synthetic_hand(Point3::planar(0.7, 0.5), &[])), tick()));
    }
    println!();

    // ── 3. oscillating beat with speed feedback ───────────────────────────
    println!("3. Back-and-forth beat (speed feedback)");
    let mut s = ConductorSession::new(SessionConfig::for_variant(Variant::SpeedFeedback));
    for i in 0..40 {
        let phase = (i as f32 / 20.0) * std::f32::consts::TAU;
        let amplitude = 0.05 + 0.01 * i as f32;
        let wrist = Point3::planar(0.5 + amplitude * phase.sin(), 0.5);
        show(&s.process_frame(Some(&synthetic_hand(wrist, CONDUCTOR)), tick()));
    }
    println!();
}
