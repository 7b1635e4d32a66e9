//! Software-rendered feedback window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ GESTURE LABEL                                  ↗ motion arrow │
//! │ conductor moving / speed              dx: … dy: … dz: …      │
//! │                                                              │
//! │        · · · wrist trajectory · · ·                          │
//! │                 FEEDBACK MESSAGE (large)                      │
//! │                                                              │
//! │ status bar                                                   │
//! │ key legend                                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use tempo_core::landmark::Point3;
use tempo_core::trajectory::TrajectoryBuffer;
use tempo_core::{FrameReport, MotionReading};

use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:      usize = 960;
pub const WIN_H:      usize = 540;
const STATUS_Y:       usize = WIN_H - 36;
const ARROW_MARGIN:   usize = 100;
/// Pixels per unit of normalized displacement for the motion arrow.
const ARROW_SCALE:    f32   = 300.0;
const BG_COLOR:       u32   = 0xFF101820;
const TEXT_BG:        u32   = 0xFF0F3460;
const TRAIL_COLOR:    u32   = 0xFF8FB8FF;
const WRIST_COLOR:    u32   = 0xFFFFFFFF;
const MOVING_COLOR:   u32   = 0xFF00FFFF;

/// What the user asked for this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    Continue,
    Reset,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    /// Present only when the simulation source is driving the session.
    sim_tx: Option<Sender<SimInput>>,
    last_cursor: Option<(f32, f32)>,
}

impl Visualizer {
    pub fn new(title: &str, sim_tx: Option<Sender<SimInput>>) -> Result<Self, String> {
        let mut window = Window::new(
            title,
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            last_cursor: None,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard/mouse.  In simulation mode input is forwarded to the
    /// simulated hand.
    pub fn poll_input(&mut self) -> UiAction {
        if !self.window.is_open() { return UiAction::Quit; }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            return UiAction::Quit;
        }
        let reset = pressed(Key::R);

        if let Some(tx) = &self.sim_tx {
            let digits = [
                (Key::Key0, 0u8), (Key::Key1, 1), (Key::Key2, 2), (Key::Key3, 3), (Key::Key4, 4),
            ];
            for (key, n) in digits {
                if pressed(key) {
                    let _ = tx.send(SimInput::Raise(n));
                }
            }
            if pressed(Key::H) {
                let _ = tx.send(SimInput::ToggleHand);
            }
            if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
                let cursor = (mx / WIN_W as f32, my / WIN_H as f32);
                if self.last_cursor != Some(cursor) {
                    self.last_cursor = Some(cursor);
                    let _ = tx.send(SimInput::Cursor { x: cursor.0, y: cursor.1 });
                }
            }
        }

        if reset { UiAction::Reset } else { UiAction::Continue }
    }

    /// Render one frame.
    pub fn render(&mut self, report: &FrameReport, trajectory: &TrajectoryBuffer, status: &str) {
        self.buf.fill(BG_COLOR);

        // ── Wrist trail ───────────────────────────────────────────────────
        self.draw_trail(trajectory);

        // ── Gesture label ─────────────────────────────────────────────────
        match report.gesture {
            Some(g) => self.draw_text(g.label(), 20, 20, 3, g.tone().argb()),
            None    => self.draw_text("no hand", 20, 20, 3, 0xFF808080),
        }

        // ── Motion readout ────────────────────────────────────────────────
        match report.motion {
            MotionReading::Moving { moving: true } => {
                self.draw_text("Conductor Moving", 20, 46, 3, MOVING_COLOR);
            }
            MotionReading::Speed { value, .. } => {
                let line = format!("speed {:.3}", value);
                self.draw_text(&line, 20, 46, 2, 0xFFCCCCCC);
            }
            _ => {}
        }

        // ── Motion vector, top right ──────────────────────────────────────
        if let Some(d) = report.displacement {
            self.draw_motion_vector(d);
        }

        // ── Feedback message, centred ─────────────────────────────────────
        if let Some(f) = &report.feedback {
            let scale = 6;
            let w = text_width(f.text, scale);
            let x = WIN_W.saturating_sub(w) / 2;
            let y = WIN_H / 2 - 15;
            self.draw_text(f.text, x, y, scale, f.tone.argb());
        }

        // ── Status bar + legend ───────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_text(status, 10, STATUS_Y + 6, 2, 0xFFEEEEEE);
        let legend = if self.sim_tx.is_some() {
            "mouse=wrist  0-4=fingers up  H=hide hand  R=reset  Q=quit"
        } else {
            "R=reset  Q=quit"
        };
        self.draw_text(legend, 10, WIN_H - 12, 1, 0xFF888888);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Trail ─────────────────────────────────────────────────────────────

    fn draw_trail(&mut self, trajectory: &TrajectoryBuffer) {
        let n = trajectory.len();
        for (i, p) in trajectory.iter().enumerate() {
            let (x, y) = to_screen(*p);
            let newest = i + 1 == n;
            let r = if newest { 6 } else { 3 };
            let color = if newest { WRIST_COLOR } else { TRAIL_COLOR };
            self.fill_rect(x.saturating_sub(r), y.saturating_sub(r), 2 * r, 2 * r, color);
        }
    }

    // ── Motion vector ─────────────────────────────────────────────────────

    fn draw_motion_vector(&mut self, d: Point3) {
        let sx = (WIN_W - ARROW_MARGIN) as f32;
        let sy = ARROW_MARGIN as f32;
        let ex = sx + d.x * ARROW_SCALE;
        let ey = sy + d.y * ARROW_SCALE;
        self.draw_line(sx, sy, ex, ey, WRIST_COLOR);

        // Arrow head: two short strokes back from the tip.
        let len = ((ex - sx).powi(2) + (ey - sy).powi(2)).sqrt();
        if len > 1.0 {
            let (ux, uy) = ((ex - sx) / len, (ey - sy) / len);
            let head = (len * 0.3).min(20.0);
            for side in [-1.0_f32, 1.0] {
                let hx = ex - head * (ux * 0.87 - side * uy * 0.5);
                let hy = ey - head * (uy * 0.87 + side * ux * 0.5);
                self.draw_line(ex, ey, hx, hy, WRIST_COLOR);
            }
        }

        let text = format!("dx: {:.3}, dy: {:.3}, dz: {:.3}", d.x, d.y, d.z);
        let x = WIN_W.saturating_sub(text_width(&text, 2) + 10);
        self.draw_text(&text, x, ARROW_MARGIN + 24, 2, WRIST_COLOR);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        fill_clipped(&mut self.buf, x, y, w, h, color);
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: u32) {
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            self.set_pixel(x.round() as isize, y.round() as isize, color);
            self.set_pixel(x.round() as isize + 1, y.round() as isize, color);
        }
    }

    /// 3×5 bitmap font, each font pixel drawn as a `scale`×`scale` block.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

/// Fill a `w`×`h` block of a `WIN_W`-wide frame buffer, clipped to the window.
fn fill_clipped(buf: &mut [u32], x: usize, y: usize, w: usize, h: usize, color: u32) {
    if x >= WIN_W {
        return;
    }
    let right = x.saturating_add(w).min(WIN_W);
    let bottom = y.saturating_add(h).min(WIN_H);
    for row in buf.chunks_exact_mut(WIN_W).take(bottom).skip(y) {
        row[x..right].fill(color);
    }
}

/// Normalized image coordinates → window pixels.
fn to_screen(p: Point3) -> (usize, usize) {
    let x = (p.x.clamp(0.0, 1.0) * (WIN_W - 1) as f32) as usize;
    let y = (p.y.clamp(0.0, 1.0) * (STATUS_Y - 1) as f32) as usize;
    (x, y)
}

fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 4 * scale
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_mapping_stays_inside_window() {
        let (x, y) = to_screen(Point3::new(1.5, -0.2, 0.0));
        assert!(x < WIN_W);
        assert_eq!(y, 0);
    }

    #[test]
    fn feedback_messages_have_glyphs() {
        for text in ["Not Quite My Tempo", "Faster!", "Even Faster!", "Good Boy!", "Conductor's Gesture"] {
            for ch in text.chars().filter(|c| *c != ' ') {
                assert_ne!(char_glyph(ch), char_glyph('\u{1}'), "missing glyph for {:?}", ch);
            }
        }
    }

    #[test]
    fn blocks_are_clipped_at_the_window_edge() {
        let mut buf = vec![0u32; WIN_W * WIN_H];
        fill_clipped(&mut buf, WIN_W - 2, WIN_H - 1, 10, 10, 7);
        assert_eq!(buf.iter().filter(|&&p| p == 7).count(), 2);
        assert_eq!(buf[WIN_W * WIN_H - 1], 7);

        fill_clipped(&mut buf, WIN_W + 5, 0, 4, 4, 9);
        assert!(!buf.contains(&9));
    }

    #[test]
    fn large_feedback_fits_on_screen() {
        assert!(text_width("Not Quite My Tempo", 6) < WIN_W);
    }
}
