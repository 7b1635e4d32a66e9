//! # tempo_conductor
//!
//! Real-time conducting feedback: hand landmarks in, gesture labels and
//! "Faster!" / "Not Quite My Tempo" feedback on screen.
//!
//! ## Landmark sources
//!
//! | Source | Flag | Notes |
//! |---|---|---|
//! | Simulation | (default) | mouse = wrist, `0`–`4` = fingers raised, `H` = hide hand |
//! | JSON lines | `--input FILE` or `--input -` | one detector result per line |
//! | Detector process | `--detector PROG -- ARGS` | child process writing JSON lines; stopped on exit |
//! | LeapMotion | `--leap` | needs `--features leap` and LeapC |
//!
//! ## Output
//!
//! * (default) — a `minifb` window with the gesture label, wrist trail,
//!   motion vector and the feedback message.
//! * `--headless` — one `FrameReport` JSON object per frame on stdout.
//!
//! ## Keys
//!
//! | Key | Action |
//! |---|---|
//! | `0`–`4` | Raise that many fingers (simulation) |
//! | `H` | Hide / show the simulated hand |
//! | `R` | Reset trajectory and feedback |
//! | `Q` / `Esc` | Quit |

pub mod source;
pub mod visualizer;
pub mod app;
