//! # Cueclock Library
//!
//! Core clock-synchronization logic for the cueclock timecode display
//! client. The remote cue-playback source pushes terse state snapshots
//! over a persistent connection; this library decodes them, reconciles
//! them against a locally extrapolated clock, and drives a periodic
//! tick source so the displayed timecode advances smoothly between
//! updates.

pub mod clock;
pub mod display;
pub mod settings;
pub mod snapshot;
pub mod sync;
pub mod ticker;
