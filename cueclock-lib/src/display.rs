//! Display sink collaborator consumed by the sync engine.

use crate::clock::DisplayFields;
use crate::snapshot::Snapshot;

/// Presentation surface fed by the sync engine.
///
/// `set_clock` fires on every applied snapshot and every clock-advance
/// tick; `set_progress` fires on the coarser progress ticks and on
/// snapshot application; `set_cue` fires once per applied snapshot with
/// the cue metadata (frame rate, offset, duration).
pub trait DisplaySink {
    fn set_clock(&mut self, fields: &DisplayFields);
    fn set_progress(&mut self, current_ms: i64, duration_ms: i64);
    fn set_cue(&mut self, snapshot: &Snapshot);
}
