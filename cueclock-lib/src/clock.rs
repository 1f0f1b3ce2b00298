//! The local clock model: the single source of truth rendered to the
//! display.
//!
//! The model holds the current timecode in milliseconds and the frame
//! rate; the sync engine resynchronizes it from every remote snapshot
//! and advances it from the tick source between snapshots.

use log::warn;

/// Frame rates displayed with the drop-frame separator.
const DROP_FRAME_RATES: [f64; 2] = [29.97, 59.94];

const FPS_TOLERANCE: f64 = 1e-3;

/// Timecode decomposed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFields {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
    /// Selects the separator glyph between seconds and frames; the
    /// numeric decomposition is identical either way.
    pub drop_frame: bool,
}

impl DisplayFields {
    /// Separator glyph shown between the seconds and frames fields.
    pub fn frame_separator(&self) -> char {
        if self.drop_frame {
            ';'
        } else {
            ':'
        }
    }
}

/// Locally owned notion of "current timecode".
#[derive(Debug, Clone)]
pub struct ClockModel {
    timecode_ms: i64,
    fps: f64,
    initialized: bool,
}

impl ClockModel {
    /// Create an uninitialized clock. No meaningful timecode exists
    /// until the first snapshot is applied.
    pub fn new() -> Self {
        Self {
            timecode_ms: 0,
            fps: 0.0,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn timecode_ms(&self) -> i64 {
        self.timecode_ms
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Apply the first snapshot, initializing the clock.
    pub fn apply_absolute(&mut self, ms: i64, fps: f64) {
        self.timecode_ms = clamp_ms(ms);
        self.fps = fps;
        self.initialized = true;
    }

    /// Resynchronize from a later snapshot. The remote-reported time
    /// always wins over local extrapolation.
    pub fn apply_relative(&mut self, ms: i64, fps: f64) {
        self.timecode_ms = clamp_ms(ms);
        if (self.fps - fps).abs() > FPS_TOLERANCE {
            self.fps = fps;
        }
    }

    /// Advance the clock by `delta_ms` (per-tick extrapolation between
    /// snapshots).
    ///
    /// # Panics
    /// Panics when called before the first snapshot has been applied.
    pub fn advance(&mut self, delta_ms: i64) {
        assert!(
            self.initialized,
            "clock advanced before the first snapshot was applied"
        );
        self.timecode_ms = clamp_ms(self.timecode_ms + delta_ms);
    }

    /// Decompose the current timecode into display fields at the
    /// current frame rate.
    pub fn display_fields(&self) -> DisplayFields {
        let fps = if self.fps > 0.0 { self.fps } else { 1.0 };
        let nominal = (fps.round() as i64).max(1);
        let total_frames = (self.timecode_ms as f64 / 1000.0 * fps).floor() as i64;

        DisplayFields {
            hours: (total_frames / nominal / 3600) as u32,
            minutes: (total_frames / nominal / 60 % 60) as u32,
            seconds: (total_frames / nominal % 60) as u32,
            frames: (total_frames % nominal) as u32,
            drop_frame: is_drop_frame(fps),
        }
    }
}

impl Default for ClockModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `fps` is rendered with drop-frame punctuation.
pub fn is_drop_frame(fps: f64) -> bool {
    DROP_FRAME_RATES
        .iter()
        .any(|rate| (fps - rate).abs() < FPS_TOLERANCE)
}

fn clamp_ms(ms: i64) -> i64 {
    if ms < 0 {
        warn!("timecode fell below zero ({} ms); clamping", ms);
        0
    } else {
        ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_apply_round_trips_through_display_fields() {
        let mut clock = ClockModel::new();
        clock.apply_absolute(3_661_000, 25.0);
        let fields = clock.display_fields();
        assert_eq!((fields.hours, fields.minutes, fields.seconds), (1, 1, 1));
        assert_eq!(fields.frames, 0);
        assert!(!fields.drop_frame);
    }

    #[test]
    fn frame_field_tracks_sub_second_position() {
        let mut clock = ClockModel::new();
        clock.apply_absolute(30, 25.0);
        // floor(0.030 * 25) = 0
        assert_eq!(clock.display_fields().frames, 0);
        clock.apply_relative(500, 25.0);
        // floor(0.5 * 25) = 12
        assert_eq!(clock.display_fields().frames, 12);
    }

    #[test]
    fn drop_frame_only_for_fractional_broadcast_rates() {
        assert!(is_drop_frame(29.97));
        assert!(is_drop_frame(59.94));
        assert!(!is_drop_frame(30.0));
        assert!(!is_drop_frame(60.0));
        assert!(!is_drop_frame(25.0));
    }

    #[test]
    fn drop_frame_changes_separator_not_arithmetic() {
        let mut ndf = ClockModel::new();
        ndf.apply_absolute(10_000, 30.0);
        let mut df = ClockModel::new();
        df.apply_absolute(10_000, 29.97);

        assert_eq!(ndf.display_fields().frame_separator(), ':');
        assert_eq!(df.display_fields().frame_separator(), ';');
        assert_eq!(ndf.display_fields().seconds, 10);
        assert_eq!(df.display_fields().seconds, 9);
    }

    #[test]
    fn advance_accumulates_exactly() {
        let mut clock = ClockModel::new();
        clock.apply_absolute(100, 25.0);
        for _ in 0..12 {
            clock.advance(10);
        }
        assert_eq!(clock.timecode_ms(), 220);

        // A resync overrides the accumulated extrapolation.
        clock.apply_relative(150, 25.0);
        assert_eq!(clock.timecode_ms(), 150);
    }

    #[test]
    #[should_panic(expected = "before the first snapshot")]
    fn advance_before_initialization_panics() {
        let mut clock = ClockModel::new();
        clock.advance(10);
    }

    #[test]
    fn negative_resync_clamps_to_zero() {
        let mut clock = ClockModel::new();
        clock.apply_absolute(1_000, 25.0);
        clock.apply_relative(-500, 25.0);
        assert_eq!(clock.timecode_ms(), 0);
        clock.advance(-100);
        assert_eq!(clock.timecode_ms(), 0);
    }

    #[test]
    fn relative_apply_updates_fps_on_change() {
        let mut clock = ClockModel::new();
        clock.apply_absolute(0, 25.0);
        clock.apply_relative(0, 29.97);
        assert_eq!(clock.fps(), 29.97);
        assert!(clock.display_fields().drop_frame);
    }
}
