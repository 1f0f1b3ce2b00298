//! Key handling and status-line formatting.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use cueclock_lib::clock::DisplayFields;
use cueclock_lib::snapshot::Snapshot;

/// What the user asked for on this poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Continue,
    /// Force a manual reconnect/reload.
    Reload,
    Quit,
}

pub fn poll_action() -> ControlAction {
    if event::poll(Duration::from_millis(50)).unwrap_or(false) {
        if let Ok(Event::Key(key)) = event::read() {
            if key.kind != KeyEventKind::Press {
                return ControlAction::Continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => return ControlAction::Quit,
                KeyCode::Char('r') | KeyCode::Char('R') => return ControlAction::Reload,
                _ => {}
            }
        }
    }

    ControlAction::Continue
}

/// The large clock line, e.g. `01:02:03;04` for drop-frame rates.
pub fn format_clock(fields: &DisplayFields) -> String {
    format!(
        "{:02}:{:02}:{:02}{}{:02}",
        fields.hours,
        fields.minutes,
        fields.seconds,
        fields.frame_separator(),
        fields.frames
    )
}

/// HH:MM:SS rendering for durations and offsets.
pub fn format_time(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let seconds = ms.unsigned_abs() / 1000;
    let minutes = seconds / 60;
    let seconds = seconds % 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;

    format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
}

pub struct StatusArgs<'a> {
    pub state_label: &'a str,
    pub cue: Option<&'a Snapshot>,
    pub progress: (i64, i64),
}

/// Render the status panel text: sync state, cue metadata, progress.
pub fn status_text(args: StatusArgs) -> String {
    let (current_ms, duration_ms) = args.progress;
    let percent = if duration_ms > 0 {
        (current_ms as f64 / duration_ms as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    match args.cue {
        Some(cue) => format!(
            "{}   cue {}   {} / {}   ({:>5.1}%)\nfps: {}   offset: {}   volume: {}",
            args.state_label,
            cue.cue_number,
            format_time(current_ms),
            format_time(duration_ms),
            percent,
            cue.fps,
            format_time(cue.offset_ms),
            cue.volume,
        ),
        None => format!("{}   waiting for first update", args.state_label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueclock_lib::snapshot::decode;

    fn fields(hours: u32, minutes: u32, seconds: u32, frames: u32, drop: bool) -> DisplayFields {
        DisplayFields {
            hours,
            minutes,
            seconds,
            frames,
            drop_frame: drop,
        }
    }

    #[test]
    fn clock_uses_drop_frame_separator() {
        assert_eq!(format_clock(&fields(1, 2, 3, 4, false)), "01:02:03:04");
        assert_eq!(format_clock(&fields(1, 2, 3, 4, true)), "01:02:03;04");
    }

    #[test]
    fn time_formatting_handles_negative_offsets() {
        assert_eq!(format_time(3_661_000), "01:01:01");
        assert_eq!(format_time(-90_000), "-00:01:30");
        assert_eq!(format_time(0), "00:00:00");
    }

    #[test]
    fn status_text_reports_progress_percent() {
        let cue = decode("2,7,15000,180000,0,29.97,80,0").expect("decode");
        let text = status_text(StatusArgs {
            state_label: "Playing",
            cue: Some(&cue),
            progress: (15000, 180000),
        });
        assert!(text.contains("cue 7"));
        assert!(text.contains("8.3%"));
        assert!(text.contains("fps: 29.97"));
    }

    #[test]
    fn status_text_before_first_update() {
        let text = status_text(StatusArgs {
            state_label: "Uninitialized",
            cue: None,
            progress: (0, 0),
        });
        assert!(text.contains("waiting"));
    }
}
