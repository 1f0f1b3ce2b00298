//! Terminal rendering of the clock, progress, cue data, and logs.

use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
    Terminal,
};
use text_to_ascii_art::to_art;

use cueclock_lib::clock::DisplayFields;
use cueclock_lib::display::DisplaySink;
use cueclock_lib::snapshot::Snapshot;

use crate::controls;

/// Shared presentation state the sync engine writes into.
#[derive(Default)]
pub struct UiState {
    pub fields: Option<DisplayFields>,
    pub progress: (i64, i64),
    pub cue: Option<Snapshot>,
}

impl DisplaySink for UiState {
    fn set_clock(&mut self, fields: &DisplayFields) {
        self.fields = Some(*fields);
    }

    fn set_progress(&mut self, current_ms: i64, duration_ms: i64) {
        self.progress = (current_ms, duration_ms);
    }

    fn set_cue(&mut self, snapshot: &Snapshot) {
        self.cue = Some(snapshot.clone());
    }
}

pub fn draw_status(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state_label: &str,
    ui_state: &UiState,
    log_lines: &[String],
) {
    // Render the clock + status + log panels.
    let _ = terminal.draw(|f| {
        let clock_line = ui_state
            .fields
            .as_ref()
            .map(controls::format_clock)
            .unwrap_or_else(|| "--:--:--:--".to_string());
        let clock_text =
            to_art(clock_line.clone(), "standard", 0, 1, 0).unwrap_or_else(|_| clock_line);
        let clock_height = clock_text.lines().count().max(1) as u16;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(clock_height),
                Constraint::Length(3),
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(f.size());

        let clock = Paragraph::new(clock_text).style(Style::default().fg(Color::Cyan));
        f.render_widget(clock, chunks[0]);

        let controls_widget = Paragraph::new("r=reload  q=quit")
            .style(Style::default().fg(Color::Blue))
            .block(Block::default().borders(Borders::ALL).title("Controls"));
        f.render_widget(controls_widget, chunks[1]);

        let status = controls::status_text(controls::StatusArgs {
            state_label,
            cue: ui_state.cue.as_ref(),
            progress: ui_state.progress,
        });
        let status_widget = Paragraph::new(status)
            .style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL).title("Cue"));
        f.render_widget(status_widget, chunks[2]);

        let (current_ms, duration_ms) = ui_state.progress;
        let ratio = if duration_ms > 0 {
            (current_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let progress_widget = Gauge::default()
            .ratio(ratio)
            .gauge_style(Style::default().fg(Color::Green))
            .block(Block::default().borders(Borders::ALL).title("Progress"));
        f.render_widget(progress_widget, chunks[3]);

        let log_height = chunks[4].height.saturating_sub(2) as usize;
        let start = log_lines.len().saturating_sub(log_height);
        let log_text = if log_lines.is_empty() {
            "No logs yet.".to_string()
        } else {
            log_lines[start..].join("\n")
        };

        let log_widget = Paragraph::new(log_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Logs"));
        f.render_widget(log_widget, chunks[4]);
    });
}
