//! Wires settings, engine, transport, and the terminal UI together.

use std::{
    io,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::sleep,
    time::{Duration, Instant},
};

use clap::ArgMatches;
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};

use cueclock_lib::settings::ClientSettings;
use cueclock_lib::sync::{SyncEngine, SyncState};

use crate::{controls, logging, transport::Transport, ui};

const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

pub fn run(args: &ArgMatches, log_buffer: logging::LogBuffer) -> Result<i32, Box<dyn std::error::Error>> {
    info!("starting cueclock");

    let settings = resolve_settings(args)?;
    info!(
        "remote source {}:{} (auto-reload {})",
        settings.host, settings.port, settings.auto_reload_on_error
    );
    let quiet = args.get_flag("quiet");

    // The reload signal only flips a flag; this loop owns reconnects.
    let reload_requested = Arc::new(AtomicBool::new(false));
    let reload_flag = reload_requested.clone();

    let ui_state = Arc::new(Mutex::new(ui::UiState::default()));
    let engine = Arc::new(Mutex::new(SyncEngine::new(
        ui_state.clone(),
        move || {
            reload_flag.store(true, Ordering::Relaxed);
        },
        &settings,
    )));

    let mut transport = Transport::new(engine.clone(), &settings.host, settings.port);
    if let Err(err) = transport.connect() {
        if !settings.auto_reload_on_error {
            return Err(Box::new(err));
        }
        warn!("initial connection failed: {}; retrying", err);
        reload_requested.store(true, Ordering::Relaxed);
    }

    let _raw_mode = RawModeGuard::enable().ok();
    let mut terminal = if !quiet {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, EnterAlternateScreen, cursor::Hide);
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).ok()
    } else {
        None
    };

    // UI / input / reconnect loop.
    let mut last_attempt: Option<Instant> = None;
    let mut halt_reported = false;
    loop {
        let backoff_elapsed =
            last_attempt.map_or(true, |attempt| attempt.elapsed() >= RECONNECT_BACKOFF);
        if reload_requested.load(Ordering::Relaxed) && backoff_elapsed {
            last_attempt = Some(Instant::now());
            transport.disconnect();
            engine.lock().unwrap().reset();
            match transport.connect() {
                Ok(()) => {
                    reload_requested.store(false, Ordering::Relaxed);
                    info!("reloaded");
                }
                Err(err) => warn!("reconnect failed: {}; retrying", err),
            }
        }

        if let Some(term) = terminal.as_mut() {
            let state_label = format!("{:?}", engine.lock().unwrap().state());
            let log_lines = logging::snapshot(&log_buffer);
            let ui_state = ui_state.lock().unwrap();
            ui::draw_status(term, &state_label, &ui_state, &log_lines);
        }

        match controls::poll_action() {
            controls::ControlAction::Quit => break,
            controls::ControlAction::Reload => {
                info!("manual reload requested");
                reload_requested.store(true, Ordering::Relaxed);
                last_attempt = None;
                halt_reported = false;
            }
            controls::ControlAction::Continue => {}
        }

        // Halted without auto-reload: keep the last good clock frozen
        // on screen and wait for manual intervention.
        if !halt_reported && engine.lock().unwrap().state() == SyncState::ErrorHalt {
            error!("halted on error; press r to reload or q to quit");
            halt_reported = true;
        }

        sleep(Duration::from_millis(50));
    }

    transport.disconnect();

    // Restore the terminal state before exiting.
    if let Some(mut term) = terminal {
        let _ = term.show_cursor();
        let stdout = term.backend_mut();
        let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    }

    Ok(0)
}

/// Settings file, then environment, then CLI flags, in ascending
/// precedence.
fn resolve_settings(args: &ArgMatches) -> Result<ClientSettings, Box<dyn std::error::Error>> {
    let path = args.get_one::<String>("settings").unwrap();
    let mut settings = ClientSettings::load(Path::new(path))?;

    if let Ok(host) = std::env::var("CUECLOCK_HOST") {
        settings.host = host;
    }
    if let Ok(port) = std::env::var("CUECLOCK_PORT") {
        settings.port = port.parse()?;
    }

    if let Some(host) = args.get_one::<String>("host") {
        settings.host = host.clone();
    }
    if let Some(port) = args.get_one::<String>("port") {
        settings.port = port.parse()?;
    }
    if args.get_flag("no-auto-reload") {
        settings.auto_reload_on_error = false;
    }
    if args.get_flag("debug") {
        settings.debug = true;
    }

    Ok(settings)
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
