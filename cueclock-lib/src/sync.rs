//! Synchronization state machine.
//!
//! Consumes decoded snapshots and transport-loss signals, reconciles
//! the remote-reported elapsed time against the local clock model, and
//! starts or stops the tick source that extrapolates the clock between
//! snapshots. Every snapshot unconditionally overrides the local
//! extrapolation, bounding drift to at most one inter-snapshot
//! interval.

use std::sync::{Arc, Mutex};

use log::{debug, error, info};

use crate::clock::ClockModel;
use crate::display::DisplaySink;
use crate::settings::ClientSettings;
use crate::snapshot::{self, RemoteState, Snapshot};
use crate::ticker::TickSource;

/// Base tick interval driving clock extrapolation, in milliseconds.
pub const CLOCK_BASE_INTERVAL_MS: u64 = 10;

/// The progress report fires every this many base intervals.
pub const PROGRESS_TICK_MULTIPLIER: u64 = 10;

/// Lifecycle state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    Stopped,
    Playing,
    Paused,
    Queued,
    /// Halted on failure, awaiting manual intervention.
    ErrorHalt,
    /// Control has passed to the external reload collaborator; the
    /// engine ignores input until [`SyncEngine::reset`].
    ReloadPending,
}

/// Remote-reported playback position, shared with the tick actions.
#[derive(Debug, Clone, Copy, Default)]
struct PlaybackPosition {
    current_ms: i64,
    offset_ms: i64,
    duration_ms: i64,
}

type SharedSink = Arc<Mutex<dyn DisplaySink + Send>>;

/// Owner of the clock model and the timer session.
///
/// One engine exists per connection lifecycle. Frames arrive on the
/// transport thread via [`handle_frame`](Self::handle_frame); tick
/// actions run on the tick source's scheduling thread. All state they
/// share sits behind mutexes, and snapshot application holds the
/// position and clock locks together so a snapshot is never applied
/// between the two halves of a tick's effect.
pub struct SyncEngine {
    clock: Arc<Mutex<ClockModel>>,
    position: Arc<Mutex<PlaybackPosition>>,
    display: SharedSink,
    reload: Box<dyn FnMut() + Send>,
    state: SyncState,
    session: Option<TickSource>,
    sessions_started: u64,
    auto_reload_on_error: bool,
    debug: bool,
}

impl SyncEngine {
    /// Create an engine in the `Uninitialized` state.
    ///
    /// `reload` is the parameterless reload-request signal; external
    /// code reacts by reestablishing the transport and calling
    /// [`reset`](Self::reset).
    pub fn new<F>(display: SharedSink, reload: F, settings: &ClientSettings) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self {
            clock: Arc::new(Mutex::new(ClockModel::new())),
            position: Arc::new(Mutex::new(PlaybackPosition::default())),
            display,
            reload: Box::new(reload),
            state: SyncState::Uninitialized,
            session: None,
            sessions_started: 0,
            auto_reload_on_error: settings.auto_reload_on_error,
            debug: settings.debug,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Current locally extrapolated timecode in milliseconds.
    pub fn timecode_ms(&self) -> i64 {
        self.clock.lock().unwrap().timecode_ms()
    }

    /// Whether a timer session is currently running.
    pub fn session_active(&self) -> bool {
        self.session.as_ref().map_or(false, TickSource::is_running)
    }

    /// Total number of timer sessions started over the engine's life.
    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Feed one raw text frame from the transport.
    pub fn handle_frame(&mut self, raw: &str) {
        if self.state == SyncState::ReloadPending || self.state == SyncState::ErrorHalt {
            debug!("frame ignored in {:?}: {}", self.state, raw.trim_end());
            return;
        }
        if self.debug {
            debug!("frame: {}", raw.trim_end());
        }

        match snapshot::decode(raw) {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(err) => {
                // Interpolating from unknown remote state is worse than
                // a visible reload; never guess at missing fields.
                error!("{}", err);
                self.escalate_failure();
            }
        }
    }

    /// Signal from the transport that the connection was lost.
    pub fn handle_transport_lost(&mut self) {
        if self.state == SyncState::ReloadPending || self.state == SyncState::ErrorHalt {
            return;
        }
        error!("transport connection lost");
        self.escalate_failure();
    }

    /// Return to `Uninitialized` with a fresh clock. Called by the
    /// reload collaborator once the transport is reestablished.
    pub fn reset(&mut self) {
        self.stop_session();
        *self.clock.lock().unwrap() = ClockModel::new();
        *self.position.lock().unwrap() = PlaybackPosition::default();
        self.state = SyncState::Uninitialized;
        info!("sync engine reset");
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        if self.debug {
            debug!("snapshot: {:?}", snapshot);
        }

        match snapshot.state {
            RemoteState::Error => {
                self.stop_session();
                error!("remote source reported error state");
                self.state = SyncState::ErrorHalt;
                if self.auto_reload_on_error {
                    self.request_reload();
                }
            }
            RemoteState::ReloadRequired | RemoteState::Unknown(_) => {
                self.stop_session();
                if let RemoteState::Unknown(code) = snapshot.state {
                    error!("unrecognized remote state code {}", code);
                }
                self.state = SyncState::ReloadPending;
                self.request_reload();
            }
            RemoteState::Stopped | RemoteState::Paused | RemoteState::Queued => {
                self.stop_session();
                self.sync_clock(&snapshot);
                self.state = match snapshot.state {
                    RemoteState::Paused => SyncState::Paused,
                    RemoteState::Queued => SyncState::Queued,
                    _ => SyncState::Stopped,
                };
            }
            RemoteState::Playing => {
                self.sync_clock(&snapshot);
                if !self.session_active() {
                    self.start_session();
                }
                self.state = SyncState::Playing;
            }
        }
    }

    /// Resynchronize the clock and position from a snapshot and push
    /// the result to the display.
    fn sync_clock(&mut self, snapshot: &Snapshot) {
        let fields = {
            let mut position = self.position.lock().unwrap();
            let mut clock = self.clock.lock().unwrap();
            position.current_ms = snapshot.current_ms;
            position.offset_ms = snapshot.offset_ms;
            position.duration_ms = snapshot.duration_ms;

            let timecode = snapshot.current_ms + snapshot.offset_ms;
            if clock.is_initialized() {
                clock.apply_relative(timecode, snapshot.fps);
            } else {
                clock.apply_absolute(timecode, snapshot.fps);
                info!("clock initialized at {} ms, {} fps", timecode, snapshot.fps);
            }
            clock.display_fields()
        };

        let mut display = self.display.lock().unwrap();
        display.set_cue(snapshot);
        display.set_clock(&fields);
        display.set_progress(snapshot.current_ms, snapshot.duration_ms);
    }

    fn start_session(&mut self) {
        let mut session = TickSource::new(CLOCK_BASE_INTERVAL_MS);

        let clock = self.clock.clone();
        let position = self.position.clone();
        let display = self.display.clone();
        session.register("clock", 1, move || {
            run_clock_tick(&position, &clock, &display);
        });

        let position = self.position.clone();
        let display = self.display.clone();
        session.register("progress", PROGRESS_TICK_MULTIPLIER, move || {
            run_progress_tick(&position, &display);
        });

        session.start();
        self.session = Some(session);
        self.sessions_started += 1;
    }

    /// Tear down the active timer session, joining its thread. The
    /// next session may only start after this returns.
    fn stop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
    }

    /// Decode failures and transport loss are treated identically:
    /// stop extrapolating and hand control to the reload collaborator,
    /// or halt awaiting manual intervention when auto-reload is off.
    fn escalate_failure(&mut self) {
        self.stop_session();
        if self.auto_reload_on_error {
            self.state = SyncState::ReloadPending;
            self.request_reload();
        } else {
            self.state = SyncState::ErrorHalt;
        }
    }

    fn request_reload(&mut self) {
        info!("requesting external reload");
        (self.reload)();
    }
}

/// Fine-grained tick: advance the clock by one base interval and
/// re-render. Holds the position and clock locks together so a
/// concurrent snapshot application cannot interleave.
fn run_clock_tick(
    position: &Arc<Mutex<PlaybackPosition>>,
    clock: &Arc<Mutex<ClockModel>>,
    display: &SharedSink,
) {
    let fields = {
        let mut position = position.lock().unwrap();
        let mut clock = clock.lock().unwrap();
        position.current_ms += CLOCK_BASE_INTERVAL_MS as i64;
        clock.advance(CLOCK_BASE_INTERVAL_MS as i64);
        clock.display_fields()
    };
    display.lock().unwrap().set_clock(&fields);
}

/// Coarse tick: report the current progress pair.
fn run_progress_tick(position: &Arc<Mutex<PlaybackPosition>>, display: &SharedSink) {
    let snapshot = *position.lock().unwrap();
    display
        .lock()
        .unwrap()
        .set_progress(snapshot.current_ms, snapshot.duration_ms);
}
