//! Local periodic tick source driving clock extrapolation between
//! snapshots.
//!
//! A thread-backed scheduler fires registered actions at integer
//! multiples of a base interval. The sync engine owns at most one
//! running source at a time; `stop` joins the scheduling thread before
//! returning, so no two clock-advance actions can overlap.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::Duration,
};

struct TickAction {
    name: &'static str,
    multiplier: u64,
    action: Arc<Mutex<dyn FnMut() + Send>>,
}

/// Cancellable periodic scheduler at a fixed base rate.
pub struct TickSource {
    base_interval: Duration,
    actions: Vec<TickAction>,
    finish: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TickSource {
    /// Create an idle scheduler with the given base interval.
    pub fn new(base_interval_ms: u64) -> Self {
        Self {
            base_interval: Duration::from_millis(base_interval_ms),
            actions: Vec::new(),
            finish: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Arm a named action to fire every `multiplier` base intervals.
    ///
    /// # Panics
    /// Panics when called after `start`, or with a zero multiplier.
    pub fn register<F>(&mut self, name: &'static str, multiplier: u64, action: F)
    where
        F: FnMut() + Send + 'static,
    {
        assert!(multiplier > 0, "tick multiplier must be at least 1");
        assert!(
            self.thread_handle.is_none(),
            "tick actions must be registered before start"
        );
        self.actions.push(TickAction {
            name,
            multiplier,
            action: Arc::new(Mutex::new(action)),
        });
    }

    /// Spawn the scheduling thread.
    ///
    /// # Panics
    /// Panics if the scheduler is already running.
    pub fn start(&mut self) {
        assert!(
            self.thread_handle.is_none(),
            "tick source started while already running"
        );

        self.finish.store(false, Ordering::Relaxed);
        let finish = self.finish.clone();
        let base_interval = self.base_interval;
        let actions: Vec<(u64, Arc<Mutex<dyn FnMut() + Send>>)> = self
            .actions
            .iter()
            .map(|event| (event.multiplier, event.action.clone()))
            .collect();

        log::debug!(
            "tick source started: base interval {:?}, {} actions",
            base_interval,
            actions.len()
        );

        let handle = std::thread::spawn(move || {
            let mut tick: u64 = 0;
            loop {
                std::thread::sleep(base_interval);
                if finish.load(Ordering::Relaxed) {
                    break;
                }
                tick += 1;
                for (multiplier, action) in &actions {
                    if tick % multiplier == 0 {
                        (action.lock().unwrap())();
                    }
                }
            }
        });
        self.thread_handle = Some(handle);
    }

    /// Whether the scheduling thread is currently alive.
    pub fn is_running(&self) -> bool {
        self.thread_handle.is_some()
    }

    /// Cancel all registered actions and join the scheduling thread.
    /// A no-op when the scheduler is not running.
    pub fn stop(&mut self) {
        self.finish.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            if handle.thread().id() == std::thread::current().id() {
                log::warn!("tick source stop called from its own thread; skipping join");
            } else if handle.join().is_err() {
                log::warn!("tick source thread panicked during join");
            }
        }
    }

    /// Names of the registered actions, in registration order.
    pub fn action_names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|event| event.name).collect()
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn fires_registered_actions_at_multiples() {
        let fine = Arc::new(AtomicU64::new(0));
        let coarse = Arc::new(AtomicU64::new(0));

        let mut source = TickSource::new(2);
        let fine_count = fine.clone();
        source.register("fine", 1, move || {
            fine_count.fetch_add(1, Ordering::Relaxed);
        });
        let coarse_count = coarse.clone();
        source.register("coarse", 4, move || {
            coarse_count.fetch_add(1, Ordering::Relaxed);
        });

        source.start();
        std::thread::sleep(Duration::from_millis(60));
        source.stop();

        let fine_total = fine.load(Ordering::Relaxed);
        let coarse_total = coarse.load(Ordering::Relaxed);
        assert!(fine_total >= 1, "fine action never fired");
        assert!(
            coarse_total <= fine_total / 4 + 1,
            "coarse action fired too often: {} vs {}",
            coarse_total,
            fine_total
        );

        // No further ticks after stop.
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(fine.load(Ordering::Relaxed), fine_total);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut source = TickSource::new(5);
        source.register("noop", 1, || {});
        source.start();
        source.stop();
        source.stop();
        assert!(!source.is_running());
    }

    #[test]
    fn stop_without_start_is_a_no_op() {
        let mut source = TickSource::new(5);
        source.stop();
        assert!(!source.is_running());
    }

    #[test]
    #[should_panic(expected = "already running")]
    fn double_start_panics() {
        let mut source = TickSource::new(5);
        source.start();
        source.start();
    }

    #[test]
    fn records_action_names() {
        let mut source = TickSource::new(10);
        source.register("clock", 1, || {});
        source.register("progress", 10, || {});
        assert_eq!(source.action_names(), vec!["clock", "progress"]);
    }
}
