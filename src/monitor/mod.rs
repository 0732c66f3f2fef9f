//! Real-time protection: change watcher, debounced queue, scan worker

pub mod queue;
pub mod watcher;

pub use queue::EventQueue;
pub use watcher::{parse_watch_spec, WatchBackend};

use crate::engine::{Detection, ResultSink, ScanEngine};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long the worker waits on the queue before re-checking state
const DEBOUNCE_THRESHOLD: Duration = Duration::from_millis(800);
/// File-stability sampling: attempts and spacing
const STABLE_ATTEMPTS: u32 = 5;
const STABLE_WAIT: Duration = Duration::from_millis(150);

/// Monitor lifecycle states. All transitions go through compare-and-swap;
/// anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MonitorState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
}

impl MonitorState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => MonitorState::Starting,
            2 => MonitorState::Running,
            3 => MonitorState::Stopping,
            _ => MonitorState::Stopped,
        }
    }
}

/// Realtime protection controller: one watcher thread per watched root
/// feeding the queue, one worker thread draining it into the scan engine.
///
/// The stored callback is snapshotted out of its slot before every
/// invocation; stop disables callbacks before joining threads so in-flight
/// scans drop their notifications quietly.
pub struct RealtimeMonitor {
    engine: Arc<ScanEngine>,
    backend: WatchBackend,
    state: AtomicU8,
    monitoring: Arc<AtomicBool>,
    callbacks_enabled: Arc<AtomicBool>,
    callback: Arc<Mutex<Option<ResultSink>>>,
    queue: Arc<EventQueue>,
    worker: Mutex<Option<JoinHandle<()>>>,
    watchers: Mutex<Option<watcher::WatcherSet>>,
}

impl RealtimeMonitor {
    pub fn new(engine: Arc<ScanEngine>, backend: WatchBackend) -> Self {
        Self {
            engine,
            backend,
            state: AtomicU8::new(MonitorState::Stopped as u8),
            monitoring: Arc::new(AtomicBool::new(false)),
            callbacks_enabled: Arc::new(AtomicBool::new(false)),
            callback: Arc::new(Mutex::new(None)),
            queue: Arc::new(EventQueue::new()),
            worker: Mutex::new(None),
            watchers: Mutex::new(None),
        }
    }

    pub fn state(&self) -> MonitorState {
        MonitorState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Start watching the roots named by `watch_spec` (env vars expanded,
    /// `;`/`|` separated). Returns false without side effects unless the
    /// monitor was fully stopped.
    pub fn start_realtime(&self, watch_spec: &str, callback: ResultSink) -> bool {
        if self
            .state
            .compare_exchange(
                MonitorState::Stopped as u8,
                MonitorState::Starting as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            debug!("start request ignored, monitor not stopped");
            return false;
        }

        // Install the new callback; any replaced one is dropped outside the
        // slot lock.
        let previous = {
            let mut slot = self.callback.lock().unwrap();
            let previous = slot.replace(callback);
            self.callbacks_enabled.store(true, Ordering::SeqCst);
            previous
        };
        drop(previous);

        self.monitoring.store(true, Ordering::SeqCst);

        let worker = {
            let queue = Arc::clone(&self.queue);
            let monitoring = Arc::clone(&self.monitoring);
            let callbacks_enabled = Arc::clone(&self.callbacks_enabled);
            let callback = Arc::clone(&self.callback);
            let engine = Arc::clone(&self.engine);
            std::thread::Builder::new()
                .name("ferroscan-monitor-worker".to_string())
                .spawn(move || {
                    worker_loop(queue, monitoring, callbacks_enabled, callback, engine);
                })
        };
        let worker = match worker {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "failed to spawn monitor worker");
                self.abort_start();
                return false;
            }
        };
        *self.worker.lock().unwrap() = Some(worker);

        let mut roots = parse_watch_spec(watch_spec);
        if roots.is_empty() {
            roots.push(PathBuf::from(watch_spec));
        }
        match watcher::spawn(
            self.backend,
            roots,
            Arc::clone(&self.queue),
            Arc::clone(&self.monitoring),
        ) {
            Ok(set) => *self.watchers.lock().unwrap() = Some(set),
            Err(e) => {
                warn!(error = %e, "failed to spawn watcher threads");
                self.abort_start();
                return false;
            }
        }

        self.state
            .store(MonitorState::Running as u8, Ordering::SeqCst);
        info!(spec = watch_spec, "realtime monitoring started");
        true
    }

    /// Stop monitoring: disable callbacks, wake and join the watcher threads
    /// then the worker, and clear all queued state.
    pub fn stop_realtime(&self) {
        if self
            .state
            .compare_exchange(
                MonitorState::Running as u8,
                MonitorState::Stopping as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            debug!("stop request while not running, clearing flags");
            self.monitoring.store(false, Ordering::SeqCst);
            self.queue.notify_all();
            return;
        }

        self.monitoring.store(false, Ordering::SeqCst);
        self.queue.notify_all();

        // Disable and take the callback before joining so in-flight scans
        // drop their notifications; the handle itself is dropped after the
        // slot lock is released.
        let previous = {
            let mut slot = self.callback.lock().unwrap();
            self.callbacks_enabled.store(false, Ordering::SeqCst);
            slot.take()
        };
        drop(previous);

        if let Some(set) = self.watchers.lock().unwrap().take() {
            set.join();
        }
        if let Some(handle) = self.worker.lock().unwrap().take() {
            if let Err(e) = handle.join() {
                warn!(?e, "monitor worker panicked");
            }
        }

        self.queue.clear();
        self.state
            .store(MonitorState::Stopped as u8, Ordering::SeqCst);
        info!("realtime monitoring stopped");
    }

    /// Roll back a partial start: clear flags, join whatever already runs,
    /// return to Stopped.
    fn abort_start(&self) {
        self.monitoring.store(false, Ordering::SeqCst);
        self.callbacks_enabled.store(false, Ordering::SeqCst);
        self.queue.notify_all();
        if let Some(set) = self.watchers.lock().unwrap().take() {
            set.join();
        }
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
        let previous = { self.callback.lock().unwrap().take() };
        drop(previous);
        self.queue.clear();
        self.state
            .store(MonitorState::Stopped as u8, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn callbacks_enabled(&self) -> bool {
        self.callbacks_enabled.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

impl Drop for RealtimeMonitor {
    fn drop(&mut self) {
        self.stop_realtime();
    }
}

fn worker_loop(
    queue: Arc<EventQueue>,
    monitoring: Arc<AtomicBool>,
    callbacks_enabled: Arc<AtomicBool>,
    callback: Arc<Mutex<Option<ResultSink>>>,
    engine: Arc<ScanEngine>,
) {
    debug!("monitor worker started");
    loop {
        let path = queue.wait_and_pop(DEBOUNCE_THRESHOLD, &monitoring);
        if let Some(path) = path {
            process_queued_path(&path, &callbacks_enabled, &callback, &engine);
        } else if !monitoring.load(Ordering::Relaxed) && queue.is_empty() {
            break;
        }
    }

    // Best-effort drain of anything that arrived during shutdown.
    while let Some(path) = queue.pop() {
        process_queued_path(&path, &callbacks_enabled, &callback, &engine);
    }
    debug!("monitor worker exiting");
}

fn process_queued_path(
    path: &Path,
    callbacks_enabled: &Arc<AtomicBool>,
    callback: &Arc<Mutex<Option<ResultSink>>>,
    engine: &Arc<ScanEngine>,
) {
    // Snapshot the callback; without one there is nobody to notify.
    let Some(sink) = callback.lock().unwrap().clone() else {
        return;
    };

    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => {}
        _ => {
            debug!(path = %path.display(), "queued path gone or not a file");
            return;
        }
    }

    if !wait_for_stable_size(path) {
        debug!(path = %path.display(), "file did not stabilize, scanning best-effort");
    }

    let enabled = Arc::clone(callbacks_enabled);
    let guarded: ResultSink = Arc::new(move |detection: &Detection| {
        if !enabled.load(Ordering::SeqCst) {
            return;
        }
        // A panicking callback must not take the worker thread down.
        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink(detection)));
        if outcome.is_err() {
            warn!("realtime callback panicked");
        }
    });
    engine.scan_file_internal(path, &guarded);
}

/// Sample the file size up to five times, 150 ms apart; stable means two
/// consecutive equal reads. Returns false when the size never settled (the
/// caller proceeds best-effort). A vanished file also reads as unstable.
fn wait_for_stable_size(path: &Path) -> bool {
    let mut last_size: Option<u64> = None;
    for _ in 0..STABLE_ATTEMPTS {
        let size = match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            _ => return false,
        };
        if last_size == Some(size) {
            return true;
        }
        last_size = Some(size);
        std::thread::sleep(STABLE_WAIT);
    }
    false
}
