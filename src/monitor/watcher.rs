//! Filesystem change sources feeding the realtime queue
//!
//! Two backends behind one spawn call: the native change-notification
//! watcher (`notify`) and a portable polling fallback. One thread per
//! watched root either way; threads observe the shared monitoring flag and
//! exit within one wait interval of a stop request.

use crate::monitor::queue::EventQueue;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// How often a native watcher thread re-checks the monitoring flag
const NATIVE_WAIT: Duration = Duration::from_millis(250);
/// Period of the polling fallback
const POLL_PERIOD: Duration = Duration::from_millis(500);

/// Watch backend, chosen at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchBackend {
    /// Platform change notifications via `notify`
    Native,
    /// Recursive mtime-snapshot polling
    Polling,
}

/// Threads spawned for one realtime session
pub struct WatcherSet {
    handles: Vec<JoinHandle<()>>,
}

impl WatcherSet {
    pub fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.join() {
                warn!(?e, "watcher thread panicked");
            }
        }
    }
}

/// Expand environment variables in the watch spec, split on `;` or `|`,
/// trim whitespace, and drop empty entries.
pub fn parse_watch_spec(spec: &str) -> Vec<PathBuf> {
    expand_env_vars(spec)
        .split(|c| c == ';' || c == '|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Expand `%NAME%` and `$NAME` references from the process environment;
/// unknown variables are left verbatim.
fn expand_env_vars(spec: &str) -> String {
    let mut out = String::with_capacity(spec.len());
    let mut chars = spec.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '%' => {
                let name: String = chars.by_ref().take_while(|&c| c != '%').collect();
                match std::env::var(&name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push('%');
                        out.push_str(&name);
                        out.push('%');
                    }
                }
            }
            '$' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    out.push('$');
                } else {
                    match std::env::var(&name) {
                        Ok(value) => out.push_str(&value),
                        Err(_) => {
                            out.push('$');
                            out.push_str(&name);
                        }
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Spawn one watcher thread per root. Returns an error only when a thread
/// could not be spawned at all; per-root watch failures degrade to polling.
pub fn spawn(
    backend: WatchBackend,
    roots: Vec<PathBuf>,
    queue: Arc<EventQueue>,
    monitoring: Arc<AtomicBool>,
) -> std::io::Result<WatcherSet> {
    let mut handles = Vec::with_capacity(roots.len());
    for root in roots {
        let queue = Arc::clone(&queue);
        let monitoring = Arc::clone(&monitoring);
        let handle = std::thread::Builder::new()
            .name(format!("ferroscan-watch-{}", root.display()))
            .spawn(move || match backend {
                WatchBackend::Native => native_watch_root(root, queue, monitoring),
                WatchBackend::Polling => polling_watch_root(root, queue, monitoring),
            })?;
        handles.push(handle);
    }
    Ok(WatcherSet { handles })
}

fn native_watch_root(root: PathBuf, queue: Arc<EventQueue>, monitoring: Arc<AtomicBool>) {
    let (tx, rx) = channel();
    let mut watcher = match RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            let _ = tx.send(res);
        },
        Config::default(),
    ) {
        Ok(watcher) => watcher,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "native watcher unavailable, polling instead");
            return polling_watch_root(root, queue, monitoring);
        }
    };

    if let Err(e) = watcher.watch(&root, RecursiveMode::Recursive) {
        warn!(root = %root.display(), error = %e, "watch registration failed, polling instead");
        return polling_watch_root(root, queue, monitoring);
    }
    debug!(root = %root.display(), "native watcher started");

    while monitoring.load(Ordering::Relaxed) {
        match rx.recv_timeout(NATIVE_WAIT) {
            Ok(Ok(event)) => handle_change_event(event, &queue),
            Ok(Err(e)) => warn!(root = %root.display(), error = %e, "watch event error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    // Dropping the watcher cancels the outstanding platform subscriptions.
    debug!(root = %root.display(), "native watcher exiting");
}

/// Enqueue file paths for additions, modifications, and the new name of a
/// rename. Deletes, old rename names, and directories are ignored. When a
/// freshly reported path cannot be stat-ed it is enqueued anyway; the
/// worker's own checks dispose of transients.
fn handle_change_event(event: notify::Event, queue: &EventQueue) {
    let relevant = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    if !relevant {
        return;
    }
    for path in event.paths {
        match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => queue.enqueue(path),
            Ok(_) => {}
            Err(_) => queue.enqueue(path),
        }
    }
}

/// Portable fallback: recursive enumeration every 500 ms with an mtime
/// snapshot, emitting events for additions and modifications and pruning
/// entries for files that vanished.
fn polling_watch_root(root: PathBuf, queue: Arc<EventQueue>, monitoring: Arc<AtomicBool>) {
    debug!(root = %root.display(), "polling watcher started");
    let mut seen: HashMap<PathBuf, SystemTime> = HashMap::new();
    for (path, mtime) in snapshot(&root) {
        seen.insert(path, mtime);
    }

    while monitoring.load(Ordering::Relaxed) {
        std::thread::sleep(POLL_PERIOD);
        if !monitoring.load(Ordering::Relaxed) {
            break;
        }

        for (path, mtime) in snapshot(&root) {
            match seen.get(&path) {
                None => {
                    seen.insert(path.clone(), mtime);
                    queue.enqueue(path);
                }
                Some(prev) if *prev != mtime => {
                    seen.insert(path.clone(), mtime);
                    queue.enqueue(path);
                }
                Some(_) => {}
            }
        }
        seen.retain(|path, _| path.exists());
    }
    debug!(root = %root.display(), "polling watcher exiting");
}

fn snapshot(root: &PathBuf) -> Vec<(PathBuf, SystemTime)> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let mtime = entry.metadata().ok()?.modified().ok()?;
            Some((entry.into_path(), mtime))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_splits_on_both_separators_and_trims() {
        let roots = parse_watch_spec("/home/a ; /home/b|/home/c ;;");
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/home/a"),
                PathBuf::from("/home/b"),
                PathBuf::from("/home/c"),
            ]
        );
    }

    #[test]
    fn empty_spec_parses_to_nothing() {
        assert!(parse_watch_spec("").is_empty());
        assert!(parse_watch_spec(" ; | ").is_empty());
    }

    #[test]
    fn env_vars_expand_in_both_styles() {
        std::env::set_var("FERROSCAN_TEST_ROOT", "/srv/watched");
        assert_eq!(
            expand_env_vars("%FERROSCAN_TEST_ROOT%/in"),
            "/srv/watched/in"
        );
        assert_eq!(
            expand_env_vars("$FERROSCAN_TEST_ROOT/in"),
            "/srv/watched/in"
        );
        std::env::remove_var("FERROSCAN_TEST_ROOT");
    }

    #[test]
    fn unknown_vars_stay_verbatim() {
        assert_eq!(
            expand_env_vars("%NO_SUCH_FERROSCAN_VAR%"),
            "%NO_SUCH_FERROSCAN_VAR%"
        );
        assert_eq!(
            expand_env_vars("$NO_SUCH_FERROSCAN_VAR"),
            "$NO_SUCH_FERROSCAN_VAR"
        );
    }

    #[test]
    fn polling_watcher_reports_new_and_modified_files() {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(EventQueue::new());
        let monitoring = Arc::new(AtomicBool::new(true));

        let set = spawn(
            WatchBackend::Polling,
            vec![dir.path().to_path_buf()],
            Arc::clone(&queue),
            Arc::clone(&monitoring),
        )
        .unwrap();

        // Let the watcher take its initial snapshot before the file lands,
        // so the write registers as an addition.
        std::thread::sleep(Duration::from_millis(1200));
        std::fs::write(dir.path().join("incoming.bin"), b"payload").unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while queue.is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(queue.pop(), Some(dir.path().join("incoming.bin")));

        monitoring.store(false, Ordering::Relaxed);
        set.join();
    }
}
