//! Scan orchestrator: policy gate, signature lookup, content scan

use crate::database::{DatabaseError, SignatureDb};
use crate::engine::digest::{self, FileDigests};
use crate::engine::policy;
use crate::engine::report::{Detection, DetectionSource, HashKind, ResultSink, Severity};
use crate::engine::rules::{self, RuleError, RuleSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Minimum per-file work before the inter-file throttle engages
const THROTTLE_MIN_WORK_MS: u64 = 2;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Rule set error: {0}")]
    Rules(#[from] RuleError),
}

/// Inter-file throttle settings for folder scans
#[derive(Debug, Clone, Copy)]
pub struct ThrottleSettings {
    /// Fraction of wall-clock time spent working, in (0, 1); 0 disables
    pub duty_cycle: f64,
    /// Clamp for the sleep inserted after each file
    pub max_sleep_ms: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            duty_cycle: 0.5,
            max_sleep_ms: 500,
        }
    }
}

/// Signature store and rule set; not safe for concurrent use, so the engine
/// serializes every scan's lookup + content-scan phase on this one mutex.
struct EngineCore {
    db: SignatureDb,
    rules: RuleSet,
}

/// The scanning engine. Owns the signature database handle and the compiled
/// rule set for its lifetime; dropping the engine releases both.
pub struct ScanEngine {
    core: Mutex<EngineCore>,
    total_count: AtomicU64,
    completed_count: AtomicU64,
    throttle: Mutex<ThrottleSettings>,
    full_scan_override: AtomicBool,
}

impl ScanEngine {
    /// Load the compiled rule set and open the signature database. Progress
    /// and failures are reported to `status` as NOTICE/ERROR results; on
    /// failure partially acquired resources are released before returning.
    pub fn init(
        rules_path: &Path,
        db_path: &Path,
        status: Option<&ResultSink>,
    ) -> Result<Self, EngineError> {
        emit_status(status, Severity::Notice, "Loading rules & database...");
        crate::crash::install_terminate_log_hook();

        let db = match SignatureDb::open(db_path) {
            Ok(db) => db,
            Err(e) => {
                emit_status(
                    status,
                    Severity::Error,
                    format!("Cannot open database: {e}"),
                );
                return Err(e.into());
            }
        };

        emit_status(status, Severity::Notice, "Starting YARA rules load...");
        let rules = match RuleSet::load(rules_path) {
            Ok(rules) => rules,
            Err(e) => {
                emit_status(
                    status,
                    Severity::Error,
                    format!("Cannot load YARA rules: {}", rules_path.display()),
                );
                return Err(e.into());
            }
        };
        emit_status(status, Severity::Notice, "YARA rules loaded successfully");

        info!(rules = %rules_path.display(), db = %db_path.display(), "engine initialized");
        emit_status(status, Severity::Notice, "Engine Ready (Rules + DB Loaded)");

        Ok(Self {
            core: Mutex::new(EngineCore { db, rules }),
            total_count: AtomicU64::new(0),
            completed_count: AtomicU64::new(0),
            throttle: Mutex::new(ThrottleSettings::default()),
            full_scan_override: AtomicBool::new(false),
        })
    }

    /// Scan a single file, delivering at most one terminal result to `sink`
    pub fn scan_file(&self, path: &Path, sink: &ResultSink) {
        self.total_count.store(1, Ordering::Relaxed);
        self.completed_count.store(0, Ordering::Relaxed);
        self.scan_file_internal(path, sink);
    }

    /// Recursively scan a folder. Progress counters are reset first; the
    /// inter-file throttle keeps the configured duty cycle between files.
    pub fn scan_folder(&self, path: &Path, sink: &ResultSink) {
        if !path.exists() {
            return;
        }

        let total = WalkDir::new(path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .count() as u64;
        self.total_count.store(total, Ordering::Relaxed);
        self.completed_count.store(0, Ordering::Relaxed);
        debug!(folder = %path.display(), total, "folder scan started");

        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let work_start = Instant::now();
            self.scan_file_internal(entry.path(), sink);
            self.completed_count.fetch_add(1, Ordering::Relaxed);

            let throttle = *self.throttle.lock().unwrap();
            let work_ms = work_start.elapsed().as_millis() as u64;
            if let Some(sleep_ms) = throttle_sleep_ms(work_ms, throttle) {
                std::thread::sleep(Duration::from_millis(sleep_ms));
            }
        }
    }

    /// Shared per-file pipeline: policy gate, then hash lookup and content
    /// scan under the engine mutex. Exactly one terminal result is emitted
    /// for non-silent outcomes; clean files emit nothing.
    pub(crate) fn scan_file_internal(&self, path: &Path, sink: &ResultSink) {
        let full_scan = self.full_scan_override.load(Ordering::Relaxed);

        // The exclusion list stays active even under the full-scan override
        // so the engine never scans its own working set.
        if policy::is_excluded_path(path) {
            self.completed_count.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let Ok(metadata) = std::fs::metadata(path) else {
            return;
        };
        if !metadata.is_file() {
            return;
        }
        let file_size = metadata.len();

        if !full_scan && file_size > policy::MAX_SCAN_SIZE {
            let mut r = Detection::for_file(path);
            r.severity = Severity::Notice;
            r.detection_source = Some(DetectionSource::Policy);
            r.description = "Skipped: file too large (>500MB)".to_string();
            sink(&r);
            self.completed_count.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if !full_scan && policy::is_trusted_publisher(path) {
            let mut r = Detection::for_file(path);
            r.severity = Severity::Notice;
            r.detection_source = Some(DetectionSource::Policy);
            r.description = "Skipped: trusted publisher signature".to_string();
            sink(&r);
            self.completed_count.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let core = self.core.lock().unwrap();

        let digests = digest::compute_all(path);

        if !full_scan && self.hash_is_whitelisted(&core, &digests) {
            let mut r = Detection::for_file(path);
            r.severity = Severity::Notice;
            r.detection_source = Some(DetectionSource::Whitelist);
            r.description = "Skipped: hash whitelisted".to_string();
            sink(&r);
            self.completed_count.fetch_add(1, Ordering::Relaxed);
            return;
        }

        // Strongest digest first.
        for kind in [HashKind::Sha256, HashKind::Sha1, HashKind::Md5] {
            let Some(hex) = digests.get(kind) else {
                continue;
            };
            if let Some(malware_name) = core.db.lookup(hex, kind) {
                let mut r = Detection::for_file(path);
                r.is_malware = true;
                r.severity = Severity::High;
                r.detection_source = Some(DetectionSource::Hash);
                r.matched_hash = Some(hex.clone());
                r.hash_type = Some(kind);
                r.malware_name = Some(malware_name);
                r.description = format!("Matched {} in DB", kind.as_str());
                sink(&r);
                return;
            }
        }

        self.content_scan(&core, path, file_size, &digests, sink);
    }

    fn hash_is_whitelisted(&self, core: &EngineCore, digests: &FileDigests) -> bool {
        [HashKind::Sha256, HashKind::Sha1, HashKind::Md5]
            .into_iter()
            .any(|kind| {
                digests
                    .get(kind)
                    .is_some_and(|hex| core.db.is_whitelisted(hex, kind))
            })
    }

    /// Size-based dispatch into the rule set: whole file up to 10 MiB,
    /// prefix+suffix sample up to 500 MiB, nothing beyond that.
    fn content_scan(
        &self,
        core: &EngineCore,
        path: &Path,
        file_size: u64,
        digests: &FileDigests,
        sink: &ResultSink,
    ) {
        let matches = if file_size <= rules::FULL_SCAN_MAX {
            match std::fs::read(path) {
                Ok(data) => core.rules.scan_bytes(&data),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "full-file read failed");
                    self.emit_scan_error(path, "YARA full-file scan failed", sink);
                    return;
                }
            }
        } else if file_size <= policy::MAX_SCAN_SIZE {
            match rules::read_prefix_suffix(path, file_size) {
                Ok(sample) => core.rules.scan_bytes(&sample),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "segment read failed");
                    self.emit_scan_error(path, "Failed to read file segments for partial scan", sink);
                    return;
                }
            }
        } else {
            // Full-scan override admits oversized files this far, but the
            // sampler tops out at 500 MiB.
            return;
        };

        let matched = match matches {
            Ok(matched) => matched,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "rule scan failed");
                let desc = if file_size <= rules::FULL_SCAN_MAX {
                    "YARA full-file scan failed"
                } else {
                    "YARA partial scan failed"
                };
                self.emit_scan_error(path, desc, sink);
                return;
            }
        };

        if matched.is_empty() {
            return;
        }

        let mut r = Detection::for_file(path);
        r.is_malware = true;
        r.severity = Severity::Warning;
        r.detection_source = Some(DetectionSource::Yara);
        r.md5 = digests.md5.clone();
        r.sha1 = digests.sha1.clone();
        r.sha256 = digests.sha256.clone();
        r.matched_rules_count = matched.len();
        r.description = format!(
            "Matched {} {}: {}",
            matched.len(),
            if matched.len() == 1 { "rule" } else { "rules" },
            matched.join(", ")
        );
        r.matched_rules = matched;
        sink(&r);
    }

    fn emit_scan_error(&self, path: &Path, description: &str, sink: &ResultSink) {
        let mut r = Detection::for_file(path);
        r.severity = Severity::Error;
        r.description = description.to_string();
        sink(&r);
    }

    // ---- Full-scan override ------------------------------------------------

    /// When set, only the exclusion-path gate applies: size, publisher and
    /// whitelist skips are bypassed and every admitted file is hashed and
    /// content-scanned.
    pub fn set_full_scan(&self, enabled: bool) {
        self.full_scan_override.store(enabled, Ordering::Relaxed);
    }

    pub fn is_full_scan(&self) -> bool {
        self.full_scan_override.load(Ordering::Relaxed)
    }

    // ---- Throttle configuration -------------------------------------------

    /// Duty cycle in (0, 1); values outside the interval disable throttling
    pub fn set_throttle_duty(&self, duty: f64) {
        let mut throttle = self.throttle.lock().unwrap();
        throttle.duty_cycle = if duty <= 0.0 || duty >= 1.0 { 0.0 } else { duty };
    }

    pub fn set_throttle_max_sleep_ms(&self, max_sleep_ms: u64) {
        self.throttle.lock().unwrap().max_sleep_ms = max_sleep_ms;
    }

    pub fn throttle_settings(&self) -> ThrottleSettings {
        *self.throttle.lock().unwrap()
    }

    // ---- Progress ----------------------------------------------------------

    pub fn get_progress_percent(&self) -> u8 {
        progress_percent(
            self.completed_count.load(Ordering::Relaxed),
            self.total_count.load(Ordering::Relaxed),
        )
    }

    pub fn get_completed_count(&self) -> u64 {
        self.completed_count.load(Ordering::Relaxed)
    }

    pub fn get_total_count(&self) -> u64 {
        self.total_count.load(Ordering::Relaxed)
    }

    pub fn reset_progress(&self) {
        self.total_count.store(0, Ordering::Relaxed);
        self.completed_count.store(0, Ordering::Relaxed);
    }
}

fn emit_status(status: Option<&ResultSink>, severity: Severity, description: impl Into<String>) {
    if let Some(sink) = status {
        sink(&Detection::status(severity, description));
    }
}

/// Sleep to insert after a file whose work took `work_ms`, or `None` when no
/// sleep is due: `min(w * (1 - d) / d, max_sleep)` for work of 2 ms or more.
fn throttle_sleep_ms(work_ms: u64, throttle: ThrottleSettings) -> Option<u64> {
    if work_ms < THROTTLE_MIN_WORK_MS {
        return None;
    }
    let d = throttle.duty_cycle;
    if d <= 0.0 || d >= 1.0 {
        return None;
    }
    let sleep = (work_ms as f64 * (1.0 - d) / d).min(throttle.max_sleep_ms as f64) as u64;
    (sleep > 0).then_some(sleep)
}

/// `floor(100 * completed / total)` clamped to 0..=100; with an unknown
/// total a heuristic capped at 99 keeps pollers moving.
fn progress_percent(completed: u64, total: u64) -> u8 {
    if total == 0 {
        if completed == 0 {
            return 0;
        }
        return completed.min(99) as u8;
    }
    ((completed * 100) / total).min(100) as u8
}
