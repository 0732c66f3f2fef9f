//! Ferroscan - On-Host Antivirus Engine
//!
//! This crate provides the core functionality for an on-host antivirus:
//! signature and YARA-rule scanning of files and folders, a real-time
//! filesystem monitor feeding a debounced scan queue, and a quarantine
//! store with restore and whitelist support.

pub mod crash;
pub mod database;
pub mod engine;
pub mod logging;
pub mod monitor;
pub mod quarantine;

/// Re-export commonly used types
pub use database::SignatureDb;
pub use engine::{Detection, DetectionSource, HashKind, ResultSink, ScanEngine, Severity};
pub use monitor::{MonitorState, RealtimeMonitor, WatchBackend};
pub use quarantine::QuarantineManager;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub rules_path: String,
    pub signature_db_path: String,
    pub quarantine_db_path: String,
    pub quarantine_folder: String,
    pub watch_spec: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules_path: "all_rules.yarc".to_string(),
            signature_db_path: "full_hash.db".to_string(),
            quarantine_db_path: "quarantine.db".to_string(),
            quarantine_folder: "quarantine".to_string(),
            watch_spec: std::env::temp_dir().to_string_lossy().to_string(),
        }
    }
}
