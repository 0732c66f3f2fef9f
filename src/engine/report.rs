//! Scan result types delivered to caller-provided sinks

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Severity attached to an emitted result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "NOTICE")]
    Notice,
    #[serde(rename = "INFO")]
    Info,
    Warning,
    High,
    #[serde(rename = "ERROR")]
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Notice => "NOTICE",
            Severity::Info => "INFO",
            Severity::Warning => "Warning",
            Severity::High => "High",
            Severity::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Hash algorithm identifier used in signature matches and whitelist rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashKind {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA1")]
    Sha1,
    #[serde(rename = "SHA256")]
    Sha256,
}

impl HashKind {
    /// Uppercase form used in detection results and signature-table routing
    pub fn as_str(&self) -> &'static str {
        match self {
            HashKind::Md5 => "MD5",
            HashKind::Sha1 => "SHA1",
            HashKind::Sha256 => "SHA256",
        }
    }

    /// Lowercase form stored in the whitelist `hash_type` column
    pub fn column_value(&self) -> &'static str {
        match self {
            HashKind::Md5 => "md5",
            HashKind::Sha1 => "sha1",
            HashKind::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectionSource {
    Hash,
    Yara,
    Whitelist,
    Policy,
}

/// One terminal scan outcome (detection, policy/whitelist notice, or error).
///
/// Hash fields are lowercase hex. `matched_hash`/`hash_type` are present only
/// for signature hits; `matched_rules` only when the content scanner matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub is_malware: bool,
    pub timestamp: String,
    pub host_name: String,
    pub severity: Severity,
    pub filename: String,
    pub filepath: String,
    pub description: String,
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    pub matched_hash: Option<String>,
    pub hash_type: Option<HashKind>,
    pub detection_source: Option<DetectionSource>,
    pub malware_name: Option<String>,
    pub matched_rules_count: usize,
    pub matched_rules: Vec<String>,
}

impl Detection {
    /// Blank result stamped with the current time and host, for the given file
    pub fn for_file(path: &Path) -> Self {
        Self {
            is_malware: false,
            timestamp: current_datetime(),
            host_name: host_name(),
            severity: Severity::Notice,
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            filepath: path.to_string_lossy().into_owned(),
            description: String::new(),
            md5: None,
            sha1: None,
            sha256: None,
            matched_hash: None,
            hash_type: None,
            detection_source: None,
            malware_name: None,
            matched_rules_count: 0,
            matched_rules: Vec::new(),
        }
    }

    /// Status message not tied to a file (engine init notices and errors)
    pub fn status(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
            ..Self::for_file(Path::new(""))
        }
    }
}

/// Application-supplied result sink. Invoked at most once per terminal
/// outcome per file, and once per status message during initialization.
pub type ResultSink = Arc<dyn Fn(&Detection) + Send + Sync>;

/// Local wall-clock timestamp in `YYYY-MM-DD HH:MM:SS` form
pub fn current_datetime() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Machine name from the environment, `unknown` when unset
pub fn host_name() -> String {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
