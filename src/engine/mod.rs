//! Core scanning engine module

pub mod digest;
pub mod policy;
pub mod report;
pub mod rules;
pub mod scanner;

pub use digest::FileDigests;
pub use report::{current_datetime, host_name, Detection, DetectionSource, HashKind, ResultSink, Severity};
pub use rules::RuleSet;
pub use scanner::{EngineError, ScanEngine, ThrottleSettings};
