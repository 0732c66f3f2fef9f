//! Quarantine store schema

/// Initialization SQL for the quarantine database. The store is opened in
/// create-if-missing mode, so the manager applies this on every open.
pub const QUARANTINE_INIT_SQL: &str = r#"
-- Key/value configuration with code-side fallbacks
CREATE TABLE IF NOT EXISTS db_info (
    key TEXT PRIMARY KEY,
    value TEXT
);

-- One row per quarantined file
CREATE TABLE IF NOT EXISTS quarantine_files (
    id INTEGER PRIMARY KEY,
    original_path TEXT,
    stored_filename TEXT,
    stored_path TEXT,
    stored_size INTEGER,
    quarantined_at TEXT DEFAULT (datetime('now')),
    original_hash TEXT,
    hash_type TEXT DEFAULT 'sha256',
    deleted INTEGER DEFAULT 0,
    restored INTEGER DEFAULT 0,
    restored_at TEXT,
    restored_path TEXT
);

-- Hashes excluded from future detections
CREATE TABLE IF NOT EXISTS whitelist (
    hash TEXT,
    hash_type TEXT,
    note TEXT,
    PRIMARY KEY (hash, hash_type)
);

CREATE INDEX IF NOT EXISTS idx_quarantine_stored_filename
    ON quarantine_files(stored_filename);
CREATE INDEX IF NOT EXISTS idx_quarantine_age
    ON quarantine_files(quarantined_at);
"#;
