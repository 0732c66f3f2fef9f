//! Signature database access

pub mod schema;

use crate::engine::HashKind;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only handle over the signature tables (`sig_md5`, `sig_sha1`,
/// `sig_sha256`) and the hash whitelist.
///
/// Lookups are case-sensitive lowercase hex; callers normalize. The handle
/// is not internally synchronized: the scan engine owns it exclusively
/// behind its own mutex.
pub struct SignatureDb {
    conn: Connection,
}

impl SignatureDb {
    /// Open the signature database read-only with a 5 s busy timeout.
    /// Point-lookup statements are prepared on first use and cached for the
    /// lifetime of the connection.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Look up a hash in the signature table for its type. Returns the
    /// malware name on a hit. Store failures degrade to "no hit" so a broken
    /// signature database never blocks scanning.
    pub fn lookup(&self, hex: &str, kind: HashKind) -> Option<String> {
        let sql = match kind {
            HashKind::Md5 => "SELECT malware_name FROM sig_md5 WHERE hash = ?1 LIMIT 1",
            HashKind::Sha1 => "SELECT malware_name FROM sig_sha1 WHERE hash = ?1 LIMIT 1",
            HashKind::Sha256 => "SELECT malware_name FROM sig_sha256 WHERE hash = ?1 LIMIT 1",
        };
        let result = self
            .conn
            .prepare_cached(sql)
            .and_then(|mut stmt| stmt.query_row([hex], |row| row.get::<_, String>(0)).optional());
        match result {
            Ok(hit) => hit,
            Err(e) => {
                warn!(hash = hex, kind = kind.as_str(), error = %e, "signature lookup failed");
                None
            }
        }
    }

    /// Check the whitelist table for `(hash, hash_type)`. Failures degrade
    /// to "not whitelisted".
    pub fn is_whitelisted(&self, hex: &str, kind: HashKind) -> bool {
        let result = self
            .conn
            .prepare_cached("SELECT 1 FROM whitelist WHERE hash = ?1 AND hash_type = ?2 LIMIT 1")
            .and_then(|mut stmt| {
                stmt.query_row([hex, kind.column_value()], |_| Ok(()))
                    .optional()
            });
        match result {
            Ok(hit) => hit.is_some(),
            Err(e) => {
                warn!(hash = hex, error = %e, "whitelist lookup failed");
                false
            }
        }
    }
}
