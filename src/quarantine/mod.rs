//! Quarantine store: size-bounded holding area for confirmed detections
//!
//! Stored files are XOR-obfuscated with a fixed 8-byte repeating key. This
//! is an anti-double-click measure, not confidentiality; the key must not
//! change or restore of pre-existing stores breaks.

use crate::database::schema::QUARANTINE_INIT_SQL;
use crate::engine::digest;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_FOLDER_LIMIT_BYTES: u64 = 500 * 1024 * 1024;
const DEFAULT_SAFE_FREE_BYTES: u64 = 100 * 1024 * 1024;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const TRANSFER_BUF: usize = 64 * 1024;

const XOR_KEY: [u8; 8] = [0xAA, 0x55, 0xC3, 0x7E, 0x9A, 0x1F, 0xB6, 0x4D];

#[derive(Error, Debug)]
enum QuarantineError {
    #[error("{0}")]
    Message(String),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

struct ManagerInner {
    db_path: PathBuf,
    folder: PathBuf,
    conn: Option<Connection>,
}

/// Quarantine manager. Every operation serializes on the instance mutex and
/// reports its outcome as a status string (`QUARANTINED`, `RESTORED`,
/// `ERROR: ...`, ...); those strings are the sole external indication.
pub struct QuarantineManager {
    inner: Mutex<ManagerInner>,
}

impl QuarantineManager {
    pub fn new(db_path: impl Into<PathBuf>, quarantine_folder: impl Into<PathBuf>) -> Self {
        Self {
            inner: Mutex::new(ManagerInner {
                db_path: db_path.into(),
                folder: quarantine_folder.into(),
                conn: None,
            }),
        }
    }

    /// Move a file into the quarantine store. Applies, in order: emergency
    /// deletion under low disk, oldest-first pruning when the store would
    /// exceed its size limit, then the obfuscate-move with a database record.
    pub fn quarantine(&self, path: &Path) -> String {
        let mut inner = self.inner.lock().unwrap();
        if let Err(e) = inner.open_db() {
            return format!("ERROR: Cannot open DB: {e}");
        }

        let folder = inner.db_info_value("quarantine_folder_path");
        if let Some(folder) = folder {
            if !folder.is_empty() {
                inner.folder = PathBuf::from(folder);
            }
        }
        let folder_limit = inner
            .db_info_u64("quarantine_folder_limit_bytes")
            .unwrap_or(DEFAULT_FOLDER_LIMIT_BYTES);
        let safe_free = inner
            .db_info_u64("quarantine_safe_free_bytes")
            .unwrap_or(DEFAULT_SAFE_FREE_BYTES);

        if let Err(e) = std::fs::create_dir_all(&inner.folder) {
            return format!("ERROR: Failed to ensure quarantine folder exists: {e}");
        }

        if !path.exists() {
            return format!("ERROR: File not found: {}", path.display());
        }
        let original_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let free_bytes = free_space_bytes(&inner.folder);

        if free_bytes < safe_free {
            return match std::fs::remove_file(path) {
                Ok(()) => {
                    warn!(file = %path.display(), free_bytes, safe_free, "emergency delete");
                    format!(
                        "EMERGENCY_DELETED: free_bytes({free_bytes}) < safe_threshold({safe_free}), deleted {}",
                        path.display()
                    )
                }
                Err(e) => format!("ERROR: failed to delete file in emergency: {e}"),
            };
        }

        let quarantine_total = inner.total_quarantine_bytes();

        let mut pruned_freed = None;
        if quarantine_total + original_size > folder_limit {
            let needed = (quarantine_total + original_size) - folder_limit;
            match inner.prune(needed) {
                Ok(freed) => pruned_freed = Some(freed),
                Err(e) => return format!("ERROR: Unable to make room in quarantine: {e}"),
            }
        }

        let stored_name = make_stored_filename(path);
        let dest = inner.folder.join(&stored_name);
        let bytes_written = match xor_transform_file(path, &dest) {
            Ok(n) => n,
            Err(e) => return format!("ERROR: Failed to move file to quarantine: {e}"),
        };

        let stored_hash = digest::sha256_hex(&dest).unwrap_or_default();
        if let Err(e) = inner.insert_record(path, &stored_name, bytes_written, &stored_hash) {
            let _ = std::fs::remove_file(&dest);
            return format!("ERROR: Failed to record quarantine in DB: {e}");
        }
        if let Err(e) = std::fs::remove_file(path) {
            warn!(file = %path.display(), error = %e, "failed to remove original after quarantine");
        }

        info!(file = %path.display(), stored = %dest.display(), "quarantined");
        match pruned_freed {
            Some(freed) => format!(
                "PRUNED_AND_QUARANTINED: freed={freed} bytes; stored_as={}",
                dest.display()
            ),
            None => format!("QUARANTINED: stored_as={}", dest.display()),
        }
    }

    /// Whitelist a file by its SHA-256 so future scans skip it
    pub fn whitelist(&self, path: &Path) -> String {
        let mut inner = self.inner.lock().unwrap();
        if let Err(e) = inner.open_db() {
            return format!("ERROR: Open DB failed: {e}");
        }
        if !path.exists() {
            return format!("ERROR: File not found: {}", path.display());
        }
        let hash = match digest::sha256_hex(path) {
            Ok(hash) => hash,
            Err(e) => return format!("ERROR: Hash computation failed: {e}"),
        };
        if let Err(e) = inner.upsert_whitelist(&hash, &path.to_string_lossy()) {
            return format!("ERROR: Failed to insert whitelist: {e}");
        }
        format!("WHITELISTED: sha256={hash}")
    }

    /// Restore a quarantined file to its original path, whitelisting the
    /// restored content. Accepts the stored filename or the full stored path.
    pub fn restore(&self, stored_name_or_path: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        if let Err(e) = inner.open_db() {
            return format!("ERROR: Open DB failed: {e}");
        }

        let search_name = Path::new(stored_name_or_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| stored_name_or_path.to_string());

        let record = inner.find_record(&search_name, stored_name_or_path);
        let Some((id, stored_path, stored_filename, original_path)) = record else {
            return format!("ERROR: Quarantined file not found: {stored_name_or_path}");
        };

        let src = Path::new(&stored_path).join(&stored_filename);
        if !src.exists() {
            return format!("ERROR: Quarantined file missing on disk: {}", src.display());
        }

        let dest = PathBuf::from(&original_path);
        if let Some(parent) = dest.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return format!("ERROR: Failed to create destination directories: {e}");
            }
        }

        // XOR is its own inverse.
        if let Err(e) = xor_transform_file(&src, &dest) {
            return format!("ERROR: Failed to decode and restore file: {e}");
        }

        let hash = digest::sha256_hex(&dest).unwrap_or_default();
        if !hash.is_empty() {
            if let Err(e) = inner.upsert_whitelist(&hash, &dest.to_string_lossy()) {
                warn!(error = %e, "failed to whitelist restored file");
            }
        }

        if let Err(e) = inner.mark_restored(id, &dest.to_string_lossy()) {
            warn!(error = %e, "failed to mark quarantine record restored");
        }

        let mut message = format!("RESTORED: {}", dest.display());
        if !hash.is_empty() {
            message.push_str(&format!(" sha256={hash}"));
        }
        if let Err(e) = std::fs::remove_file(&src) {
            message.push_str(&format!(" WARNING: Failed to remove quarantined file: {e}"));
        }
        info!(restored = %dest.display(), "restore complete");
        message
    }

    /// Close the backing database handle. Further operations reopen it.
    pub fn shutdown(&self) {
        self.inner.lock().unwrap().conn = None;
    }
}

impl ManagerInner {
    fn open_db(&mut self) -> Result<(), QuarantineError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(QUARANTINE_INIT_SQL)?;
        self.conn = Some(conn);
        Ok(())
    }

    fn conn(&self) -> &Connection {
        self.conn.as_ref().expect("database opened by caller")
    }

    fn db_info_value(&self, key: &str) -> Option<String> {
        self.conn()
            .query_row(
                "SELECT value FROM db_info WHERE key = ?1 LIMIT 1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .ok()
            .flatten()
    }

    fn db_info_u64(&self, key: &str) -> Option<u64> {
        self.db_info_value(key).and_then(|v| v.parse().ok())
    }

    /// Current store size: the `db_info` figure when present, otherwise the
    /// sum of regular files in the quarantine folder.
    fn total_quarantine_bytes(&self) -> u64 {
        if let Some(total) = self.db_info_u64("quarantine_total_size") {
            return total;
        }
        std::fs::read_dir(&self.folder)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .filter_map(|entry| entry.metadata().ok())
                    .filter(|metadata| metadata.is_file())
                    .map(|metadata| metadata.len())
                    .sum()
            })
            .unwrap_or(0)
    }

    fn insert_record(
        &self,
        original: &Path,
        stored_filename: &str,
        stored_size: u64,
        stored_hash: &str,
    ) -> Result<(), QuarantineError> {
        self.conn().execute(
            "INSERT INTO quarantine_files
                 (original_path, stored_filename, stored_path, stored_size,
                  quarantined_at, original_hash, hash_type, deleted)
             VALUES (?1, ?2, ?3, ?4, datetime('now'), ?5, 'sha256', 0)",
            params![
                original.to_string_lossy().into_owned(),
                stored_filename,
                self.folder.to_string_lossy().into_owned(),
                stored_size as i64,
                stored_hash,
            ],
        )?;
        Ok(())
    }

    fn upsert_whitelist(&self, hash: &str, note: &str) -> Result<(), QuarantineError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO whitelist (hash, hash_type, note) VALUES (?1, 'sha256', ?2)",
            params![hash, note],
        )?;
        Ok(())
    }

    fn find_record(
        &self,
        stored_filename: &str,
        full_path: &str,
    ) -> Option<(i64, String, String, String)> {
        self.conn()
            .query_row(
                "SELECT id, stored_path, stored_filename, original_path
                 FROM quarantine_files
                 WHERE stored_filename = ?1
                    OR (stored_path || '/' || stored_filename) = ?2
                 LIMIT 1",
                params![stored_filename, full_path],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .ok()
            .flatten()
    }

    fn mark_restored(&self, id: i64, restored_path: &str) -> Result<(), QuarantineError> {
        self.conn().execute(
            "UPDATE quarantine_files
             SET restored = 1, restored_at = datetime('now'), restored_path = ?1
             WHERE id = ?2",
            params![restored_path, id],
        )?;
        Ok(())
    }

    /// Reclaim at least `needed` bytes from the oldest non-deleted records,
    /// removing each stored file and its row. Errors when the store cannot
    /// yield that much.
    fn prune(&self, needed: u64) -> Result<u64, QuarantineError> {
        if needed == 0 {
            return Ok(0);
        }

        let mut stmt = self.conn().prepare(
            "SELECT id, stored_path, stored_filename, stored_size
             FROM quarantine_files
             WHERE deleted = 0
             ORDER BY quarantined_at ASC, id ASC",
        )?;
        let mut rows = stmt.query([])?;

        let mut victims: Vec<(i64, PathBuf, u64)> = Vec::new();
        let mut reclaimable = 0u64;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let stored_path: String = row.get(1)?;
            let stored_filename: String = row.get(2)?;
            let stored_size: i64 = row.get(3)?;
            reclaimable += stored_size as u64;
            victims.push((id, Path::new(&stored_path).join(stored_filename), stored_size as u64));
            if reclaimable >= needed {
                break;
            }
        }
        drop(rows);
        drop(stmt);

        if reclaimable < needed {
            return Err(QuarantineError::Message(
                "Not enough reclaimable space in quarantine to satisfy request".to_string(),
            ));
        }

        let mut freed = 0u64;
        for (id, file, size) in victims {
            if file.exists() {
                if let Err(e) = std::fs::remove_file(&file) {
                    warn!(file = %file.display(), error = %e, "failed to remove pruned file");
                }
            }
            match self
                .conn()
                .execute("DELETE FROM quarantine_files WHERE id = ?1", [id])
            {
                Ok(_) => freed += size,
                Err(e) => warn!(id, error = %e, "failed to delete pruned record"),
            }
        }
        info!(freed, needed, "quarantine pruned");
        Ok(freed)
    }
}

/// `<epoch_ms>_<rand64_hex>_<basename>` with path-hostile characters
/// replaced, unique enough for a local store.
fn make_stored_filename(original: &Path) -> String {
    let epoch_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let entropy: u64 = rand::random();
    let basename = original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{epoch_ms}_{entropy:x}_{basename}")
        .replace([':', '\\', '/'], "_")
}

/// Stream `src` into `dst`, XOR-ing every byte with the repeating key.
/// Returns bytes written. Applying it twice yields the original content.
fn xor_transform_file(src: &Path, dst: &Path) -> std::io::Result<u64> {
    let mut input = File::open(src)?;
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut output = File::create(dst)?;

    let mut buf = vec![0u8; TRANSFER_BUF];
    let mut key_pos = 0usize;
    let mut total = 0u64;
    loop {
        let read = input.read(&mut buf)?;
        if read == 0 {
            break;
        }
        for byte in &mut buf[..read] {
            *byte ^= XOR_KEY[key_pos];
            key_pos = (key_pos + 1) % XOR_KEY.len();
        }
        output.write_all(&buf[..read])?;
        total += read as u64;
    }
    output.flush()?;
    Ok(total)
}

/// Available bytes on the volume holding `path`, walking up to the nearest
/// existing ancestor first. Failures read as zero free space.
fn free_space_bytes(path: &Path) -> u64 {
    let mut probe = path;
    while !probe.exists() {
        match probe.parent() {
            Some(parent) if parent.as_os_str().is_empty() => break,
            Some(parent) => probe = parent,
            None => break,
        }
    }
    platform_free_space(probe).unwrap_or(0)
}

#[cfg(unix)]
fn platform_free_space(path: &Path) -> Option<u64> {
    let stat = nix::sys::statvfs::statvfs(path).ok()?;
    Some(stat.blocks_available() as u64 * stat.fragment_size() as u64)
}

#[cfg(windows)]
fn platform_free_space(path: &Path) -> Option<u64> {
    use std::os::windows::ffi::OsStrExt;
    use winapi::um::fileapi::GetDiskFreeSpaceExW;
    use winapi::um::winnt::ULARGE_INTEGER;

    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();
    unsafe {
        let mut available: ULARGE_INTEGER = std::mem::zeroed();
        let ok = GetDiskFreeSpaceExW(
            wide.as_ptr(),
            &mut available,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        );
        (ok != 0).then(|| *available.QuadPart())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dir: tempfile::TempDir,
        manager: QuarantineManager,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(
            dir.path().join("quarantine.db"),
            dir.path().join("quarantine"),
        );
        Fixture { dir, manager }
    }

    fn set_db_info(fx: &Fixture, key: &str, value: &str) {
        // Open through the manager first so the schema exists.
        fx.manager.whitelist(Path::new("/definitely/not/here"));
        let conn = Connection::open(fx.dir.path().join("quarantine.db")).unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO db_info (key, value) VALUES (?1, ?2)",
            [key, value],
        )
        .unwrap();
    }

    fn stored_path_from(status: &str) -> PathBuf {
        let idx = status.find("stored_as=").expect("stored_as in status");
        PathBuf::from(&status[idx + "stored_as=".len()..])
    }

    #[test]
    fn xor_transform_is_its_own_inverse() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        let content = b"some bytes that are longer than the eight byte key".to_vec();
        std::fs::write(&a, &content).unwrap();

        let written = xor_transform_file(&a, &b).unwrap();
        assert_eq!(written, content.len() as u64);
        assert_ne!(std::fs::read(&b).unwrap(), content);

        xor_transform_file(&b, &c).unwrap();
        assert_eq!(std::fs::read(&c).unwrap(), content);
    }

    #[test]
    fn stored_filenames_are_sanitized_and_unique() {
        let name_a = make_stored_filename(Path::new("/tmp/evil:file.exe"));
        let name_b = make_stored_filename(Path::new("/tmp/evil:file.exe"));
        assert!(!name_a.contains(':') && !name_a.contains('/') && !name_a.contains('\\'));
        assert!(name_a.ends_with("evil_file.exe"));
        assert_ne!(name_a, name_b);
    }

    #[test]
    fn quarantine_then_restore_round_trips_content() {
        let fx = fixture();
        let victim = fx.dir.path().join("infected.bin");
        let content = b"malicious payload bytes".to_vec();
        std::fs::write(&victim, &content).unwrap();

        let status = fx.manager.quarantine(&victim);
        assert!(status.starts_with("QUARANTINED: "), "got: {status}");
        assert!(!victim.exists());

        let stored = stored_path_from(&status);
        assert!(stored.exists());
        assert_ne!(std::fs::read(&stored).unwrap(), content);

        let stored_name = stored.file_name().unwrap().to_string_lossy().into_owned();
        let restore_status = fx.manager.restore(&stored_name);
        assert!(restore_status.starts_with("RESTORED: "), "got: {restore_status}");
        assert!(victim.exists());
        assert_eq!(std::fs::read(&victim).unwrap(), content);
        assert!(!stored.exists());

        // Restored content is whitelisted by SHA-256.
        let expected_hash = digest::sha256_hex(&victim).unwrap();
        let conn = Connection::open(fx.dir.path().join("quarantine.db")).unwrap();
        let listed: bool = conn
            .query_row(
                "SELECT 1 FROM whitelist WHERE hash = ?1 AND hash_type = 'sha256'",
                [&expected_hash],
                |_| Ok(true),
            )
            .unwrap_or(false);
        assert!(listed);

        let restored_flag: i64 = conn
            .query_row(
                "SELECT restored FROM quarantine_files WHERE stored_filename = ?1",
                [&stored_name],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(restored_flag, 1);
    }

    #[test]
    fn restore_accepts_full_stored_path() {
        let fx = fixture();
        let victim = fx.dir.path().join("by_path.bin");
        std::fs::write(&victim, b"payload").unwrap();

        let status = fx.manager.quarantine(&victim);
        let stored = stored_path_from(&status);
        let restore_status = fx.manager.restore(&stored.to_string_lossy());
        assert!(restore_status.starts_with("RESTORED: "), "got: {restore_status}");
        assert!(victim.exists());
    }

    #[test]
    fn restore_of_unknown_name_errors() {
        let fx = fixture();
        let status = fx.manager.restore("never_stored.bin");
        assert!(status.starts_with("ERROR: Quarantined file not found"));
    }

    #[test]
    fn quarantine_missing_file_errors() {
        let fx = fixture();
        let status = fx.manager.quarantine(&fx.dir.path().join("ghost.bin"));
        assert!(status.starts_with("ERROR: File not found"));
    }

    #[test]
    fn emergency_delete_under_low_disk() {
        let fx = fixture();
        // A safe-free threshold no volume satisfies forces the emergency path.
        set_db_info(&fx, "quarantine_safe_free_bytes", &u64::MAX.to_string());

        let victim = fx.dir.path().join("doomed.bin");
        std::fs::write(&victim, b"payload").unwrap();

        let status = fx.manager.quarantine(&victim);
        assert!(status.starts_with("EMERGENCY_DELETED: "), "got: {status}");
        assert!(!victim.exists());

        let conn = Connection::open(fx.dir.path().join("quarantine.db")).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM quarantine_files", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn over_limit_store_prunes_oldest_first() {
        let fx = fixture();
        set_db_info(&fx, "quarantine_folder_limit_bytes", "1024");

        let first = fx.dir.path().join("first.bin");
        std::fs::write(&first, vec![1u8; 600]).unwrap();
        let status_first = fx.manager.quarantine(&first);
        assert!(status_first.starts_with("QUARANTINED: "), "got: {status_first}");
        let first_stored = stored_path_from(&status_first);

        // Age the first record so the eviction order is unambiguous.
        {
            let conn = Connection::open(fx.dir.path().join("quarantine.db")).unwrap();
            conn.execute(
                "UPDATE quarantine_files SET quarantined_at = datetime('now', '-1 hour')",
                [],
            )
            .unwrap();
        }

        let second = fx.dir.path().join("second.bin");
        std::fs::write(&second, vec![2u8; 600]).unwrap();
        let status_second = fx.manager.quarantine(&second);
        assert!(
            status_second.starts_with("PRUNED_AND_QUARANTINED: "),
            "got: {status_second}"
        );
        assert!(status_second.contains("freed=600 bytes"));

        assert!(!first_stored.exists());
        assert!(stored_path_from(&status_second).exists());

        let conn = Connection::open(fx.dir.path().join("quarantine.db")).unwrap();
        let remaining: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM quarantine_files WHERE deleted = 0",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[test]
    fn prune_failure_when_nothing_reclaimable() {
        let fx = fixture();
        set_db_info(&fx, "quarantine_folder_limit_bytes", "10");

        let victim = fx.dir.path().join("too_big.bin");
        std::fs::write(&victim, vec![0u8; 4096]).unwrap();

        let status = fx.manager.quarantine(&victim);
        assert!(
            status.starts_with("ERROR: Unable to make room in quarantine"),
            "got: {status}"
        );
        assert!(victim.exists());
    }

    #[test]
    fn whitelist_records_file_hash() {
        let fx = fixture();
        let file = fx.dir.path().join("benign.bin");
        std::fs::write(&file, b"benign content").unwrap();

        let status = fx.manager.whitelist(&file);
        let expected = digest::sha256_hex(&file).unwrap();
        assert_eq!(status, format!("WHITELISTED: sha256={expected}"));

        // Upsert: repeating the call succeeds.
        assert_eq!(fx.manager.whitelist(&file), status);
    }

    #[test]
    fn shutdown_allows_reopen() {
        let fx = fixture();
        let file = fx.dir.path().join("cycle.bin");
        std::fs::write(&file, b"x").unwrap();
        assert!(fx.manager.whitelist(&file).starts_with("WHITELISTED"));
        fx.manager.shutdown();
        assert!(fx.manager.whitelist(&file).starts_with("WHITELISTED"));
    }
}
