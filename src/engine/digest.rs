//! File digest computation (MD5, SHA-1, SHA-256)

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 16 * 1024;

/// The three digests of one file, each absent iff the file could not be
/// opened or read. Values are lowercase hex.
#[derive(Debug, Clone, Default)]
pub struct FileDigests {
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
}

impl FileDigests {
    pub fn get(&self, kind: crate::engine::HashKind) -> Option<&String> {
        match kind {
            crate::engine::HashKind::Md5 => self.md5.as_ref(),
            crate::engine::HashKind::Sha1 => self.sha1.as_ref(),
            crate::engine::HashKind::Sha256 => self.sha256.as_ref(),
        }
    }
}

/// Compute all three digests in a single streaming pass. Failure mode is
/// absence, never an error: an unreadable file yields an empty set.
pub fn compute_all(path: &Path) -> FileDigests {
    match compute_all_inner(path) {
        Some(d) => d,
        None => FileDigests::default(),
    }
}

fn compute_all_inner(path: &Path) -> Option<FileDigests> {
    let mut file = File::open(path).ok()?;
    let mut md5 = Md5::new();
    let mut sha1 = Sha1::new();
    let mut sha256 = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buf).ok()?;
        if read == 0 {
            break;
        }
        md5.update(&buf[..read]);
        sha1.update(&buf[..read]);
        sha256.update(&buf[..read]);
    }

    Some(FileDigests {
        md5: Some(hex::encode(md5.finalize())),
        sha1: Some(hex::encode(sha1.finalize())),
        sha256: Some(hex::encode(sha256.finalize())),
    })
}

/// SHA-256 of a single file, lowercase hex
pub fn sha256_hex(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
