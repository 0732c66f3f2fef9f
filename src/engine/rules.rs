//! Compiled pattern rule set and partial-read sampling

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use thiserror::Error;

/// Whole-file scan ceiling; larger files are sampled
pub const FULL_SCAN_MAX: u64 = 10 * 1024 * 1024;
/// Bytes read from the head of a sampled file
pub const SAMPLE_PREFIX_LEN: u64 = 4 * 1024 * 1024;
/// Bytes read from the tail of a sampled file
pub const SAMPLE_SUFFIX_LEN: u64 = 1024 * 1024;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to load rule set: {0}")]
    Load(String),
    #[error("Scan failed: {0}")]
    Scan(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only compiled rule set. Loaded once at engine initialization and
/// owned by the engine for its lifetime.
pub struct RuleSet {
    rules: yara_x::Rules,
}

impl RuleSet {
    /// Load rules from a pre-built artifact. A `.yar`/`.yara` path is
    /// compiled from source as a convenience; anything else is treated as a
    /// serialized compiled artifact.
    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let is_source = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yar") | Some("yara")
        );
        let rules = if is_source {
            let src = std::fs::read_to_string(path)?;
            yara_x::compile(src.as_str()).map_err(|e| RuleError::Load(e.to_string()))?
        } else {
            let file = File::open(path)?;
            yara_x::Rules::deserialize_from(file).map_err(|e| RuleError::Load(e.to_string()))?
        };
        Ok(Self { rules })
    }

    /// Compile a rule set from source text (used by tests and tooling)
    pub fn compile(source: &str) -> Result<Self, RuleError> {
        let rules = yara_x::compile(source).map_err(|e| RuleError::Load(e.to_string()))?;
        Ok(Self { rules })
    }

    /// Run every rule over `data`, stopping at the first match per rule, and
    /// return the matched rule identifiers in evaluation order.
    pub fn scan_bytes(&self, data: &[u8]) -> Result<Vec<String>, RuleError> {
        let mut scanner = yara_x::Scanner::new(&self.rules);
        let results = scanner
            .scan(data)
            .map_err(|e| RuleError::Scan(e.to_string()))?;
        Ok(results
            .matching_rules()
            .map(|rule| rule.identifier().to_string())
            .collect())
    }
}

/// Read up to 4 MiB from the head and 1 MiB from the tail of the file,
/// trimmed to the bytes actually present, concatenated into one buffer.
pub fn read_prefix_suffix(path: &Path, size: u64) -> std::io::Result<Vec<u8>> {
    let prefix_len = SAMPLE_PREFIX_LEN.min(size);
    let suffix_len = SAMPLE_SUFFIX_LEN.min(size - prefix_len);

    let mut file = File::open(path)?;
    let mut buf = Vec::with_capacity((prefix_len + suffix_len) as usize);

    let mut prefix = vec![0u8; prefix_len as usize];
    let read = read_up_to(&mut file, &mut prefix)?;
    prefix.truncate(read);
    buf.extend_from_slice(&prefix);

    if suffix_len > 0 {
        file.seek(SeekFrom::Start(size - suffix_len))?;
        let mut suffix = vec![0u8; suffix_len as usize];
        let read = read_up_to(&mut file, &mut suffix)?;
        suffix.truncate(read);
        buf.extend_from_slice(&suffix);
    }

    Ok(buf)
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let read = file.read(&mut buf[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEST_RULES: &str = r#"
rule MarkerOne {
    strings:
        $a = "FERRO_MARKER_ONE"
    condition:
        $a
}

rule MarkerTwo {
    strings:
        $b = "FERRO_MARKER_TWO"
    condition:
        $b
}
"#;

    #[test]
    fn matches_report_identifiers_in_order() {
        let rules = RuleSet::compile(TEST_RULES).unwrap();
        let hits = rules
            .scan_bytes(b"xx FERRO_MARKER_ONE yy FERRO_MARKER_TWO zz")
            .unwrap();
        assert_eq!(hits, vec!["MarkerOne".to_string(), "MarkerTwo".to_string()]);
    }

    #[test]
    fn clean_buffer_matches_nothing() {
        let rules = RuleSet::compile(TEST_RULES).unwrap();
        assert!(rules.scan_bytes(b"nothing of note").unwrap().is_empty());
    }

    #[test]
    fn sampler_concatenates_head_and_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sampled.bin");
        // Larger than prefix+suffix so the middle is genuinely skipped.
        let total = (SAMPLE_PREFIX_LEN + SAMPLE_SUFFIX_LEN + 4096) as usize;
        let mut data = vec![b'.'; total];
        data[..4].copy_from_slice(b"HEAD");
        let tail_at = total - 4;
        data[tail_at..].copy_from_slice(b"TAIL");
        std::fs::File::create(&path).unwrap().write_all(&data).unwrap();

        let sample = read_prefix_suffix(&path, total as u64).unwrap();
        assert_eq!(
            sample.len(),
            (SAMPLE_PREFIX_LEN + SAMPLE_SUFFIX_LEN) as usize
        );
        assert_eq!(&sample[..4], b"HEAD");
        assert_eq!(&sample[sample.len() - 4..], b"TAIL");
    }

    #[test]
    fn sampler_trims_to_small_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.bin");
        std::fs::write(&path, b"tiny").unwrap();

        let sample = read_prefix_suffix(&path, 4).unwrap();
        assert_eq!(sample, b"tiny");
    }
}
