//! Evidence Digests
//!
//! SHA-256 fingerprints of acquired evidence files. These are the opaque
//! hashes an operator copies from the audit log into the console.

use chrono::Local;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceDigest {
    pub file_name: String,
    pub sha256: String,
    pub size: u64,
}

impl EvidenceDigest {
    /// Audit log line in the acquisition agent's format.
    pub fn log_line(&self) -> String {
        format!(
            "[{}] SHA256 {}: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.file_name,
            self.sha256
        )
    }
}

/// Stream a file through SHA-256.
pub fn digest_file(path: &Path) -> io::Result<EvidenceDigest> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let size = io::copy(&mut file, &mut hasher)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Digested {} ({} bytes)", file_name, size);
    Ok(EvidenceDigest {
        file_name,
        sha256: hex::encode(hasher.finalize()),
        size,
    })
}

/// Digest every regular file in `folder`, sorted by name. Unreadable files
/// are skipped with a warning.
pub fn digest_folder(folder: &Path) -> io::Result<Vec<EvidenceDigest>> {
    let mut paths: Vec<_> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut digests = Vec::with_capacity(paths.len());
    for path in paths {
        match digest_file(&path) {
            Ok(digest) => digests.push(digest),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    info!("Digested {} files in {}", digests.len(), folder.display());
    Ok(digests)
}

/// Append digest lines to the audit log, creating it if needed.
pub fn append_to_log(log_path: &Path, digests: &[EvidenceDigest]) -> io::Result<()> {
    let mut log = OpenOptions::new().create(true).append(true).open(log_path)?;
    for digest in digests {
        writeln!(log, "{}", digest.log_line())?;
    }
    log.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_digest_known_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, "abc").unwrap();

        let digest = digest_file(&path).unwrap();
        assert_eq!(digest.file_name, "abc.txt");
        assert_eq!(digest.size, 3);
        assert_eq!(
            digest.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_folder_sorted_and_skips_dirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.bin"), "b").unwrap();
        fs::write(dir.path().join("a.bin"), "a").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let digests = digest_folder(dir.path()).unwrap();
        let names: Vec<&str> = digests.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
    }

    #[test]
    fn test_append_to_log() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("audit_log.txt");
        fs::write(&log, "=== ACQUISITION ===\n").unwrap();

        let digest = EvidenceDigest {
            file_name: "ram.mem".to_string(),
            sha256: "ab".repeat(32),
            size: 1,
        };
        append_to_log(&log, &[digest]).unwrap();

        let contents = fs::read_to_string(&log).unwrap();
        assert!(contents.starts_with("=== ACQUISITION ===\n"));
        assert!(contents.contains(&format!("SHA256 ram.mem: {}", "ab".repeat(32))));
    }
}
