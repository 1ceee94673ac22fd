//! Evidence Locator
//!
//! Finds the evidence root on removable media: a directory holding the
//! acquisition audit log and an `evidence/` folder. Read-only; every I/O
//! problem is reported as a visible "not found" state, never as an error.

pub mod mounts;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Manual,
    AutoDetected,
}

/// The evidence root in effect and how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceSource {
    pub root: PathBuf,
    pub origin: SourceOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogView {
    Present(String),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceListing {
    Files(Vec<String>),
    Empty,
    Missing,
}

#[derive(Debug, Clone)]
pub struct EvidenceLocator {
    marker_file: String,
    evidence_dir: String,
    search_roots: Vec<PathBuf>,
    mount_table: PathBuf,
}

impl EvidenceLocator {
    pub fn new(marker_file: impl Into<String>, evidence_dir: impl Into<String>) -> Self {
        Self {
            marker_file: marker_file.into(),
            evidence_dir: evidence_dir.into(),
            search_roots: Vec::new(),
            mount_table: PathBuf::from(mounts::MOUNT_TABLE),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.marker_file.clone(), config.evidence_dir.clone())
            .with_search_roots(config.search_roots.clone())
    }

    /// Extra directories scanned after the mounted volumes.
    pub fn with_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.search_roots = roots;
        self
    }

    pub fn with_mount_table(mut self, table: PathBuf) -> Self {
        self.mount_table = table;
        self
    }

    pub fn marker_file(&self) -> &str {
        &self.marker_file
    }

    /// Roots examined by auto-detection, in scan order.
    pub fn candidate_roots(&self) -> Vec<PathBuf> {
        let mut roots = mounts::read_mount_points(&self.mount_table);
        roots.extend(mounts::drive_roots());
        roots.extend(self.search_roots.iter().cloned());
        roots
    }

    /// First candidate root that carries the marker file.
    pub fn auto_detect(&self) -> Option<PathBuf> {
        let found = self
            .candidate_roots()
            .into_iter()
            .find(|root| root.join(&self.marker_file).is_file());

        match &found {
            Some(root) => info!("Evidence media detected at {}", root.display()),
            None => debug!("No volume carries {}", self.marker_file),
        }
        found
    }

    /// A non-empty manual path always wins; otherwise auto-detect.
    pub fn resolve(&self, manual: Option<&str>) -> Option<EvidenceSource> {
        if let Some(path) = manual.map(str::trim).filter(|p| !p.is_empty()) {
            return Some(EvidenceSource {
                root: PathBuf::from(path),
                origin: SourceOrigin::Manual,
            });
        }

        self.auto_detect().map(|root| EvidenceSource {
            root,
            origin: SourceOrigin::AutoDetected,
        })
    }

    pub fn log_path(&self, root: &Path) -> PathBuf {
        root.join(&self.marker_file)
    }

    pub fn evidence_path(&self, root: &Path) -> PathBuf {
        root.join(&self.evidence_dir)
    }

    /// Raw audit log text. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_log(&self, root: &Path) -> LogView {
        let path = self.log_path(root);
        match fs::read(&path) {
            Ok(bytes) => LogView::Present(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                warn!("Audit log {} unreadable: {}", path.display(), e);
                LogView::NotFound
            }
        }
    }

    /// Names of the entries in the evidence folder, sorted.
    pub fn list_evidence(&self, root: &Path) -> EvidenceListing {
        let folder = self.evidence_path(root);
        let entries = match fs::read_dir(&folder) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Evidence folder {} unavailable: {}", folder.display(), e);
                return EvidenceListing::Missing;
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();

        if names.is_empty() {
            return EvidenceListing::Empty;
        }
        names.sort();
        EvidenceListing::Files(names)
    }
}
