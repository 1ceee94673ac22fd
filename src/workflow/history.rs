//! Session Ledger History
//!
//! In-memory record of successful anchors for the lifetime of the console
//! session. Most recent first, bounded, never persisted.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

use crate::ledger::{EvidenceHash, TransactionId, VaultReference};

/// Characters kept when abbreviating hashes and transaction ids.
pub const DISPLAY_PREFIX_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnchorStatus {
    Sealed,
}

impl fmt::Display for AnchorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorStatus::Sealed => f.write_str("Sealed"),
        }
    }
}

/// A confirmed anchor. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct AnchorRecord {
    submitted_at: DateTime<Utc>,
    hash_display: String,
    tx_display: String,
    status: AnchorStatus,
    vault: VaultReference,
}

impl AnchorRecord {
    /// Record for an anchor the ledger has confirmed.
    pub fn sealed(
        submitted_at: DateTime<Utc>,
        hash: &EvidenceHash,
        tx_id: &TransactionId,
        vault: VaultReference,
    ) -> Self {
        Self {
            submitted_at,
            hash_display: abbreviate(hash.as_str()),
            tx_display: abbreviate(tx_id.as_str()),
            status: AnchorStatus::Sealed,
            vault,
        }
    }

    /// When the anchor was submitted, in UTC.
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Submission time as local wall-clock `HH:MM:SS`.
    pub fn local_time(&self) -> String {
        self.submitted_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }

    /// Abbreviated evidence hash.
    pub fn hash_display(&self) -> &str {
        &self.hash_display
    }

    /// Abbreviated transaction id.
    pub fn tx_display(&self) -> &str {
        &self.tx_display
    }

    pub fn status(&self) -> AnchorStatus {
        self.status
    }

    /// Vault the anchor was submitted to.
    pub fn vault(&self) -> &VaultReference {
        &self.vault
    }
}

/// Keep the first [`DISPLAY_PREFIX_LEN`] characters, marking any cut with `...`.
pub fn abbreviate(value: &str) -> String {
    match value.char_indices().nth(DISPLAY_PREFIX_LEN) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

/// Anchors confirmed this session, most recent first.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    records: VecDeque<AnchorRecord>,
    capacity: usize,
}

impl SessionHistory {
    /// Create an empty history holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Front-insert a record, evicting the oldest when full.
    pub fn append(&mut self, record: AnchorRecord) -> Option<AnchorRecord> {
        self.records.push_front(record);
        if self.records.len() > self.capacity {
            let evicted = self.records.pop_back();
            debug!("History full ({}), evicted oldest record", self.capacity);
            return evicted;
        }
        None
    }

    /// Records, most recent first.
    pub fn list(&self) -> impl Iterator<Item = &AnchorRecord> {
        self.records.iter()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records kept before the oldest is dropped.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
