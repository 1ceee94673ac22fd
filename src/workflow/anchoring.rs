//! Anchoring workflow: submit a hash, wait for confirmation, record it.

use chrono::Utc;
use tracing::{error, info};

use super::{AnchorRecord, VaultSession};
use crate::error::{Result, VaultError};
use crate::ledger::{EvidenceHash, LedgerClient};

impl VaultSession {
    /// Anchor `hash` to the active vault.
    ///
    /// Only confirmed anchors reach the history. Failures are returned to
    /// the operator and never retried here, since a retry could submit the
    /// same hash twice.
    pub async fn submit_anchor<L>(&mut self, ledger: &L, hash: &EvidenceHash) -> Result<AnchorRecord>
    where
        L: LedgerClient + ?Sized,
    {
        let vault = self.vault.clone().ok_or(VaultError::NoVaultConfigured)?;

        if !ledger.is_connected().await {
            return Err(VaultError::LedgerOffline);
        }

        let submitted_at = Utc::now();
        info!("Anchoring {} to vault {}", hash, vault);

        let tx_id = ledger.anchor(&vault, hash).await.map_err(|e| {
            error!("Anchoring {} failed: {}", hash, e);
            VaultError::from_anchor(e)
        })?;

        let record = AnchorRecord::sealed(submitted_at, hash, &tx_id, vault);
        self.history.append(record.clone());

        info!("Sealed {} in transaction {}", hash, tx_id);
        Ok(record)
    }
}
