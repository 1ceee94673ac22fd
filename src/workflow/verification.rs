//! Verification workflow: has this hash been anchored to the active vault?

use chrono::{DateTime, Local, Utc};
use tracing::{debug, info};

use super::VaultSession;
use crate::error::{Result, VaultError};
use crate::ledger::{EvidenceHash, LedgerClient, LedgerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Anchored at the given ledger time.
    Verified(DateTime<Utc>),
    /// Not present in the current vault.
    Unverified,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified(_))
    }

    /// Anchor time in local `%Y-%m-%d %H:%M:%S`, if verified.
    pub fn local_timestamp(&self) -> Option<String> {
        match self {
            VerificationOutcome::Verified(at) => Some(
                at.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
            VerificationOutcome::Unverified => None,
        }
    }
}

impl VaultSession {
    /// Check connectivity, vault configuration and contract existence in that
    /// order, then query the vault. A missing hash is `Unverified`, not an error.
    pub async fn verify_hash<L>(&self, ledger: &L, hash: &EvidenceHash) -> Result<VerificationOutcome>
    where
        L: LedgerClient + ?Sized,
    {
        if !ledger.is_connected().await {
            return Err(VaultError::LedgerOffline);
        }

        let vault = self.vault.as_ref().ok_or(VaultError::NoVaultConfigured)?;

        let deployed = ledger
            .has_code(vault)
            .await
            .map_err(VaultError::VerificationError)?;
        if !deployed {
            return Err(VaultError::VaultNotDeployed(vault.to_string()));
        }

        let result = ledger
            .verify(vault, hash)
            .await
            .map_err(VaultError::VerificationError)?;

        let outcome = match (result.found, result.anchored_at) {
            (true, Some(at)) => VerificationOutcome::Verified(at),
            (true, None) => {
                return Err(VaultError::VerificationError(LedgerError::InvalidResponse(
                    "anchor timestamp is out of range".to_string(),
                )))
            }
            (false, _) => VerificationOutcome::Unverified,
        };

        match outcome {
            VerificationOutcome::Verified(at) => info!("{} verified, anchored at {}", hash, at),
            VerificationOutcome::Unverified => debug!("{} not found in vault {}", hash, vault),
        }

        Ok(outcome)
    }
}
