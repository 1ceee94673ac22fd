//! Evidence Anchoring Workflows
//!
//! [`VaultSession`] owns the mutable session state (active vault and anchor
//! history) and drives the ledger through the anchoring, verification and
//! vault initialization workflows. Every mutation goes through `&mut self`,
//! so concurrent callers have to serialize on the session owner.

pub mod anchoring;
pub mod history;
pub mod verification;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{Result, VaultError};
use crate::ledger::{Bytecode, Deployment, LedgerClient, VaultReference};

pub use history::{AnchorRecord, AnchorStatus, SessionHistory};
pub use verification::VerificationOutcome;

#[derive(Debug, Clone)]
pub struct VaultSession {
    vault: Option<VaultReference>,
    history: SessionHistory,
}

impl VaultSession {
    pub fn new(vault: Option<VaultReference>, history_capacity: usize) -> Self {
        Self {
            vault,
            history: SessionHistory::new(history_capacity),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.vault_reference(), config.history_capacity)
    }

    pub fn vault(&self) -> Option<&VaultReference> {
        self.vault.as_ref()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Deploy a fresh vault contract and make it the session's target.
    ///
    /// On failure the current vault stays in place. Existing history
    /// records keep the vault they were anchored to.
    pub async fn initialize_vault<L>(&mut self, ledger: &L, bytecode: &Bytecode) -> Result<Deployment>
    where
        L: LedgerClient + ?Sized,
    {
        if !ledger.is_connected().await {
            return Err(VaultError::LedgerOffline);
        }

        let deployment = ledger
            .deploy_vault(bytecode)
            .await
            .map_err(VaultError::from_deployment)?;

        match self.vault.replace(deployment.vault.clone()) {
            Some(previous) if previous != deployment.vault => {
                warn!(
                    "Vault re-initialized: {} replaces {}; earlier history stays tagged with {}",
                    deployment.vault, previous, previous
                );
            }
            _ => info!("Vault initialized at {}", deployment.vault),
        }

        Ok(deployment)
    }
}
