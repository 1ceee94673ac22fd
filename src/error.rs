use thiserror::Error;

use crate::ledger::LedgerError;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Ledger is offline: the RPC endpoint did not answer the liveness probe")]
    LedgerOffline,

    #[error("No vault configured: initialize a vault first")]
    NoVaultConfigured,

    #[error("Vault not deployed: no contract code at {0}")]
    VaultNotDeployed(String),

    #[error("Deployment failed: {0}")]
    DeploymentError(#[source] LedgerError),

    #[error("Anchoring failed: {0}")]
    AnchorError(#[source] LedgerError),

    #[error("Verification failed: {0}")]
    VerificationError(#[source] LedgerError),

    #[error("{operation} outcome unknown: transaction {tx_id} not confirmed after {waited_secs}s")]
    OutcomeUnknown {
        operation: &'static str,
        tx_id: String,
        waited_secs: u64,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Contract artifact error: {0}")]
    ArtifactError(String),
}

impl From<config::ConfigError> for VaultError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

/// Placeholder id when the node never returned a transaction hash.
pub const UNKNOWN_TX_ID: &str = "(id unknown)";

impl VaultError {
    /// Wrap a ledger failure from a mutating call. Either timeout becomes
    /// `OutcomeUnknown` since the transaction may still be mined.
    pub fn from_anchor(err: LedgerError) -> Self {
        Self::outcome_unknown("Anchoring", err).unwrap_or_else(Self::AnchorError)
    }

    pub fn from_deployment(err: LedgerError) -> Self {
        Self::outcome_unknown("Deployment", err).unwrap_or_else(Self::DeploymentError)
    }

    fn outcome_unknown(
        operation: &'static str,
        err: LedgerError,
    ) -> std::result::Result<Self, LedgerError> {
        match err {
            LedgerError::ConfirmationTimeout { tx_id, waited } => Ok(Self::OutcomeUnknown {
                operation,
                tx_id,
                waited_secs: waited.as_secs(),
            }),
            LedgerError::SubmissionTimeout { waited } => Ok(Self::OutcomeUnknown {
                operation,
                tx_id: UNKNOWN_TX_ID.to_string(),
                waited_secs: waited.as_secs(),
            }),
            other => Err(other),
        }
    }

    /// True when the ledger may or may not have applied the submission.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::OutcomeUnknown { .. })
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
