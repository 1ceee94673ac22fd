//! Ledger Client
//!
//! Adapter over a remote smart-contract ledger. Workflows talk to the
//! ledger only through the [`LedgerClient`] trait; [`JsonRpcLedger`] is the
//! production implementation speaking Ethereum JSON-RPC.

pub mod abi;
pub mod artifact;
pub mod rpc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use artifact::{load_bytecode, Bytecode};
pub use rpc::JsonRpcLedger;

/// Address of a deployed vault contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultReference(String);

impl VaultReference {
    /// Returns `None` for an empty or whitespace-only address.
    pub fn parse(address: &str) -> Option<Self> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Address as given, `0x`-prefixed.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VaultReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content fingerprint supplied by the operator. Never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceHash(String);

impl EvidenceHash {
    /// Wrap operator input verbatim; no trimming or case folding.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Hash exactly as entered.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvidenceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction hash returned by the ledger on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap a transaction hash reported by the node.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Hex transaction hash, `0x`-prefixed.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A confirmed contract-creation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub vault: VaultReference,
    pub tx_id: TransactionId,
}

/// Answer to a read-only `verifyEvidence` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    pub found: bool,
    pub anchored_at: Option<DateTime<Utc>>,
}

impl VerificationResult {
    /// Interpret the raw on-chain timestamp; zero means never anchored.
    pub fn from_timestamp(seconds: u64) -> Self {
        if seconds == 0 {
            return Self::not_found();
        }
        let anchored_at = i64::try_from(seconds)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        Self {
            found: true,
            anchored_at,
        }
    }

    /// Result for a hash the vault has never seen.
    pub fn not_found() -> Self {
        Self {
            found: false,
            anchored_at: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0} request timed out")]
    RequestTimeout(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("no sender account available on the node")]
    NoAccounts,

    #[error("no contract code at {0}")]
    NoContractCode(String),

    #[error("transaction {tx_id} reverted")]
    Reverted { tx_id: String },

    #[error("receipt for {tx_id} carries no contract address")]
    MissingContractAddress { tx_id: String },

    #[error("transaction {tx_id} not confirmed within {}s", .waited.as_secs())]
    ConfirmationTimeout { tx_id: String, waited: Duration },

    /// The node never answered the submission. It may still mine it.
    #[error("transaction submission unanswered after {}s", .waited.as_secs())]
    SubmissionTimeout { waited: Duration },
}

/// Operations the workflows need from a ledger endpoint.
///
/// Mutating calls (`deploy_vault`, `anchor`) return only after the
/// transaction is confirmed, or fail with
/// [`LedgerError::ConfirmationTimeout`] or [`LedgerError::SubmissionTimeout`]
/// once the client stops waiting.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Liveness probe. Never errors; an unreachable endpoint is `false`.
    async fn is_connected(&self) -> bool;

    /// Account identity used as the transaction sender.
    async fn sender_account(&self) -> Result<String, LedgerError>;

    /// Code-existence probe for a vault address.
    async fn has_code(&self, vault: &VaultReference) -> Result<bool, LedgerError>;

    /// Create a new vault from contract bytecode and wait for its address.
    async fn deploy_vault(&self, bytecode: &Bytecode) -> Result<Deployment, LedgerError>;

    /// Record `hash` in `vault` and wait for confirmation.
    async fn anchor(
        &self,
        vault: &VaultReference,
        hash: &EvidenceHash,
    ) -> Result<TransactionId, LedgerError>;

    /// Read-only query. "Never anchored" is `found == false`, not an error.
    async fn verify(
        &self,
        vault: &VaultReference,
        hash: &EvidenceHash,
    ) -> Result<VerificationResult, LedgerError>;
}
