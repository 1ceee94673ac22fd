#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use evidence_vault::ledger::{
    Bytecode, Deployment, EvidenceHash, LedgerClient, LedgerError, TransactionId, VaultReference,
    VerificationResult,
};

/// Calls observed by the in-memory ledger.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub probes: usize,
    pub code_checks: usize,
    pub deploys: usize,
    pub anchors: usize,
    pub verifies: usize,
}

impl CallCounts {
    /// Calls other than the liveness probe.
    pub fn beyond_probe(&self) -> usize {
        self.code_checks + self.deploys + self.anchors + self.verifies
    }
}

#[derive(Default)]
struct State {
    online: bool,
    contracts: HashMap<String, HashMap<String, u64>>,
    next_contract: u64,
    next_tx: u64,
    calls: CallCounts,
    anchor_failure: Option<LedgerError>,
}

/// A single-node ledger kept in memory. Contracts are maps from hash to
/// anchor time in seconds.
pub struct InMemoryLedger {
    state: Mutex<State>,
}

impl InMemoryLedger {
    pub fn online() -> Self {
        Self {
            state: Mutex::new(State {
                online: true,
                ..State::default()
            }),
        }
    }

    pub fn offline() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.state.lock().unwrap().online = online;
    }

    /// Deploy a vault directly, bypassing the workflows.
    pub fn seed_vault(&self) -> VaultReference {
        let mut state = self.state.lock().unwrap();
        Self::create_contract(&mut state)
    }

    pub fn fail_next_anchor(&self, err: LedgerError) {
        self.state.lock().unwrap().anchor_failure = Some(err);
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }

    fn create_contract(state: &mut State) -> VaultReference {
        state.next_contract += 1;
        let address = format!("0x{:040x}", state.next_contract);
        state.contracts.insert(address.clone(), HashMap::new());
        VaultReference::parse(&address).unwrap()
    }

    fn next_tx(state: &mut State) -> TransactionId {
        state.next_tx += 1;
        TransactionId::new(format!("0x{:064x}", state.next_tx))
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn is_connected(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.probes += 1;
        state.online
    }

    async fn sender_account(&self) -> Result<String, LedgerError> {
        let state = self.state.lock().unwrap();
        if !state.online {
            return Err(LedgerError::Transport("connection refused".to_string()));
        }
        Ok("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string())
    }

    async fn has_code(&self, vault: &VaultReference) -> Result<bool, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.code_checks += 1;
        if !state.online {
            return Err(LedgerError::Transport("connection refused".to_string()));
        }
        Ok(state.contracts.contains_key(vault.as_str()))
    }

    async fn deploy_vault(&self, _bytecode: &Bytecode) -> Result<Deployment, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.deploys += 1;
        if !state.online {
            return Err(LedgerError::Transport("connection refused".to_string()));
        }
        let vault = Self::create_contract(&mut state);
        let tx_id = Self::next_tx(&mut state);
        Ok(Deployment { vault, tx_id })
    }

    async fn anchor(
        &self,
        vault: &VaultReference,
        hash: &EvidenceHash,
    ) -> Result<TransactionId, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.anchors += 1;
        if let Some(err) = state.anchor_failure.take() {
            return Err(err);
        }
        if !state.online {
            return Err(LedgerError::Transport("connection refused".to_string()));
        }
        let now = Utc::now().timestamp() as u64;
        let contract = state
            .contracts
            .get_mut(vault.as_str())
            .ok_or_else(|| LedgerError::NoContractCode(vault.to_string()))?;
        contract.entry(hash.as_str().to_string()).or_insert(now);
        Ok(Self::next_tx(&mut state))
    }

    async fn verify(
        &self,
        vault: &VaultReference,
        hash: &EvidenceHash,
    ) -> Result<VerificationResult, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.verifies += 1;
        if !state.online {
            return Err(LedgerError::Transport("connection refused".to_string()));
        }
        let contract = state
            .contracts
            .get(vault.as_str())
            .ok_or_else(|| LedgerError::NoContractCode(vault.to_string()))?;
        let timestamp = contract.get(hash.as_str()).copied().unwrap_or(0);
        Ok(VerificationResult::from_timestamp(timestamp))
    }
}

/// Write a minimal compiler artifact for the vault contract.
pub fn write_artifact(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("CyFiVault.json");
    std::fs::write(
        &path,
        r#"{"contractName":"CyFiVault","abi":[],"bytecode":"0x608060405234801561001057600080fd5b50"}"#,
    )
    .unwrap();
    path
}
