//! JSON-RPC Ledger Client
//!
//! Talks Ethereum JSON-RPC 2.0 over HTTP to a node with managed accounts
//! (a local development node or a private chain). Transactions are sent
//! with `eth_sendTransaction` and confirmed by polling for a receipt.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::abi;
use super::{
    Bytecode, Deployment, EvidenceHash, LedgerClient, LedgerError, TransactionId,
    VaultReference, VerificationResult,
};
use crate::config::AppConfig;

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    block_number: Option<String>,
    status: Option<String>,
    contract_address: Option<String>,
}

impl TransactionReceipt {
    fn is_mined(&self) -> bool {
        self.block_number.is_some()
    }

    /// Pre-Byzantium receipts carry no status and are treated as success.
    fn succeeded(&self) -> Result<bool, LedgerError> {
        match self.status.as_deref() {
            Some(status) => Ok(abi::parse_quantity(status)? == 1),
            None => Ok(true),
        }
    }
}

/// Ledger client backed by an HTTP JSON-RPC endpoint.
pub struct JsonRpcLedger {
    rpc_url: String,
    http_client: Client,
    sender: Option<String>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    /// Create a client for `rpc_url` with a per-request HTTP timeout.
    pub fn new(rpc_url: String, request_timeout: Duration) -> Result<Self, LedgerError> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| LedgerError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            rpc_url,
            http_client,
            sender: None,
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(500),
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a client from the endpoint, sender and timeouts in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, LedgerError> {
        Ok(Self::new(config.rpc_url.clone(), config.request_timeout())?
            .with_sender(config.sender.clone())
            .with_confirmation(config.confirmation_timeout(), config.poll_interval()))
    }

    /// Send transactions from `sender` instead of the node's first account.
    pub fn with_sender(mut self, sender: Option<String>) -> Self {
        self.sender = sender;
        self
    }

    /// Set how long to wait for a receipt and how often to poll.
    pub fn with_confirmation(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Send a request; a JSON `null` result comes back as `None`.
    async fn rpc_request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, LedgerError> {
        self.post(method, params, None).await
    }

    /// `timeout` replaces the client-wide request timeout for this call.
    async fn post<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Option<T>, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });

        debug!("RPC -> {} (id {})", method, id);

        let mut request = self.http_client.post(&self.rpc_url).json(&body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LedgerError::RequestTimeout(method.to_string())
            } else {
                LedgerError::Transport(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(LedgerError::Transport(format!(
                "{} answered HTTP {}",
                self.rpc_url,
                response.status()
            )));
        }

        let parsed: JsonRpcResponse<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LedgerError::RequestTimeout(method.to_string())
            } else {
                LedgerError::InvalidResponse(format!("{}: {}", method, e))
            }
        })?;

        if let Some(err) = parsed.error {
            return Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        Ok(parsed.result)
    }

    async fn rpc_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, LedgerError> {
        self.rpc_request(method, params)
            .await?
            .ok_or_else(|| LedgerError::InvalidResponse(format!("{} returned no result", method)))
    }

    /// Submit a transaction. Automining nodes answer only once the
    /// transaction is mined, so the submission gets the confirmation budget
    /// rather than the request timeout.
    async fn send_transaction(&self, tx: Value) -> Result<TransactionId, LedgerError> {
        let tx_hash: String = match self
            .post("eth_sendTransaction", json!([tx]), Some(self.confirmation_timeout))
            .await
        {
            Ok(Some(hash)) => hash,
            Ok(None) => {
                return Err(LedgerError::InvalidResponse(
                    "eth_sendTransaction returned no result".to_string(),
                ))
            }
            Err(LedgerError::RequestTimeout(_)) => {
                warn!(
                    "Node did not answer the submission within {}s",
                    self.confirmation_timeout.as_secs()
                );
                return Err(LedgerError::SubmissionTimeout {
                    waited: self.confirmation_timeout,
                });
            }
            Err(e) => return Err(e),
        };
        info!("Broadcast transaction {}", tx_hash);
        Ok(TransactionId::new(tx_hash))
    }

    /// Poll for a mined receipt until `confirmation_timeout` elapses.
    ///
    /// Errors while polling are logged and polling continues: the transaction
    /// has already been broadcast, so only the timeout ends the wait.
    async fn wait_for_receipt(
        &self,
        tx_id: &TransactionId,
    ) -> Result<TransactionReceipt, LedgerError> {
        let poll = async {
            loop {
                match self
                    .rpc_request::<TransactionReceipt>(
                        "eth_getTransactionReceipt",
                        json!([tx_id.as_str()]),
                    )
                    .await
                {
                    Ok(Some(receipt)) if receipt.is_mined() => return receipt,
                    Ok(_) => debug!("Transaction {} pending", tx_id),
                    Err(e) => warn!("Receipt poll for {} failed: {}", tx_id, e),
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(self.confirmation_timeout, poll)
            .await
            .map_err(|_| LedgerError::ConfirmationTimeout {
                tx_id: tx_id.to_string(),
                waited: self.confirmation_timeout,
            })
    }

    async fn confirm(&self, tx_id: &TransactionId) -> Result<TransactionReceipt, LedgerError> {
        let receipt = self.wait_for_receipt(tx_id).await?;
        if !receipt.succeeded()? {
            return Err(LedgerError::Reverted {
                tx_id: tx_id.to_string(),
            });
        }
        debug!(
            "Transaction {} confirmed in block {}",
            tx_id,
            receipt.block_number.as_deref().unwrap_or("?")
        );
        Ok(receipt)
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn is_connected(&self) -> bool {
        match self
            .rpc_call::<String>("web3_clientVersion", json!([]))
            .await
        {
            Ok(version) => {
                debug!("Ledger node {} is up: {}", self.rpc_url, version);
                true
            }
            Err(e) => {
                debug!("Ledger node {} unreachable: {}", self.rpc_url, e);
                false
            }
        }
    }

    async fn sender_account(&self) -> Result<String, LedgerError> {
        if let Some(sender) = &self.sender {
            return Ok(sender.clone());
        }
        let accounts: Vec<String> = self.rpc_call("eth_accounts", json!([])).await?;
        accounts.into_iter().next().ok_or(LedgerError::NoAccounts)
    }

    async fn has_code(&self, vault: &VaultReference) -> Result<bool, LedgerError> {
        let code: String = self
            .rpc_call("eth_getCode", json!([vault.as_str(), "latest"]))
            .await?;
        Ok(!code.trim_start_matches("0x").is_empty())
    }

    async fn deploy_vault(&self, bytecode: &Bytecode) -> Result<Deployment, LedgerError> {
        let from = self.sender_account().await?;
        info!("Deploying vault contract from {}", from);

        let tx_id = self
            .send_transaction(json!({ "from": from, "data": bytecode.as_hex() }))
            .await?;
        let receipt = self.confirm(&tx_id).await?;

        let address = receipt
            .contract_address
            .as_deref()
            .and_then(VaultReference::parse)
            .ok_or_else(|| LedgerError::MissingContractAddress {
                tx_id: tx_id.to_string(),
            })?;

        info!("Vault deployed at {} by {}", address, tx_id);
        Ok(Deployment {
            vault: address,
            tx_id,
        })
    }

    async fn anchor(
        &self,
        vault: &VaultReference,
        hash: &EvidenceHash,
    ) -> Result<TransactionId, LedgerError> {
        if !self.has_code(vault).await? {
            return Err(LedgerError::NoContractCode(vault.to_string()));
        }

        let from = self.sender_account().await?;
        let data = abi::anchor_calldata(hash.as_str());
        let tx_id = self
            .send_transaction(json!({ "from": from, "to": vault.as_str(), "data": data }))
            .await?;
        self.confirm(&tx_id).await?;
        Ok(tx_id)
    }

    async fn verify(
        &self,
        vault: &VaultReference,
        hash: &EvidenceHash,
    ) -> Result<VerificationResult, LedgerError> {
        let data = abi::verify_calldata(hash.as_str());
        let output: String = self
            .rpc_call(
                "eth_call",
                json!([{ "to": vault.as_str(), "data": data }, "latest"]),
            )
            .await?;

        if output.trim_start_matches("0x").is_empty() {
            return Err(LedgerError::NoContractCode(vault.to_string()));
        }

        let timestamp = abi::decode_timestamp(&output)?;
        Ok(VerificationResult::from_timestamp(timestamp))
    }
}
