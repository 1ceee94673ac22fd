use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, VaultError};
use crate::ledger::VaultReference;

/// First contract address handed out by a fresh local development node.
pub const DEFAULT_VAULT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

const VAULT_ADDRESS_ENV: &str = "VAULT_ADDRESS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rpc_url: String,
    /// Vault contract address. Empty means no vault is configured.
    pub vault_address: String,
    /// Sender account for transactions; the node's first account when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub artifact_path: PathBuf,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub history_capacity: usize,
    pub marker_file: String,
    pub evidence_dir: String,
    pub search_roots: Vec<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            vault_address: DEFAULT_VAULT_ADDRESS.to_string(),
            sender: None,
            artifact_path: PathBuf::from("./artifacts/contracts/CyFiVault.sol/CyFiVault.json"),
            confirmation_timeout_secs: 120,
            poll_interval_ms: 500,
            request_timeout_secs: 10,
            history_capacity: 256,
            marker_file: "audit_log.txt".to_string(),
            evidence_dir: "evidence".to_string(),
            search_roots: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from `VAULT_*` environment variables over the built-in defaults.
    pub fn load() -> Result<Self> {
        Self::load_with_file(None)
    }

    /// Load an optional TOML file, then let `VAULT_*` environment variables
    /// override it.
    pub fn load_with_file(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("Reading configuration file {}", path.display());
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder
            .add_source(
                Environment::with_prefix("VAULT")
                    .try_parsing(true)
                    .list_separator(":")
                    .with_list_parse_key("search_roots"),
            )
            // Under the prefix `VAULT_ADDRESS` would land on `address`.
            // An empty value still overrides: no vault configured.
            .set_override_option("vault_address", env::var(VAULT_ADDRESS_ENV).ok())?;

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn normalize(&mut self) {
        self.vault_address = self.vault_address.trim().to_string();
        if self
            .sender
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(false)
        {
            self.sender = None;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(VaultError::ConfigError("rpc_url must not be empty".to_string()));
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(VaultError::ConfigError(
                "confirmation_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(VaultError::ConfigError(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(VaultError::ConfigError(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(VaultError::ConfigError(
                "history_capacity must be greater than zero".to_string(),
            ));
        }
        if self.marker_file.trim().is_empty() || self.evidence_dir.trim().is_empty() {
            return Err(VaultError::ConfigError(
                "marker_file and evidence_dir must be set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn vault_reference(&self) -> Option<VaultReference> {
        VaultReference::parse(&self.vault_address)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| VaultError::ConfigError(format!("Failed to render configuration: {}", e)))
    }
}
