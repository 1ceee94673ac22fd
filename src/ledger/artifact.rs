//! Compiled contract artifacts.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{Result, VaultError};

/// Contract creation bytecode, `0x`-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytecode(String);

impl Bytecode {
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let digits = hex_str.trim().trim_start_matches("0x");
        if digits.is_empty() {
            return Err(VaultError::ArtifactError("bytecode is empty".to_string()));
        }
        hex::decode(digits)
            .map_err(|e| VaultError::ArtifactError(format!("bytecode is not valid hex: {}", e)))?;
        Ok(Self(format!("0x{}", digits)))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Size of the decoded bytecode in bytes.
    pub fn len(&self) -> usize {
        (self.0.len() - 2) / 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Deserialize)]
struct ContractArtifact {
    #[serde(rename = "contractName")]
    contract_name: Option<String>,
    bytecode: String,
}

/// Read the creation bytecode from a compiler artifact JSON file.
pub fn load_bytecode(path: &Path) -> Result<Bytecode> {
    let contents = fs::read_to_string(path).map_err(|e| {
        VaultError::ArtifactError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let artifact: ContractArtifact = serde_json::from_str(&contents).map_err(|e| {
        VaultError::ArtifactError(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    let bytecode = Bytecode::from_hex(&artifact.bytecode)?;
    info!(
        "Loaded {} bytes of bytecode for {} from {}",
        bytecode.len(),
        artifact.contract_name.as_deref().unwrap_or("contract"),
        path.display()
    );
    Ok(bytecode)
}
