//! Solidity ABI codec for the vault contract.
//!
//! The vault exposes exactly two functions, both taking a single `string`:
//! `anchorEvidence(string)` and `verifyEvidence(string) returns (uint256)`.

use alloy::primitives::U256;
use alloy::sol;
use alloy::sol_types::SolCall;

use super::LedgerError;

sol! {
    function anchorEvidence(string evidenceHash) external;
    function verifyEvidence(string evidenceHash) external view returns (uint256);
}

/// Calldata for `anchorEvidence`, `0x`-prefixed.
pub fn anchor_calldata(hash: &str) -> String {
    let call = anchorEvidenceCall {
        evidenceHash: hash.to_string(),
    };
    format!("0x{}", hex::encode(call.abi_encode()))
}

/// Calldata for `verifyEvidence`, `0x`-prefixed.
pub fn verify_calldata(hash: &str) -> String {
    let call = verifyEvidenceCall {
        evidenceHash: hash.to_string(),
    };
    format!("0x{}", hex::encode(call.abi_encode()))
}

/// Decode the `verifyEvidence` return value. The timestamp must fit a `u64`.
pub fn decode_timestamp(data: &str) -> Result<u64, LedgerError> {
    let raw = hex::decode(data.trim_start_matches("0x"))
        .map_err(|e| LedgerError::InvalidResponse(format!("return data is not hex: {}", e)))?;

    let value: U256 = verifyEvidenceCall::abi_decode_returns(&raw)
        .map_err(|e| LedgerError::InvalidResponse(format!("verifyEvidence return: {}", e)))?;

    u64::try_from(value).map_err(|_| {
        LedgerError::InvalidResponse("uint256 value does not fit in 64 bits".to_string())
    })
}

/// Parse a JSON-RPC hex quantity such as `"0x1a"`.
pub fn parse_quantity(quantity: &str) -> Result<u64, LedgerError> {
    let digits = quantity.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::InvalidResponse(format!("bad quantity {}: {}", quantity, e)))
}
