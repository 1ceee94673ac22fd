use std::fmt::Write;

use crate::digest::EvidenceDigest;
use crate::error::VaultError;
use crate::ledger::{LedgerError, VaultReference};
use crate::locator::{EvidenceListing, EvidenceSource, LogView, SourceOrigin};
use crate::workflow::{VaultSession, VerificationOutcome};

pub(super) fn error(err: &VaultError) -> String {
    match err {
        VaultError::LedgerOffline => {
            "Ledger: OFFLINE. Start the ledger node and retry.".to_string()
        }
        VaultError::NoVaultConfigured => {
            "No vault address configured. Run `init` to initialize a vault first.".to_string()
        }
        VaultError::VaultNotDeployed(address) => format!(
            "Vault not found at {}. Run `init` to redeploy.",
            address
        ),
        VaultError::OutcomeUnknown { .. } => format!(
            "{}\nThe transaction may still confirm. Check with `verify` before submitting again.",
            err
        ),
        other => other.to_string(),
    }
}

pub(super) fn source(
    source: &EvidenceSource,
    marker_file: &str,
    log: &LogView,
    listing: &EvidenceListing,
) -> String {
    let mut out = String::new();
    let origin = match source.origin {
        SourceOrigin::AutoDetected => "Auto-detected media at",
        SourceOrigin::Manual => "Manual evidence path",
    };
    let _ = writeln!(out, "{} {}", origin, source.root.display());

    let _ = writeln!(out, "\n--- Audit log ---");
    match log {
        LogView::Present(text) => {
            let _ = writeln!(out, "{}", text.trim_end());
        }
        LogView::NotFound => {
            let _ = writeln!(out, "{} not found at {}", marker_file, source.root.display());
        }
    }

    let _ = writeln!(out, "\n--- Evidence files ---");
    match listing {
        EvidenceListing::Files(names) => {
            for name in names {
                let _ = writeln!(out, "  {}", name);
            }
        }
        EvidenceListing::Empty => {
            let _ = writeln!(out, "Evidence folder exists but is empty.");
        }
        EvidenceListing::Missing => {
            let _ = writeln!(out, "Evidence folder not found.");
        }
    }

    out.trim_end().to_string()
}

pub(super) fn status(vault: Option<&VaultReference>, sender: Result<String, LedgerError>) -> String {
    let vault = vault
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none (run `init`)".to_string());
    let sender = sender.unwrap_or_else(|e| format!("unavailable ({})", e));
    format!(
        "Ledger: CONNECTED\nSender account: {}\nVault address: {}",
        sender, vault
    )
}

pub(super) fn verification(outcome: &VerificationOutcome) -> String {
    match outcome.local_timestamp() {
        Some(at) => format!("VERIFIED: This evidence was anchored on {}", at),
        None => "UNVERIFIED: This hash does not exist in the current ledger.".to_string(),
    }
}

pub(super) fn history(session: &VaultSession) -> String {
    let history = session.history();
    if history.is_empty() {
        return "The blockchain ledger log is currently empty.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:<20} {:<20} {:<8}",
        "Time", "Evidence Hash", "TX ID", "Status"
    );
    for record in history.list() {
        let stale = session.vault() != Some(record.vault());
        let _ = writeln!(
            out,
            "{:<10} {:<20} {:<20} {:<8}{}",
            record.local_time(),
            record.hash_display(),
            record.tx_display(),
            record.status(),
            if stale {
                format!(" (vault {})", record.vault())
            } else {
                String::new()
            }
        );
    }
    out.trim_end().to_string()
}

pub(super) fn digests(digests: &[EvidenceDigest]) -> String {
    if digests.is_empty() {
        return "Evidence folder exists but is empty.".to_string();
    }
    digests
        .iter()
        .map(|d| format!("{}  {} ({} bytes)", d.sha256, d.file_name, d.size))
        .collect::<Vec<_>>()
        .join("\n")
}
