//! Operator Console
//!
//! Maps the operator actions (rescan drives, initialize vault, anchor to
//! ledger, check ledger status) onto the workflows and renders the results
//! as text. Each command runs to completion before the next one is read.

pub mod commands;
mod render;

use std::path::PathBuf;
use tracing::{debug, error};

use crate::error::VaultError;
use crate::ledger::{load_bytecode, EvidenceHash, LedgerClient};
use crate::locator::{EvidenceListing, EvidenceLocator};
use crate::workflow::VaultSession;

pub use commands::{parse_line, ConsoleCommand};

/// Text produced by one command and whether it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub success: bool,
}

impl Reply {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
        }
    }

    fn from_error(err: &VaultError) -> Self {
        error!("{}", err);
        Self::failed(render::error(err))
    }
}

pub struct Console<L: LedgerClient> {
    ledger: L,
    session: VaultSession,
    locator: EvidenceLocator,
    artifact_path: PathBuf,
    manual_path: Option<String>,
}

impl<L: LedgerClient> Console<L> {
    pub fn new(
        ledger: L,
        session: VaultSession,
        locator: EvidenceLocator,
        artifact_path: PathBuf,
    ) -> Self {
        Self {
            ledger,
            session,
            locator,
            artifact_path,
            manual_path: None,
        }
    }

    pub fn session(&self) -> &VaultSession {
        &self.session
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn set_manual_path(&mut self, path: Option<String>) {
        self.manual_path = path.filter(|p| !p.trim().is_empty());
    }

    pub async fn execute(&mut self, command: ConsoleCommand) -> Reply {
        debug!("Console command: {:?}", command);
        match command {
            ConsoleCommand::Rescan => self.show_source(),
            ConsoleCommand::Path { folder } => {
                self.set_manual_path(folder);
                self.show_source()
            }
            ConsoleCommand::Status => self.status().await,
            ConsoleCommand::Init => self.initialize_vault().await,
            ConsoleCommand::Anchor { hash } => self.anchor(EvidenceHash::new(hash)).await,
            ConsoleCommand::Verify { hash } => self.verify(EvidenceHash::new(hash)).await,
            ConsoleCommand::History => Reply::ok(render::history(&self.session)),
            ConsoleCommand::Digest => self.digest(),
            ConsoleCommand::Quit => Reply::ok("Session closed."),
        }
    }

    fn show_source(&self) -> Reply {
        match self.locator.resolve(self.manual_path.as_deref()) {
            Some(source) => {
                let log = self.locator.read_log(&source.root);
                let listing = self.locator.list_evidence(&source.root);
                Reply::ok(render::source(&source, self.locator.marker_file(), &log, &listing))
            }
            None => Reply::failed(format!(
                "No media with '{}' detected. Connect the drive and run `rescan`, or set `path <folder>`.",
                self.locator.marker_file()
            )),
        }
    }

    async fn status(&self) -> Reply {
        if !self.ledger.is_connected().await {
            return Reply::failed(render::error(&VaultError::LedgerOffline));
        }
        let sender = self.ledger.sender_account().await;
        Reply::ok(render::status(self.session.vault(), sender))
    }

    async fn initialize_vault(&mut self) -> Reply {
        let bytecode = match load_bytecode(&self.artifact_path) {
            Ok(bytecode) => bytecode,
            Err(e) => return Reply::from_error(&e),
        };

        match self.session.initialize_vault(&self.ledger, &bytecode).await {
            Ok(deployment) => Reply::ok(format!(
                "Vault deployed at {} (transaction {}).",
                deployment.vault, deployment.tx_id
            )),
            Err(e) => Reply::from_error(&e),
        }
    }

    async fn anchor(&mut self, hash: EvidenceHash) -> Reply {
        match self.session.submit_anchor(&self.ledger, &hash).await {
            Ok(record) => Reply::ok(format!(
                "Immutably sealed to ledger: {} in {} at {}.",
                record.hash_display(),
                record.tx_display(),
                record.local_time()
            )),
            Err(e) => Reply::from_error(&e),
        }
    }

    async fn verify(&self, hash: EvidenceHash) -> Reply {
        match self.session.verify_hash(&self.ledger, &hash).await {
            Ok(outcome) => Reply::ok(render::verification(&outcome)),
            Err(e) => Reply::from_error(&e),
        }
    }

    fn digest(&self) -> Reply {
        let Some(source) = self.locator.resolve(self.manual_path.as_deref()) else {
            return Reply::failed("No evidence source: run `rescan` or set `path <folder>`.");
        };

        if let EvidenceListing::Missing = self.locator.list_evidence(&source.root) {
            return Reply::failed("Evidence folder not found.");
        }

        match crate::digest::digest_folder(&self.locator.evidence_path(&source.root)) {
            Ok(digests) => Reply::ok(render::digests(&digests)),
            Err(e) => Reply::failed(format!("Evidence folder unreadable: {}", e)),
        }
    }
}
