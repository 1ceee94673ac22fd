pub mod config;
pub mod console;
pub mod digest;
pub mod error;
pub mod ledger;
pub mod locator;
pub mod workflow;

pub use error::VaultError;
