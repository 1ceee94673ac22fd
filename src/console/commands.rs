//! Interactive command grammar.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "console",
    no_binary_name = true,
    disable_version_flag = true,
    override_usage = "<COMMAND> [ARGS]"
)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Rescan drives for evidence media and show the log and evidence files
    #[command(alias = "scan")]
    Rescan,

    /// Use a folder as the evidence root; without a folder, return to auto-detection
    Path {
        #[arg(allow_hyphen_values = true)]
        folder: Option<String>,
    },

    /// Check ledger connectivity and the active vault
    Status,

    /// Initialize a new vault contract
    #[command(alias = "deploy")]
    Init,

    /// Anchor an evidence hash to the ledger
    Anchor {
        #[arg(allow_hyphen_values = true)]
        hash: String,
    },

    /// Check whether an evidence hash was anchored
    Verify {
        #[arg(allow_hyphen_values = true)]
        hash: String,
    },

    /// Show anchors sealed during this session
    History,

    /// SHA-256 every file in the evidence folder
    Digest,

    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

/// Parse one console line. `Ok(None)` for blank input; `Err` carries text
/// for the operator (usage errors and `help` output).
///
/// Everything after `path` is taken verbatim as the folder, so paths keep
/// their inner whitespace.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    let words: Vec<&str> = match line.split_once(char::is_whitespace) {
        Some(("path", rest)) => vec!["path", rest.trim()],
        _ => line.split_whitespace().collect(),
    };
    if words.is_empty() {
        return Ok(None);
    }
    ConsoleLine::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|e| e.render().to_string())
}
