use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::{error, info};

use evidence_vault::digest::{append_to_log, digest_folder};

fn main() -> Result<()> {
    let matches = Command::new("evidence-digest")
        .version("0.1.0")
        .about("Compute SHA-256 digests of acquired evidence files")
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("PATH")
                .help("Evidence media root holding the evidence folder and audit log")
                .required(true),
        )
        .arg(
            Arg::new("evidence-dir")
                .long("evidence-dir")
                .value_name("NAME")
                .default_value("evidence")
                .help("Evidence folder name under the root"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("NAME")
                .default_value("audit_log.txt")
                .help("Audit log file name under the root"),
        )
        .arg(
            Arg::new("append")
                .short('a')
                .long("append")
                .action(ArgAction::SetTrue)
                .help("Append the digests to the audit log"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppress output except errors"),
        )
        .get_matches();

    let quiet = matches.get_flag("quiet");
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if quiet {
            tracing::Level::ERROR
        } else {
            tracing::Level::INFO
        })
        .init();

    let root = matches
        .get_one::<String>("root")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("--root is required"))?;
    let evidence_dir = root.join(
        matches
            .get_one::<String>("evidence-dir")
            .map(String::as_str)
            .unwrap_or("evidence"),
    );
    let log_path = root.join(
        matches
            .get_one::<String>("log-file")
            .map(String::as_str)
            .unwrap_or("audit_log.txt"),
    );

    let digests = digest_folder(&evidence_dir).map_err(|e| {
        error!("Cannot read {}: {}", evidence_dir.display(), e);
        anyhow!("Evidence folder unreadable: {}", e)
    })?;

    if !quiet {
        for digest in &digests {
            println!("{}  {}", digest.sha256, digest.file_name);
        }
    }

    if matches.get_flag("append") {
        append_to_log(&log_path, &digests)
            .map_err(|e| anyhow!("Failed to append to {}: {}", log_path.display(), e))?;
        info!("Appended {} digests to {}", digests.len(), log_path.display());
    }

    Ok(())
}
