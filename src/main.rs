use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evidence_vault::config::AppConfig;
use evidence_vault::console::{parse_line, Console, ConsoleCommand};
use evidence_vault::ledger::{JsonRpcLedger, LedgerClient};
use evidence_vault::locator::EvidenceLocator;
use evidence_vault::workflow::VaultSession;

#[derive(Parser)]
#[command(name = "evidence-vault")]
#[command(about = "Anchor forensic evidence hashes to a smart-contract ledger and verify them")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML configuration file (VAULT_* environment variables take precedence)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive operator console (default)
    Console,

    /// Locate evidence media and show the audit log and evidence files
    Scan {
        /// Evidence root to use instead of auto-detection
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Check ledger connectivity and the configured vault
    Status,

    /// Initialize a new vault contract from the compiled artifact
    Deploy,

    /// Anchor an evidence hash
    Anchor {
        /// Evidence hash, as copied from the audit log
        hash: String,
    },

    /// Check whether an evidence hash was anchored
    Verify {
        /// Evidence hash to look up
        hash: String,
    },

    /// SHA-256 every file in the evidence folder
    Digest {
        /// Evidence root to use instead of auto-detection
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evidence_vault=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_with_file(cli.config.as_deref())?;
    info!("Configuration loaded, ledger endpoint {}", config.rpc_url);

    let ledger = JsonRpcLedger::from_config(&config)?;
    let mut console = Console::new(
        ledger,
        VaultSession::from_config(&config),
        EvidenceLocator::from_config(&config),
        config.artifact_path.clone(),
    );

    let one_shot = match cli.command.unwrap_or(Commands::Console) {
        Commands::Config => {
            print!("{}", config.to_toml()?);
            return Ok(());
        }
        Commands::Console => return run_interactive(&mut console).await,
        Commands::Scan { path } => {
            console.set_manual_path(path);
            ConsoleCommand::Rescan
        }
        Commands::Digest { path } => {
            console.set_manual_path(path);
            ConsoleCommand::Digest
        }
        Commands::Status => ConsoleCommand::Status,
        Commands::Deploy => ConsoleCommand::Init,
        Commands::Anchor { hash } => ConsoleCommand::Anchor { hash },
        Commands::Verify { hash } => ConsoleCommand::Verify { hash },
    };

    let reply = console.execute(one_shot).await;
    println!("{}", reply.text);
    if !reply.success {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_interactive<L: LedgerClient>(console: &mut Console<L>) -> Result<()> {
    println!("CyFi Digital Evidence Vault. Type `help` for commands.\n");
    for opening in [ConsoleCommand::Status, ConsoleCommand::Rescan] {
        println!("{}\n", console.execute(opening).await.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("vault> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => println!("{}\n", console.execute(command).await.text),
            Err(usage) => println!("{}", usage),
        }
    }

    info!(
        "Console closed with {} anchors sealed this session",
        console.session().history().len()
    );
    Ok(())
}
