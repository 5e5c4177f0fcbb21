//! `wakeel` binary: interactive console for the office.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wakeel::audit;
use wakeel::config::{self, AppConfig};
use wakeel::console::Console;
use wakeel::store::{JsonStore, MemoryStore, RecordStore};

#[derive(Parser)]
#[command(name = "wakeel", version, about = "إدارة مكتب المحاماة من سطر الأوامر")]
struct Cli {
    /// Data directory (defaults to WAKEEL_DATA_DIR, then the platform data
    /// dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Keep every record in memory; nothing is written to disk.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved data directory, settings file, and audit log path.
    Paths,
    /// Write a shell completion script to stdout.
    Completions { shell: clap_complete::Shell },
}

/// Logs go to stderr so they never interleave with console output on stdout.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env("WAKEEL_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| "wakeel=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    init_tracing();
    let config = AppConfig::resolve(cli.data_dir.clone(), cli.ephemeral)?;

    if let Some(Commands::Paths) = cli.command {
        println!("data directory: {}", config.data_dir.display());
        println!(
            "settings file:  {}",
            config.data_dir.join(config::CONFIG_FILE).display()
        );
        println!("audit log:      {}", config.audit.path.display());
        return Ok(());
    }

    audit::init(&config.audit);

    let store: Arc<dyn RecordStore> = if config.ephemeral {
        tracing::info!("running ephemeral; records live in memory only");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonStore::open(&config.data_dir)?)
    };

    tracing::info!(
        data_dir = %config.data_dir.display(),
        audit = audit::enabled(),
        "office console starting"
    );
    Console::new(config, store).run().await
}
