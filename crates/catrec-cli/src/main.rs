use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "catrec")]
#[command(about = "Catalog option reconciler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One reconciliation pass over the configured category, then a report.
    Run {
        /// Layered config paths in merge order (base -> env -> overrides)
        #[arg(long = "config", required = true, num_args = 1..)]
        config_paths: Vec<String>,

        /// Compute and report changes without writing to the catalog.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Skip report delivery.
        #[arg(long, default_value_t = false)]
        no_report: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Dev-time convenience; a missing file is not an error.
    let _ = dotenvy::from_filename(".env.local");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run {
            config_paths,
            dry_run,
            no_report,
        } => {
            commands::run::run_reconcile(config_paths, dry_run, no_report).await?;
        }

        Commands::ConfigHash { paths } => {
            let loaded = commands::load_config(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}
