use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use filemig_core::{BackendSpec, LabelResult, MigrationConfig};
use filemig_engine::{Direction, ManifestSource, Migrator};

#[derive(Parser, Debug)]
#[command(name = "filemig")]
#[command(about = "Migrate files referenced by records between storage backends")]
struct Args {
    /// Record type labels to migrate (app_name.ModelName)
    #[arg(required = true, value_name = "LABEL")]
    labels: Vec<String>,

    /// Manifest file describing record types and their file references
    #[arg(long, value_name = "FILE")]
    manifest: PathBuf,

    /// Overwrite files that already exist in the destination backend
    #[arg(short = 'f', long)]
    overwrite: bool,

    /// Copy from the old storage to the new storage (default direction copies
    /// from the new storage back to the old one)
    #[arg(long)]
    to_new: bool,

    /// Use this directory as the old storage location
    #[arg(short = 'p', long, value_name = "DIR")]
    path: Option<PathBuf>,

    /// Number of concurrent copies (overrides MAX_CONCURRENT_COPIES)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = MigrationConfig::from_env()?;
    if let Some(dir) = args.path {
        config.old_default = Some(BackendSpec::local(dir));
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrent_copies = concurrency.max(1);
    }

    let direction = if args.to_new {
        Direction::Forward
    } else {
        Direction::Reverse
    };

    let records = ManifestSource::from_path(&args.manifest)?;
    let migrator = Migrator::new(config, direction, args.overwrite, records);
    let results = migrator.run(&args.labels).await;

    let mut completed = 0;
    for result in &results {
        match result {
            LabelResult::Completed(report) => {
                completed += 1;
                println!("{}", report);
                for outcome in report.outcomes.iter() {
                    if let filemig_core::CopyDecision::Failed(cause) = &outcome.decision {
                        eprintln!("  failed {}: {}", outcome.reference.key, cause);
                    }
                }
            }
            LabelResult::Skipped { message, .. } => println!("{}", message),
        }
    }

    if completed == 0 {
        anyhow::bail!("no labels could be processed");
    }
    Ok(())
}
