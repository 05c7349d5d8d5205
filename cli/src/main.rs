mod image_store;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ramekin_import::{progress_channel, Credentials, ImportConfig, Importer, Platform, ReqwestClient};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::image_store::DirectoryImageStore;

#[derive(Parser)]
#[command(name = "ramekin-import")]
#[command(about = "Import recipes from Mealie, Tandoor or Nextcloud Cookbook", long_about = None)]
struct Cli {
    /// Platform to import from (mealie, tandoor, nextcloud)
    platform: Platform,

    /// Base URL of the instance, e.g. https://mealie.example.com
    #[arg(long)]
    url: String,

    #[arg(long)]
    username: String,

    #[arg(long, env = "RAMEKIN_IMPORT_PASSWORD", hide_env_values = true)]
    password: String,

    /// Write recipes as JSON to this file (default: stdout)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory relayed images are written to
    #[arg(long, default_value = "images")]
    images_dir: PathBuf,

    /// Recipes fetched at the same time (overrides RAMEKIN_IMPORT_CONCURRENCY)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds (overrides RAMEKIN_HTTP_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = ImportConfig::from_env();
    if let Some(n) = cli.concurrency {
        config = config.max_concurrency(n);
    }

    let mut builder = ReqwestClient::builder()
        .user_agent(format!("ramekin-import/{}", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = cli.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = Arc::new(builder.build().context("Failed to build HTTP client")?);
    let store = Arc::new(
        DirectoryImageStore::create(&cli.images_dir)
            .await
            .with_context(|| format!("Failed to create {}", cli.images_dir.display()))?,
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, stopping import");
                cancel.cancel();
            }
        }
    });

    let (tx, mut rx) = progress_channel();
    let printer = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            eprintln!("Imported {}/{}", progress.value, progress.total);
        }
    });

    let credentials = Credentials::new(cli.url, cli.username, cli.password);
    let recipes = Importer::new(client, store)
        .with_config(config)
        .with_cancellation(cancel)
        .import(cli.platform, &credentials, tx)
        .await
        .with_context(|| format!("Import from {} failed", cli.platform))?;
    printer.await.ok();

    let json = serde_json::to_string_pretty(&recipes)?;
    match &cli.out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} recipes to {}", recipes.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    Ok(())
}
