mod documents;
mod fetch;
mod logging;
mod scrape;
mod settings;
mod transcript;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use spool_core::{App, AppBuilder, CommandStore, InMemoryStore, SqliteStore, WorkerReport, submit};
use tracing::info;

use crate::documents::DocumentDesk;
use crate::fetch::FsFetcher;
use crate::scrape::{ScrapeGenres, Scraper};
use crate::transcript::Transcript;

#[derive(Debug, Parser)]
#[command(name = "spool", version, about = "Durable command queue")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database (overrides `db_path` from the config file)
    #[arg(long, global = true, conflicts_with = "in_memory")]
    db: Option<PathBuf>,

    /// Use a throwaway in-memory queue instead of SQLite
    #[arg(long, global = true)]
    in_memory: bool,

    /// Directory holding the saved pages the scrape commands read
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Enqueue print, save and convert for each document, then drain the queue
    Documents {
        #[arg(required = true)]
        documents: Vec<String>,
    },
    /// Seed the genre index (unless work is already pending), then drain the queue
    Scrape {
        #[arg(long, default_value = scrape::GENRES_URL)]
        seed: String,
    },
    /// Drain whatever is pending
    Work {
        /// Keep polling for new commands until Ctrl-C
        #[arg(long)]
        follow: bool,
    },
    /// Show pending and complete counts
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let config = settings::load(cli.config.as_deref())?;
    let store = open_store(&cli, &config.db_path)?;
    let app = build_app(&cli.root, Transcript::echo())?;

    match cli.command {
        Cmd::Documents { documents: names } => {
            for document in &names {
                let ids = documents::enqueue(store.as_ref(), document).await?;
                info!(document = %document, commands = ids.len(), "enqueued document");
            }
            drain(&app, store).await?;
        }
        Cmd::Scrape { seed } => {
            // resume instead of seeding twice
            if store.is_empty().await? {
                let id = submit(store.as_ref(), &ScrapeGenres::new(seed)).await?;
                info!(command_id = %id, "seeded genre index");
            } else {
                info!(
                    pending = store.pending_count().await?,
                    "resuming pending commands"
                );
            }
            drain(&app, store).await?;
        }
        Cmd::Work { follow: false } => {
            drain(&app, store).await?;
        }
        Cmd::Work { follow: true } => {
            let mut handle = app.worker(store).spawn(config.worker.clone());
            // a worker that dies on its own must not leave us waiting for Ctrl-C
            let exited = tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("failed to listen for Ctrl-C")?;
                    None
                }
                result = handle.finished() => Some(result),
            };
            let report = match exited {
                Some(result) => result.context("worker stopped unexpectedly")?,
                None => {
                    info!("shutdown requested");
                    handle.shutdown_and_join().await?
                }
            };
            print_report(&report);
        }
        Cmd::Status => {
            let counts = store.counts().await?;
            println!("pending:  {}", counts.pending);
            println!("complete: {}", counts.complete);
        }
    }
    Ok(())
}

fn open_store(cli: &Cli, configured: &Path) -> anyhow::Result<Arc<dyn CommandStore>> {
    if cli.in_memory {
        return Ok(Arc::new(InMemoryStore::new()));
    }
    let path = cli.db.as_deref().unwrap_or(configured);
    let store = SqliteStore::open(path)
        .with_context(|| format!("failed to open queue at {}", path.display()))?;
    info!(path = %path.display(), "opened queue");
    Ok(Arc::new(store))
}

fn build_app(root: &Path, transcript: Transcript) -> anyhow::Result<App> {
    let scraper = Scraper::new(Arc::new(FsFetcher::new(root)), transcript.clone());
    let builder = documents::register(AppBuilder::new(), DocumentDesk::new(transcript))?;
    let builder = scrape::register(builder, scraper)?;

    let expected: Vec<&str> = documents::KINDS
        .iter()
        .chain(scrape::KINDS.iter())
        .copied()
        .collect();
    Ok(builder.expect_kinds(&expected).build()?)
}

async fn drain(app: &App, store: Arc<dyn CommandStore>) -> anyhow::Result<()> {
    let report = app.worker(store).run_until_idle().await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &WorkerReport) {
    println!(
        "executed {}, enqueued {}, failed {}, undecodable {}",
        report.executed, report.enqueued, report.failed, report.undecodable
    );
    if !report.left_pending.is_empty() {
        let ids: Vec<String> = report.left_pending.iter().map(ToString::to_string).collect();
        println!("left pending: {}", ids.join(", "));
    }
}
