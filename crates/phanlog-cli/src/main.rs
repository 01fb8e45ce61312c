//! `phanlog` — QC completeness tracking for MRI phantom scans.
//!
//! # Usage
//!
//! ```text
//! phanlog init --products /corral-secure/projects/A2CPS/products/mris
//! phanlog export-table status_log --out phantom-log.tsv
//! phanlog write-and-post --post --secrets secrets.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phanlog_core::{
  report::{Table, reconcile},
  store::ScanStore,
};
use phanlog_store_sqlite::SqliteStore;
use phanlog_wiki::WikiClient;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
  name = "phanlog",
  about = "QC completeness tracking for MRI phantom scans"
)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Walk the products tree and write the database.
  Init {
    /// Root of the per-site products tree.
    #[arg(
      long,
      env = "PHANLOG_PRODUCTS",
      default_value = "/corral-secure/projects/A2CPS/products/mris"
    )]
    products: PathBuf,

    /// SQLite database to create or extend.
    #[arg(long, env = "PHANLOG_DB", default_value = "phantom.db")]
    db: PathBuf,
  },

  /// Dump a table or view to a tab-separated file — mainly for inspection.
  ExportTable {
    /// Table or view name.
    #[arg(default_value = "status_log")]
    table: String,

    /// Output file.
    #[arg(long, default_value = "phantom-log.tsv")]
    out: PathBuf,

    #[arg(long, env = "PHANLOG_DB", default_value = "phantom.db")]
    db: PathBuf,
  },

  /// Reconcile the computed status with the published table; optionally
  /// publish and/or write a TSV copy.
  WriteAndPost {
    /// TSV file to write, if any.
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long, env = "PHANLOG_DB", default_value = "phantom.db")]
    db: PathBuf,

    /// Upload the merged table to the wiki.
    #[arg(long)]
    post: bool,

    /// JSON file holding the personal access token under the key "PAT".
    #[arg(long, default_value = "secrets.json")]
    secrets: PathBuf,

    /// Base URL of the wiki.
    #[arg(
      long,
      env = "PHANLOG_WIKI_URL",
      default_value = "https://confluence.a2cps.org/"
    )]
    wiki_url: String,

    /// Page carrying the published status table.
    #[arg(long, env = "PHANLOG_PAGE_ID", default_value = "44237591")]
    page_id: String,
  },
}

/// Shape of the secrets file.
#[derive(Deserialize)]
struct Secrets {
  #[serde(rename = "PAT")]
  pat: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  match Cli::parse().command {
    Command::Init { products, db } => init(&products, &db).await,
    Command::ExportTable { table, out, db } => {
      export_table(&table, &out, &db).await
    }
    Command::WriteAndPost { out, db, post, secrets, wiki_url, page_id } => {
      write_and_post(out.as_deref(), &db, post, &secrets, &wiki_url, &page_id)
        .await
    }
  }
}

// ─── Operations ───────────────────────────────────────────────────────────────

async fn init(products: &Path, db: &Path) -> Result<()> {
  let batch = phanlog_ingest::discover(products)
    .with_context(|| format!("walking products tree {}", products.display()))?;

  tracing::info!(
    scans = batch.scans.len(),
    conversions = batch.conversions.len(),
    derivatives = batch.derivatives.len(),
    slices = batch.slices.len(),
    "discovered artifacts"
  );

  let store = open_store(db).await?;
  store.ingest(batch).await.context("ingesting batch")?;
  Ok(())
}

async fn export_table(table: &str, out: &Path, db: &Path) -> Result<()> {
  let store = open_store(db).await?;
  let dumped = store
    .dump_table(table)
    .await
    .with_context(|| format!("reading table {table:?}"))?;

  write_tsv(out, &dumped)?;
  tracing::info!(table, out = %out.display(), rows = dumped.rows.len(), "exported");
  Ok(())
}

async fn write_and_post(
  out: Option<&Path>,
  db: &Path,
  post: bool,
  secrets: &Path,
  wiki_url: &str,
  page_id: &str,
) -> Result<()> {
  let store = open_store(db).await?;
  let status = store.status_log().await.context("computing status view")?;

  let raw = std::fs::read_to_string(secrets)
    .with_context(|| format!("reading secrets file {}", secrets.display()))?;
  let parsed: Secrets =
    serde_json::from_str(&raw).context("parsing secrets file")?;

  let client =
    WikiClient::new(wiki_url, parsed.pat).context("building wiki client")?;
  let old = client
    .fetch_table(page_id)
    .await
    .context("fetching published table")?;
  let notes = old
    .project_notes()
    .context("projecting notes from published table")?;

  let report = reconcile(status, &notes);
  let table = report.to_table();

  if post {
    client
      .publish_table(page_id, &table)
      .await
      .context("publishing merged table")?;
  }
  if let Some(out) = out {
    write_tsv(out, &table)?;
    tracing::info!(out = %out.display(), rows = table.rows.len(), "wrote merged table");
  }
  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn open_store(db: &Path) -> Result<SqliteStore> {
  SqliteStore::open(db)
    .await
    .with_context(|| format!("opening database {}", db.display()))
}

fn write_tsv(out: &Path, table: &Table) -> Result<()> {
  let mut writer = csv::WriterBuilder::new()
    .delimiter(b'\t')
    .from_path(out)
    .with_context(|| format!("creating {}", out.display()))?;

  writer.write_record(&table.headers)?;
  for row in &table.rows {
    writer.write_record(row)?;
  }
  writer.flush()?;
  Ok(())
}
