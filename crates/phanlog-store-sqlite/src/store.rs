//! [`SqliteStore`] — the SQLite implementation of [`ScanStore`].

use std::path::Path;

use phanlog_core::{
  report::Table,
  status::StatusRow,
  store::{IngestBatch, ScanStore},
};

use crate::{
  Error, Result,
  encode::{RawStatusRow, encode_day},
  schema::SCHEMA,
};

/// Tables and views [`ScanStore::dump_table`] may read.
const EXPORTABLE: [&str; 7] = [
  "scans",
  "conversions",
  "derivatives",
  "slices",
  "diffusion_low",
  "diffusion_high",
  "status_log",
];

// ─── Store ───────────────────────────────────────────────────────────────────

/// A scan store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ScanStore impl ──────────────────────────────────────────────────────────

impl ScanStore for SqliteStore {
  type Error = Error;

  async fn ingest(&self, batch: IngestBatch) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        // One transaction per pass: a duplicate identifier or broken
        // reference anywhere in the batch rolls the whole pass back.
        let tx = conn.transaction()?;

        for scan in &batch.scans {
          tx.execute(
            "INSERT INTO scans (id, site, day, acquisition_day)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
              scan.id,
              scan.site.code(),
              encode_day(scan.day),
              scan.acquisition_day.map(encode_day),
            ],
          )?;
        }

        for conversion in &batch.conversions {
          tx.execute(
            "INSERT INTO conversions (scan_id, day, valid)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![
              conversion.scan_id,
              encode_day(conversion.day),
              conversion.valid,
            ],
          )?;
        }

        for derivative in &batch.derivatives {
          tx.execute(
            "INSERT INTO derivatives (id, modality, meta, scan_id)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
              derivative.id,
              derivative.modality.as_str(),
              derivative.meta.to_string(),
              derivative.scan_id,
            ],
          )?;
        }

        for slice in &batch.slices {
          tx.execute(
            "INSERT INTO slices (derivative_id, slice, signal, signal_p2p, snr, ghost)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              slice.derivative_id,
              slice.slice,
              slice.signal,
              slice.signal_p2p,
              slice.snr,
              slice.ghost,
            ],
          )?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn status_log(&self) -> Result<Vec<StatusRow>> {
    let raws: Vec<RawStatusRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT site, date, dicom, bids, bids_validation,
                  anatomical, \"diffusion-low\", \"diffusion-high\",
                  functional, id
           FROM status_log
           ORDER BY site, dicom",
        )?;

        let rows = stmt
          .query_map([], |row| {
            Ok(RawStatusRow {
              site:            row.get(0)?,
              date:            row.get(1)?,
              dicom:           row.get(2)?,
              bids:            row.get(3)?,
              bids_validation: row.get(4)?,
              anatomical:      row.get(5)?,
              diffusion_low:   row.get(6)?,
              diffusion_high:  row.get(7)?,
              functional:      row.get(8)?,
              id:              row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStatusRow::into_status_row).collect()
  }

  async fn dump_table<'a>(&'a self, table: &'a str) -> Result<Table> {
    if !EXPORTABLE.contains(&table) {
      return Err(Error::UnknownTable(table.to_owned()));
    }
    // `table` is allowlisted above; interpolation is safe.
    let sql = format!("SELECT * FROM {table}");

    let dumped = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let headers: Vec<String> =
          stmt.column_names().iter().map(|c| c.to_string()).collect();
        let ncols = headers.len();

        let rows = stmt
          .query_map([], |row| {
            (0..ncols)
              .map(|i| {
                let value: rusqlite::types::Value = row.get(i)?;
                Ok(cell_text(value))
              })
              .collect::<rusqlite::Result<Vec<String>>>()
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Table { headers, rows })
      })
      .await?;

    Ok(dumped)
  }
}

/// Render one stored value the way the export surface expects: nulls become
/// empty cells, everything else its canonical text.
fn cell_text(value: rusqlite::types::Value) -> String {
  use rusqlite::types::Value;

  match value {
    Value::Null => String::new(),
    Value::Integer(i) => i.to_string(),
    Value::Real(f) => f.to_string(),
    Value::Text(s) => s,
    // No blob columns exist in this schema.
    Value::Blob(_) => String::new(),
  }
}
