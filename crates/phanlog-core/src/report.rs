//! The reconciliation engine: merge the freshly computed status view with
//! the previously published, human-annotated table.
//!
//! Everything here is a pure function of its inputs. Publishing is a
//! separate step performed by the caller, which keeps the merge testable
//! without network access.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::{Error, Result, status::StatusRow};

/// Date format used in published cells.
pub const CELL_DATE_FORMAT: &str = "%y-%m-%d";

/// Published column order. `notes` is carried from the old table; every
/// other column comes from the computed view.
pub const REPORT_COLUMNS: [&str; 11] = [
  "site",
  "date",
  "dicom",
  "bids",
  "bids_validation",
  "anatomical",
  "diffusion-low",
  "diffusion-high",
  "functional",
  "id",
  "notes",
];

// ─── Table ───────────────────────────────────────────────────────────────────

/// A plain tabular result: one header row plus string cells.
///
/// The published surface has no notion of null — absent values are empty
/// cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
  pub headers: Vec<String>,
  pub rows:    Vec<Vec<String>>,
}

impl Table {
  pub fn column(&self, name: &str) -> Option<usize> {
    self.headers.iter().position(|h| h == name)
  }

  /// Project the `(id, notes)` pairs out of a previously published table.
  ///
  /// Fails fast when either column is missing — silently producing a report
  /// without notes is worse than aborting the run.
  pub fn project_notes(&self) -> Result<NotesTable> {
    let id_col = self.column("id").ok_or(Error::MissingColumn("id"))?;
    let notes_col = self.column("notes").ok_or(Error::MissingColumn("notes"))?;

    let mut by_id = HashMap::new();
    for row in &self.rows {
      let id = row.get(id_col).cloned().unwrap_or_default();
      let notes = row.get(notes_col).cloned().unwrap_or_default();
      if !id.is_empty() {
        by_id.insert(id, notes);
      }
    }
    Ok(NotesTable { by_id })
  }
}

// ─── NotesTable ──────────────────────────────────────────────────────────────

/// Human-maintained notes keyed by scan identifier.
#[derive(Debug, Clone, Default)]
pub struct NotesTable {
  by_id: HashMap<String, String>,
}

impl NotesTable {
  pub fn get(&self, id: &str) -> Option<&str> {
    self.by_id.get(id).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.by_id.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_id.is_empty()
  }
}

impl FromIterator<(String, String)> for NotesTable {
  fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
    NotesTable { by_id: iter.into_iter().collect() }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// A reconciled row: computed completeness plus the carried-over note.
#[derive(Debug, Clone)]
pub struct ReportRow {
  pub status: StatusRow,
  pub notes:  String,
}

/// The merged table to publish.
#[derive(Debug, Clone, Default)]
pub struct Report {
  pub rows: Vec<ReportRow>,
}

/// Merge the computed view with the notes of the previously published table.
///
/// The computed view is authoritative for which scans exist: every computed
/// row survives, and old rows whose id no longer appears are dropped (a scan
/// that vanished from the products tree leaves the report). Notes travel by
/// id.
pub fn reconcile(new: Vec<StatusRow>, old: &NotesTable) -> Report {
  let mut rows: Vec<ReportRow> = new
    .into_iter()
    .map(|status| {
      let notes = old.get(&status.id).unwrap_or_default().to_owned();
      ReportRow { status, notes }
    })
    .collect();

  // Stable sort: ties keep the order the view produced. Rows without an
  // acquisition date sort after dated rows of the same site.
  rows.sort_by(|a, b| sort_key(&a.status).cmp(&sort_key(&b.status)));

  Report { rows }
}

fn sort_key(row: &StatusRow) -> (&'static str, bool, Option<NaiveDate>) {
  (row.site.code(), row.date.is_none(), row.date)
}

impl Report {
  /// Render for publishing: fixed column order, dates as
  /// [`CELL_DATE_FORMAT`], absent values as empty cells.
  pub fn to_table(&self) -> Table {
    let headers = REPORT_COLUMNS.iter().map(|c| c.to_string()).collect();
    let rows = self
      .rows
      .iter()
      .map(|row| {
        let s = &row.status;
        vec![
          s.site.code().to_owned(),
          date_cell(s.date),
          date_cell(Some(s.dicom)),
          date_cell(s.bids),
          s.bids_validation.as_str().to_owned(),
          s.anatomical.as_str().to_owned(),
          s.diffusion_low.as_str().to_owned(),
          s.diffusion_high.as_str().to_owned(),
          s.functional.as_str().to_owned(),
          s.id.clone(),
          row.notes.clone(),
        ]
      })
      .collect();
    Table { headers, rows }
  }
}

fn date_cell(d: Option<NaiveDate>) -> String {
  d.map(|d| d.format(CELL_DATE_FORMAT).to_string())
    .unwrap_or_default()
}
