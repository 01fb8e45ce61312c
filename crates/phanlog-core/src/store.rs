//! The `ScanStore` trait and the atomic ingestion batch.
//!
//! The trait is implemented by storage backends (e.g.
//! `phanlog-store-sqlite`). The CLI depends on this abstraction, not on any
//! concrete engine.

use std::future::Future;

use crate::{
  product::{Conversion, Derivative, SliceMetrics},
  report::Table,
  scan::Scan,
  status::StatusRow,
};

// ─── Ingestion batch ─────────────────────────────────────────────────────────

/// Everything one discovery pass found.
///
/// Persisted atomically: either the whole batch commits or none of it does.
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
  pub scans:       Vec<Scan>,
  pub conversions: Vec<Conversion>,
  pub derivatives: Vec<Derivative>,
  pub slices:      Vec<SliceMetrics>,
}

impl IngestBatch {
  pub fn is_empty(&self) -> bool {
    self.scans.is_empty()
      && self.conversions.is_empty()
      && self.derivatives.is_empty()
      && self.slices.is_empty()
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the relational store backing the tracker.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait ScanStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a discovery pass in a single transaction.
  ///
  /// A duplicate identifier or broken reference fails the whole batch and
  /// leaves the store exactly as it was before the call.
  fn ingest(
    &self,
    batch: IngestBatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Compute the consolidated status view: exactly one row per scan,
  /// ordered by `(site, dicom day)`.
  fn status_log(
    &self,
  ) -> impl Future<Output = Result<Vec<StatusRow>, Self::Error>> + Send + '_;

  /// Read a named table or view as a tabular result.
  fn dump_table<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Table, Self::Error>> + Send + 'a;
}
