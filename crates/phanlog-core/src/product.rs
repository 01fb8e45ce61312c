//! Pipeline products attached to a scan: the conversion record, the three
//! derivative kinds, and per-slice functional QC metrics.
//!
//! The three derivative kinds share one record shape; a modality
//! discriminant stands in for three near-identical types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Modality ────────────────────────────────────────────────────────────────

/// Which derivative kind a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
  Anat,
  Func,
  Dwi,
}

impl Modality {
  /// The discriminant string stored in the `modality` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Modality::Anat => "anat",
      Modality::Func => "func",
      Modality::Dwi => "dwi",
    }
  }
}

// ─── Derivative ──────────────────────────────────────────────────────────────

/// A processed output derived from a scan's converted data.
///
/// The sidecar description blob is carried verbatim; its schema is not
/// interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Derivative {
  /// Sidecar filename stem.
  pub id:       String,
  pub modality: Modality,
  /// Opaque sidecar JSON.
  pub meta:     serde_json::Value,
  /// Parent scan, when it was known at construction time. A derivative
  /// discovered before (or without) its scan is an orphan, not an error.
  pub scan_id:  Option<String>,
}

impl Derivative {
  /// Construct a derivative, resolving its parent through an explicit
  /// read-only lookup. An unresolved parent leaves `scan_id` empty.
  pub fn resolve(
    modality: Modality,
    id: impl Into<String>,
    meta: serde_json::Value,
    parent_id: impl Into<String>,
    scan_exists: impl Fn(&str) -> bool,
  ) -> Derivative {
    let parent_id = parent_id.into();
    let scan_id = scan_exists(&parent_id).then_some(parent_id);
    Derivative { id: id.into(), modality, meta, scan_id }
  }
}

// ─── SliceMetrics ────────────────────────────────────────────────────────────

/// One QC measurement row for one slice of a functional derivative.
///
/// Every measurement is optional (absent when not computable); the owning
/// derivative is not — a slice without an existing parent is an integrity
/// violation surfaced by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceMetrics {
  pub derivative_id: String,
  pub slice:         Option<i64>,
  pub signal:        Option<f64>,
  pub signal_p2p:    Option<f64>,
  pub snr:           Option<f64>,
  pub ghost:         Option<f64>,
}

// ─── Conversion ──────────────────────────────────────────────────────────────

/// The result of converting a scan's raw data into the standardised layout.
///
/// `valid` is computed once from the validation artifact at ingestion time
/// and never recomputed: `None` means validation never ran, which is
/// distinct from `Some(false)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
  pub scan_id: Option<String>,
  pub day:     NaiveDate,
  pub valid:   Option<bool>,
}

impl Conversion {
  /// Construct a conversion record, resolving its scan through an explicit
  /// read-only lookup.
  pub fn resolve(
    day: NaiveDate,
    valid: Option<bool>,
    scan_id: impl Into<String>,
    scan_exists: impl Fn(&str) -> bool,
  ) -> Conversion {
    let scan_id = scan_id.into();
    let scan_id = scan_exists(&scan_id).then_some(scan_id);
    Conversion { scan_id, day, valid }
  }
}
