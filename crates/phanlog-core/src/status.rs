//! The tri-state completeness flag and the consolidated status row.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scan::Site;

// ─── Flag ────────────────────────────────────────────────────────────────────

/// Three-valued completeness: not applicable/unknown, present, absent.
///
/// `Blank` is a real state, not a missing value — it marks a column whose
/// question cannot be asked yet (no conversion record, validation never
/// ran, or conversion failed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
  #[default]
  Blank,
  Yes,
  No,
}

impl Flag {
  /// The cell text published for this flag.
  pub fn as_str(self) -> &'static str {
    match self {
      Flag::Blank => "",
      Flag::Yes => "Y",
      Flag::No => "N",
    }
  }

  /// Decode a published cell. Unknown text is `None`.
  pub fn from_symbol(s: &str) -> Option<Flag> {
    match s {
      "" => Some(Flag::Blank),
      "Y" => Some(Flag::Yes),
      "N" => Some(Flag::No),
      _ => None,
    }
  }

  /// Validation outcome → flag. A conversion that was never validated stays
  /// blank rather than becoming a failure.
  pub fn from_valid(valid: Option<bool>) -> Flag {
    match valid {
      Some(true) => Flag::Yes,
      Some(false) => Flag::No,
      None => Flag::Blank,
    }
  }

  /// Derivative presence gated on conversion validation: the question
  /// "does the derivative exist" is only asked once validation passed.
  pub fn gated(validation: Flag, present: bool) -> Flag {
    match validation {
      Flag::Yes if present => Flag::Yes,
      Flag::Yes => Flag::No,
      _ => Flag::Blank,
    }
  }
}

impl fmt::Display for Flag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── StatusRow ───────────────────────────────────────────────────────────────

/// One row of the consolidated status view: per-scan completeness of every
/// pipeline stage. Never stored — recomputed in full on every invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRow {
  pub site:            Site,
  /// Acquisition date from the raw header ([`crate::scan::Scan::acquisition_day`]).
  pub date:            Option<NaiveDate>,
  /// Date the raw archive appeared ([`crate::scan::Scan::day`]).
  pub dicom:           NaiveDate,
  /// Date the converted layout appeared ([`crate::product::Conversion::day`]).
  pub bids:            Option<NaiveDate>,
  pub bids_validation: Flag,
  pub anatomical:      Flag,
  pub diffusion_low:   Flag,
  pub diffusion_high:  Flag,
  pub functional:      Flag,
  pub id:              String,
}
