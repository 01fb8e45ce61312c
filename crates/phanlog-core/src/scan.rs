//! Scan — the root entity of the data model.
//!
//! One scan per raw archive found under a site's `dicoms/` directory.
//! Derivatives and the conversion record refer back to it by `id`.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Site ────────────────────────────────────────────────────────────────────

/// The fixed, closed set of imaging-site codes embedded in scan identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Site {
  Ns,
  Ws,
  Sh,
  Ui,
  Uc,
  Um,
}

impl Site {
  /// All site codes, in the order they are tried during extraction.
  pub const ALL: [Site; 6] =
    [Site::Ns, Site::Ws, Site::Sh, Site::Ui, Site::Uc, Site::Um];

  /// The canonical upper-case code.
  pub fn code(self) -> &'static str {
    match self {
      Site::Ns => "NS",
      Site::Ws => "WS",
      Site::Sh => "SH",
      Site::Ui => "UI",
      Site::Uc => "UC",
      Site::Um => "UM",
    }
  }

  fn code_lower(self) -> &'static [u8] {
    match self {
      Site::Ns => b"ns",
      Site::Ws => b"ws",
      Site::Sh => b"sh",
      Site::Ui => b"ui",
      Site::Uc => b"uc",
      Site::Um => b"um",
    }
  }

  /// Scan `id` left to right for the first embedded site code,
  /// case-insensitively.
  ///
  /// An identifier without a recognised code is a data-quality problem and
  /// fails extraction outright rather than producing a partial match.
  pub fn extract(id: &str) -> Result<Site> {
    let lower = id.to_ascii_lowercase();
    let bytes = lower.as_bytes();

    for start in 0..bytes.len().saturating_sub(1) {
      let window = &bytes[start..start + 2];
      for site in Site::ALL {
        if window == site.code_lower() {
          return Ok(site);
        }
      }
    }
    Err(Error::UnrecognizedSite(id.to_owned()))
  }

  /// Decode a stored upper-case code.
  pub fn from_code(code: &str) -> Option<Site> {
    Site::ALL.into_iter().find(|s| s.code() == code)
  }
}

impl fmt::Display for Site {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

// ─── Scan ────────────────────────────────────────────────────────────────────

/// One raw acquisition session.
///
/// Created exclusively during an ingestion pass and never updated in place
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
  /// Source-archive filename stem; globally unique and stable across runs.
  pub id:              String,
  pub site:            Site,
  /// Filesystem creation date of the archive — a proxy for the date the
  /// scan reached the products tree. Always present.
  pub day:             NaiveDate,
  /// True acquisition date from the embedded header, when extractable.
  pub acquisition_day: Option<NaiveDate>,
}

impl Scan {
  /// Build a scan from its identifier and discovery dates. The site is
  /// derived from the identifier.
  pub fn new(
    id: impl Into<String>,
    day: NaiveDate,
    acquisition_day: Option<NaiveDate>,
  ) -> Result<Scan> {
    let id = id.into();
    let site = Site::extract(&id)?;
    Ok(Scan { id, site, day, acquisition_day })
  }
}
