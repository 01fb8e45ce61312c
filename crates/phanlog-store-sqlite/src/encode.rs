//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as ISO 8601 (`%Y-%m-%d`) strings so lexicographic and
//! chronological order agree. Sites and flags are stored as their canonical
//! cell text.

use chrono::NaiveDate;
use phanlog_core::{
  scan::Site,
  status::{Flag, StatusRow},
};

use crate::{Error, Result};

pub const DAY_FORMAT: &str = "%Y-%m-%d";

pub fn encode_day(day: NaiveDate) -> String {
  day.format(DAY_FORMAT).to_string()
}

pub fn decode_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DAY_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_opt_day(s: Option<&str>) -> Result<Option<NaiveDate>> {
  s.map(decode_day).transpose()
}

pub fn decode_site(s: &str) -> Result<Site> {
  Site::from_code(s).ok_or_else(|| Error::Decode {
    column: "site",
    value:  s.to_owned(),
  })
}

pub fn decode_flag(column: &'static str, s: &str) -> Result<Flag> {
  Flag::from_symbol(s).ok_or_else(|| Error::Decode {
    column,
    value: s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `status_log` row.
pub struct RawStatusRow {
  pub site:            String,
  pub date:            Option<String>,
  pub dicom:           String,
  pub bids:            Option<String>,
  pub bids_validation: String,
  pub anatomical:      String,
  pub diffusion_low:   String,
  pub diffusion_high:  String,
  pub functional:      String,
  pub id:              String,
}

impl RawStatusRow {
  pub fn into_status_row(self) -> Result<StatusRow> {
    Ok(StatusRow {
      site:            decode_site(&self.site)?,
      date:            decode_opt_day(self.date.as_deref())?,
      dicom:           decode_day(&self.dicom)?,
      bids:            decode_opt_day(self.bids.as_deref())?,
      bids_validation: decode_flag("bids_validation", &self.bids_validation)?,
      anatomical:      decode_flag("anatomical", &self.anatomical)?,
      diffusion_low:   decode_flag("diffusion-low", &self.diffusion_low)?,
      diffusion_high:  decode_flag("diffusion-high", &self.diffusion_high)?,
      functional:      decode_flag("functional", &self.functional)?,
      id:              self.id,
    })
  }
}
