//! A minimal read of one DICOM header element.
//!
//! This is not a DICOM codec. The only thing identity derivation needs from
//! a raw header is the AcquisitionDate element (0008,0022), so this walks an
//! explicit-VR little-endian stream far enough to find it and nothing more.
//! Streams the walker does not understand yield "no date" rather than an
//! error; only a present-but-unparseable date value fails.

use chrono::NaiveDate;

use crate::{Error, Result};

const MAGIC_OFFSET: usize = 128;
const MAGIC: &[u8] = b"DICM";

/// Group and element of AcquisitionDate.
const ACQUISITION_DATE: (u16, u16) = (0x0008, 0x0022);

/// DA values are calendar dates packed as `YYYYMMDD`.
const DA_FORMAT: &str = "%Y%m%d";

/// VRs whose length field is four bytes after a two-byte reserved gap.
const LONG_VRS: [&[u8; 2]; 6] = [b"OB", b"OW", b"OF", b"SQ", b"UT", b"UN"];

/// Scan a header stream for the acquisition date.
pub fn acquisition_date(bytes: &[u8]) -> Result<Option<NaiveDate>> {
  if bytes.len() < MAGIC_OFFSET + MAGIC.len()
    || &bytes[MAGIC_OFFSET..MAGIC_OFFSET + MAGIC.len()] != MAGIC
  {
    return Ok(None);
  }

  let mut cursor = MAGIC_OFFSET + MAGIC.len();

  while cursor + 8 <= bytes.len() {
    let group = u16::from_le_bytes([bytes[cursor], bytes[cursor + 1]]);
    let element = u16::from_le_bytes([bytes[cursor + 2], bytes[cursor + 3]]);
    let vr = &bytes[cursor + 4..cursor + 6];

    // Anything that does not look like an explicit VR means a transfer
    // syntax we do not read; give up quietly.
    if !vr.iter().all(u8::is_ascii_uppercase) {
      return Ok(None);
    }

    let (length, header_len) = if LONG_VRS.iter().any(|long| long.as_slice() == vr) {
      if cursor + 12 > bytes.len() {
        return Ok(None);
      }
      let length = u32::from_le_bytes([
        bytes[cursor + 8],
        bytes[cursor + 9],
        bytes[cursor + 10],
        bytes[cursor + 11],
      ]);
      // Undefined lengths cannot be skipped without a full parser.
      if length == u32::MAX {
        return Ok(None);
      }
      (length as usize, 12)
    } else {
      let length = u16::from_le_bytes([bytes[cursor + 6], bytes[cursor + 7]]);
      (length as usize, 8)
    };

    let value_start = cursor + header_len;
    let value_end = match value_start.checked_add(length) {
      Some(end) if end <= bytes.len() => end,
      _ => return Ok(None),
    };

    if (group, element) == ACQUISITION_DATE {
      let text = String::from_utf8_lossy(&bytes[value_start..value_end]);
      let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
      if trimmed.is_empty() {
        return Ok(None);
      }
      let date = NaiveDate::parse_from_str(trimmed, DA_FORMAT)
        .map_err(|source| Error::MalformedDate {
          value:  trimmed.to_owned(),
          source,
        })?;
      return Ok(Some(date));
    }

    cursor = value_end;
  }

  Ok(None)
}

// ─── Test fixtures ───────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::testing::{long_element, short_element, stream, stream_with_date};
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn finds_acquisition_date() {
    let bytes = stream_with_date("20240131");
    assert_eq!(acquisition_date(&bytes).unwrap(), Some(date(2024, 1, 31)));
  }

  #[test]
  fn walks_past_preceding_elements() {
    let bytes = stream(&[
      long_element(0x0002, 0x0001, b"OB", &[0x00, 0x01]),
      short_element(0x0008, 0x0020, b"DA", b"20240101"),
      short_element(0x0008, 0x0022, b"DA", b"20240102"),
    ]);
    assert_eq!(acquisition_date(&bytes).unwrap(), Some(date(2024, 1, 2)));
  }

  #[test]
  fn missing_element_is_absent() {
    let bytes = stream(&[short_element(0x0008, 0x0020, b"DA", b"20240101")]);
    assert_eq!(acquisition_date(&bytes).unwrap(), None);
  }

  #[test]
  fn empty_value_is_absent() {
    let bytes = stream(&[short_element(0x0008, 0x0022, b"DA", b"")]);
    assert_eq!(acquisition_date(&bytes).unwrap(), None);
  }

  #[test]
  fn malformed_value_is_an_error() {
    let bytes = stream(&[short_element(0x0008, 0x0022, b"DA", b"2024-XX")]);
    let err = acquisition_date(&bytes).unwrap_err();
    assert!(matches!(err, Error::MalformedDate { .. }));
  }

  #[test]
  fn non_dicom_bytes_are_absent() {
    assert_eq!(acquisition_date(b"not a header").unwrap(), None);
    assert_eq!(acquisition_date(&[0u8; 200]).unwrap(), None);
  }

  #[test]
  fn implicit_vr_stream_is_absent() {
    // Implicit-VR elements put a 4-byte length where the VR letters go.
    let mut element = Vec::new();
    element.extend_from_slice(&0x0008u16.to_le_bytes());
    element.extend_from_slice(&0x0022u16.to_le_bytes());
    element.extend_from_slice(&8u32.to_le_bytes());
    element.extend_from_slice(b"20240101");

    let bytes = stream(&[element]);
    assert_eq!(acquisition_date(&bytes).unwrap(), None);
  }

  #[test]
  fn truncated_value_is_absent() {
    let mut bytes = stream_with_date("20240131");
    bytes.truncate(bytes.len() - 4);
    assert_eq!(acquisition_date(&bytes).unwrap(), None);
  }
}
