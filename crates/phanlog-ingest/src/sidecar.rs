//! Sidecar-derived records: conversion results, derivative descriptions,
//! and per-slice QC tables.

use std::{
  ffi::OsStr,
  fs,
  path::{Component, Path, PathBuf},
};

use phanlog_core::product::{Conversion, Derivative, Modality, SliceMetrics};
use serde::Deserialize;

use crate::{Error, Result, raw};

/// Path component naming the conversion stage.
const CONVERSION_STAGE: &str = "bids";
/// Path component naming the validation stage.
const VALIDATION_STAGE: &str = "bids_validation";
/// Filename suffix marking a successful validation run.
const SUCCESS_SUFFIX: &str = "out";

/// Directory levels between a modality sidecar and the conversion session
/// directory named after its scan (`<scan>/sub-*/ses-*/<modality>/<file>`).
const SESSION_DEPTH: usize = 3;

// ─── Conversions ─────────────────────────────────────────────────────────────

/// Build a [`Conversion`] from a converted-layout path.
///
/// The validation outcome comes from the sibling validation directory: no
/// sibling means validation never ran; a sibling holding at least one
/// success-marker file means it passed; anything else means it failed.
pub fn conversion_from_path(
  path: &Path,
  scan_exists: impl Fn(&str) -> bool,
) -> Result<Conversion> {
  let valid = validation_outcome(path)?;
  let day = raw::created_day(path)?;
  Ok(Conversion::resolve(day, valid, raw::stem(path)?, scan_exists))
}

fn validation_outcome(path: &Path) -> Result<Option<bool>> {
  let validation_dir = swap_stage(path);
  if !validation_dir.exists() {
    return Ok(None);
  }

  let entries = fs::read_dir(&validation_dir).map_err(|source| Error::Io {
    path: validation_dir.clone(),
    source,
  })?;
  for entry in entries {
    let entry = entry.map_err(|source| Error::Io {
      path: validation_dir.clone(),
      source,
    })?;
    if entry.file_name().to_string_lossy().ends_with(SUCCESS_SUFFIX) {
      return Ok(Some(true));
    }
  }
  Ok(Some(false))
}

/// Swap the path component naming the conversion stage for the one naming
/// the validation stage. Only whole components are swapped — a filename
/// that merely contains the stage name is left alone.
fn swap_stage(path: &Path) -> PathBuf {
  path
    .components()
    .map(|component| match component {
      Component::Normal(name) if name == CONVERSION_STAGE => {
        Component::Normal(OsStr::new(VALIDATION_STAGE))
      }
      other => other,
    })
    .collect()
}

// ─── Derivatives ─────────────────────────────────────────────────────────────

/// Build a [`Derivative`] from a modality sidecar path. The parent scan is
/// the conversion session directory's name, resolved through `scan_exists`.
pub fn derivative_from_path(
  modality: Modality,
  path: &Path,
  scan_exists: impl Fn(&str) -> bool,
) -> Result<Derivative> {
  let text = fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.to_owned(),
    source,
  })?;
  let meta = serde_json::from_str(&text).map_err(|source| Error::Sidecar {
    path: path.to_owned(),
    source,
  })?;
  let parent = session_id(path)?;
  Ok(Derivative::resolve(modality, raw::stem(path)?, meta, parent, scan_exists))
}

/// The conversion session directory's name, [`SESSION_DEPTH`] + 1 levels up
/// from the sidecar.
fn session_id(path: &Path) -> Result<String> {
  let mut ancestor = path.parent();
  for _ in 0..SESSION_DEPTH {
    ancestor = ancestor.and_then(Path::parent);
  }
  let session = ancestor.ok_or_else(|| Error::BadStem(path.to_owned()))?;
  raw::stem(session)
}

// ─── Slice QC tables ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SliceRecord {
  slice:      Option<i64>,
  signal:     Option<f64>,
  signal_p2p: Option<f64>,
  snr:        Option<f64>,
  ghost:      Option<f64>,
}

/// Read one per-slice QC table. The owning functional derivative is the
/// table's parent directory.
pub fn slices_from_table(path: &Path) -> Result<Vec<SliceMetrics>> {
  let derivative_id = path
    .parent()
    .map(raw::stem)
    .transpose()?
    .ok_or_else(|| Error::BadStem(path.to_owned()))?;

  let mut reader = csv::Reader::from_path(path).map_err(|source| Error::QcTable {
    path: path.to_owned(),
    source,
  })?;

  let mut slices = Vec::new();
  for record in reader.deserialize::<SliceRecord>() {
    let record = record.map_err(|source| Error::QcTable {
      path: path.to_owned(),
      source,
    })?;
    slices.push(SliceMetrics {
      derivative_id: derivative_id.clone(),
      slice:         record.slice,
      signal:        record.signal,
      signal_p2p:    record.signal_p2p,
      snr:           record.snr,
      ghost:         record.ghost,
    });
  }
  Ok(slices)
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  fn touch(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
  }

  // ── Conversions ──────────────────────────────────────────────────────────

  #[test]
  fn conversion_without_validation_sibling_is_unvalidated() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("site/bids/NS0001QC");
    fs::create_dir_all(&session).unwrap();

    let conversion = conversion_from_path(&session, |_| true).unwrap();
    assert_eq!(conversion.valid, None);
    assert_eq!(conversion.scan_id.as_deref(), Some("NS0001QC"));
  }

  #[test]
  fn conversion_with_success_marker_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("site/bids/NS0001QC");
    fs::create_dir_all(&session).unwrap();
    touch(
      &dir.path().join("site/bids_validation/NS0001QC/validator.out"),
      "ok",
    );

    let conversion = conversion_from_path(&session, |_| true).unwrap();
    assert_eq!(conversion.valid, Some(true));
  }

  #[test]
  fn conversion_with_empty_validation_dir_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("site/bids/NS0001QC");
    fs::create_dir_all(&session).unwrap();
    fs::create_dir_all(dir.path().join("site/bids_validation/NS0001QC")).unwrap();

    let conversion = conversion_from_path(&session, |_| true).unwrap();
    assert_eq!(conversion.valid, Some(false));
  }

  #[test]
  fn conversion_marker_must_be_a_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("site/bids/NS0001QC");
    fs::create_dir_all(&session).unwrap();
    touch(
      &dir.path().join("site/bids_validation/NS0001QC/output.log"),
      "not a marker",
    );

    let conversion = conversion_from_path(&session, |_| true).unwrap();
    assert_eq!(conversion.valid, Some(false));
  }

  #[test]
  fn conversion_for_unknown_scan_stays_orphaned() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("site/bids/WS0009QC");
    fs::create_dir_all(&session).unwrap();

    let conversion = conversion_from_path(&session, |_| false).unwrap();
    assert_eq!(conversion.scan_id, None);
  }

  #[test]
  fn swap_stage_replaces_whole_components_only() {
    let swapped = swap_stage(Path::new("products/ns/bids/ns-bids-QC"));
    assert_eq!(
      swapped,
      Path::new("products/ns/bids_validation/ns-bids-QC")
    );
  }

  // ── Derivatives ──────────────────────────────────────────────────────────

  #[test]
  fn derivative_resolves_parent_from_session_directory() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = dir
      .path()
      .join("site/bids/NS0001QC/sub-01/ses-1/anat/sub-01_T1w.json");
    touch(&sidecar, r#"{"EchoTime": 0.03}"#);

    let derivative =
      derivative_from_path(Modality::Anat, &sidecar, |id| id == "NS0001QC")
        .unwrap();
    assert_eq!(derivative.id, "sub-01_T1w");
    assert_eq!(derivative.modality, Modality::Anat);
    assert_eq!(derivative.scan_id.as_deref(), Some("NS0001QC"));
    assert_eq!(derivative.meta["EchoTime"], 0.03);
  }

  #[test]
  fn derivative_with_unknown_parent_is_orphaned() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = dir
      .path()
      .join("site/bids/ZZ0001QC/sub-01/ses-1/func/sub-01_bold.json");
    touch(&sidecar, "{}");

    let derivative =
      derivative_from_path(Modality::Func, &sidecar, |_| false).unwrap();
    assert_eq!(derivative.scan_id, None);
  }

  #[test]
  fn derivative_with_broken_sidecar_errors() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = dir
      .path()
      .join("site/bids/NS0001QC/sub-01/ses-1/dwi/sub-01_dwi.json");
    touch(&sidecar, "not json");

    let err = derivative_from_path(Modality::Dwi, &sidecar, |_| true).unwrap_err();
    assert!(matches!(err, Error::Sidecar { .. }));
  }

  // ── Slice QC tables ──────────────────────────────────────────────────────

  #[test]
  fn slices_parse_with_missing_measurements() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("qa/NS0001QC/sub-01_bold/moment_table.csv");
    touch(
      &table,
      "slice,signal,signal_p2p,snr,ghost\n\
       0,512.3,0.4,,0.01\n\
       1,,,118.2,\n",
    );

    let slices = slices_from_table(&table).unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].derivative_id, "sub-01_bold");
    assert_eq!(slices[0].slice, Some(0));
    assert_eq!(slices[0].snr, None);
    assert_eq!(slices[1].signal, None);
    assert_eq!(slices[1].snr, Some(118.2));
  }

  #[test]
  fn slices_tolerate_extra_columns() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("qa/NS0001QC/sub-01_bold/moment_table.csv");
    touch(
      &table,
      ",slice,signal,signal_p2p,snr,ghost,comment\n0,3,1.0,2.0,3.0,4.0,fine\n",
    );

    let slices = slices_from_table(&table).unwrap();
    assert_eq!(slices.len(), 1);
    assert_eq!(slices[0].slice, Some(3));
    assert_eq!(slices[0].ghost, Some(4.0));
  }
}
