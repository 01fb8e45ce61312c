//! Filesystem discovery: walk a products root with fixed glob patterns per
//! artifact kind and assemble one ingestion batch.

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use phanlog_core::{product::Modality, store::IngestBatch};
use tracing::debug;

use crate::{Error, Result, raw, sidecar};

/// Glob patterns per artifact kind, relative to the products root.
pub const RAW_PATTERN: &str = "*/dicoms/*QC*zip";
pub const CONVERSION_PATTERN: &str = "*/bids/*QC*";
pub const ANAT_PATTERN: &str = "*/bids/*QC*/sub*/ses*/anat/*T1w.json";
pub const FUNC_PATTERN: &str = "*/bids/*QC*/sub*/ses*/func/*bold.json";
pub const DWI_PATTERN: &str = "*/bids/*QC*/sub*/ses*/dwi/*dwi.json";
pub const QC_TABLE_PATTERN: &str = "*/aa-fmri-phantom-qa/*/*/*table.csv";

/// Walk `root` and build the batch for one ingestion pass.
///
/// Scans are collected first so conversion and derivative records can
/// resolve their parents against the pass's own scan identifiers.
pub fn discover(root: &Path) -> Result<IngestBatch> {
  let mut batch = IngestBatch::default();

  for path in matches(root, RAW_PATTERN)? {
    batch.scans.push(raw::scan_from_path(&path)?);
  }

  let scan_ids: HashSet<String> =
    batch.scans.iter().map(|s| s.id.clone()).collect();
  let scan_exists = |id: &str| scan_ids.contains(id);

  for path in matches(root, CONVERSION_PATTERN)? {
    batch
      .conversions
      .push(sidecar::conversion_from_path(&path, &scan_exists)?);
  }

  for (modality, pattern) in [
    (Modality::Anat, ANAT_PATTERN),
    (Modality::Func, FUNC_PATTERN),
    (Modality::Dwi, DWI_PATTERN),
  ] {
    for path in matches(root, pattern)? {
      batch
        .derivatives
        .push(sidecar::derivative_from_path(modality, &path, &scan_exists)?);
    }
  }

  for path in matches(root, QC_TABLE_PATTERN)? {
    batch.slices.extend(sidecar::slices_from_table(&path)?);
  }

  debug!(
    scans = batch.scans.len(),
    conversions = batch.conversions.len(),
    derivatives = batch.derivatives.len(),
    slices = batch.slices.len(),
    "discovery pass complete"
  );

  Ok(batch)
}

fn matches(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
  let full = root.join(pattern).to_string_lossy().into_owned();
  let walker = glob::glob(&full).map_err(|source| Error::Pattern {
    pattern: full.clone(),
    source,
  })?;
  Ok(walker.collect::<std::result::Result<Vec<_>, _>>()?)
}
