//! Raw-archive handling: discovery dates and the embedded acquisition date.

use std::{fs, io::Read, path::Path};

use chrono::{DateTime, Local, NaiveDate};
use phanlog_core::scan::Scan;

use crate::{Error, Result, dicom};

/// Entries whose name marks an index/manifest rather than image data.
const INDEX_MARKER: &str = "DICOMDIR";

/// Build a [`Scan`] from a raw archive path.
pub fn scan_from_path(path: &Path) -> Result<Scan> {
  let id = stem(path)?;
  let day = created_day(path)?;
  let acquisition_day = acquisition_day(path)?;
  Ok(Scan::new(id, day, acquisition_day)?)
}

/// The filesystem creation date, as a local calendar date. Falls back to
/// the modification date on filesystems that do not record creation time.
pub fn created_day(path: &Path) -> Result<NaiveDate> {
  let metadata = fs::metadata(path).map_err(|source| Error::Io {
    path: path.to_owned(),
    source,
  })?;
  let stamp = metadata
    .created()
    .or_else(|_| metadata.modified())
    .map_err(|source| Error::Io { path: path.to_owned(), source })?;
  Ok(DateTime::<Local>::from(stamp).date_naive())
}

/// The acquisition date embedded in the archive's first data entry.
///
/// Absent — never an error — when the file is not a zip archive, the
/// archive has no suitable entry, or the entry carries no acquisition-date
/// element. Index entries are skipped.
pub fn acquisition_day(path: &Path) -> Result<Option<NaiveDate>> {
  let file = fs::File::open(path).map_err(|source| Error::Io {
    path: path.to_owned(),
    source,
  })?;

  let mut archive = match zip::ZipArchive::new(file) {
    Ok(archive) => archive,
    Err(zip::result::ZipError::InvalidArchive(_)) => return Ok(None),
    Err(source) => {
      return Err(Error::Archive { path: path.to_owned(), source });
    }
  };

  for index in 0..archive.len() {
    let mut entry = archive.by_index(index).map_err(|source| Error::Archive {
      path: path.to_owned(),
      source,
    })?;
    if entry.is_dir() || entry.name().contains(INDEX_MARKER) {
      continue;
    }

    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).map_err(|source| Error::Io {
      path: path.to_owned(),
      source,
    })?;
    return dicom::acquisition_date(&bytes);
  }

  Ok(None)
}

/// Filename stem as the artifact identifier.
pub(crate) fn stem(path: &Path) -> Result<String> {
  path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .ok_or_else(|| Error::BadStem(path.to_owned()))
}
