//! Error types for `phanlog-ingest`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] phanlog_core::Error),

  #[error("i/o error at {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("bad glob pattern {pattern:?}: {source}")]
  Pattern {
    pattern: String,
    #[source]
    source:  glob::PatternError,
  },

  #[error("glob walk failed: {0}")]
  Glob(#[from] glob::GlobError),

  #[error("archive error at {}: {source}", path.display())]
  Archive {
    path:   PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  #[error("malformed acquisition date {value:?}: {source}")]
  MalformedDate {
    value:  String,
    #[source]
    source: chrono::ParseError,
  },

  #[error("sidecar {} is not valid JSON: {source}", path.display())]
  Sidecar {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("qc table {}: {source}", path.display())]
  QcTable {
    path:   PathBuf,
    #[source]
    source: csv::Error,
  },

  #[error("artifact path {} has no usable filename stem", .0.display())]
  BadStem(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
