//! Error types for `phanlog-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no recognised site code in scan identifier {0:?}")]
  UnrecognizedSite(String),

  #[error("published table is missing required column {0:?}")]
  MissingColumn(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
