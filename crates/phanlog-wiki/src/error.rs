//! Error types for `phanlog-wiki`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("wiki returned {status} for {url}")]
  Status {
    status: reqwest::StatusCode,
    url:    String,
  },

  #[error("page has no embedded table")]
  MissingTable,

  #[error("xml error: {0}")]
  Xml(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
