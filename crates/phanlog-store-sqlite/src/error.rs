//! Error type for `phanlog-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  #[error("unknown value in column {column}: {value:?}")]
  Decode {
    column: &'static str,
    value:  String,
  },

  #[error("table {0:?} is not exportable")]
  UnknownTable(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
