//! Filesystem discovery and field extraction for the phanlog tracker.
//!
//! Pure filesystem-and-bytes work: glob the products tree, derive entity
//! identity from paths, probe raw archives for their embedded acquisition
//! date, and read sidecar and QC files. No database or HTTP dependencies.

mod dicom;
mod raw;
mod sidecar;

pub mod discover;
pub mod error;

pub use discover::discover;
pub use error::{Error, Result};
