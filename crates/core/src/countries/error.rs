//! Error types for the country catalog.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the country catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("Failed to read country catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not a JSON array of countries.
    #[error("Failed to parse country catalog {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// An entry carries a code that cannot be used in an attribute filter.
    #[error("Invalid country code in catalog: {code:?}")]
    InvalidCode { code: String },
}
