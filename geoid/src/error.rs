//! Error types for the geoid library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or querying a geoid grid.
#[derive(Error, Debug)]
pub enum GeoidError {
    /// IO error when reading or writing grid data.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unexpected structure in ASCII or binary grid data.
    #[error("Invalid grid data: {reason}")]
    Format { reason: String },

    /// Longitude and latitude inputs of a batch query differ in length.
    #[error("Mismatched batch input: {lngs} longitudes vs {lats} latitudes")]
    Shape { lngs: usize, lats: usize },

    /// File extension does not identify a known grid format.
    #[error("Cannot detect grid format of {path} (expected .asc or .bin)")]
    UnsupportedFormat { path: PathBuf },

    /// The configured model file does not exist.
    #[error("Geoid model not found: {path}")]
    FileNotFound { path: PathBuf },
}

impl GeoidError {
    /// Shorthand for a [`GeoidError::Format`] with the given reason.
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        GeoidError::Format {
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`GeoidError`].
pub type Result<T> = std::result::Result<T, GeoidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeoidError::format("line 3: expected 1601 values, found 1600");
        assert!(err.to_string().contains("line 3"));

        let err = GeoidError::Shape { lngs: 3, lats: 2 };
        let msg = err.to_string();
        assert!(msg.contains('3') && msg.contains('2'));

        let err = GeoidError::UnsupportedFormat {
            path: PathBuf::from("model.txt"),
        };
        assert!(err.to_string().contains("model.txt"));

        let err = GeoidError::FileNotFound {
            path: PathBuf::from("gsigeo2011_ver2_2.bin"),
        };
        assert!(err.to_string().contains("gsigeo2011_ver2_2.bin"));
    }
}
