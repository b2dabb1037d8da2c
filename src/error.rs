//! Error types for dataset loading and aggregation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The dataset could not be obtained or parsed.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Malformed JSON rows in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported dataset format '{extension}' for file {path} (expected .csv or .json)")]
    UnsupportedFormat { path: PathBuf, extension: String },
    #[error("Dataset {path} is not tabular: {message}")]
    NotTabular { path: PathBuf, message: String },
    #[error("Dataset parsing task failed: {0}")]
    Task(String),
}

/// A mean or ratio was requested over nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Division undefined while computing {what}")]
    DivisionUndefined { what: &'static str },
}

impl AggregateError {
    pub(crate) fn undefined(what: &'static str) -> Self {
        AggregateError::DivisionUndefined { what }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LoadError::UnsupportedFormat {
            path: PathBuf::from("data.xlsx"),
            extension: "xlsx".to_string(),
        };
        assert!(err.to_string().contains("xlsx"));
        assert!(err.to_string().contains("data.xlsx"));

        let err = AggregateError::undefined("average efficiency");
        assert_eq!(
            err.to_string(),
            "Division undefined while computing average efficiency"
        );
    }
}
