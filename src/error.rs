//! Error types for ScaleLib
//!
//! This module defines the error kinds surfaced by the node model, the
//! partitioning helpers and the singleton lock. Host name resolution failures
//! are deliberately absent: they are logged and degraded, never returned.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ScaleLib operations
#[derive(Error, Debug)]
pub enum ScaleError {
    /// Another process already holds the singleton lock
    #[error("Could not acquire lock ({}) - more than one instance is running (pid {pid}).", path.display())]
    MultipleInstances {
        /// Path of the contended lock file
        path: PathBuf,
        /// Content of the lock file, i.e. the holder's recorded process id
        pid: String,
    },

    /// A key did not map to exactly one value
    #[error("Could not partition list into single values - key={key} values={values:?}")]
    PartitionCardinality {
        /// Offending key, rendered with `Debug`
        key: String,
        /// Every value that shares the key, rendered with `Debug`
        values: Vec<String>,
    },

    /// Scheduler nodes require a non-empty hostname
    #[error("Invalid hostname: {0:?}")]
    InvalidHostname(String),

    /// I/O error on a file the crate owns
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScaleError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a lock contention error
    pub fn multiple_instances(path: impl Into<PathBuf>, pid: impl Into<String>) -> Self {
        Self::MultipleInstances {
            path: path.into(),
            pid: pid.into(),
        }
    }

    /// Check if this error means another instance holds the lock
    pub fn is_multiple_instances(&self) -> bool {
        matches!(self, Self::MultipleInstances { .. })
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::MultipleInstances { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for ScaleLib operations
pub type Result<T> = std::result::Result<T, ScaleError>;

impl From<std::io::Error> for ScaleError {
    fn from(err: std::io::Error) -> Self {
        ScaleError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ScaleError {
    fn from(err: serde_json::Error) -> Self {
        ScaleError::Config(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| ScaleError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_instances_message() {
        let err = ScaleError::multiple_instances("/tmp/scalelib.lock", "4242");
        assert!(err.is_multiple_instances());
        assert_eq!(
            err.to_string(),
            "Could not acquire lock (/tmp/scalelib.lock) - more than one instance is running (pid 4242)."
        );
        assert_eq!(err.path().unwrap(), &PathBuf::from("/tmp/scalelib.lock"));
    }

    #[test]
    fn test_io_error_with_path() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let err = result.with_path("/test/path").unwrap_err();
        assert!(!err.is_multiple_instances());
        assert_eq!(err.path().unwrap(), &PathBuf::from("/test/path"));
    }

    #[test]
    fn test_partition_error_names_key_and_values() {
        let err = ScaleError::PartitionCardinality {
            key: "\"b1\"".to_string(),
            values: vec!["\"n1\"".to_string(), "\"n2\"".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("key=\"b1\""));
        assert!(message.contains("n1"));
        assert!(message.contains("n2"));
        assert!(err.path().is_none());
    }

    #[test]
    fn test_serde_error_becomes_config_error() {
        let err: ScaleError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ScaleError::Config(_)));
    }
}
