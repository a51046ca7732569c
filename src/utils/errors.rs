//! Error type shared by every stage of a merge run.

use std::{io, path::Path};
use thiserror::Error;

/// Result type alias for jqmerge operations
pub type Result<T> = std::result::Result<T, MergeError>;

#[derive(Error, Debug)]
pub enum MergeError {
    /// User-supplied settings that cannot produce a sensible merge
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed metaheaders / column header
    #[error("Invalid VCF header in {path}: {reason}")]
    InvalidHeader { path: String, reason: String },

    /// A data row that cannot be parsed
    #[error("Invalid VCF record in {path} at line {line}: {reason}")]
    InvalidRecord {
        path: String,
        line: usize,
        reason: String,
    },

    /// Inputs that are individually valid but cannot be merged together
    #[error("Incompatible inputs: {0}")]
    IncompatibleInputs(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl MergeError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        MergeError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn header(path: &Path, reason: impl Into<String>) -> Self {
        MergeError::InvalidHeader {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    pub fn record(path: &Path, line: usize, reason: impl Into<String>) -> Self {
        MergeError::InvalidRecord {
            path: path.display().to_string(),
            line,
            reason: reason.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, MergeError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_record_mentions_line() {
        let error = MergeError::record(Path::new("/data/p1.mutect.vcf"), 12, "expected 10 columns");
        let msg = format!("{error}");
        assert!(msg.contains("/data/p1.mutect.vcf"));
        assert!(msg.contains("line 12"));
        assert!(msg.contains("expected 10 columns"));
    }

    #[test]
    fn test_io_error_keeps_context() {
        let error = MergeError::io(
            "Failed to open out.vcf",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(format!("{error}"), "Failed to open out.vcf: denied");
        assert!(!error.is_config());
    }

    #[test]
    fn test_config_error() {
        let error = MergeError::Config("no FORMAT tags retained".to_string());
        assert!(error.is_config());
        assert!(format!("{error}").starts_with("Configuration error"));
    }
}
