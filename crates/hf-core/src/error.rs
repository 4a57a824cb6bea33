//! Error types for hf-rs

use thiserror::Error;

/// hf-rs error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Modifier `type` field is not one of the recognized kinds
    #[error("Unsupported modifier kind: '{kind}'")]
    UnsupportedModifierKind {
        /// The raw `type` string.
        kind: String,
    },

    /// Two registrations of one modifier name cannot act as one parameter
    #[error("Modifier conflict for '{name}': {reason}")]
    ModifierConflict {
        /// Modifier name.
        name: String,
        /// Human-readable cause (kind or shape disagreement).
        reason: String,
    },

    /// Two samples in one channel share a name
    #[error("Duplicate sample name '{sample}' in channel '{channel}'")]
    DuplicateSampleName {
        /// Channel name.
        channel: String,
        /// Repeated sample name.
        sample: String,
    },

    /// A per-bin vector disagrees with the channel's bin count
    #[error("Bin count mismatch in channel '{channel}' ({sample}): expected {expected}, got {got}")]
    BinCountMismatch {
        /// Channel name.
        channel: String,
        /// Sample (or modifier/observation) the vector belongs to.
        sample: String,
        /// Channel bin count.
        expected: usize,
        /// Offending length.
        got: usize,
    },

    /// Parameter vector length does not match the model
    #[error("Parameter count mismatch: expected {expected}, got {got}")]
    ParameterCountMismatch {
        /// Number of parameter slots in the model.
        expected: usize,
        /// Length of the supplied vector.
        got: usize,
    },

    /// Observed data, priors or parameters disagree in length
    #[error("Dimension mismatch ({what}): expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which pair of vectors disagreed.
        what: &'static str,
        /// Reference length.
        expected: usize,
        /// Offending length.
        got: usize,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let e = Error::DuplicateSampleName { channel: "SR".into(), sample: "signal".into() };
        assert_eq!(e.to_string(), "Duplicate sample name 'signal' in channel 'SR'");

        let e = Error::ParameterCountMismatch { expected: 3, got: 2 };
        assert!(e.to_string().contains("expected 3, got 2"));
    }

    #[test]
    fn test_json_error_converts() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let e: Error = err.into();
        assert!(matches!(e, Error::Json(_)));
    }
}
