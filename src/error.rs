//! Error types for ns-filter
//!
//! This module defines the error types used throughout the application.
//! Every [`ProcessError`] is terminal for the invocation that raised it.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Pattern compilation error
#[derive(Error, Debug)]
#[error("Could not compile provided expression '{pattern}': {source}")]
pub struct PatternError {
    /// Pattern text as supplied by the caller
    pub pattern: String,
    /// Underlying regex diagnostic
    #[source]
    pub source: regex::Error,
}

/// A single problem found while validating a configuration option
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionProblem {
    /// Required option absent
    #[error("required option '{key}' is not provided")]
    Missing { key: String },

    /// Option present with the wrong value type
    #[error("option '{key}' must be a {expected}, got {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Option present but empty
    #[error("option '{key}' must not be empty")]
    Empty { key: String },

    /// Option value outside the accepted set
    #[error("option '{key}' has invalid value '{value}', expected one of: {allowed}")]
    InvalidValue {
        key: String,
        value: String,
        allowed: String,
    },
}

impl OptionProblem {
    /// Key of the offending option
    pub fn key(&self) -> &str {
        match self {
            OptionProblem::Missing { key }
            | OptionProblem::WrongType { key, .. }
            | OptionProblem::Empty { key }
            | OptionProblem::InvalidValue { key, .. } => key,
        }
    }
}

/// Configuration rejected by the policy
///
/// Lists every offending option, not only the first one found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    /// All problems found
    pub problems: Vec<OptionProblem>,
}

impl ConfigurationError {
    /// Keys of all offending options, in policy order
    pub fn keys(&self) -> Vec<&str> {
        self.problems.iter().map(OptionProblem::key).collect()
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid configuration: ")?;
        for (i, problem) in self.problems.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", problem)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationError {}

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// No codec registered for the content type
    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),

    /// JSON input could not be parsed as a metric batch
    #[error("JSON decode error: {0}")]
    JsonDecode(#[source] serde_json::Error),

    /// Batch could not be written as JSON
    #[error("JSON encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),

    /// MessagePack input could not be parsed as a metric batch
    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[source] rmp_serde::decode::Error),

    /// Batch could not be written as MessagePack
    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[source] rmp_serde::encode::Error),
}

/// Error kinds surfaced to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or mistyped options
    Configuration,
    /// Pattern is not a valid regular expression
    PatternCompilation,
    /// Input content could not be decoded
    Decoding,
    /// Output content could not be encoded
    Encoding,
}

impl ErrorKind {
    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::PatternCompilation => "pattern_compilation",
            ErrorKind::Decoding => "decoding",
            ErrorKind::Encoding => "encoding",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processor invocation error
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Configuration error
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Pattern compilation error
    #[error(transparent)]
    PatternCompilation(#[from] PatternError),

    /// Input could not be decoded; nothing was transformed
    #[error("Error decoding '{content_type}' content: {source}")]
    Decoding {
        content_type: String,
        #[source]
        source: CodecError,
    },

    /// Output could not be encoded; the transformed batch was discarded
    #[error("Error encoding '{content_type}' content: {source}")]
    Encoding {
        content_type: String,
        #[source]
        source: CodecError,
    },
}

impl ProcessError {
    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::Configuration(_) => ErrorKind::Configuration,
            ProcessError::PatternCompilation(_) => ErrorKind::PatternCompilation,
            ProcessError::Decoding { .. } => ErrorKind::Decoding,
            ProcessError::Encoding { .. } => ErrorKind::Encoding,
        }
    }

    /// HTTP status used by the server adapter
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProcessError::Configuration(_) => StatusCode::BAD_REQUEST,
            ProcessError::PatternCompilation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ProcessError::Decoding {
                source: CodecError::UnsupportedContentType(_),
                ..
            } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ProcessError::Decoding { .. } => StatusCode::BAD_REQUEST,
            ProcessError::Encoding { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body returned by the server adapter
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error kind
    pub kind: ErrorKind,
    /// Human readable message
    pub error: String,
}

impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            kind: self.kind(),
            error: self.to_string(),
        };

        tracing::warn!(status = %status, kind = %body.kind, error = %body.error, "Process request failed");

        (status, Json(body)).into_response()
    }
}

/// Result type alias for processor invocations
pub type ProcessResult<T> = Result<T, ProcessError>;
