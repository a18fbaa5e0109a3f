//! Error types for query compilation, signing, and service calls

use thiserror::Error;

/// Errors reported by the library.
///
/// Compilation and signing only fail on malformed input; transport and
/// service failures are passed through from the HTTP layer untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// Region and service could not be derived from the request host
    #[error("Malformed host '{host}': expected <prefix>.<region>.<service>.amazonaws.com")]
    MalformedHost { host: String },

    /// A filter or facet value has a shape the compiler cannot render
    #[error("Unsupported value type for '{field}': {kind}")]
    UnsupportedValueType { field: String, kind: &'static str },

    /// Filter input nests deeper than the compiler accepts
    #[error("Filter nesting exceeds maximum depth of {max}")]
    FilterTooDeep { max: usize },

    #[error("Search domain is not configured")]
    MissingSearchDomain,

    #[error("Missing credential: {variable} is not set")]
    MissingCredential { variable: &'static str },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Network-level failure from the transport
    #[error("Transport failure: {message}")]
    TransportFailure { message: String },

    /// The search endpoint answered with a non-200 status
    #[error("Search failed with {status}: {message} ({url})")]
    SearchFailed {
        status: u16,
        message: String,
        url: String,
    },

    /// The document endpoint answered with a non-200 status
    #[error("Document update failed with {status}: {message}")]
    DocumentUpdateFailed { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn unsupported(field: impl Into<String>, kind: &'static str) -> Self {
        Self::UnsupportedValueType {
            field: field.into(),
            kind,
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportFailure {
            message: msg.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
