//! Error types for the upstream API clients.

/// Result type for upstream client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures a single upstream call can end in.
///
/// Calls are attempted exactly once; callers decide what to do with the failure.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Credentials or target identifiers are missing from the configuration.
    #[error("{0}")]
    NotConfigured(&'static str),

    /// Upstream answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The per-request ceiling elapsed before the upstream answered.
    #[error("Request timed out")]
    Timeout,

    /// Connection-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream body was not the JSON we expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A path segment that cannot be sent as one literal segment.
    #[error("Invalid path segment: {0:?}")]
    InvalidPath(String),

    /// A client could not be built from its configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Build an API error from an upstream status code and response body.
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Upstream status code, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}
