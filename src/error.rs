//! Error types for the network, persistence, and configuration seams.
//!
//! Content problems (no title, not an article, malformed feed) are not
//! errors here: they are handled where they occur and logged with a reason.

use thiserror::Error;

/// A request that produced no response at all.
///
/// HTTP error statuses are not `FetchError`s; the caller inspects the status.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Worth retrying: the request may succeed if sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }

    /// Short code used in skip-reason logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "InvalidUrl",
            Self::Timeout(_) => "Timeout",
            Self::Connect(_) => "ConnectionError",
            Self::Request(_) => "RequestError",
            Self::Body(_) => "BodyError",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else if e.is_builder() {
            Self::InvalidUrl(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Failure reading or writing the persisted dataset.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("no identifiers left after {max_id}")]
    IdsExhausted { max_id: u64 },
}

/// Failure loading a site file.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot read site file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid site file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("site file lists no sites")]
    Empty,
}
