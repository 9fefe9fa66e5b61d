//! Typed errors surfaced by the library layers.
//!
//! The CLI and the page orchestrators wrap these into `anyhow::Error` with context.

use thiserror::Error;

/// Failure of a single HTTP request issued by [`crate::fetch::DataFetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status. The raw body is kept for diagnostics.
    #[error("GET {url} failed with HTTP {status}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    /// DNS, connect, TLS or body read failure.
    #[error("GET {url}: transport error")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The body was received but is not the expected JSON.
    #[error("GET {url}: invalid JSON body")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while building page elements.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("no element with id `{0}`")]
    MissingElement(String),
    #[error("selector has no option `{0}`")]
    UnknownOption(String),
    #[error("unknown fuel type `{0}`")]
    UnknownFuel(String),
}

/// Errors raised while loading region geometry.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("invalid GeoJSON")]
    GeoJson(#[from] geojson::Error),
    #[error("GeoJSON root is not a FeatureCollection")]
    NotAFeatureCollection,
}
