//! Error taxonomy for document acquisition and crawl aggregation.
//!
//! Field-level parsing problems are deliberately not represented here;
//! they resolve to default values inside the extractors.

use thiserror::Error;

/// Errors that can escape a single document acquisition.
///
/// The fetcher never retries; retry is an aggregation-layer policy.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The caller cancelled the request while it was still waiting for
    /// admission (rate limiter or permit pool).
    #[error("fetch of {url} cancelled while waiting for admission")]
    Cancelled { url: String },

    /// Connection or I/O level failure.
    #[error("transport failure fetching {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200 OK.
    #[error("unexpected HTTP status {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    /// The response body could not be parsed into a document tree.
    #[error("malformed document body from {url}: {reason}")]
    Parse { url: String, reason: String },
}

impl FetchError {
    pub(crate) fn cancelled(url: &str) -> Self {
        Self::Cancelled {
            url: url.to_owned(),
        }
    }

    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_owned(),
            source,
        }
    }

    /// The HTTP status code, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors reported by the crawler and fan-out aggregator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Page 1 of the ledger carried no prediction records.
    #[error("no predictions found")]
    NoPredictions,

    /// Page 1 carried a last-page link that could not be read.
    #[error("unable to determine the prediction page count")]
    UnknownPageCount,

    /// A detail-page task panicked or was torn down by the runtime.
    #[error("detail page task failed to complete")]
    Task(#[source] tokio::task::JoinError),
}
