//! Extraction of prediction records and responses from a paginated,
//! web-published forecasting ledger.
//!
//! The crate is organised around three pieces:
//! - [`fetch`]: a rate-limited, bounded-concurrency HTML acquirer;
//! - [`query`]: a generic tree query engine over parsed documents;
//! - [`source`]: the pagination crawler and per-prediction fan-out
//!   aggregator that drive the acquirer and merge results.
//!
//! Record-shaped extraction lives in [`extract`], and [`export`] formats
//! the resulting ordered sequences for the CLI binary.

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod query;
pub mod source;

pub use config::HttpFetcherConfig;
pub use error::{FetchError, SourceError};
pub use fetch::{HtmlFetcher, HttpFetcher};
pub use model::{ListPageInfo, Outcome, PredictionResponse, PredictionSummary};
pub use source::{JoinPolicy, PredictionSource};
