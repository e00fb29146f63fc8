//! Domain records extracted from the ledger.
//!
//! Entities are immutable once extracted; the source merges and dedups
//! them but never edits fields.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Resolution state of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Outcome {
    #[default]
    Unknown,
    Right,
    Wrong,
}

/// One prediction as listed on a ledger page.
///
/// Fields the page does not carry (or carries malformed) hold their
/// documented defaults; a bad field never fails the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub id: i64,
    pub title: String,
    pub creator: String,
    pub created: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    /// Mean assigned confidence as a fraction in [0, 1]; 0.0 if unparsed.
    pub mean_confidence: f64,
    /// Number of wagers; the site omits the count for a single wager.
    pub wager_count: i64,
    pub outcome: Outcome,
}

impl Default for PredictionSummary {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            creator: String::new(),
            created: DateTime::UNIX_EPOCH,
            deadline: DateTime::UNIX_EPOCH,
            mean_confidence: 0.0,
            wager_count: 1,
            outcome: Outcome::Unknown,
        }
    }
}

/// One user's response to a prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    /// Id of the prediction this response belongs to. A foreign reference;
    /// not validated at extraction time.
    pub prediction: i64,
    pub time: DateTime<Utc>,
    pub user: String,
    /// Assigned confidence as a fraction in [0, 1]. `f64::NAN` means the
    /// response is a comment without a numeric assignment; check with
    /// `is_nan`, never with equality.
    pub confidence: f64,
    pub comment: String,
}

/// Pagination facts read off a single list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListPageInfo {
    /// 1-based index of the page this was read from.
    pub index: u64,
    /// Index of the final page. Equals `index` when the page carries no
    /// "go to last page" link, which marks it as the terminal page.
    pub last_page: u64,
}
