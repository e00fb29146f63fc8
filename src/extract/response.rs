//! Response extraction from prediction detail pages.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{class_text, time_from_title_attr};
use crate::model::PredictionResponse;
use crate::query::{find_first, TreeNode, TreeQuery};

static CONFIDENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)?)%").unwrap());

/// Map one `response`-classed subtree to a [`PredictionResponse`].
///
/// `prediction` is the id of the record the detail page belongs to; the
/// markup itself does not repeat it.
pub fn response<N: TreeNode>(node: N, prediction: i64) -> PredictionResponse {
    PredictionResponse {
        prediction,
        time: time_from_title_attr(find_first(node, &TreeQuery::class("date"))),
        user: class_text(node, "user"),
        comment: class_text(node, "comment"),
        confidence: confidence(node),
    }
}

/// Assigned confidence, or the NaN sentinel for comment-only responses.
fn confidence<N: TreeNode>(node: N) -> f64 {
    let text = class_text(node, "confidence");
    CONFIDENCE_RE
        .captures(text.trim())
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|percentage| percentage / 100.0)
        .unwrap_or(f64::NAN)
}
