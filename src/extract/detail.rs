//! Corrected summary extraction from a prediction's own detail page.
//!
//! Detail pages carry fresher data than the listing (every response is
//! present, the title is unabridged), so the fan-out aggregator can use
//! this to replace the listing summary.

use super::{outcome, response, time_from_title_attr};
use crate::model::PredictionSummary;
use crate::query::{find_all, find_first, TreeNode, TreeQuery};

/// Build a [`PredictionSummary`] from a detail page root.
///
/// `id` comes from the caller; the page address held it, not the markup.
pub fn detail_summary<N: TreeNode>(id: i64, root: N) -> PredictionSummary {
    let responses: Vec<_> = find_all(root, &TreeQuery::class("response"))
        .into_iter()
        .map(|node| response(node, id))
        .collect();

    let assignments: Vec<f64> = responses
        .iter()
        .map(|r| r.confidence)
        .filter(|confidence| !confidence.is_nan())
        .collect();
    let mean_confidence = if assignments.is_empty() {
        0.0
    } else {
        assignments.iter().sum::<f64>() / assignments.len() as f64
    };

    // The byline paragraph under the content container holds the creator
    // link and the created/deadline stamps, in that order.
    let byline = find_first(root, &TreeQuery::new().attr("id", "content"))
        .and_then(|content| find_first(content, &TreeQuery::new().tag("p")));
    let dates = byline
        .map(|p| find_all(p, &TreeQuery::class("date")))
        .unwrap_or_default();

    PredictionSummary {
        id,
        title: find_first(root, &TreeQuery::new().tag("h1"))
            .map(|h1| h1.text().trim().to_owned())
            .unwrap_or_default(),
        creator: byline
            .and_then(|p| find_first(p, &TreeQuery::new().tag("a").attr("class", "user")))
            .map(|link| link.text())
            .unwrap_or_default(),
        created: time_from_title_attr(dates.first().copied()),
        deadline: time_from_title_attr(dates.last().copied()),
        mean_confidence,
        wager_count: responses.len() as i64,
        outcome: outcome(root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Outcome;
    use chrono::{TimeZone, Utc};
    use scraper::Html;

    const DETAIL_PAGE: &str = r#"
        <div id="content">
          <h1> It will rain tomorrow </h1>
          <p>
            <a class="user" href="/users/alice">alice</a> made this prediction
            <span class="date" title="2018-09-22 10:09:00 UTC">a month ago</span>;
            known on <span class="date" title="2019-01-01 00:00:00 UTC">Jan 1st</span>
          </p>
          <span class="outcome">wrong</span>
          <ul>
            <li class="response"><a class="user">bob</a><span class="confidence">60%</span>
              <span class="date" title="2018-10-11 09:36:38 UTC">then</span></li>
            <li class="response"><a class="user">carol</a><span class="confidence">20%</span>
              <span class="date" title="2018-10-12 09:36:38 UTC">then</span></li>
            <li class="response"><a class="user">dave</a><span class="comment">no idea</span>
              <span class="date" title="2018-10-13 09:36:38 UTC">then</span></li>
          </ul>
        </div>"#;

    #[test]
    fn builds_a_corrected_summary_from_the_detail_page() {
        let html = Html::parse_document(DETAIL_PAGE);
        let record = detail_summary(193436, html.tree.root());

        assert_eq!(record.id, 193436);
        assert_eq!(record.title, "It will rain tomorrow");
        assert_eq!(record.creator, "alice");
        assert_eq!(
            record.created,
            Utc.with_ymd_and_hms(2018, 9, 22, 10, 9, 0).unwrap()
        );
        assert_eq!(
            record.deadline,
            Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap()
        );
        // Comment-only responses count as wagers but not towards the mean.
        assert_eq!(record.wager_count, 3);
        assert!((record.mean_confidence - 0.40).abs() < 1e-5);
        assert_eq!(record.outcome, Outcome::Wrong);
    }

    #[test]
    fn a_page_without_responses_has_no_mean_confidence() {
        let html = Html::parse_document(
            r#"<div id="content"><h1>Quiet one</h1><p><a class="user">alice</a></p></div>"#,
        );
        let record = detail_summary(5, html.tree.root());

        assert_eq!(record.wager_count, 0);
        assert_eq!(record.mean_confidence, 0.0);
        assert_eq!(record.created, chrono::DateTime::UNIX_EPOCH);
    }
}
