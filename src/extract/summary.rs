//! List-page prediction summary extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{class_text, outcome, time_from_title_attr};
use crate::model::PredictionSummary;
use crate::query::{find_first, TreeNode, TreeQuery};

static MEAN_CONFIDENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)?)%\s+confidence").unwrap());
static WAGER_COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)\s+wagers").unwrap());

/// Map one `prediction`-classed subtree to a [`PredictionSummary`].
pub fn summary<N: TreeNode>(node: N) -> PredictionSummary {
    let (title, id) = title_and_id(node);

    PredictionSummary {
        id,
        title,
        creator: creator(node),
        created: time_from_title_attr(find_first(node, &TreeQuery::class("created_at"))),
        deadline: deadline(node),
        mean_confidence: mean_confidence(node),
        wager_count: wager_count(node),
        outcome: outcome(node),
    }
}

/// Title text plus the numeric id taken from the trailing path segment of
/// the title link's address.
fn title_and_id<N: TreeNode>(node: N) -> (String, i64) {
    let Some(link) = find_first(node, &TreeQuery::class("title"))
        .and_then(|title| find_first(title, &TreeQuery::new().tag("a")))
    else {
        return (String::new(), 0);
    };

    let id = link
        .attr("href")
        .and_then(|href| href.rsplit('/').next())
        .and_then(|segment| segment.parse::<i64>().ok())
        .unwrap_or(0);

    (link.text(), id)
}

/// The first text fragment directly under the `creator`-classed element.
fn creator<N: TreeNode>(node: N) -> String {
    find_first(node, &TreeQuery::class("creator"))
        .and_then(|element| element.child_nodes().into_iter().next())
        .and_then(|child| child.own_text().map(str::to_owned))
        .unwrap_or_default()
}

fn deadline<N: TreeNode>(node: N) -> chrono::DateTime<chrono::Utc> {
    let date = find_first(node, &TreeQuery::class("deadline"))
        .and_then(|deadline| find_first(deadline, &TreeQuery::class("date")));
    time_from_title_attr(date)
}

fn mean_confidence<N: TreeNode>(node: N) -> f64 {
    let text = class_text(node, "mean_confidence");
    MEAN_CONFIDENCE_RE
        .captures(text.trim())
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|percentage| percentage / 100.0)
        .unwrap_or(0.0)
}

fn wager_count<N: TreeNode>(node: N) -> i64 {
    let text = class_text(node, "wagers_count");
    WAGER_COUNT_RE
        .captures(text.trim())
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Outcome;
    use chrono::{DateTime, TimeZone, Utc};
    use scraper::Html;

    const PREDICTION: &str = r#"
        <li class="prediction">
          <span class="title"><a href="/predictions/193473">It will rain tomorrow</a></span>
          by <span class="creator">alice</span>
          <span class="created_at date" title="2018-09-22 10:09:00 UTC">a month ago</span>
          <span class="deadline"><span class="date" title="2019-01-01 00:00:00 UTC">in 3 months</span></span>
          <span class="mean_confidence">25.00% confidence</span>
          <span class="wagers_count">3 wagers</span>
          <span class="outcome">right</span>
        </li>"#;

    fn extract(fragment: &str) -> PredictionSummary {
        let html = Html::parse_fragment(fragment);
        summary(html.tree.root())
    }

    #[test]
    fn extracts_every_field_from_a_complete_record() {
        let record = extract(PREDICTION);

        assert_eq!(record.id, 193473);
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
        assert!((record.mean_confidence - 0.25).abs() < 1e-5);
        assert_eq!(record.wager_count, 3);
        assert_eq!(record.outcome, Outcome::Right);
    }

    #[test]
    fn missing_or_malformed_fields_fall_back_to_defaults() {
        let record = extract(
            r#"<li class="prediction">
                 <span class="title"><a href="/predictions/not-a-number">Odd one</a></span>
                 <span class="created_at" title="someday">?</span>
                 <span class="mean_confidence">confidence unknown</span>
                 <span class="outcome">pending</span>
               </li>"#,
        );

        assert_eq!(record.id, 0);
        assert_eq!(record.title, "Odd one");
        assert_eq!(record.creator, "");
        assert_eq!(record.created, DateTime::UNIX_EPOCH);
        assert_eq!(record.deadline, DateTime::UNIX_EPOCH);
        assert_eq!(record.mean_confidence, 0.0);
        assert_eq!(record.wager_count, 1);
        assert_eq!(record.outcome, Outcome::Unknown);
    }

    #[test]
    fn singular_wager_text_defaults_to_one() {
        let record = extract(
            r#"<li class="prediction"><span class="wagers_count">1 wager</span></li>"#,
        );
        assert_eq!(record.wager_count, 1);
    }

    #[test]
    fn creator_takes_only_the_leading_text_fragment() {
        let record = extract(
            r#"<li class="prediction">
                 <span class="creator">bob<span class="flair">(admin)</span></span>
               </li>"#,
        );
        assert_eq!(record.creator, "bob");
    }
}
