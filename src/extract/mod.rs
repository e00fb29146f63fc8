//! Pure record extractors.
//!
//! Each extractor maps an already-located subtree to a record value using
//! only the tree query engine. A field whose source text is missing or
//! malformed resolves to its default; nothing here ever returns an error,
//! so one bad field cannot sink the record or its siblings.

mod detail;
mod page_info;
mod response;
mod summary;

pub use detail::detail_summary;
pub use page_info::page_info;
pub use response::response;
pub use summary::summary;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::model::Outcome;
use crate::query::{find_first, TreeNode, TreeQuery};

/// Text content of the first element carrying `class`, or empty.
pub(crate) fn class_text<N: TreeNode>(root: N, class: &str) -> String {
    find_first(root, &TreeQuery::class(class))
        .map(|node| node.text())
        .unwrap_or_default()
}

/// Timestamp from the `title` attribute of `node`, or the epoch default.
pub(crate) fn time_from_title_attr<N: TreeNode>(node: Option<N>) -> DateTime<Utc> {
    node.and_then(|n| n.attr("title").and_then(parse_site_time))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse the site's fixed `YYYY-MM-DD HH:MM:SS <zone-abbrev>` stamps.
///
/// Zone abbreviations are ambiguous, and the site serves UTC; the naive
/// part is therefore read as UTC whatever the trailing abbreviation says,
/// which is also what the original exporter effectively did.
pub(crate) fn parse_site_time(raw: &str) -> Option<DateTime<Utc>> {
    let (stamp, zone) = raw.trim().rsplit_once(' ')?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").ok()?;
    Some(naive.and_utc())
}

/// Outcome from the text of the first `outcome`-classed element.
pub(crate) fn outcome<N: TreeNode>(root: N) -> Outcome {
    match class_text(root, "outcome").trim() {
        "right" => Outcome::Right,
        "wrong" => Outcome::Wrong,
        _ => Outcome::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn site_times_parse_as_utc() {
        let parsed = parse_site_time("2018-10-11 09:36:38 UTC").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2018, 10, 11, 9, 36, 38).unwrap());
    }

    #[test]
    fn unknown_zone_abbreviations_still_read_as_utc() {
        let parsed = parse_site_time("2018-10-11 09:36:38 PDT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2018, 10, 11, 9, 36, 38).unwrap());
    }

    #[test]
    fn malformed_stamps_are_rejected() {
        assert!(parse_site_time("2018-10-11 09:36:38").is_none());
        assert!(parse_site_time("2018-13-99 09:36:38 UTC").is_none());
        assert!(parse_site_time("soon").is_none());
        assert!(parse_site_time("").is_none());
    }
}
