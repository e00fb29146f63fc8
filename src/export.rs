//! CSV formatting for extracted records.
//!
//! Rows are written in exactly the order handed in; the crawler already
//! established the final ordering and the exporter must not disturb it.

use std::borrow::Cow;
use std::io::{self, Write};

use crate::model::{PredictionResponse, PredictionSummary};

/// Write one CSV row per summary:
/// `id,created,deadline,mean_confidence,wager_count,outcome,creator,title`
/// with timestamps as unix seconds and the outcome as its numeric code.
pub fn write_summaries<W: Write>(
    mut out: W,
    summaries: &[PredictionSummary],
) -> io::Result<()> {
    for summary in summaries {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            summary.id,
            summary.created.timestamp(),
            summary.deadline.timestamp(),
            summary.mean_confidence,
            summary.wager_count,
            summary.outcome as i64,
            field(&summary.creator),
            field(&summary.title),
        )?;
    }
    Ok(())
}

/// Write one CSV row per response:
/// `prediction,time,confidence,user,comment`, with an empty confidence
/// column for comment-only responses.
pub fn write_responses<W: Write>(
    mut out: W,
    responses: &[PredictionResponse],
) -> io::Result<()> {
    for response in responses {
        let confidence = if response.confidence.is_nan() {
            String::new()
        } else {
            response.confidence.to_string()
        };
        writeln!(
            out,
            "{},{},{},{},{}",
            response.prediction,
            response.time.timestamp(),
            confidence,
            field(&response.user),
            field(&response.comment),
        )?;
    }
    Ok(())
}

/// Quote a free-text field when it would break the row.
fn field(raw: &str) -> Cow<'_, str> {
    if raw.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", raw.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Outcome;
    use chrono::{DateTime, TimeZone, Utc};

    #[test]
    fn summaries_export_in_the_given_order() {
        let summaries = vec![
            PredictionSummary {
                id: 7,
                title: "It will rain".to_owned(),
                creator: "alice".to_owned(),
                created: Utc.timestamp_opt(1_537_610_940, 0).unwrap(),
                deadline: Utc.timestamp_opt(1_546_300_800, 0).unwrap(),
                mean_confidence: 0.25,
                wager_count: 3,
                outcome: Outcome::Right,
            },
            PredictionSummary { id: 400, ..Default::default() },
        ];

        let mut out = Vec::new();
        write_summaries(&mut out, &summaries).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "7,1537610940,1546300800,0.25,3,1,alice,It will rain",
                "400,0,0,0,1,0,,",
            ],
        );
    }

    #[test]
    fn free_text_fields_are_quoted_when_needed() {
        assert_eq!(field("plain"), "plain");
        assert_eq!(field("a, b"), "\"a, b\"");
        assert_eq!(field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn comment_only_responses_export_an_empty_confidence() {
        let responses = vec![PredictionResponse {
            prediction: 9,
            time: DateTime::UNIX_EPOCH,
            user: "bob".to_owned(),
            confidence: f64::NAN,
            comment: "no idea".to_owned(),
        }];

        let mut out = Vec::new();
        write_responses(&mut out, &responses).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "9,0,,bob,no idea\n");
    }
}
