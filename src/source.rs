//! Ledger source: pagination crawler and per-prediction fan-out.
//!
//! `PredictionSource` drives the fetcher across list pages sequentially
//! and across detail pages concurrently. Physical throttling lives in the
//! fetcher; this layer only decides what to fetch, how to retry, and how
//! to merge.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::extract;
use crate::fetch::HtmlFetcher;
use crate::model::{ListPageInfo, PredictionResponse, PredictionSummary};
use crate::query::{find_all, TreeQuery};

/// Total attempts each detail-page task makes before failing the aggregate.
const DETAIL_FETCH_ATTEMPTS: u32 = 3;

/// How the fan-out barrier treats a task that has exhausted its retries.
///
/// Either way the aggregate operation fails with the first terminal error
/// and returns no partial results; the policies differ only in what
/// happens to sibling tasks still running at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    /// Abort the remaining tasks and return the error immediately.
    #[default]
    FailFast,
    /// Let every sibling run to completion before returning the error.
    Drain,
}

/// A PredictionBook-style ledger reachable over HTTP.
pub struct PredictionSource {
    fetcher: Arc<dyn HtmlFetcher>,
    base_url: String,
    join_policy: JoinPolicy,
}

impl PredictionSource {
    pub fn new(fetcher: Arc<dyn HtmlFetcher>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_owned(),
            join_policy: JoinPolicy::default(),
        }
    }

    pub fn with_join_policy(mut self, policy: JoinPolicy) -> Self {
        self.join_policy = policy;
        self
    }

    /// The most recently created prediction on the ledger.
    pub async fn latest(
        &self,
        cancel: &CancellationToken,
    ) -> Result<PredictionSummary, SourceError> {
        let (summaries, _) = self.list_page(cancel, 1).await?;
        summaries
            .into_iter()
            .next()
            .ok_or(SourceError::NoPredictions)
    }

    /// Number of list pages the ledger currently spans.
    pub async fn page_count(&self, cancel: &CancellationToken) -> Result<u64, SourceError> {
        let (_, info) = self.list_page(cancel, 1).await?;
        if info.last_page == 0 {
            return Err(SourceError::UnknownPageCount);
        }
        Ok(info.last_page)
    }

    /// Fetch one list page and extract its records and pagination info.
    pub async fn list_page(
        &self,
        cancel: &CancellationToken,
        index: u64,
    ) -> Result<(Vec<PredictionSummary>, ListPageInfo), SourceError> {
        let url = format!("{}/predictions/page/{index}", self.base_url);
        let html = self.fetcher.fetch_html(cancel, &url).await?;
        let root = html.tree.root();

        let summaries: Vec<PredictionSummary> = find_all(root, &TreeQuery::class("prediction"))
            .into_iter()
            .map(extract::summary)
            .collect();
        let info = extract::page_info(root, index);

        debug!(index, records = summaries.len(), last_page = info.last_page, "read list page");
        Ok((summaries, info))
    }

    /// Crawl every list page and return all predictions, sorted by id with
    /// duplicates collapsed.
    ///
    /// Pages are visited strictly in increasing order, and the last-page
    /// number is re-read from every page because the live site can gain
    /// pages mid-crawl. Any page failure aborts the whole crawl.
    pub async fn all_predictions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<PredictionSummary>, SourceError> {
        info!(base_url = %self.base_url, "starting full prediction crawl");

        let mut predictions = Vec::new();
        let mut current = 1;
        loop {
            let (mut page, info) = self.list_page(cancel, current).await?;
            predictions.append(&mut page);
            if current >= info.last_page {
                break;
            }
            current += 1;
        }

        let predictions = finish_crawl(predictions);
        info!(pages = current, predictions = predictions.len(), "finished full crawl");
        Ok(predictions)
    }

    /// Crawl list pages until a record created before `cutoff` appears.
    ///
    /// Pages list records newest-first, so the first too-old record ends
    /// the crawl without visiting older pages; that record and everything
    /// after it are discarded.
    pub async fn all_predictions_since(
        &self,
        cancel: &CancellationToken,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PredictionSummary>, SourceError> {
        info!(base_url = %self.base_url, %cutoff, "starting cutoff prediction crawl");

        let mut predictions = Vec::new();
        let mut current = 1;
        'crawl: loop {
            let (page, info) = self.list_page(cancel, current).await?;
            for summary in page {
                if summary.created < cutoff {
                    break 'crawl;
                }
                predictions.push(summary);
            }
            if current >= info.last_page {
                break;
            }
            current += 1;
        }

        let predictions = finish_crawl(predictions);
        info!(pages = current, predictions = predictions.len(), "finished cutoff crawl");
        Ok(predictions)
    }

    /// Fetch one prediction's detail page and extract its responses.
    pub async fn prediction_responses(
        &self,
        cancel: &CancellationToken,
        prediction: i64,
    ) -> Result<Vec<PredictionResponse>, SourceError> {
        let (_, responses) =
            fetch_detail(&self.fetcher, &self.base_url, cancel, prediction, false).await?;
        Ok(responses)
    }

    /// Collect the responses of every given prediction concurrently.
    ///
    /// Returns all responses sorted by (prediction id, time); the order
    /// tasks happen to finish in never shows through.
    pub async fn all_prediction_responses(
        &self,
        cancel: &CancellationToken,
        summaries: &[PredictionSummary],
    ) -> Result<Vec<PredictionResponse>, SourceError> {
        let (_, responses) = self.fan_out(cancel, summaries, false).await?;
        Ok(responses)
    }

    /// Like [`all_prediction_responses`](Self::all_prediction_responses),
    /// but also returns a corrected summary read from each detail page,
    /// sorted by id.
    pub async fn all_prediction_details(
        &self,
        cancel: &CancellationToken,
        summaries: &[PredictionSummary],
    ) -> Result<(Vec<PredictionSummary>, Vec<PredictionResponse>), SourceError> {
        self.fan_out(cancel, summaries, true).await
    }

    /// One task per summary; logical fan-out is unbounded here and the
    /// fetcher's limiter/permit pool does all physical throttling.
    async fn fan_out(
        &self,
        cancel: &CancellationToken,
        summaries: &[PredictionSummary],
        with_summaries: bool,
    ) -> Result<(Vec<PredictionSummary>, Vec<PredictionResponse>), SourceError> {
        info!(predictions = summaries.len(), "collecting detail pages");

        let mut tasks: JoinSet<DetailResult> = JoinSet::new();
        for summary in summaries {
            let fetcher = Arc::clone(&self.fetcher);
            let base_url = self.base_url.clone();
            let cancel = cancel.clone();
            let id = summary.id;
            tasks.spawn(async move {
                let mut attempt = 0;
                loop {
                    attempt += 1;
                    match fetch_detail(&fetcher, &base_url, &cancel, id, with_summaries).await {
                        Ok(result) => break Ok(result),
                        Err(err) if attempt >= DETAIL_FETCH_ATTEMPTS => break Err(err),
                        Err(err) => {
                            warn!(prediction = id, attempt, error = %err, "detail fetch failed, retrying");
                        }
                    }
                }
            });
        }

        let mut corrected = Vec::new();
        let mut responses = Vec::new();
        let mut first_error: Option<SourceError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((summary, mut batch))) => {
                    if first_error.is_none() {
                        corrected.extend(summary);
                        responses.append(&mut batch);
                        debug!(collected = responses.len(), "merged detail page batch");
                    }
                }
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        warn!(error = %err, "detail task exhausted its attempts");
                        first_error = Some(err);
                        if self.join_policy == JoinPolicy::FailFast {
                            tasks.abort_all();
                        }
                    }
                }
                Err(join_err) => {
                    // Tasks aborted by the fail-fast path land here too.
                    if join_err.is_cancelled() {
                        continue;
                    }
                    if first_error.is_none() {
                        first_error = Some(SourceError::Task(join_err));
                        if self.join_policy == JoinPolicy::FailFast {
                            tasks.abort_all();
                        }
                    }
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        corrected.sort_by_key(|summary| summary.id);
        responses.sort_by(|a, b| (a.prediction, a.time).cmp(&(b.prediction, b.time)));
        info!(responses = responses.len(), "finished collecting detail pages");
        Ok((corrected, responses))
    }
}

type DetailResult =
    Result<(Option<PredictionSummary>, Vec<PredictionResponse>), SourceError>;

async fn fetch_detail(
    fetcher: &Arc<dyn HtmlFetcher>,
    base_url: &str,
    cancel: &CancellationToken,
    prediction: i64,
    with_summary: bool,
) -> DetailResult {
    let url = format!("{base_url}/predictions/{prediction}");
    let html = fetcher.fetch_html(cancel, &url).await?;
    let root = html.tree.root();

    let responses: Vec<PredictionResponse> = find_all(root, &TreeQuery::class("response"))
        .into_iter()
        .map(|node| extract::response(node, prediction))
        .collect();
    let summary = with_summary.then(|| extract::detail_summary(prediction, root));

    Ok((summary, responses))
}

/// Sort by id and collapse duplicates. Duplicates occur when records
/// inserted mid-crawl shift page boundaries underneath us.
fn finish_crawl(mut predictions: Vec<PredictionSummary>) -> Vec<PredictionSummary> {
    predictions.sort_by_key(|summary| summary.id);
    predictions.dedup_by_key(|summary| summary.id);
    predictions
}
