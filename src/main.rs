//! CLI: crawl a prediction ledger and export its records as CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use prediction_extractor::{
    export, HttpFetcher, HttpFetcherConfig, PredictionSource,
};

#[derive(Parser, Debug)]
#[command(name = "prediction-extractor", version, about)]
struct Args {
    /// Base URL of the ledger instance to extract from
    #[arg(long, default_value = "https://predictionbook.com")]
    url: String,

    /// Export all predictions in CSV format to the given file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Only include predictions created at or after this RFC 3339 timestamp
    #[arg(long)]
    since: Option<DateTime<Utc>>,

    /// Also export every prediction's responses to the given file
    #[arg(long)]
    responses: Option<PathBuf>,

    /// Sustained request rate against the site
    #[arg(long, default_value_t = 1)]
    requests_per_second: u32,

    /// Requests the limiter may admit back-to-back
    #[arg(long, default_value_t = 2)]
    burst_size: u32,

    /// Maximum simultaneous in-flight requests
    #[arg(long, default_value_t = 2)]
    max_concurrent_requests: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    Url::parse(&args.url).with_context(|| format!("invalid base URL: {}", args.url))?;

    let Some(export_path) = args.export else {
        info!("nothing to do; pass --export to extract predictions");
        return Ok(());
    };

    let fetcher = HttpFetcher::new(HttpFetcherConfig {
        requests_per_second: args.requests_per_second,
        burst_size: args.burst_size,
        max_concurrent_requests: args.max_concurrent_requests,
        ..Default::default()
    })?;
    let source = PredictionSource::new(Arc::new(fetcher), args.url);

    // Ctrl-C aborts anything still waiting for admission.
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling crawl");
            canceller.cancel();
        }
    });

    let summaries = match args.since {
        Some(cutoff) => source.all_predictions_since(&cancel, cutoff).await?,
        None => source.all_predictions(&cancel).await?,
    };

    let out = File::create(&export_path)
        .with_context(|| format!("failed to create {}", export_path.display()))?;
    let mut writer = BufWriter::new(out);
    export::write_summaries(&mut writer, &summaries).context("failed to write predictions")?;
    writer.flush().context("failed to write predictions")?;
    info!(
        predictions = summaries.len(),
        path = %export_path.display(),
        "exported predictions"
    );

    if let Some(responses_path) = args.responses {
        let responses = source.all_prediction_responses(&cancel, &summaries).await?;
        let out = File::create(&responses_path)
            .with_context(|| format!("failed to create {}", responses_path.display()))?;
        let mut writer = BufWriter::new(out);
        export::write_responses(&mut writer, &responses).context("failed to write responses")?;
        writer.flush().context("failed to write responses")?;
        info!(
            responses = responses.len(),
            path = %responses_path.display(),
            "exported responses"
        );
    }

    Ok(())
}
