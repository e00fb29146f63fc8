//! Fetcher configuration, injected at construction.

/// Configuration for the rate-limited HTTP fetcher.
///
/// All throttling policy lives here; callers above the fetcher issue as
/// many logical requests as they like and rely on these limits for the
/// physical request rate.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpFetcherConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Sustained request rate shared by every caller.
    pub requests_per_second: u32,
    /// Requests the limiter may admit back-to-back before spacing kicks in.
    pub burst_size: u32,
    /// Permit pool size bounding simultaneous in-flight requests.
    pub max_concurrent_requests: usize,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: "prediction-extractor/0.1".to_string(),
            timeout_seconds: 30,
            requests_per_second: 1,
            burst_size: 2,
            max_concurrent_requests: 2,
        }
    }
}
