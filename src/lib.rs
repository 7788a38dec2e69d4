#![allow(clippy::too_many_arguments)]

// Re-export modules
pub mod checker;
pub mod config;
pub mod crawl;
pub mod error;
pub mod fetch;
pub mod judge;
pub mod normalize;
pub mod parsers;
pub mod resolver;
pub mod results;

// Re-export commonly used types for convenience
pub use crawl::AuditRun;
pub use error::AuditError;
pub use fetch::{FetchResponse, HttpFetcher, PageFetcher};
pub use results::{CheckResult, RunSummary, Verdict};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use config::AuditConfig;

/// Main builder for auditing the links found on a set of pages
pub struct Audit {
    url_input: String,
    config: AuditConfig,
    fetcher: Option<Arc<dyn PageFetcher>>,
    cancel: CancellationToken,
}

impl Audit {
    /// Create a new audit over newline-separated page URLs
    pub fn new(url_input: impl Into<String>) -> Self {
        Self {
            url_input: url_input.into(),
            config: AuditConfig::default(),
            fetcher: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the pacing delay between requests, in milliseconds
    pub fn with_request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.request_delay_ms = delay_ms;
        self
    }

    /// Set how long checked link targets stay cached, in seconds
    pub fn with_cache_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.config.cache_ttl_secs = ttl_secs;
        self
    }

    /// Add a URL to visit before the audit starts so that its session
    /// cookies are available to the run
    pub fn with_session_url(mut self, url: impl Into<String>) -> Self {
        self.config.session_urls.push(url.into());
        self
    }

    /// Set the full audit configuration
    pub fn with_config(mut self, config: AuditConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(
        self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = AuditConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = serde_json::from_str(config_str)?;
        Ok(self.with_config(config))
    }

    /// Use a custom page fetcher instead of the built-in HTTP client
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Stop the audit early when this token is cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Start the audit and get a handle streaming its results
    pub async fn start(self) -> Result<AuditRun, AuditError> {
        let seeds = crawl::parse_seed_urls(&self.url_input);
        if seeds.is_empty() {
            return Err(AuditError::NoValidSeeds);
        }

        let fetcher: Arc<dyn PageFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&self.config)?),
        };

        Ok(crawl::start(seeds, self.config, fetcher, self.cancel))
    }
}
