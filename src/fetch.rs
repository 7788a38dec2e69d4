use crate::config::{AuditConfig, BasicAuthCredential};
use crate::error::AuditError;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Outcome of one page fetch.
///
/// Fetches never fail as calls: failures travel in `error` with `status` 0
/// standing for a transport-level problem (unresolved host, refused
/// connection, invalid URL) rather than an HTTP response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// True for 2xx responses.
    pub ok: bool,

    /// Terminal HTTP status after redirects; 0 when no response arrived.
    pub status: u16,

    /// Response body.
    pub text: String,

    /// Whether any redirect was followed.
    pub redirected: bool,

    /// The URL the terminal response came from.
    pub final_url: String,

    /// Transport or body-read error, when one occurred.
    pub error: Option<String>,
}

impl FetchResponse {
    /// Response for a completed HTTP exchange.
    pub fn http(url: &str, status: u16, text: &str) -> Self {
        Self {
            ok: (200..300).contains(&status),
            status,
            text: text.to_string(),
            redirected: false,
            final_url: url.to_string(),
            error: None,
        }
    }

    /// Response for a transport-level failure.
    pub fn transport_error(url: &str, message: &str) -> Self {
        Self {
            ok: false,
            status: 0,
            text: String::new(),
            redirected: false,
            final_url: url.to_string(),
            error: Some(message.to_string()),
        }
    }
}

/// External boundary for retrieving pages.
///
/// Implementations follow redirects themselves and report the terminal
/// status and body; the pipeline never manages redirection.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one absolute URL.
    async fn fetch(&self, url: &str) -> FetchResponse;

    /// Arranges for future fetches to the URL's origin to carry the right
    /// session credentials. The default does nothing.
    async fn capture_session(&self, url: &str) {
        let _ = url;
    }
}

/// Production fetcher backed by reqwest.
///
/// Keeps a cookie jar so captured sessions persist across requests, and
/// applies configured Basic-Auth credentials to matching origins.
pub struct HttpFetcher {
    client: reqwest::Client,
    basic_auth: Vec<BasicAuthCredential>,
}

impl HttpFetcher {
    /// Builds a fetcher from the audit configuration.
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()
            .map_err(|e| AuditError::Client(e.to_string()))?;

        Ok(Self {
            client,
            basic_auth: config.basic_auth.clone(),
        })
    }

    /// Finds the configured credentials for a URL's origin, if any.
    fn credential_for(&self, url: &str) -> Option<&BasicAuthCredential> {
        let origin = Url::parse(url).ok()?.origin().ascii_serialization();
        self.basic_auth.iter().find(|c| c.origin == origin)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResponse {
        let mut request = self.client.get(url);
        if let Some(credential) = self.credential_for(url) {
            request = request.basic_auth(&credential.username, Some(&credential.password));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let ok = response.status().is_success();
                let final_url = response.url().to_string();
                let redirected = final_url != url;
                match response.text().await {
                    Ok(text) => FetchResponse {
                        ok,
                        status,
                        text,
                        redirected,
                        final_url,
                        error: None,
                    },
                    Err(e) => {
                        ::log::warn!("Failed to read body of {}: {}", url, e);
                        FetchResponse {
                            ok: false,
                            status,
                            text: String::new(),
                            redirected,
                            final_url,
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
            Err(e) => {
                let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
                FetchResponse {
                    ok: false,
                    status,
                    text: String::new(),
                    redirected: false,
                    final_url: url.to_string(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Fetches the URL so its origin's session cookies land in the jar.
    async fn capture_session(&self, url: &str) {
        let response = self.fetch(url).await;
        match response.error {
            Some(error) => ::log::warn!("Session capture failed for {}: {}", url, error),
            None => ::log::debug!(
                "Session captured for {} (status {})",
                url,
                response.status
            ),
        }
    }
}
