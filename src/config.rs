use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Configuration for an audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Delay between requests in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// How long a cached status/title pair stays valid, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// URLs handed to session capture before the seed loop starts
    #[serde(default)]
    pub session_urls: Vec<String>,

    /// Basic-Auth credentials applied to requests matching their origin
    #[serde(default)]
    pub basic_auth: Vec<BasicAuthCredential>,
}

/// Basic-Auth credentials for one origin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicAuthCredential {
    /// Origin the credentials apply to, e.g. "https://intranet.example.com"
    pub origin: String,

    pub username: String,

    pub password: String,
}

impl AuditConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            session_urls: Vec::new(),
            basic_auth: Vec::new(),
        }
    }
}

/// Default inter-request delay (one second)
fn default_request_delay_ms() -> u64 {
    1000
}

/// Default cache TTL (one minute)
fn default_cache_ttl_secs() -> u64 {
    60
}

/// Default HTTP timeout
fn default_timeout_secs() -> u64 {
    30
}

/// Default User-Agent
fn default_user_agent() -> String {
    concat!("anchor-audit/", env!("CARGO_PKG_VERSION")).to_string()
}
