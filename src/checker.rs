use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use url::Url;

use crate::fetch::PageFetcher;
use crate::parsers::fragment::{document_title, fragment_text};

/// Stands in for a title when the target document has none.
const NO_TITLE_FOUND: &str = "No title found";

/// Stands in for a title when the target could not be fetched at all.
const FETCH_ERROR_TEXT: &str = "Error fetching content";

struct CacheEntry {
    status: u16,
    title_or_text: String,
    created: Instant,
}

/// Resolves link targets to a status code and a descriptive text, with a
/// TTL cache so that a target linked from many pages is fetched once.
///
/// The cache key is the full URL including its fragment: two fragments on
/// the same document are separate entries, each carrying the text derived
/// for its own anchor. Each audit run owns a fresh checker.
pub struct LinkChecker {
    fetcher: Arc<dyn PageFetcher>,
    cache: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl LinkChecker {
    pub fn new(fetcher: Arc<dyn PageFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
            ttl,
        }
    }

    /// Status code and title-or-anchor-text for a link target.
    ///
    /// For fragment URLs the text comes from the element the fragment
    /// points at; otherwise it is the document title. A status of 0 means
    /// the target was never reached.
    pub async fn check_link(&mut self, url: &str) -> (u16, String) {
        if let Some(entry) = self.cache.get(url) {
            if entry.created.elapsed() < self.ttl {
                ::log::debug!("Cache hit for {}", url);
                return (entry.status, entry.title_or_text.clone());
            }
        }

        let (status, title_or_text) = self.resolve_target(url).await;
        self.cache.insert(
            url.to_string(),
            CacheEntry {
                status,
                title_or_text: title_or_text.clone(),
                created: Instant::now(),
            },
        );
        (status, title_or_text)
    }

    async fn resolve_target(&self, url: &str) -> (u16, String) {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return (0, FETCH_ERROR_TEXT.to_string());
        }

        let (base, fragment) = split_fragment(url);
        let response = self.fetcher.fetch(&base).await;
        if response.error.is_some() {
            return (response.status, FETCH_ERROR_TEXT.to_string());
        }

        // Non-2xx bodies are still parsed: a 404 page's title is more
        // useful in a report than a blank.
        let title = fragment
            .as_deref()
            .and_then(|id| fragment_text(&response.text, id))
            .or_else(|| document_title(&response.text))
            .unwrap_or_else(|| NO_TITLE_FOUND.to_string());

        (response.status, title)
    }
}

/// Splits a URL into its fragment-free form and its raw fragment, if any.
/// The fragment keeps whatever percent-encoding URL parsing gave it; ids in
/// documents are matched against that form, not a decoded one.
fn split_fragment(url: &str) -> (String, Option<String>) {
    match Url::parse(url) {
        Ok(mut parsed) => {
            let fragment = parsed
                .fragment()
                .filter(|f| !f.is_empty())
                .map(|f| f.to_string());
            parsed.set_fragment(None);
            (parsed.to_string(), fragment)
        }
        Err(_) => (url.to_string(), None),
    }
}
