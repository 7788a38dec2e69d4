use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::checker::LinkChecker;
use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::fetch::PageFetcher;
use crate::judge::judge;
use crate::parsers::links::extract_links;
use crate::results::{CheckResult, PageError, RunSummary};

/// Parses newline-separated URL input into validated seed URLs.
///
/// Lines are trimmed, blank lines are skipped, and anything that does not
/// parse as an absolute URL is discarded.
pub(crate) fn parse_seed_urls(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match Url::parse(line) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                ::log::warn!("Discarding invalid seed URL {}: {}", line, e);
                None
            }
        })
        .collect()
}

/// Starts an audit worker and returns a handle streaming its results.
pub(crate) fn start(
    seeds: Vec<String>,
    config: AuditConfig,
    fetcher: Arc<dyn PageFetcher>,
    cancel: CancellationToken,
) -> AuditRun {
    let (result_tx, result_rx) = mpsc::channel::<CheckResult>(10000);
    let handle = tokio::spawn(run_audit(seeds, config, fetcher, cancel, result_tx));

    AuditRun {
        results: result_rx,
        handle,
    }
}

/// A running audit: a stream of per-link results and, once the stream is
/// drained, a run summary.
pub struct AuditRun {
    results: mpsc::Receiver<CheckResult>,
    handle: JoinHandle<Result<RunSummary, AuditError>>,
}

impl AuditRun {
    /// The next checked link, in the order links appear on their pages.
    /// Returns None once the run is complete.
    pub async fn next_result(&mut self) -> Option<CheckResult> {
        self.results.recv().await
    }

    /// Waits for the worker and returns the run summary.
    pub async fn finish(mut self) -> Result<RunSummary, AuditError> {
        // Drain anything the caller did not consume so the worker is never
        // left blocked on a full channel.
        while self.results.recv().await.is_some() {}
        self.handle
            .await
            .map_err(|e| AuditError::Worker(e.to_string()))?
    }
}

async fn run_audit(
    seeds: Vec<String>,
    config: AuditConfig,
    fetcher: Arc<dyn PageFetcher>,
    cancel: CancellationToken,
    results: mpsc::Sender<CheckResult>,
) -> Result<RunSummary, AuditError> {
    ::log::info!("Starting link audit of {} page(s)", seeds.len());

    for url in &config.session_urls {
        ensure_active(&cancel)?;
        ::log::info!("Capturing session from: {}", url);
        fetcher.capture_session(url).await;
    }

    let mut checker = LinkChecker::new(
        Arc::clone(&fetcher),
        Duration::from_secs(config.cache_ttl_secs),
    );
    let delay = Duration::from_millis(config.request_delay_ms);
    let mut visited: HashSet<String> = HashSet::new();
    let mut summary = RunSummary::default();

    for seed in &seeds {
        let outcome = process_page(
            seed,
            fetcher.as_ref(),
            &mut checker,
            &mut visited,
            delay,
            &cancel,
            &results,
        )
        .await;

        match outcome {
            Ok(emitted) => {
                summary.pages_processed += 1;
                summary.results_emitted += emitted;
            }
            Err(AuditError::PageFetch { url, reason }) => {
                ::log::error!("Error processing page {}: {}", url, reason);
                summary.errors.push(PageError { url, error: reason });
            }
            Err(e) if e.is_cancelled() => {
                ::log::info!("Audit cancelled after {} page(s)", summary.pages_processed);
                return Err(e);
            }
            Err(e) => {
                ::log::error!("Error processing page {}: {}", seed, e);
                summary.errors.push(PageError {
                    url: seed.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    ::log::info!(
        "Audit complete: {} page(s), {} link check(s), {} error(s)",
        summary.pages_processed,
        summary.results_emitted,
        summary.errors.len()
    );
    Ok(summary)
}

/// Crawls one seed page and checks every link found on it. Returns the
/// number of results emitted for the page.
async fn process_page(
    page_url: &str,
    fetcher: &dyn PageFetcher,
    checker: &mut LinkChecker,
    visited: &mut HashSet<String>,
    delay: Duration,
    cancel: &CancellationToken,
    results: &mpsc::Sender<CheckResult>,
) -> Result<usize, AuditError> {
    ensure_active(cancel)?;
    wait_delay(delay, cancel).await?;

    let links = crawl_page(page_url, fetcher, visited, cancel).await?;

    // Duplicate suppression is scoped to this page: the same URL+text pair
    // is checked once per page, while a later page reports it again.
    let mut processed: HashMap<String, HashSet<String>> = HashMap::new();
    let mut emitted = 0;

    for link in links {
        ensure_active(cancel)?;

        let key = if link.text.is_empty() {
            link.source_html.clone()
        } else {
            link.text.clone()
        };
        let seen = processed.entry(link.href.clone()).or_default();
        if !seen.insert(key) {
            ::log::debug!("Skipping duplicate link {} on {}", link.href, page_url);
            continue;
        }

        wait_delay(delay, cancel).await?;
        ensure_active(cancel)?;

        let (status_code, title_or_text) = checker.check_link(&link.href).await;
        ensure_active(cancel)?;

        let judgment = judge(
            &link.text,
            &title_or_text,
            status_code,
            &link.original_href,
            &link.href,
            page_url,
        );

        let result = CheckResult {
            found_on: page_url.to_string(),
            href: link.href,
            original_href: link.original_href,
            status_code,
            link_text: link.text,
            title_or_text_node: title_or_text,
            judgment,
            is_anchor: link.is_anchor,
            html: link.source_html,
            parent_html: link.parent_html,
            error: None,
        };

        if let Err(e) = results.send(result).await {
            ::log::error!("Failed to deliver result for {}: {}", page_url, e);
            return Err(AuditError::Cancelled);
        }
        emitted += 1;
    }

    Ok(emitted)
}

/// Fetches a seed page and extracts its links. The page is marked visited
/// only after a successful fetch, so a failed seed can be retried by a
/// later run of the same list.
async fn crawl_page(
    page_url: &str,
    fetcher: &dyn PageFetcher,
    visited: &mut HashSet<String>,
    cancel: &CancellationToken,
) -> Result<Vec<crate::results::Link>, AuditError> {
    if visited.contains(page_url) {
        ::log::info!("Skipping already processed URL: {}", page_url);
        return Ok(Vec::new());
    }

    ensure_active(cancel)?;
    ::log::info!("Crawling page: {}", page_url);

    let response = fetcher.fetch(page_url).await;
    if !response.ok {
        let reason = response
            .error
            .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
        return Err(AuditError::PageFetch {
            url: page_url.to_string(),
            reason,
        });
    }

    let links = extract_links(&response.text, page_url);
    visited.insert(page_url.to_string());
    ::log::info!("Found {} links on {}", links.len(), page_url);

    Ok(links)
}

/// Sleeps for the configured pacing delay, waking early on cancellation.
async fn wait_delay(delay: Duration, cancel: &CancellationToken) -> Result<(), AuditError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AuditError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), AuditError> {
    if cancel.is_cancelled() {
        Err(AuditError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchResponse;
    use crate::results::Verdict;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedFetcher {
        pages: HashMap<String, FetchResponse>,
        fetches: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(pages: Vec<(&str, FetchResponse)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(url, response)| (url.to_string(), response))
                    .collect(),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> FetchResponse {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(url)
                .cloned()
                .unwrap_or_else(|| FetchResponse::transport_error(url, "no such page"))
        }
    }

    /// Records every call in order, serving a linkless page for fetches.
    struct RecordingFetcher {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingFetcher {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for RecordingFetcher {
        async fn fetch(&self, url: &str) -> FetchResponse {
            self.calls.lock().unwrap().push(format!("fetch {}", url));
            FetchResponse::http(url, 200, &page("Recorded", ""))
        }

        async fn capture_session(&self, url: &str) {
            self.calls.lock().unwrap().push(format!("capture {}", url));
        }
    }

    fn fast_config() -> AuditConfig {
        AuditConfig {
            request_delay_ms: 0,
            ..AuditConfig::default()
        }
    }

    fn page(title: &str, body: &str) -> String {
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        )
    }

    async fn collect(mut run: AuditRun) -> (Vec<CheckResult>, Result<RunSummary, AuditError>) {
        let mut results = Vec::new();
        while let Some(result) = run.next_result().await {
            results.push(result);
        }
        (results, run.finish().await)
    }

    #[tokio::test]
    async fn test_audit_checks_links_in_page_order() {
        let seed = page(
            "Home",
            r#"<a href="/about">About us</a>
               <a href="/contact">Contact</a>"#,
        );
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            (
                "https://example.com/",
                FetchResponse::http("https://example.com/", 200, &seed),
            ),
            (
                "https://example.com/about",
                FetchResponse::http("https://example.com/about", 200, &page("About us", "")),
            ),
            (
                "https://example.com/contact",
                FetchResponse::http("https://example.com/contact", 200, &page("Contact", "")),
            ),
        ]));

        let run = start(
            vec!["https://example.com/".to_string()],
            fast_config(),
            fetcher,
            CancellationToken::new(),
        );
        let (results, summary) = collect(run).await;
        let summary = summary.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].href, "https://example.com/about");
        assert_eq!(results[0].link_text, "About us");
        assert_eq!(results[0].title_or_text_node, "About us");
        assert_eq!(results[0].judgment, Verdict::Ok);
        assert_eq!(results[1].href, "https://example.com/contact");

        assert_eq!(summary.pages_processed, 1);
        assert_eq!(summary.results_emitted, 2);
        assert!(summary.errors.is_empty());
    }

    #[tokio::test]
    async fn test_link_text_and_title_flow_through_to_the_result() {
        let seed = page("Home", r#"<a href="/b">Contact</a>"#);
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            (
                "https://example.com/",
                FetchResponse::http("https://example.com/", 200, &seed),
            ),
            (
                "https://example.com/b",
                FetchResponse::http(
                    "https://example.com/b",
                    200,
                    &page("Contact Us | Example", ""),
                ),
            ),
        ]));

        let run = start(
            vec!["https://example.com/".to_string()],
            fast_config(),
            fetcher,
            CancellationToken::new(),
        );
        let (results, _) = collect(run).await;

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.found_on, "https://example.com/");
        assert_eq!(result.href, "https://example.com/b");
        assert_eq!(result.original_href, "/b");
        assert_eq!(result.status_code, 200);
        assert_eq!(result.link_text, "Contact");
        assert_eq!(result.title_or_text_node, "Contact Us | Example");
        assert_eq!(result.judgment, Verdict::Ok);
        assert!(!result.is_anchor);
        assert!(result.html.contains("href=\"/b\""));
    }

    #[tokio::test]
    async fn test_back_to_top_link_passes_whatever_its_text() {
        let seed = page("Guide", r##"<a href="#top">戻る</a>"##);
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            "https://example.com/guide",
            FetchResponse::http("https://example.com/guide", 200, &seed),
        )]));

        let run = start(
            vec!["https://example.com/guide".to_string()],
            fast_config(),
            fetcher,
            CancellationToken::new(),
        );
        let (results, _) = collect(run).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].href, "https://example.com/guide#top");
        assert!(results[0].is_anchor);
        // The text does not describe the title, but a same-page #top link
        // is fine by definition.
        assert_eq!(results[0].judgment, Verdict::Ok);
    }

    #[tokio::test]
    async fn test_broken_links_are_reported_not_fatal() {
        let seed = page("Home", r#"<a href="/missing">Missing page</a>"#);
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            (
                "https://example.com/",
                FetchResponse::http("https://example.com/", 200, &seed),
            ),
            (
                "https://example.com/missing",
                FetchResponse::http("https://example.com/missing", 404, &page("Not found", "")),
            ),
        ]));

        let run = start(
            vec!["https://example.com/".to_string()],
            fast_config(),
            fetcher,
            CancellationToken::new(),
        );
        let (results, summary) = collect(run).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status_code, 404);
        assert_eq!(results[0].judgment, Verdict::Error);
        assert_eq!(results[0].title_or_text_node, "Not found");
        assert!(summary.unwrap().errors.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_links_checked_once_per_page() {
        let seed = page(
            "Home",
            r#"<a href="/about">About</a>
               <a href="/about">About</a>
               <a href="/about">Different text</a>"#,
        );
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            (
                "https://example.com/",
                FetchResponse::http("https://example.com/", 200, &seed),
            ),
            (
                "https://example.com/about",
                FetchResponse::http("https://example.com/about", 200, &page("About", "")),
            ),
        ]));

        let run = start(
            vec!["https://example.com/".to_string()],
            fast_config(),
            fetcher,
            CancellationToken::new(),
        );
        let (results, _) = collect(run).await;

        // Same URL+text collapses; same URL with different text does not.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].link_text, "About");
        assert_eq!(results[1].link_text, "Different text");
    }

    #[tokio::test]
    async fn test_duplicates_reset_between_pages() {
        let body = r#"<a href="https://example.com/shared">Shared</a>"#;
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            (
                "https://example.com/one",
                FetchResponse::http("https://example.com/one", 200, &page("One", body)),
            ),
            (
                "https://example.com/two",
                FetchResponse::http("https://example.com/two", 200, &page("Two", body)),
            ),
            (
                "https://example.com/shared",
                FetchResponse::http("https://example.com/shared", 200, &page("Shared", "")),
            ),
        ]));

        let run = start(
            vec![
                "https://example.com/one".to_string(),
                "https://example.com/two".to_string(),
            ],
            fast_config(),
            fetcher.clone(),
            CancellationToken::new(),
        );
        let (results, _) = collect(run).await;

        // Both pages report the link, but the cache kept it to one fetch.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].found_on, "https://example.com/one");
        assert_eq!(results[1].found_on, "https://example.com/two");
        // 2 seed fetches + 1 target fetch
        assert_eq!(fetcher.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_repeated_seed_is_skipped() {
        let seed = page("Home", r#"<a href="/about">About</a>"#);
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            (
                "https://example.com/",
                FetchResponse::http("https://example.com/", 200, &seed),
            ),
            (
                "https://example.com/about",
                FetchResponse::http("https://example.com/about", 200, &page("About", "")),
            ),
        ]));

        let run = start(
            vec![
                "https://example.com/".to_string(),
                "https://example.com/".to_string(),
            ],
            fast_config(),
            fetcher,
            CancellationToken::new(),
        );
        let (results, summary) = collect(run).await;
        let summary = summary.unwrap();

        assert_eq!(results.len(), 1);
        // The repeat still counts as processed, it just yields nothing.
        assert_eq!(summary.pages_processed, 2);
        assert_eq!(summary.results_emitted, 1);
    }

    #[tokio::test]
    async fn test_failed_page_is_recorded_and_run_continues() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            (
                "https://example.com/down",
                FetchResponse::transport_error("https://example.com/down", "connection refused"),
            ),
            (
                "https://example.com/up",
                FetchResponse::http(
                    "https://example.com/up",
                    200,
                    &page("Up", r#"<a href="https://example.com/up">Self</a>"#),
                ),
            ),
        ]));

        let run = start(
            vec![
                "https://example.com/down".to_string(),
                "https://example.com/up".to_string(),
            ],
            fast_config(),
            fetcher,
            CancellationToken::new(),
        );
        let (results, summary) = collect(run).await;
        let summary = summary.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(summary.pages_processed, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].url, "https://example.com/down");
        assert_eq!(summary.errors[0].error, "connection refused");

        let message = summary.aggregate_message().unwrap();
        assert!(message.starts_with("Errors occurred while checking links:\n"));
        assert!(message.contains("https://example.com/down: connection refused"));
    }

    #[tokio::test]
    async fn test_http_error_page_uses_status_message() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            "https://example.com/teapot",
            FetchResponse::http("https://example.com/teapot", 418, ""),
        )]));

        let run = start(
            vec!["https://example.com/teapot".to_string()],
            fast_config(),
            fetcher,
            CancellationToken::new(),
        );
        let (_, summary) = collect(run).await;
        let summary = summary.unwrap();

        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].error, "HTTP error! status: 418");
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_run() {
        let seed = page(
            "Home",
            r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
        );
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            "https://example.com/",
            FetchResponse::http("https://example.com/", 200, &seed),
        )]));

        let cancel = CancellationToken::new();
        let config = AuditConfig {
            // Long enough that cancellation lands during the pacing delay.
            request_delay_ms: 5_000,
            ..AuditConfig::default()
        };
        let run = start(
            vec!["https://example.com/".to_string()],
            config,
            fetcher.clone(),
            cancel.clone(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let summary = run.finish().await;
        assert!(matches!(summary, Err(AuditError::Cancelled)));
        // Cancelled during the initial delay: the seed was never fetched.
        assert_eq!(fetcher.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_session_urls_captured_before_seed_fetches() {
        let fetcher = Arc::new(RecordingFetcher::new());
        let config = AuditConfig {
            request_delay_ms: 0,
            session_urls: vec![
                "https://intranet.example.com/login".to_string(),
                "https://sso.example.com/start".to_string(),
            ],
            ..AuditConfig::default()
        };

        let run = start(
            vec!["https://example.com/".to_string()],
            config,
            fetcher.clone(),
            CancellationToken::new(),
        );
        let (results, summary) = collect(run).await;

        assert!(results.is_empty());
        assert_eq!(summary.unwrap().pages_processed, 1);
        // Every configured session URL is captured, in order, before any
        // page is requested.
        assert_eq!(
            fetcher.calls(),
            vec![
                "capture https://intranet.example.com/login".to_string(),
                "capture https://sso.example.com/start".to_string(),
                "fetch https://example.com/".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_href_judged_empty() {
        let seed = page("Home", r#"<a href="">Broken editor output</a>"#);
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            "https://example.com/",
            FetchResponse::http("https://example.com/", 200, &seed),
        )]));

        let run = start(
            vec!["https://example.com/".to_string()],
            fast_config(),
            fetcher,
            CancellationToken::new(),
        );
        let (results, _) = collect(run).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].judgment, Verdict::Empty);
        assert_eq!(results[0].original_href, "");
    }

    #[test]
    fn test_parse_seed_urls_trims_and_validates() {
        let input = "  https://example.com/a  \n\nnot a url\nhttps://example.com/b\n   \n";
        assert_eq!(
            parse_seed_urls(input),
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_seed_urls_empty_input() {
        assert!(parse_seed_urls("").is_empty());
        assert!(parse_seed_urls("\n  \n").is_empty());
    }
}
