use serde::{Deserialize, Serialize};
use std::fmt;

/// Judgment assigned to one checked link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The anchor had an empty href attribute.
    Empty,
    /// The anchor href was exactly `#` (a placeholder link).
    Dummy,
    /// Status and link text both check out.
    Ok,
    /// The target did not answer with a usable status.
    Error,
    /// The link text does not plausibly describe the target; needs a human.
    Review,
}

impl Verdict {
    /// Verdicts from most to least pressing, the order summaries are
    /// reported in.
    pub const SEVERITY_ORDER: [Verdict; 5] = [
        Verdict::Error,
        Verdict::Empty,
        Verdict::Review,
        Verdict::Dummy,
        Verdict::Ok,
    ];

    /// Everything except `ok` warrants attention.
    pub fn is_issue(self) -> bool {
        !matches!(self, Verdict::Ok)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Empty => "empty",
            Verdict::Dummy => "dummy",
            Verdict::Ok => "ok",
            Verdict::Error => "error",
            Verdict::Review => "review",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One anchor extracted from a page, immutable after extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// The href attribute exactly as written in the markup.
    pub original_href: String,

    /// Absolute resolved URL; empty when the href was unresolvable but the
    /// anchor is still worth reporting (empty or `#` hrefs).
    pub href: String,

    /// Effective visible text of the anchor.
    pub text: String,

    /// aria-label attribute, when present and non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,

    /// Non-empty alt texts of images inside the anchor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_alts: Option<Vec<String>>,

    /// True when the link targets a fragment within a document.
    pub is_anchor: bool,

    /// The anchor element's own markup.
    pub source_html: String,

    /// Markup of the anchor's parent element, for diagnostics when the
    /// anchor itself carries no usable text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_html: Option<String>,
}

/// The audit record emitted for one (page, link) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// The seed page the anchor was found on.
    pub found_on: String,

    /// Absolute URL that was checked.
    pub href: String,

    /// The href attribute exactly as written in the markup.
    pub original_href: String,

    /// HTTP status of the target; 0 for transport-level failures.
    pub status_code: u16,

    /// Effective visible text of the anchor.
    pub link_text: String,

    /// Target page title, or nearest heading/paragraph text for fragments.
    pub title_or_text_node: String,

    /// Judgment for this link.
    pub judgment: Verdict,

    /// True when the link targets a fragment within a document.
    pub is_anchor: bool,

    /// The anchor element's own markup.
    pub html: String,

    /// Markup of the anchor's parent element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_html: Option<String>,

    /// Reserved for integration-level errors; the pipeline itself folds
    /// failures into `status_code` and `judgment` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A page-level failure recorded while the run carried on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageError {
    /// The seed page that failed.
    pub url: String,

    /// Why it failed.
    pub error: String,
}

/// Aggregate report for one audit run, delivered separately from the
/// result stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Seed pages processed without a page-level failure.
    pub pages_processed: usize,

    /// CheckResults emitted over the stream.
    pub results_emitted: usize,

    /// Page-level failures, in the order they occurred.
    pub errors: Vec<PageError>,
}

impl RunSummary {
    /// Renders the accumulated page errors as one user-facing message,
    /// or `None` when the run was clean.
    pub fn aggregate_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let lines = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.url, e.error))
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!("Errors occurred while checking links:\n{}", lines))
    }
}
