use thiserror::Error;

/// Errors produced while running an audit.
///
/// Per-page fetch failures are recorded in the run summary rather than
/// propagated; only seed validation, cancellation, and client construction
/// stop a run.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The seed input contained no parsable absolute URLs.
    #[error("No valid URLs provided")]
    NoValidSeeds,

    /// The cancellation token was triggered; the run stops immediately.
    #[error("Link checking was cancelled")]
    Cancelled,

    /// A seed page could not be fetched or parsed.
    #[error("failed to fetch {url}: {reason}")]
    PageFetch { url: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// The audit task itself failed (e.g. panicked).
    #[error("audit worker failed: {0}")]
    Worker(String),
}

impl AuditError {
    /// True for the cancellation variant; used where cancellation must
    /// propagate while ordinary page errors are recorded and skipped.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AuditError::Cancelled)
    }
}
