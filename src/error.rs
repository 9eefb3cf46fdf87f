use thiserror::Error;

/// Failures a [`ScrapeSession`](crate::session::ScrapeSession) reports to its
/// caller. Everything else degrades to empty fields inside the record.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("extraction already in progress")]
    InProgress,

    #[error("page did not render `{selector}` within {waited_ms}ms")]
    AnchorNotFound { selector: String, waited_ms: u64 },

    #[error("invalid anchor selector `{0}`")]
    InvalidAnchor(String),

    #[error("failed to read page: {0:#}")]
    Page(anyhow::Error),
}
