//! Error types for helpsync-github.

use thiserror::Error;

/// All errors that can arise from hosting-API calls.
///
/// There is no built-in retry; callers treat each failure as fatal or
/// ignorable depending on the call site.
#[derive(Debug, Error)]
pub enum GithubError {
    /// The request failed (transport error or non-success status).
    #[error("GitHub request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// The response body could not be read.
    #[error("failed to read GitHub response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The response body was not the expected JSON shape.
    #[error("failed to parse GitHub response from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
