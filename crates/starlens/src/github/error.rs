//! GitHub API error types.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when talking to the GitHub GraphQL API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The request never produced an HTTP response.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Primary or secondary rate limit hit.
    #[error("Rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// The token was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The GraphQL layer reported errors (validation, unknown fields, ...).
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The body is not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A successful response carried no `data` payload.
    #[error("Response contained no data")]
    MissingData,

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Whether a failed page fetch is worth retrying.
///
/// Transport failures, server errors and rate limits are transient. Anything
/// describing the request itself (credentials, query validation, response
/// shape) will fail the same way again.
pub fn is_retryable(err: &GitHubError) -> bool {
    match err {
        GitHubError::Http(_) | GitHubError::RateLimited { .. } => true,
        GitHubError::Api { status, .. } => *status >= 500 || *status == 429,
        GitHubError::Auth(_)
        | GitHubError::GraphQl(_)
        | GitHubError::Json(_)
        | GitHubError::MissingData
        | GitHubError::Config(_) => false,
    }
}

/// Get a short, single-line error message suitable for progress output.
pub fn short_error_message(err: &GitHubError) -> String {
    let message = err.to_string();
    let first_line = message.lines().next().unwrap_or_default();
    if first_line.chars().count() > 120 {
        let truncated: String = first_line.chars().take(117).collect();
        format!("{truncated}...")
    } else {
        first_line.to_string()
    }
}
