//! Paginated collection of the most-starred repositories.
//!
//! Pages are fetched strictly one after another: each request needs the
//! previous page's cursor. Every page fetch goes through the retry policy;
//! a page that still fails aborts the whole run.

mod progress;

use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;

pub use progress::{CollectProgress, ProgressCallback, emit};

use crate::github::error::short_error_message;
use crate::github::{
    DEFAULT_SEARCH_QUERY, GitHubClient, GitHubError, ProjectionError, SearchConnection,
    is_retryable, project,
};
use crate::record::RepositoryRecord;
use crate::retry::{RetryConfig, with_retry};

/// Number of repositories collected by default.
pub const DEFAULT_TARGET_COUNT: usize = 1000;

/// Edges requested per page by default.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Largest `first` value GitHub accepts on a connection.
pub const MAX_PAGE_SIZE: usize = 100;

/// Options for a collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectOptions {
    /// Stop once this many records are collected.
    pub target_count: usize,
    /// Edges requested per page.
    pub page_size: usize,
    /// GitHub search string; its ordering is the ordering of the result.
    pub search_query: String,
    /// Retry policy applied to every page.
    pub retry: RetryConfig,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
            page_size: DEFAULT_PAGE_SIZE,
            search_query: DEFAULT_SEARCH_QUERY.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl CollectOptions {
    #[must_use]
    pub fn new(target_count: usize, page_size: usize) -> Self {
        Self {
            target_count,
            page_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Check the options before any request is made.
    pub fn validate(&self) -> Result<(), CollectError> {
        if self.target_count == 0 {
            return Err(CollectError::InvalidOptions(
                "target count must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(CollectError::InvalidOptions(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if !self.retry.is_valid() {
            return Err(CollectError::InvalidOptions(format!(
                "retry base must be a positive number, got {}",
                self.retry.base
            )));
        }
        if self.search_query.trim().is_empty() {
            return Err(CollectError::InvalidOptions(
                "search query must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors that abort a collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid collect options: {0}")]
    InvalidOptions(String),

    /// A page could not be fetched within the retry budget, or failed with a
    /// permanent error.
    #[error("page {page} failed after {attempts} attempt(s): {source}")]
    PageFailed {
        page: u32,
        attempts: u32,
        #[source]
        source: GitHubError,
    },

    /// An edge lacked a mandatory field.
    #[error("repository #{index} could not be read: {source}")]
    Projection {
        /// Zero-based position in the collected sequence.
        index: usize,
        #[source]
        source: ProjectionError,
    },
}

/// Collect up to `options.target_count` repositories in upstream order.
///
/// Returns exactly `min(target_count, available)` records. A page may return
/// more edges than still needed; the surplus is dropped without being
/// projected.
pub async fn collect(
    client: &GitHubClient,
    options: &CollectOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<RepositoryRecord>, CollectError> {
    options.validate()?;

    emit(
        on_progress,
        CollectProgress::Started {
            target_count: options.target_count,
            page_size: options.page_size,
        },
    );

    // The target is only an upper bound; the result set may be far smaller.
    let mut records: Vec<RepositoryRecord> =
        Vec::with_capacity(options.target_count.min(options.page_size));
    let mut cursor: Option<String> = None;
    let mut has_next = true;
    let mut page = 1u32;

    while has_next && records.len() < options.target_count {
        emit(
            on_progress,
            CollectProgress::FetchingPage {
                page,
                page_size: options.page_size,
            },
        );

        let connection =
            fetch_page_with_retry(client, options, cursor.as_deref(), page, on_progress).await?;

        let count = connection.edges.len();
        let remaining = options.target_count - records.len();
        for edge in connection.edges.iter().take(remaining) {
            let record = project(edge).map_err(|source| CollectError::Projection {
                index: records.len(),
                source,
            })?;
            records.push(record);
        }

        emit(
            on_progress,
            CollectProgress::FetchedPage {
                page,
                count,
                total_so_far: records.len(),
            },
        );

        (has_next, cursor) = match connection.page_info {
            Some(info) => (info.has_next_page, info.end_cursor),
            None => (false, None),
        };

        if has_next && count == 0 {
            emit(
                on_progress,
                CollectProgress::Warning {
                    message: format!("page {page} was empty but reported more pages; stopping"),
                },
            );
            has_next = false;
        }
        if has_next && cursor.is_none() {
            emit(
                on_progress,
                CollectProgress::Warning {
                    message: format!("page {page} reported more pages without a cursor; stopping"),
                },
            );
            has_next = false;
        }

        page += 1;
    }

    records.truncate(options.target_count);

    tracing::debug!(total = records.len(), pages = page - 1, "Collection finished");
    emit(
        on_progress,
        CollectProgress::Complete {
            total: records.len(),
        },
    );

    Ok(records)
}

/// Fetch one page, retrying transient failures per `options.retry`.
async fn fetch_page_with_retry(
    client: &GitHubClient,
    options: &CollectOptions,
    cursor: Option<&str>,
    page: u32,
    on_progress: Option<&ProgressCallback>,
) -> Result<SearchConnection, CollectError> {
    let attempts = AtomicU32::new(0);
    let search = options.search_query.as_str();
    let page_size = options.page_size;

    let operation = || {
        attempts.fetch_add(1, Ordering::SeqCst);
        client.search_page(search, page_size, cursor)
    };

    with_retry(
        operation,
        &options.retry,
        is_retryable,
        |err: &GitHubError, delay, attempt| {
            let message = short_error_message(err);
            tracing::warn!(
                page,
                attempt,
                max_retries = options.retry.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Page fetch failed, retrying: {}",
                message
            );
            emit(
                on_progress,
                CollectProgress::RetryBackoff {
                    page,
                    attempt,
                    max_retries: options.retry.max_retries,
                    delay,
                    error: message,
                },
            );
        },
    )
    .await
    .map_err(|source| CollectError::PageFailed {
        page,
        attempts: attempts.load(Ordering::SeqCst),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse, MockTransport};
    use crate::retry::MAX_RETRIES;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const ENDPOINT: &str = "https://api.github.test/graphql";

    fn edge(stars: u64) -> serde_json::Value {
        json!({
            "node": {
                "name": format!("repo-{stars}"),
                "owner": { "login": "owner" },
                "stargazerCount": stars,
                "createdAt": "2015-01-01T00:00:00Z",
                "pushedAt": "2025-01-01T00:00:00Z",
                "primaryLanguage": { "name": "Rust" },
                "languages": { "edges": [] },
                "pullRequests": { "totalCount": 10 },
                "releases": { "totalCount": 2 },
                "issues": { "totalCount": 4 },
                "closed": { "totalCount": 3 }
            }
        })
    }

    fn page_response(stars: &[u64], has_next: bool, cursor: Option<&str>) -> HttpResponse {
        let edges: Vec<_> = stars.iter().map(|s| edge(*s)).collect();
        let body = json!({
            "data": {
                "search": {
                    "pageInfo": { "hasNextPage": has_next, "endCursor": cursor },
                    "edges": edges
                }
            }
        });
        ok(body)
    }

    fn ok(body: serde_json::Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    fn status(code: u16) -> HttpResponse {
        HttpResponse {
            status: code,
            headers: Vec::new(),
            body: b"upstream failure".to_vec(),
        }
    }

    fn client(transport: &MockTransport) -> GitHubClient {
        GitHubClient::new_with_transport(ENDPOINT, "ghp_test", Arc::new(transport.clone())).unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<CollectProgress>>>, ProgressCallback) {
        let events: Arc<Mutex<Vec<CollectProgress>>> = Arc::default();
        let capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            capture.lock().unwrap().push(event);
        });
        (events, callback)
    }

    fn request_cursors(transport: &MockTransport) -> Vec<serde_json::Value> {
        transport
            .requests()
            .iter()
            .map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
                body["variables"]["cursor"].clone()
            })
            .collect()
    }

    fn descending(from: u64, count: usize) -> Vec<u64> {
        (0..count as u64).map(|i| from - i * 100).collect()
    }

    #[test]
    fn test_default_options() {
        let options = CollectOptions::default();
        assert_eq!(options.target_count, 1000);
        assert_eq!(options.page_size, 25);
        assert_eq!(options.search_query, DEFAULT_SEARCH_QUERY);
        assert_eq!(options.retry, RetryConfig::default());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_options() {
        assert!(CollectOptions::new(0, 25).validate().is_err());
        assert!(CollectOptions::new(10, 0).validate().is_err());
        assert!(CollectOptions::new(10, 101).validate().is_err());
        assert!(CollectOptions::new(10, 100).validate().is_ok());
        assert!(
            CollectOptions::new(10, 25)
                .with_retry(RetryConfig::new(0.0, 4))
                .validate()
                .is_err()
        );
        assert!(
            CollectOptions::new(10, 25)
                .with_search_query("  ")
                .validate()
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_invalid_options_make_no_requests() {
        let transport = MockTransport::new();
        let err = collect(&client(&transport), &CollectOptions::new(10, 0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::InvalidOptions(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_collect_stops_when_pages_run_out() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&descending(5000, 3), true, Some("c1")),
        );
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&descending(4700, 2), false, Some("c2")),
        );

        let records = collect(&client(&transport), &CollectOptions::new(10, 3), None)
            .await
            .unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records[0].stars, 5000);
        assert_eq!(records[4].stars, 4600);
        assert_eq!(request_cursors(&transport), vec![json!(null), json!("c1")]);
    }

    #[tokio::test]
    async fn test_unbounded_target_returns_what_is_available() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&descending(700, 2), true, Some("c1")),
        );
        transport.push_response(HttpMethod::Post, ENDPOINT, page_response(&[], false, None));

        let records = collect(
            &client(&transport),
            &CollectOptions::new(usize::MAX, 25),
            None,
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_collect_truncates_overshooting_page() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&descending(9000, 4), true, Some("c1")),
        );
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&descending(8600, 4), true, Some("c2")),
        );

        let records = collect(&client(&transport), &CollectOptions::new(6, 4), None)
            .await
            .unwrap();

        assert_eq!(records.len(), 6);
        assert_eq!(records.last().unwrap().stars, 8500);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_surplus_edges_are_not_projected() {
        let transport = MockTransport::new();
        let mut edges: Vec<_> = descending(9000, 2).into_iter().map(edge).collect();
        edges.push(json!({ "node": { "name": "broken" } }));
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            ok(json!({
                "data": { "search": {
                    "pageInfo": { "hasNextPage": true, "endCursor": "c1" },
                    "edges": edges
                }}
            })),
        );

        let records = collect(&client(&transport), &CollectOptions::new(2, 3), None)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_page_info_means_last_page() {
        let transport = MockTransport::new();
        let edges: Vec<_> = descending(9000, 2).into_iter().map(edge).collect();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            ok(json!({ "data": { "search": { "edges": edges } } })),
        );

        let records = collect(&client(&transport), &CollectOptions::new(50, 2), None)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_with_next_stops_with_warning() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&[], true, Some("c1")),
        );
        let (events, callback) = recorder();

        let records = collect(&client(&transport), &CollectOptions::new(50, 25), Some(&callback))
            .await
            .unwrap();

        assert!(records.is_empty());
        assert_eq!(transport.requests().len(), 1);
        assert!(
            events
                .lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, CollectProgress::Warning { .. }))
        );
    }

    #[tokio::test]
    async fn test_next_page_without_cursor_stops() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&descending(9000, 2), true, None),
        );

        let records = collect(&client(&transport), &CollectOptions::new(50, 2), None)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_recovers_after_max_retries_failures() {
        let transport = MockTransport::new();
        transport.push_failure(HttpMethod::Post, ENDPOINT, "connection reset");
        for _ in 1..MAX_RETRIES {
            transport.push_response(HttpMethod::Post, ENDPOINT, status(502));
        }
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&descending(9000, 3), false, None),
        );
        let (events, callback) = recorder();

        let records = collect(&client(&transport), &CollectOptions::new(3, 3), Some(&callback))
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(transport.requests().len(), MAX_RETRIES + 1);

        let events = events.lock().unwrap();
        let retries: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                CollectProgress::RetryBackoff { page, attempt, .. } => {
                    assert_eq!(*page, 1);
                    Some(*attempt)
                }
                _ => None,
            })
            .collect();
        assert_eq!(retries, vec![1, 2, 3, 4]);
        assert!(matches!(
            events.last(),
            Some(CollectProgress::Complete { total: 3 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_fails_after_exhausting_retries() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&descending(9000, 2), true, Some("c1")),
        );
        for _ in 0..=MAX_RETRIES {
            transport.push_response(HttpMethod::Post, ENDPOINT, status(503));
        }
        let (events, callback) = recorder();

        let err = collect(&client(&transport), &CollectOptions::new(10, 2), Some(&callback))
            .await
            .unwrap_err();

        match err {
            CollectError::PageFailed {
                page,
                attempts,
                source,
            } => {
                assert_eq!(page, 2);
                assert_eq!(attempts, MAX_RETRIES as u32 + 1);
                assert!(matches!(source, GitHubError::Api { status: 503, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.requests().len(), 1 + MAX_RETRIES + 1);

        let events = events.lock().unwrap();
        let retries = events
            .iter()
            .filter(|e| matches!(e, CollectProgress::RetryBackoff { .. }))
            .count();
        assert_eq!(retries, MAX_RETRIES);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, CollectProgress::Complete { .. }))
        );
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let transport = MockTransport::new();
        transport.push_response(HttpMethod::Post, ENDPOINT, status(401));

        let err = collect(&client(&transport), &CollectOptions::new(10, 2), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectError::PageFailed {
                attempts: 1,
                source: GitHubError::Auth(_),
                ..
            }
        ));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_edge_aborts_run() {
        let transport = MockTransport::new();
        let mut edges: Vec<_> = descending(9000, 2).into_iter().map(edge).collect();
        edges[1]["node"]
            .as_object_mut()
            .unwrap()
            .remove("stargazerCount");
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            ok(json!({
                "data": { "search": {
                    "pageInfo": { "hasNextPage": false, "endCursor": null },
                    "edges": edges
                }}
            })),
        );

        let err = collect(&client(&transport), &CollectOptions::new(10, 2), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::Projection { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_thirty_edges_over_two_pages() {
        let stars: Vec<u64> = (0..30u64).map(|i| 50_000 - i * 1_700).collect();
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&stars[..25], true, Some("c25")),
        );
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            page_response(&stars[25..], false, Some("c30")),
        );
        let (events, callback) = recorder();

        let records = collect(&client(&transport), &CollectOptions::new(30, 25), Some(&callback))
            .await
            .unwrap();

        let got: Vec<u64> = records.iter().map(|r| r.stars).collect();
        assert_eq!(got, stars);
        assert_eq!(transport.requests().len(), 2);

        let pages: Vec<(u32, usize, usize)> = events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                CollectProgress::FetchedPage {
                    page,
                    count,
                    total_so_far,
                } => Some((*page, *count, *total_so_far)),
                _ => None,
            })
            .collect();
        assert_eq!(pages, vec![(1, 25, 25), (2, 5, 30)]);
    }
}
