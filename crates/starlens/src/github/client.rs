//! GitHub GraphQL client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::GitHubError;
use super::types::{GraphQlRequest, GraphQlResponse, SearchConnection, SearchData, SearchVariables};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport, header_get};

/// GitHub's GraphQL endpoint.
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Search string selecting repositories by descending star count.
pub const DEFAULT_SEARCH_QUERY: &str = "stars:>1 sort:stars-desc";

/// The repository search document.
pub const SEARCH_DOCUMENT: &str = include_str!("search.graphql");

const USER_AGENT: &str = concat!("starlens/", env!("CARGO_PKG_VERSION"));

/// GitHub GraphQL API client.
///
/// The token and transport are supplied once at construction; the client
/// holds no other state and is cheap to clone.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
    token: String,
}

impl GitHubClient {
    /// Create a client for `endpoint` backed by reqwest.
    pub fn new(endpoint: &str, token: &str) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Self::new_with_transport(endpoint, token, Arc::new(transport))
    }

    pub fn new_with_transport(
        endpoint: &str,
        token: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, GitHubError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GitHubError::Config("GitHub token is empty".to_string()));
        }

        Ok(Self {
            transport,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute a GraphQL document and decode its `data` payload.
    pub async fn graphql<V, T>(&self, document: &str, variables: V) -> Result<T, GitHubError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(&GraphQlRequest {
            query: document,
            variables,
        })?;

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint.clone(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
                ("Authorization".to_string(), format!("bearer {}", self.token)),
            ],
            body,
        };

        let response = self.transport.send(request).await?;
        tracing::debug!(status = response.status, bytes = response.body.len(), "GraphQL response");

        if !response.is_success() {
            return Err(status_error(&response));
        }

        let envelope: GraphQlResponse<T> = serde_json::from_slice(&response.body)?;

        if !envelope.errors.is_empty() {
            let message = envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            if envelope.errors.iter().any(|e| e.is_rate_limit()) {
                return Err(GitHubError::RateLimited { message });
            }
            return Err(GitHubError::GraphQl(message));
        }

        envelope.data.ok_or(GitHubError::MissingData)
    }

    /// Fetch one page of the repository search.
    pub async fn search_page(
        &self,
        search: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<SearchConnection, GitHubError> {
        let data: SearchData = self
            .graphql(
                SEARCH_DOCUMENT,
                SearchVariables {
                    query: search,
                    page_size,
                    cursor,
                },
            )
            .await?;

        Ok(data.search)
    }
}

/// Map a non-success response to an error.
///
/// GitHub signals rate limits with 429, or with 403 plus either an exhausted
/// `x-ratelimit-remaining` or a `retry-after` header (secondary limits).
fn status_error(response: &HttpResponse) -> GitHubError {
    let message = String::from_utf8_lossy(&response.body).trim().to_string();

    match response.status {
        401 => GitHubError::Auth(message),
        429 => GitHubError::RateLimited { message },
        403 if is_rate_limited(&response.headers, &message) => GitHubError::RateLimited { message },
        status => GitHubError::Api { status, message },
    }
}

fn is_rate_limited(headers: &HttpHeaders, message: &str) -> bool {
    header_get(headers, "x-ratelimit-remaining") == Some("0")
        || header_get(headers, "retry-after").is_some()
        || message.to_ascii_lowercase().contains("rate limit")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::error::is_retryable;
    use crate::http::MockTransport;

    const ENDPOINT: &str = "https://api.github.test/graphql";

    fn response(status: u16, headers: Vec<(&str, &str)>, body: impl AsRef<[u8]>) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.as_ref().to_vec(),
        }
    }

    fn client(transport: &MockTransport) -> GitHubClient {
        GitHubClient::new_with_transport(ENDPOINT, "ghp_test", Arc::new(transport.clone()))
            .expect("client should build")
    }

    #[test]
    fn test_search_document_selects_expected_fields() {
        for field in [
            "stargazerCount",
            "pushedAt",
            "primaryLanguage",
            "closed: issues(states: CLOSED)",
            "endCursor",
            "$cursor",
        ] {
            assert!(SEARCH_DOCUMENT.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_new_rejects_empty_token() {
        let transport = MockTransport::new();
        let err = GitHubClient::new_with_transport(ENDPOINT, "  ", Arc::new(transport))
            .err()
            .expect("empty token should be rejected");
        assert!(matches!(err, GitHubError::Config(_)));
    }

    #[test]
    fn test_new_normalizes_endpoint() {
        let transport = MockTransport::new();
        let client =
            GitHubClient::new_with_transport("https://ghe.example/api/graphql/", "t", Arc::new(transport))
                .unwrap();
        assert_eq!(client.endpoint(), "https://ghe.example/api/graphql");
    }

    #[tokio::test]
    async fn test_search_page_sends_bearer_token_and_variables() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            response(
                200,
                vec![],
                r#"{"data":{"search":{"pageInfo":{"hasNextPage":true,"endCursor":"c2"},"edges":[]}}}"#,
            ),
        );

        let page = client(&transport)
            .search_page(DEFAULT_SEARCH_QUERY, 25, Some("c1"))
            .await
            .expect("page should decode");

        assert_eq!(
            page.page_info,
            Some(crate::github::PageInfo {
                has_next_page: true,
                end_cursor: Some("c2".to_string()),
            })
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("authorization"), Some("bearer ghp_test"));

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["variables"]["cursor"], "c1");
        assert_eq!(body["variables"]["pageSize"], 25);
        assert_eq!(body["variables"]["query"], DEFAULT_SEARCH_QUERY);
        assert_eq!(body["query"], SEARCH_DOCUMENT);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let transport = MockTransport::new();
        transport.push_response(HttpMethod::Post, ENDPOINT, response(401, vec![], "Bad credentials"));
        transport.push_response(HttpMethod::Post, ENDPOINT, response(502, vec![], "Bad Gateway"));
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            response(403, vec![("x-ratelimit-remaining", "0")], "{}"),
        );
        transport.push_response(HttpMethod::Post, ENDPOINT, response(403, vec![], "Forbidden"));

        let client = client(&transport);

        let err = client.search_page("q", 25, None).await.unwrap_err();
        assert!(matches!(err, GitHubError::Auth(_)));
        assert!(!is_retryable(&err));

        let err = client.search_page("q", 25, None).await.unwrap_err();
        assert!(matches!(err, GitHubError::Api { status: 502, .. }));
        assert!(is_retryable(&err));

        let err = client.search_page("q", 25, None).await.unwrap_err();
        assert!(matches!(err, GitHubError::RateLimited { .. }));
        assert!(is_retryable(&err));

        let err = client.search_page("q", 25, None).await.unwrap_err();
        assert!(matches!(err, GitHubError::Api { status: 403, .. }));
        assert!(!is_retryable(&err));
    }

    #[tokio::test]
    async fn test_graphql_errors() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            response(
                200,
                vec![],
                r#"{"errors":[{"type":"RATE_LIMITED","message":"API rate limit exceeded"}]}"#,
            ),
        );
        transport.push_response(
            HttpMethod::Post,
            ENDPOINT,
            response(
                200,
                vec![],
                r#"{"errors":[{"message":"Field 'stars' doesn't exist on type 'Repository'"}]}"#,
            ),
        );
        transport.push_response(HttpMethod::Post, ENDPOINT, response(200, vec![], r#"{"data":null}"#));

        let client = client(&transport);

        let err = client.search_page("q", 25, None).await.unwrap_err();
        assert!(matches!(err, GitHubError::RateLimited { .. }));

        let err = client.search_page("q", 25, None).await.unwrap_err();
        match err {
            GitHubError::GraphQl(message) => assert!(message.contains("doesn't exist")),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = client.search_page("q", 25, None).await.unwrap_err();
        assert!(matches!(err, GitHubError::MissingData));
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_error() {
        let transport = MockTransport::new();
        transport.push_failure(HttpMethod::Post, ENDPOINT, "operation timed out");

        let err = client(&transport).search_page("q", 25, None).await.unwrap_err();
        assert!(matches!(err, GitHubError::Http(_)));
        assert!(is_retryable(&err));
    }
}
