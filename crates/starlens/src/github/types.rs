//! GitHub GraphQL request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GraphQL request body.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

/// Variables of the repository search document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchVariables<'a> {
    pub query: &'a str,
    pub page_size: usize,
    /// `None` serializes as `null`, which requests the first page.
    pub cursor: Option<&'a str>,
}

/// Envelope of every GraphQL response.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorEntry>,
}

/// One entry of the GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlErrorEntry {
    pub message: String,
    /// GitHub sets this to e.g. `RATE_LIMITED` or `NOT_FOUND`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl GraphQlErrorEntry {
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        self.kind.as_deref() == Some("RATE_LIMITED")
    }
}

/// `data` payload of the search document.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    pub search: SearchConnection,
}

/// One page of search results.
///
/// Edges are kept as raw JSON so that a malformed repository surfaces as a
/// projection error for that record rather than as an undecodable page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnection {
    #[serde(default)]
    pub page_info: Option<PageInfo>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub edges: Vec<serde_json::Value>,
}

/// Pagination metadata for a search page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A search edge as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEdge {
    pub node: RawRepository,
}

/// The repository fields selected by the search document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRepository {
    pub name: String,
    pub owner: RawOwner,
    pub stargazer_count: u64,
    pub created_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
    #[serde(default)]
    pub primary_language: Option<RawLanguage>,
    #[serde(default)]
    pub languages: Option<RawLanguageConnection>,
    pub pull_requests: RawCount,
    pub releases: RawCount,
    pub issues: RawCount,
    /// Aliased `issues(states: CLOSED)`.
    pub closed: RawCount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLanguage {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLanguageConnection {
    #[serde(default)]
    pub edges: Option<Vec<RawLanguageEdge>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLanguageEdge {
    pub node: RawLanguageNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLanguageNode {
    pub name: String,
}

/// A `{ totalCount }` selection.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCount {
    pub total_count: u64,
}
