//! GitHub GraphQL integration.
//!
//! This module provides:
//! - A GraphQL client over the pluggable [`HttpTransport`](crate::http::HttpTransport)
//! - The repository search document and its response types
//! - Projection of raw search edges into [`RepositoryRecord`](crate::RepositoryRecord)s

pub mod client;
pub mod convert;
pub mod error;
pub mod types;

pub use client::{DEFAULT_SEARCH_QUERY, GITHUB_GRAPHQL_URL, GitHubClient, SEARCH_DOCUMENT};
pub use convert::{ProjectionError, pick_language, project};
pub use error::{GitHubError, is_retryable};
pub use types::{PageInfo, SearchConnection};
