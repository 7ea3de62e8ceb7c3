//! Starlens - collect and analyze the most-starred GitHub repositories.
//!
//! The library has two halves that only meet at a CSV file:
//!
//! - The collector pages through GitHub's GraphQL repository search with a
//!   bounded retry per page and projects every edge into a flat
//!   [`RepositoryRecord`].
//! - The analyzer reads the table back, derives auxiliary columns and renders
//!   a fixed set of charts answering seven research questions.
//!
//! # Example
//!
//! ```ignore
//! use starlens::{CollectOptions, GitHubClient, GITHUB_GRAPHQL_URL, collect, table};
//!
//! let client = GitHubClient::new(GITHUB_GRAPHQL_URL, &token)?;
//! let records = collect(&client, &CollectOptions::default(), None).await?;
//! table::write_records("repositories.csv".as_ref(), &records)?;
//!
//! let derived = starlens::analysis::derive(&records, chrono::Utc::now());
//! let report = starlens::report::render_report(&derived, "charts".as_ref())?;
//! println!("{}", starlens::report::issue_closure_line(&report.issue_closure));
//! ```

pub mod analysis;
pub mod collect;
pub mod github;
pub mod http;
pub mod record;
pub mod report;
pub mod retry;
pub mod table;

pub use analysis::{DerivedRow, DerivedTable, StarBucket, derive};
pub use collect::{
    CollectError, CollectOptions, CollectProgress, ProgressCallback, collect,
};
pub use github::{GITHUB_GRAPHQL_URL, GitHubClient, GitHubError};
pub use record::{RepositoryRecord, UNKNOWN_LANGUAGE};
pub use report::{ReportError, ReportOutput, render_report};
pub use retry::RetryConfig;
pub use table::TableError;
