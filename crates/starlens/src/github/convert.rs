//! Projection of raw search edges into flat repository records.

use serde::Deserialize;
use thiserror::Error;

use super::types::{RawEdge, RawRepository};
use crate::record::{RepositoryRecord, UNKNOWN_LANGUAGE};

/// A search edge could not be turned into a record.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A mandatory field is missing or has the wrong type.
    #[error("malformed repository: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Convert one raw search edge (`{ "node": { ... } }`) into a record.
///
/// Only the language lookup is optional; every other field must be present.
pub fn project(edge: &serde_json::Value) -> Result<RepositoryRecord, ProjectionError> {
    let raw = RawEdge::deserialize(edge)?;
    Ok(to_record(raw.node))
}

/// Resolve the language of a repository.
///
/// Uses the primary language when it has a name, then the first entry of the
/// language list, then [`UNKNOWN_LANGUAGE`].
pub fn pick_language(repo: &RawRepository) -> String {
    if let Some(name) = repo
        .primary_language
        .as_ref()
        .and_then(|l| l.name.as_deref())
        .filter(|n| !n.is_empty())
    {
        return name.to_string();
    }

    repo.languages
        .as_ref()
        .and_then(|l| l.edges.as_ref())
        .and_then(|edges| edges.first())
        .map(|edge| edge.node.name.clone())
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}

fn to_record(repo: RawRepository) -> RepositoryRecord {
    let primary_language = pick_language(&repo);

    RepositoryRecord {
        name: repo.name,
        owner: repo.owner.login,
        stars: repo.stargazer_count,
        created_at: repo.created_at,
        updated_at: repo.pushed_at,
        primary_language,
        pull_requests: repo.pull_requests.total_count,
        releases: repo.releases.total_count,
        issues: repo.issues.total_count,
        closed_issues: repo.closed.total_count,
    }
}
