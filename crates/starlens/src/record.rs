//! The flat repository record shared by the collector and the analyzer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Language placeholder used when neither the primary language nor the
/// language list is available.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// One row per fetched repository.
///
/// Field names serialize in camelCase, which is also the CSV header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRecord {
    pub name: String,
    /// Owner login.
    pub owner: String,
    pub stars: u64,
    pub created_at: DateTime<Utc>,
    /// Time of the last push to the repository.
    pub updated_at: DateTime<Utc>,
    #[serde(deserialize_with = "language_or_unknown")]
    pub primary_language: String,
    pub pull_requests: u64,
    pub releases: u64,
    pub issues: u64,
    pub closed_issues: u64,
}

impl RepositoryRecord {
    #[must_use]
    pub fn has_known_language(&self) -> bool {
        self.primary_language != UNKNOWN_LANGUAGE
    }
}

fn language_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> RepositoryRecord {
        RepositoryRecord {
            name: "react".to_string(),
            owner: "facebook".to_string(),
            stars: 230_000,
            created_at: Utc.with_ymd_and_hms(2013, 5, 24, 16, 15, 54).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap(),
            primary_language: "JavaScript".to_string(),
            pull_requests: 17_000,
            releases: 120,
            issues: 14_000,
            closed_issues: 13_000,
        }
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let json = serde_json::to_value(record()).unwrap();
        let keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        for expected in [
            "name",
            "owner",
            "stars",
            "createdAt",
            "updatedAt",
            "primaryLanguage",
            "pullRequests",
            "releases",
            "issues",
            "closedIssues",
        ] {
            assert!(keys.contains(&expected), "missing {expected}");
        }
        assert_eq!(json["createdAt"], "2013-05-24T16:15:54Z");
    }

    #[test]
    fn null_or_blank_language_reads_as_unknown() {
        let mut json = serde_json::to_value(record()).unwrap();
        json["primaryLanguage"] = serde_json::Value::Null;
        let parsed: RepositoryRecord = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(parsed.primary_language, UNKNOWN_LANGUAGE);
        assert!(!parsed.has_known_language());

        json["primaryLanguage"] = serde_json::json!("  ");
        let parsed: RepositoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.primary_language, UNKNOWN_LANGUAGE);
    }
}
