//! Derived columns computed from the persisted table.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};

use super::stats::{Summary, value_counts};
use crate::record::{RepositoryRecord, UNKNOWN_LANGUAGE};

/// Number of languages kept by name in [`DerivedRow::lang_top8`].
pub const TOP_LANGUAGE_COUNT: usize = 8;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_YEAR: f64 = 365.0 * 86_400.0;

/// Star-count range of a repository. Each bucket includes its lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StarBucket {
    Under1k,
    From1kTo5k,
    From5kTo10k,
    From10kTo25k,
    From25kTo50k,
    From50kTo100k,
    Over100k,
}

impl StarBucket {
    /// Every bucket in ascending order.
    pub const ALL: [StarBucket; 7] = [
        StarBucket::Under1k,
        StarBucket::From1kTo5k,
        StarBucket::From5kTo10k,
        StarBucket::From10kTo25k,
        StarBucket::From25kTo50k,
        StarBucket::From50kTo100k,
        StarBucket::Over100k,
    ];

    pub fn from_stars(stars: u64) -> Self {
        match stars {
            0..1_000 => StarBucket::Under1k,
            1_000..5_000 => StarBucket::From1kTo5k,
            5_000..10_000 => StarBucket::From5kTo10k,
            10_000..25_000 => StarBucket::From10kTo25k,
            25_000..50_000 => StarBucket::From25kTo50k,
            50_000..100_000 => StarBucket::From50kTo100k,
            _ => StarBucket::Over100k,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StarBucket::Under1k => "<1k",
            StarBucket::From1kTo5k => "1k-5k",
            StarBucket::From5kTo10k => "5k-10k",
            StarBucket::From10kTo25k => "10k-25k",
            StarBucket::From25kTo50k => "25k-50k",
            StarBucket::From50kTo100k => "50k-100k",
            StarBucket::Over100k => "100k+",
        }
    }

    /// Position in [`StarBucket::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StarBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A record plus the columns the report needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub record: RepositoryRecord,
    /// Years since creation, 365-day years.
    pub age_years: f64,
    /// Whole days since the last push, rounded down.
    pub days_since_update: i64,
    /// The primary language when it ranks among the most frequent ones,
    /// otherwise `"Unknown"`.
    pub lang_top8: String,
    pub star_bucket: StarBucket,
    /// `closed_issues / issues` in `[0, 1]`; `None` for repositories without
    /// issues.
    pub percent_issues_closed: Option<f64>,
}

impl DerivedRow {
    pub fn has_top_language(&self) -> bool {
        self.lang_top8 != UNKNOWN_LANGUAGE
    }

    pub fn created_year(&self) -> i32 {
        self.record.created_at.year()
    }

    pub fn updated_year(&self) -> i32 {
        self.record.updated_at.year()
    }
}

/// The derived view of a whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable {
    /// The single "now" every time-based column was computed against.
    pub reference_time: DateTime<Utc>,
    /// Most frequent known languages, most frequent first.
    pub top_languages: Vec<String>,
    /// One row per record, in input order.
    pub rows: Vec<DerivedRow>,
}

impl DerivedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose language is one of [`DerivedTable::top_languages`].
    pub fn top_language_rows(&self) -> impl Iterator<Item = &DerivedRow> {
        self.rows.iter().filter(|r| r.has_top_language())
    }

    /// Rows grouped by top language, in [`DerivedTable::top_languages`] order.
    /// Languages with no rows are kept with an empty group.
    pub fn group_by_top_language(&self) -> Vec<(&str, Vec<&DerivedRow>)> {
        self.top_languages
            .iter()
            .map(|lang| {
                let rows = self
                    .rows
                    .iter()
                    .filter(|r| r.lang_top8 == *lang)
                    .collect();
                (lang.as_str(), rows)
            })
            .collect()
    }

    /// Closed-issue percentage (0 to 100) over repositories that have issues.
    pub fn issue_closure_summary(&self) -> Summary {
        Summary::of(
            self.rows
                .iter()
                .filter_map(|r| r.percent_issues_closed)
                .map(|ratio| ratio * 100.0),
        )
    }
}

/// Derive the analysis columns with the default top-language cut-off.
pub fn derive(records: &[RepositoryRecord], now: DateTime<Utc>) -> DerivedTable {
    derive_with(records, now, TOP_LANGUAGE_COUNT)
}

/// Derive the analysis columns keeping `top_n` languages by name.
///
/// Languages are ranked by repository count over the whole table, ignoring
/// `"Unknown"`; equal counts rank alphabetically.
pub fn derive_with(records: &[RepositoryRecord], now: DateTime<Utc>, top_n: usize) -> DerivedTable {
    let top_languages: Vec<String> = value_counts(
        records
            .iter()
            .filter(|r| r.has_known_language())
            .map(|r| r.primary_language.as_str()),
    )
    .into_iter()
    .take(top_n)
    .map(|(lang, _)| lang)
    .collect();

    let rows = records
        .iter()
        .map(|record| derive_row(record, now, &top_languages))
        .collect();

    DerivedTable {
        reference_time: now,
        top_languages,
        rows,
    }
}

fn derive_row(record: &RepositoryRecord, now: DateTime<Utc>, top_languages: &[String]) -> DerivedRow {
    let age_seconds = (now - record.created_at).num_seconds();
    let idle_seconds = (now - record.updated_at).num_seconds();

    let lang_top8 = if top_languages.contains(&record.primary_language) {
        record.primary_language.clone()
    } else {
        UNKNOWN_LANGUAGE.to_string()
    };

    let percent_issues_closed =
        (record.issues > 0).then(|| record.closed_issues as f64 / record.issues as f64);

    DerivedRow {
        record: record.clone(),
        age_years: age_seconds as f64 / SECONDS_PER_YEAR,
        days_since_update: idle_seconds.div_euclid(SECONDS_PER_DAY),
        lang_top8,
        star_bucket: StarBucket::from_stars(record.stars),
        percent_issues_closed,
    }
}
