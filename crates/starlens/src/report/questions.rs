//! The research questions and the charts that answer them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::charts::{self, DrawResult, Labels};
use crate::analysis::{DerivedRow, DerivedTable, Histogram, StarBucket, median, value_counts};

/// Languages shown in the overall language ranking.
const TOP_RANKED_LANGUAGES: usize = 15;

/// One of the seven questions the report answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResearchQuestion {
    /// RQ01: how old are popular repositories?
    Maturity,
    /// RQ02: do they receive many external contributions?
    PullRequests,
    /// RQ03: do they release often?
    Releases,
    /// RQ04: how recently were they updated?
    UpdateRecency,
    /// RQ05: which languages are they written in?
    Languages,
    /// RQ06: how many of their issues are closed?
    IssueClosure,
    /// RQ07: do the metrics above differ by language?
    LanguageMedians,
}

impl ResearchQuestion {
    pub const ALL: [ResearchQuestion; 7] = [
        ResearchQuestion::Maturity,
        ResearchQuestion::PullRequests,
        ResearchQuestion::Releases,
        ResearchQuestion::UpdateRecency,
        ResearchQuestion::Languages,
        ResearchQuestion::IssueClosure,
        ResearchQuestion::LanguageMedians,
    ];

    /// `RQ01` .. `RQ07`.
    pub fn code(self) -> &'static str {
        match self {
            ResearchQuestion::Maturity => "RQ01",
            ResearchQuestion::PullRequests => "RQ02",
            ResearchQuestion::Releases => "RQ03",
            ResearchQuestion::UpdateRecency => "RQ04",
            ResearchQuestion::Languages => "RQ05",
            ResearchQuestion::IssueClosure => "RQ06",
            ResearchQuestion::LanguageMedians => "RQ07",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ResearchQuestion::Maturity => "Repository maturity",
            ResearchQuestion::PullRequests => "External contributions",
            ResearchQuestion::Releases => "Release frequency",
            ResearchQuestion::UpdateRecency => "Update recency",
            ResearchQuestion::Languages => "Popular languages",
            ResearchQuestion::IssueClosure => "Closed issues",
            ResearchQuestion::LanguageMedians => "Medians by language",
        }
    }
}

impl fmt::Display for ResearchQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.title())
    }
}

/// A chart of the report: its question, file stem and drawing function.
#[derive(Clone, Copy)]
pub struct Chart {
    pub question: ResearchQuestion,
    pub slug: &'static str,
    pub draw: fn(&DerivedTable, &Path) -> DrawResult,
}

impl fmt::Debug for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chart")
            .field("question", &self.question)
            .field("slug", &self.slug)
            .finish()
    }
}

const fn chart(
    question: ResearchQuestion,
    slug: &'static str,
    draw: fn(&DerivedTable, &Path) -> DrawResult,
) -> Chart {
    Chart {
        question,
        slug,
        draw,
    }
}

use ResearchQuestion::{
    IssueClosure, LanguageMedians, Languages, Maturity, PullRequests, Releases, UpdateRecency,
};

/// Every chart of the report, in rendering order.
pub const CHARTS: [Chart; 23] = [
    chart(Maturity, "rq01_hist_age", rq01_hist_age),
    chart(Maturity, "rq01_box_age", rq01_box_age),
    chart(Maturity, "rq01_line_created_per_year", rq01_line_created_per_year),
    chart(Maturity, "rq01_box_age_by_language", rq01_box_age_by_language),
    chart(PullRequests, "rq02_scatter_stars_vs_prs", rq02_scatter_stars_vs_prs),
    chart(PullRequests, "rq02_box_prs_by_language", rq02_box_prs_by_language),
    chart(PullRequests, "rq02_hist_prs", rq02_hist_prs),
    chart(Releases, "rq03_hist_releases", rq03_hist_releases),
    chart(Releases, "rq03_scatter_stars_vs_releases", rq03_scatter_stars_vs_releases),
    chart(Releases, "rq03_box_releases_by_language", rq03_box_releases_by_language),
    chart(
        UpdateRecency,
        "rq04_line_median_days_since_update_by_year",
        rq04_line_median_days_since_update_by_year,
    ),
    chart(
        UpdateRecency,
        "rq04_violin_days_since_update_by_language",
        rq04_violin_days_since_update_by_language,
    ),
    chart(UpdateRecency, "rq04_hist_days_since_update", rq04_hist_days_since_update),
    chart(Languages, "rq05_bar_top15_languages", rq05_bar_top15_languages),
    chart(
        Languages,
        "rq05_stacked_language_by_star_bucket",
        rq05_stacked_language_by_star_bucket,
    ),
    chart(
        Languages,
        "rq05_heatmap_language_star_bucket",
        rq05_heatmap_language_star_bucket,
    ),
    chart(Languages, "rq05_bar_repos_per_star_bucket", rq05_bar_repos_per_star_bucket),
    chart(IssueClosure, "rq06_hist_closed_issues_pct", rq06_hist_closed_issues_pct),
    chart(
        IssueClosure,
        "rq06_box_closed_issues_pct_by_language",
        rq06_box_closed_issues_pct_by_language,
    ),
    chart(
        IssueClosure,
        "rq06_scatter_stars_vs_closed_issues_pct",
        rq06_scatter_stars_vs_closed_issues_pct,
    ),
    chart(LanguageMedians, "rq07_bar_median_prs_by_language", rq07_bar_median_prs_by_language),
    chart(
        LanguageMedians,
        "rq07_bar_median_releases_by_language",
        rq07_bar_median_releases_by_language,
    ),
    chart(
        LanguageMedians,
        "rq07_bar_median_days_since_update_by_language",
        rq07_bar_median_days_since_update_by_language,
    ),
];

// ---------- Column selection ----------

fn column<F>(table: &DerivedTable, value: F) -> Vec<f64>
where
    F: Fn(&DerivedRow) -> Option<f64>,
{
    table.rows.iter().filter_map(value).collect()
}

fn pairs<F>(table: &DerivedTable, value: F) -> Vec<(f64, f64)>
where
    F: Fn(&DerivedRow) -> Option<f64>,
{
    table
        .rows
        .iter()
        .filter_map(|r| value(r).map(|v| (r.record.stars as f64, v)))
        .collect()
}

/// Values per top language, in ranking order. `"Unknown"` is left out.
pub fn by_language<F>(table: &DerivedTable, value: F) -> Vec<(String, Vec<f64>)>
where
    F: Fn(&DerivedRow) -> Option<f64>,
{
    table
        .group_by_top_language()
        .into_iter()
        .map(|(lang, rows)| {
            let values = rows.into_iter().filter_map(&value).collect();
            (lang.to_string(), values)
        })
        .collect()
}

/// Median per top language; languages without values are dropped.
pub fn median_by_language<F>(table: &DerivedTable, value: F) -> Vec<(String, f64)>
where
    F: Fn(&DerivedRow) -> Option<f64>,
{
    by_language(table, value)
        .into_iter()
        .filter_map(|(lang, values)| median(values).map(|m| (lang, m)))
        .collect()
}

/// Repository counts per (top language, star bucket). Rows follow
/// `table.top_languages`, columns follow [`StarBucket::ALL`].
pub fn language_star_bucket_matrix(table: &DerivedTable) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0usize; StarBucket::ALL.len()]; table.top_languages.len()];
    for row in table.top_language_rows() {
        if let Some(r) = table.top_languages.iter().position(|l| *l == row.lang_top8) {
            matrix[r][row.star_bucket.index()] += 1;
        }
    }
    matrix
}

fn bucket_labels() -> Vec<String> {
    StarBucket::ALL.iter().map(|b| b.label().to_string()).collect()
}

fn age(row: &DerivedRow) -> Option<f64> {
    Some(row.age_years)
}

fn pull_requests(row: &DerivedRow) -> Option<f64> {
    Some(row.record.pull_requests as f64)
}

fn releases(row: &DerivedRow) -> Option<f64> {
    Some(row.record.releases as f64)
}

fn days_since_update(row: &DerivedRow) -> Option<f64> {
    Some(row.days_since_update as f64)
}

fn closed_issues_pct(row: &DerivedRow) -> Option<f64> {
    row.percent_issues_closed.map(|ratio| ratio * 100.0)
}

// ---------- RQ01 ----------

fn rq01_hist_age(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::histogram(
        path,
        &Labels::new("RQ01: Repository age", "Age (years)", "Repositories"),
        &Histogram::new(column(table, age), 30),
    )
}

fn rq01_box_age(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::boxplots(
        path,
        &Labels::new("RQ01: Repository age", "", "Age (years)"),
        &[("All repositories".to_string(), column(table, age))],
    )
}

fn rq01_line_created_per_year(table: &DerivedTable, path: &Path) -> DrawResult {
    let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
    for row in &table.rows {
        *per_year.entry(row.created_year()).or_default() += 1;
    }
    let points: Vec<(i32, f64)> = per_year.into_iter().map(|(y, n)| (y, n as f64)).collect();

    charts::line(
        path,
        &Labels::new("RQ01: Repositories by creation year", "Year", "Repositories"),
        &points,
    )
}

fn rq01_box_age_by_language(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::boxplots(
        path,
        &Labels::new("RQ01: Age by language", "Language (top 8)", "Age (years)"),
        &by_language(table, age),
    )
}

// ---------- RQ02 ----------

fn rq02_scatter_stars_vs_prs(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::scatter(
        path,
        &Labels::new("RQ02: Stars vs merged pull requests", "Stars", "Pull requests"),
        &pairs(table, pull_requests),
    )
}

fn rq02_box_prs_by_language(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::boxplots(
        path,
        &Labels::new("RQ02: Pull requests by language", "Language (top 8)", "Pull requests"),
        &by_language(table, pull_requests),
    )
}

fn rq02_hist_prs(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::histogram(
        path,
        &Labels::new("RQ02: Merged pull requests", "Pull requests", "Repositories"),
        &Histogram::new(column(table, pull_requests), 40),
    )
}

// ---------- RQ03 ----------

fn rq03_hist_releases(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::histogram(
        path,
        &Labels::new("RQ03: Releases", "Releases", "Repositories"),
        &Histogram::new(column(table, releases), 40),
    )
}

fn rq03_scatter_stars_vs_releases(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::scatter(
        path,
        &Labels::new("RQ03: Stars vs releases", "Stars", "Releases"),
        &pairs(table, releases),
    )
}

fn rq03_box_releases_by_language(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::boxplots(
        path,
        &Labels::new("RQ03: Releases by language", "Language (top 8)", "Releases"),
        &by_language(table, releases),
    )
}

// ---------- RQ04 ----------

fn rq04_line_median_days_since_update_by_year(table: &DerivedTable, path: &Path) -> DrawResult {
    let mut per_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for row in &table.rows {
        per_year
            .entry(row.updated_year())
            .or_default()
            .push(row.days_since_update as f64);
    }
    let points: Vec<(i32, f64)> = per_year
        .into_iter()
        .filter_map(|(year, days)| median(days).map(|m| (year, m)))
        .collect();

    charts::line(
        path,
        &Labels::new(
            "RQ04: Median days without update, by year of last push",
            "Year of last push",
            "Median days",
        ),
        &points,
    )
}

fn rq04_violin_days_since_update_by_language(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::violins(
        path,
        &Labels::new(
            "RQ04: Days since last push by language",
            "Language (top 8)",
            "Days since last push",
        ),
        &by_language(table, days_since_update),
    )
}

fn rq04_hist_days_since_update(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::histogram(
        path,
        &Labels::new("RQ04: Days since last push", "Days", "Repositories"),
        &Histogram::new(column(table, days_since_update), 30),
    )
}

// ---------- RQ05 ----------

fn rq05_bar_top15_languages(table: &DerivedTable, path: &Path) -> DrawResult {
    let ranking: Vec<(String, f64)> = value_counts(
        table
            .rows
            .iter()
            .filter(|r| r.record.has_known_language())
            .map(|r| r.record.primary_language.as_str()),
    )
    .into_iter()
    .take(TOP_RANKED_LANGUAGES)
    .map(|(lang, n)| (lang, n as f64))
    .collect();

    charts::bars(
        path,
        &Labels::new("RQ05: Top 15 languages", "Language", "Repositories"),
        &ranking,
    )
}

fn rq05_stacked_language_by_star_bucket(table: &DerivedTable, path: &Path) -> DrawResult {
    let matrix = language_star_bucket_matrix(table);
    let series: Vec<(String, Vec<f64>)> = StarBucket::ALL
        .iter()
        .map(|bucket| {
            let heights = matrix
                .iter()
                .map(|row| row[bucket.index()] as f64)
                .collect();
            (bucket.label().to_string(), heights)
        })
        .collect();

    charts::stacked_bars(
        path,
        &Labels::new("RQ05: Language by star range", "Language (top 8)", "Repositories"),
        &table.top_languages,
        &series,
    )
}

fn rq05_heatmap_language_star_bucket(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::heatmap(
        path,
        &Labels::new("RQ05: Language by star range", "Stars", "Language"),
        &table.top_languages,
        &bucket_labels(),
        &language_star_bucket_matrix(table),
    )
}

fn rq05_bar_repos_per_star_bucket(table: &DerivedTable, path: &Path) -> DrawResult {
    let mut counts = [0usize; StarBucket::ALL.len()];
    for row in &table.rows {
        counts[row.star_bucket.index()] += 1;
    }
    let bars: Vec<(String, f64)> = StarBucket::ALL
        .iter()
        .map(|b| (b.label().to_string(), counts[b.index()] as f64))
        .collect();

    charts::bars(
        path,
        &Labels::new("RQ05: Repositories per star range", "Stars", "Repositories"),
        &bars,
    )
}

// ---------- RQ06 ----------

fn rq06_hist_closed_issues_pct(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::histogram(
        path,
        &Labels::new("RQ06: Closed issues", "Closed issues (%)", "Repositories"),
        &Histogram::new(column(table, closed_issues_pct), 20),
    )
}

fn rq06_box_closed_issues_pct_by_language(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::boxplots(
        path,
        &Labels::new(
            "RQ06: Closed issues by language",
            "Language (top 8)",
            "Closed issues (%)",
        ),
        &by_language(table, closed_issues_pct),
    )
}

fn rq06_scatter_stars_vs_closed_issues_pct(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::scatter(
        path,
        &Labels::new("RQ06: Stars vs closed issues", "Stars", "Closed issues (%)"),
        &pairs(table, closed_issues_pct),
    )
}

// ---------- RQ07 ----------

fn rq07_bar_median_prs_by_language(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::bars(
        path,
        &Labels::new("RQ07: Median pull requests by language", "Language", "Median pull requests"),
        &median_by_language(table, pull_requests),
    )
}

fn rq07_bar_median_releases_by_language(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::bars(
        path,
        &Labels::new("RQ07: Median releases by language", "Language", "Median releases"),
        &median_by_language(table, releases),
    )
}

fn rq07_bar_median_days_since_update_by_language(table: &DerivedTable, path: &Path) -> DrawResult {
    charts::bars(
        path,
        &Labels::new(
            "RQ07: Median days since last push by language",
            "Language",
            "Median days",
        ),
        &median_by_language(table, days_since_update),
    )
}
