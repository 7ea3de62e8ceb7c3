//! Chart report over a derived table.
//!
//! Every chart in [`CHARTS`] is written as `<slug>.svg` into one output
//! directory. The report also carries the closed-issue summary printed by the
//! analyzer.

pub mod charts;
pub mod questions;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use questions::{CHARTS, Chart, ResearchQuestion};

use crate::analysis::{DerivedTable, Summary};

/// Number of charts in a full report.
pub const CHART_COUNT: usize = CHARTS.len();

/// Errors producing the report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to render {chart}: {message}")]
    Render { chart: &'static str, message: String },
}

/// One chart written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub question: ResearchQuestion,
    pub slug: &'static str,
    pub path: PathBuf,
}

/// What [`render_report`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutput {
    pub charts: Vec<RenderedChart>,
    /// Closed-issue percentage over repositories with at least one issue.
    pub issue_closure: Summary,
}

/// Render every chart into `out_dir`, creating it if needed.
///
/// Existing files with the same names are overwritten. Stops at the first
/// chart that fails.
pub fn render_report(table: &DerivedTable, out_dir: &Path) -> Result<ReportOutput, ReportError> {
    fs::create_dir_all(out_dir).map_err(|source| ReportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut rendered = Vec::with_capacity(CHART_COUNT);
    for chart in &CHARTS {
        let path = out_dir.join(format!("{}.svg", chart.slug));
        (chart.draw)(table, &path).map_err(|e| ReportError::Render {
            chart: chart.slug,
            message: e.to_string(),
        })?;
        tracing::debug!(
            question = %chart.question,
            chart = chart.slug,
            path = %path.display(),
            "Rendered chart"
        );

        rendered.push(RenderedChart {
            question: chart.question,
            slug: chart.slug,
            path,
        });
    }

    Ok(ReportOutput {
        charts: rendered,
        issue_closure: table.issue_closure_summary(),
    })
}

/// The analyzer's one-line closed-issue summary, e.g.
/// `RQ06: n=812, mean=71.25%, median=78.40%`.
pub fn issue_closure_line(summary: &Summary) -> String {
    let pct = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}%"));
    format!(
        "{}: n={}, mean={}, median={}",
        ResearchQuestion::IssueClosure.code(),
        summary.n,
        pct(summary.mean),
        pct(summary.median)
    )
}
