use std::path::Path;

use chrono::{DateTime, Utc};
use starlens::report::issue_closure_line;
use starlens::{derive, render_report, table};

use crate::AnalyzeArgs;
use crate::config::Config;

/// Read the table, render every chart and return the summary line.
fn run_analysis(
    input: &Path,
    output_dir: &Path,
    now: DateTime<Utc>,
) -> Result<String, Box<dyn std::error::Error>> {
    let records = table::read_records(input)?;
    tracing::debug!(rows = records.len(), input = %input.display(), "Loaded repositories");

    let derived = derive(&records, now);
    let report = render_report(&derived, output_dir)?;
    tracing::debug!(
        charts = report.charts.len(),
        output_dir = %output_dir.display(),
        "Charts written"
    );

    Ok(issue_closure_line(&report.issue_closure))
}

pub(crate) fn handle_analyze(
    args: AnalyzeArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = args.input.unwrap_or_else(|| config.analyze.input.clone());
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.analyze.output_dir.clone());

    let line = run_analysis(&input, &output_dir, Utc::now())?;
    println!("{line}");

    Ok(())
}
