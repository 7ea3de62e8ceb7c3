use std::path::PathBuf;
use std::sync::Arc;

use starlens::{CollectOptions, GitHubClient, collect, table};

use crate::CollectArgs;
use crate::config::Config;
use crate::progress::ProgressReporter;

const MISSING_TOKEN: &str = "GitHub token not configured. Set STARLENS_GITHUB_TOKEN or GITHUB_TOKEN, \
or add `token` under [github] in the config file";

/// Merge command-line flags over the configured defaults.
fn resolve_options(args: &CollectArgs, config: &Config) -> (CollectOptions, PathBuf) {
    let mut options = config.collect_options();
    if let Some(target_count) = args.target_count {
        options.target_count = target_count;
    }
    if let Some(page_size) = args.page_size {
        options.page_size = page_size;
    }
    if let Some(ref query) = args.query {
        options.search_query = query.clone();
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.collect.output.clone());

    (options, output)
}

pub(crate) async fn handle_collect(
    args: CollectArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    run_collect(args, config, config.github_token()).await
}

/// Collect with an already resolved token; a missing token fails first.
async fn run_collect(
    args: CollectArgs,
    config: &Config,
    token: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = token.ok_or(MISSING_TOKEN)?;
    let (options, output) = resolve_options(&args, config);
    options.validate()?;

    let client = GitHubClient::new(&config.github.endpoint, &token)?;

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let result = collect(&client, &options, Some(&callback)).await;
    reporter.finish();
    let records = result?;

    table::write_records(&output, &records)?;
    println!(
        "Saved {} repositories to {}",
        records.len(),
        output.display()
    );

    Ok(())
}
