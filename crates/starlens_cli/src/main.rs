//! Starlens CLI - collect and analyze the most-starred GitHub repositories.

mod commands;
mod config;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starlens")]
#[command(version)]
#[command(about = "Collect and analyze the most-starred GitHub repositories")]
#[command(
    long_about = "Starlens pages through GitHub's GraphQL search to collect the most-starred \
repositories into a CSV file, then derives metrics from that file and renders \
charts answering seven research questions about popular repositories."
)]
#[command(after_long_help = r#"EXAMPLES
    Collect the top 1000 repositories:
        $ starlens collect

    Collect a smaller sample into a custom file:
        $ starlens collect --target-count 100 --page-size 50 --output top100.csv

    Render charts from a collected file:
        $ starlens analyze --input top100.csv --output-dir charts

    Generate shell completions:
        $ starlens completions bash > ~/.local/share/bash-completion/completions/starlens

CONFIGURATION
    Starlens reads configuration from:
      1. ~/.config/starlens/config.toml (or $XDG_CONFIG_HOME/starlens/config.toml)
      2. ./starlens.toml
      3. Environment variables (STARLENS_* prefix, e.g., STARLENS_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    STARLENS_GITHUB_TOKEN     GitHub personal access token
    GITHUB_TOKEN              Fallback when no token is configured
    STARLENS_GITHUB_ENDPOINT  GraphQL endpoint (default: https://api.github.com/graphql)
    STARLENS_COLLECT_OUTPUT   CSV file written by collect (default: repositories.csv)
    STARLENS_ANALYZE_INPUT    CSV file read by analyze (default: repositories.csv)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect the most-starred repositories into a CSV file
    Collect(CollectArgs),
    /// Derive metrics from a CSV file and render charts
    Analyze(AnalyzeArgs),
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Options for `starlens collect`.
#[derive(Debug, Clone, clap::Args)]
struct CollectArgs {
    /// Number of repositories to collect (default from config or 1000)
    #[arg(short = 'n', long)]
    target_count: Option<usize>,

    /// Repositories requested per page, 1-100 (default from config or 25)
    #[arg(short = 'p', long)]
    page_size: Option<usize>,

    /// CSV file to write (default from config or repositories.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// GitHub search string (default from config or "stars:>1 sort:stars-desc")
    #[arg(short, long)]
    query: Option<String>,
}

/// Options for `starlens analyze`.
#[derive(Debug, Clone, clap::Args)]
struct AnalyzeArgs {
    /// CSV file to read (default from config or repositories.csv)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory to write charts into (default from config or charts)
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("starlens=info,starlens_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Collect(args) => commands::collect::handle_collect(args, &config).await,
        Commands::Analyze(args) => commands::analyze::handle_analyze(args, &config),
        Commands::Completions { shell } => commands::meta::handle_completions(shell),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_collect_flags() {
        let cli = Cli::try_parse_from([
            "starlens",
            "collect",
            "--target-count",
            "100",
            "-p",
            "50",
            "--output",
            "top.csv",
        ])
        .unwrap();

        match cli.command {
            Commands::Collect(args) => {
                assert_eq!(args.target_count, Some(100));
                assert_eq!(args.page_size, Some(50));
                assert_eq!(args.output, Some(PathBuf::from("top.csv")));
                assert!(args.query.is_none());
            }
            _ => panic!("expected collect"),
        }
    }

    #[test]
    fn test_collect_without_flags() {
        let cli = Cli::try_parse_from(["starlens", "collect"]).unwrap();
        match cli.command {
            Commands::Collect(args) => {
                assert!(args.target_count.is_none());
                assert!(args.page_size.is_none());
                assert!(args.output.is_none());
            }
            _ => panic!("expected collect"),
        }
    }

    #[test]
    fn test_analyze_flags() {
        let cli =
            Cli::try_parse_from(["starlens", "analyze", "-i", "in.csv", "-d", "plots"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.input, Some(PathBuf::from("in.csv")));
                assert_eq!(args.output_dir, Some(PathBuf::from("plots")));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_non_numeric_target_count_is_rejected() {
        assert!(Cli::try_parse_from(["starlens", "collect", "--target-count", "many"]).is_err());
    }
}
