//! reaper - retention enforcement for remote artifact stores
//!
//! The `reaper` command turns declarative retention policies into concrete
//! delete specifications, and executes those specifications against the
//! configured store.
//!
//! ## Commands
//!
//! - `expand`: render policies into specification files for review
//! - `run`: execute specification files (search, then delete)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use reaper_core::{
    execute, expand_policies, DescriptorState, ExecuteOptions, ExpandOptions, ParentRewrite,
    PolicySet, RunReport,
};
use reaper_store::{HttpArtifactStore, StoreConfig};

#[derive(Parser)]
#[command(name = "reaper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Retention enforcement for remote artifact stores", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand retention policies into specification files
    Expand {
        /// Path to the policy configuration file (JSON or TOML)
        config: PathBuf,

        /// Directory to write generated specification files into
        output: PathBuf,

        /// Store base URL (parent-scoped policies search the store)
        #[arg(long, env = "REAPER_SERVER")]
        server: Option<String>,
    },

    /// Execute specification files against the store
    Run {
        /// Specification file, or directory of specification files
        specs: PathBuf,

        /// Search but never delete
        #[arg(long)]
        dry_run: bool,

        /// Recurse into subdirectories when discovering specifications
        #[arg(short, long)]
        recursive: bool,

        /// Worker count for store-communicating steps
        #[arg(long, default_value_t = 3)]
        threads: usize,

        /// Store base URL
        #[arg(long, env = "REAPER_SERVER")]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    reaper_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Expand {
            config,
            output,
            server,
        } => cmd_expand(&config, &output, server.as_deref()).await,
        Commands::Run {
            specs,
            dry_run,
            recursive,
            threads,
            server,
        } => cmd_run(&specs, dry_run, recursive, threads, server.as_deref()).await,
    }
}

fn build_store(server: Option<&str>, threads: Option<usize>) -> Result<HttpArtifactStore> {
    let mut config = match server {
        Some(url) => StoreConfig::new(url),
        None => StoreConfig::from_env(),
    };
    if let Some(threads) = threads {
        config = config.with_threads(threads);
    }
    HttpArtifactStore::new(config).context("Failed to configure store client")
}

/// Expand policies into reviewable specification files
async fn cmd_expand(config: &PathBuf, output: &PathBuf, server: Option<&str>) -> Result<()> {
    info!("Parsing policy configuration");
    let policies = PolicySet::load(config)
        .with_context(|| format!("Failed to load policies from {}", config.display()))?;
    info!(policies = policies.len(), "Loaded policy set");

    let store = build_store(server, None)?;
    let rewrite = ParentRewrite::new()?;
    let options = ExpandOptions {
        output_dir: output.clone(),
    };

    let summary = expand_policies(&policies, &store, &rewrite, &options).await?;

    println!(
        "Expanded {} policies into {} specification files under {}",
        summary.policies,
        summary.files_written,
        output.display()
    );
    Ok(())
}

/// Execute discovered specification files
async fn cmd_run(
    specs: &PathBuf,
    dry_run: bool,
    recursive: bool,
    threads: usize,
    server: Option<&str>,
) -> Result<()> {
    let store = build_store(server, Some(threads))?;
    let options = ExecuteOptions { recursive, dry_run };

    let report = execute(&store, specs, &options).await?;
    print_report(&report, dry_run);

    // A non-empty failure set is the run's single aggregate error.
    report.into_result()?;
    Ok(())
}

fn print_report(report: &RunReport, dry_run: bool) {
    for outcome in &report.outcomes {
        println!(
            "  {} [{}] {}",
            outcome.spec_path.display(),
            outcome.clause,
            describe_outcome(outcome.state, outcome.matched, outcome.deleted)
        );
    }

    if dry_run {
        println!(
            "Dry run: {} descriptor(s) searched, nothing deleted",
            report.outcomes.len()
        );
    } else {
        println!(
            "Deleted {} item(s) across {} descriptor(s), {} failure(s)",
            report.deleted,
            report.outcomes.len(),
            report.failures.len()
        );
    }
}

fn describe_outcome(state: DescriptorState, matched: usize, deleted: u64) -> String {
    match state {
        DescriptorState::Pending => "pending".to_string(),
        DescriptorState::Queried => format!("matched {matched} (dry run)"),
        DescriptorState::Deleted => format!("matched {matched}, deleted {deleted}"),
        DescriptorState::QueryFailed => "search failed".to_string(),
        DescriptorState::DeleteFailed => format!("matched {matched}, delete failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_outcome_states() {
        assert_eq!(
            describe_outcome(DescriptorState::Deleted, 4, 4),
            "matched 4, deleted 4"
        );
        assert_eq!(
            describe_outcome(DescriptorState::Queried, 2, 0),
            "matched 2 (dry run)"
        );
        assert_eq!(describe_outcome(DescriptorState::QueryFailed, 0, 0), "search failed");
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "reaper", "run", "out/", "--dry-run", "-r", "--threads", "8",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                dry_run,
                recursive,
                threads,
                ..
            } => {
                assert!(dry_run);
                assert!(recursive);
                assert_eq!(threads, 8);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_parses_expand_arguments() {
        let cli = Cli::try_parse_from(["reaper", "expand", "retention.json", "out/"]).unwrap();
        match cli.command {
            Commands::Expand { config, output, .. } => {
                assert_eq!(config, PathBuf::from("retention.json"));
                assert_eq!(output, PathBuf::from("out/"));
            }
            _ => panic!("expected expand command"),
        }
    }
}
