//! # leakscan
//!
//! Scans a directory or the git index for committed secrets: API keys,
//! access tokens, and user-defined patterns. Exits 1 when secrets are
//! found, 2 on error, 0 on a clean scan.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod files;
mod git;
mod report;
mod scanning;
mod ui;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use clap::{CommandFactory, FromArgMatches, Parser};
use console::style;
use leakscan_core::prelude::*;

use crate::report::{ScanStats, write_output};
use crate::scanning::{configure_thread_pool, run_scan};
use crate::ui::{colors, exit};

const REPO_URL: &str = "https://github.com/leakscan/leakscan";

#[derive(Debug, Parser)]
#[command(name = "leakscan", version, styles = ui::clap_styles())]
struct Cli {
    /// Directory or file to scan.
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Scan only files staged in the git index.
    #[arg(long, conflicts_with = "all")]
    staged: bool,

    /// Scan every file under the root (the default behaviour).
    #[arg(long)]
    all: bool,

    /// Additional path prefixes to ignore.
    #[arg(short, long = "ignore", value_name = "PATH")]
    ignore: Vec<String>,

    /// Additional regex patterns to scan for.
    #[arg(short, long = "pattern", value_name = "REGEX")]
    pattern: Vec<String>,

    /// Built-in detectors to disable by name.
    #[arg(short = 'x', long = "exclude", value_name = "NAME")]
    exclude: Vec<String>,

    /// Path to the configuration file (defaults to `.gitleaksrc.json` in the root).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Write the report to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suppress warnings and informational output.
    #[arg(short, long)]
    quiet: bool,

    /// List the files that would be scanned without scanning them.
    #[arg(long)]
    dry_run: bool,

    /// Number of parallel scanning threads.
    #[arg(long)]
    concurrency: Option<usize>,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

fn main() {
    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).without_time())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let cli = parse_cli();

    if let Err(e) = run(&cli) {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(exit::ERROR);
    }
}

fn parse_cli() -> Cli {
    let cmd = Cli::command().about(build_about()).after_help(build_after_help());

    let matches = cmd.get_matches();

    #[expect(clippy::expect_used, reason = "clap already validated args; this cannot fail")]
    Cli::from_arg_matches(&matches).expect("failed to parse arguments")
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    configure_thread_pool(cli.concurrency)?;

    let start = Instant::now();

    let resolution = resolve_config(cli)?;
    if !cli.quiet {
        for warning in &resolution.warnings {
            ui::print_warning(&warning.to_string());
        }
    }

    let filter = FileFilter::new(&cli.root, &resolution.config)?;
    let candidates = collect_candidates(cli, &resolution.config)?;

    let mut eligible = Vec::with_capacity(candidates.len());
    for path in candidates {
        if filter.is_eligible(&path)? {
            eligible.push(path);
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        candidates = eligible.len(),
        detectors = resolution.config.detectors.len(),
        "eligibility filtering complete"
    );

    if cli.dry_run {
        print_dry_run(cli, &eligible);
        return Ok(());
    }

    let engine = MatchEngine::from_config(&resolution.config)?;

    let show_progress = should_show_progress(cli);
    let records = run_scan(&engine, &eligible, show_progress)?;

    let stats = ScanStats {
        file_count: eligible.len(),
        elapsed: start.elapsed(),
    };
    write_output(cli.output.as_deref(), cli.format, &records, &stats)?;

    if !records.is_empty() {
        std::process::exit(exit::FINDINGS);
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Resolution> {
    let resolver = ConfigResolver::new(PatternRegistry::builtin(), DefaultPolicy::default());
    let overrides = Overrides {
        ignore_paths: cli.ignore.clone(),
        custom_patterns: cli.pattern.clone(),
        exclude_detectors: cli.exclude.clone(),
    };

    match &cli.config {
        Some(path) => {
            // An explicitly named config that does not exist is a user
            // error; only the implicit root lookup may come up empty.
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Ok(resolver.resolve_from_path(path, &overrides)?)
        }
        None => Ok(resolver.resolve_from_root(&cli.root, &overrides)?),
    }
}

fn collect_candidates(cli: &Cli, config: &EffectiveConfig) -> anyhow::Result<Vec<PathBuf>> {
    if !cli.staged {
        return Ok(files::collect_files(&cli.root, &config.ignore_paths));
    }

    let repo = git::LocalRepo::open(&cli.root)?;
    let root_abs = std::fs::canonicalize(&cli.root)
        .with_context(|| format!("cannot resolve scan root '{}'", cli.root.display()))?;

    // Re-anchor staged paths under the user-supplied root so ignore
    // prefixes and report paths stay consistent with directory scans.
    let files = repo
        .staged_files()
        .into_iter()
        .map(|path| match path.strip_prefix(&root_abs) {
            Ok(rel) => cli.root.join(rel),
            Err(_) => path,
        })
        .collect();

    Ok(files)
}

fn print_dry_run(cli: &Cli, eligible: &[PathBuf]) {
    for path in eligible {
        println!("{}", path.display());
    }
    if !cli.quiet {
        ui::print_info(&format!(
            "{} {} would be scanned",
            eligible.len(),
            ui::pluralise_word(eligible.len(), "file", "files")
        ));
    }
}

const fn should_show_progress(cli: &Cli) -> bool {
    !cli.quiet && cli.output.is_none() && matches!(cli.format, OutputFormat::Text)
}

fn build_about() -> String {
    format!(
        r"
  {} finds hardcoded secrets before they reach your repository.

  Scans directories or the git index for API keys, access tokens,
  and custom patterns. Works offline. Zero configuration.",
        colors::accent().apply_to("leakscan").bold()
    )
}

fn build_after_help() -> String {
    format!(
        r"
  {}
    leakscan                       Scan the current directory
    leakscan src/                  Scan a specific directory
    leakscan --staged              Scan files staged in git
    leakscan -f json -o report.json   Write a JSON report
    leakscan -p 'MYAPP_[A-Z0-9]{{16}}'  Add a custom pattern
    leakscan -x genericApiKey      Disable a built-in detector

  Learn more: {}",
        style("Examples:").bold(),
        colors::accent().apply_to(REPO_URL).underlined()
    )
}
