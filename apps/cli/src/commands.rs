//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use slovlex_core::{LawTools, ScanProgress};
use slovlex_shared::{
    AppConfig, FetchConfig, LawFetchOutcome, ScanConfig, ScanMatch, ScanOutcome, ScanReport,
    SourceConfig, init_config, init_config_at, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// slovlex: discover and download Slovak laws.
#[derive(Parser)]
#[command(
    name = "slovlex",
    version,
    about = "Download Slovak laws from Slov-Lex and search their titles.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.slovlex/slovlex.toml.
    #[arg(long, env = "SLOVLEX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Download one law's XML and PDF.
    Fetch {
        /// Year of promulgation.
        year: u32,

        /// Law number within the year.
        id: u32,

        /// Directory under which downloads/ is created.
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Search the titles of a year's laws for a keyword.
    Scan {
        /// Year to scan.
        year: u32,

        /// Case-insensitive title substring.
        keyword: String,

        /// Highest law number checked.
        #[arg(short, long)]
        limit: Option<u32>,

        /// Maximum concurrent lookups.
        #[arg(long)]
        concurrency: Option<u32>,

        /// Pause before each lookup, in milliseconds.
        #[arg(long)]
        rate_limit_ms: Option<u64>,

        /// Download every match after the scan.
        #[arg(long)]
        fetch: bool,

        /// Directory under which downloads/ is created (with --fetch).
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

/// Overrides applied on top of the config file.
#[derive(Default)]
struct Overrides {
    root: Option<PathBuf>,
    concurrency: Option<u32>,
    rate_limit_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "slovlex=info",
        1 => "slovlex=debug",
        _ => "slovlex=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Fetch { year, id, root } => {
            let config = resolve_config(config_path)?;
            let overrides = Overrides {
                root,
                ..Overrides::default()
            };
            cmd_fetch(&config, overrides, year, id, cli.json).await
        }
        Command::Scan {
            year,
            keyword,
            limit,
            concurrency,
            rate_limit_ms,
            fetch,
            root,
        } => {
            let config = resolve_config(config_path)?;
            let overrides = Overrides {
                root,
                concurrency,
                rate_limit_ms,
            };
            cmd_scan(&config, overrides, year, &keyword, limit, fetch, cli.json).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn build_tools(config: &AppConfig, overrides: Overrides) -> Result<LawTools> {
    let source = SourceConfig::try_from(config)?;

    let mut fetch = FetchConfig::from(config);
    if let Some(root) = overrides.root {
        fetch.root = root;
    }

    let mut scan = ScanConfig::from(config);
    if let Some(concurrency) = overrides.concurrency {
        scan.concurrency = concurrency.max(1) as usize;
    }
    if let Some(ms) = overrides.rate_limit_ms {
        scan.rate_limit = Duration::from_millis(ms);
    }

    Ok(LawTools::new(source, fetch, scan)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_fetch(
    config: &AppConfig,
    overrides: Overrides,
    year: u32,
    id: u32,
    json: bool,
) -> Result<()> {
    let tools = build_tools(config, overrides)?;
    info!(year, id, root = %tools.fetch_config().root.display(), "fetching law");

    let outcome = tools.fetch_specific_law(year, id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", render_fetch(&outcome));
    }
    Ok(())
}

async fn cmd_scan(
    config: &AppConfig,
    overrides: Overrides,
    year: u32,
    keyword: &str,
    limit: Option<u32>,
    fetch: bool,
    json: bool,
) -> Result<()> {
    let tools = build_tools(config, overrides)?;

    let progress = CliScanProgress::new();
    let report = tools
        .scan_laws_for_keyword(year, keyword, limit, &progress)
        .await;

    let mut fetched = Vec::new();
    if fetch {
        for found in report.outcome.matches() {
            fetched.push(tools.fetch_specific_law(year, found.id).await);
        }
    }

    if json {
        let value = if fetch {
            serde_json::json!({ "scan": report, "fetched": fetched })
        } else {
            serde_json::to_value(&report)?
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", render_scan(&report));
    for outcome in &fetched {
        println!();
        println!("{}", render_fetch(outcome));
    }
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => init_config_at(path)?,
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn render_fetch(outcome: &LawFetchOutcome) -> String {
    match outcome {
        LawFetchOutcome::Fetched(law) => format!(
            "SUCCESS. Law {} downloaded.\nTitle: {}\nArticles: {}\nPDF: {}\nPath: {}",
            law.identity,
            law.summary.title,
            law.summary.article_count,
            law.pdf.filename().unwrap_or("Not Found"),
            law.directory.display(),
        ),
        LawFetchOutcome::NotFound { identity } => {
            format!("Failed to find XML for Law {identity}.")
        }
    }
}

fn render_scan(report: &ScanReport) -> String {
    match &report.outcome {
        ScanOutcome::Matches(matches) => {
            let mut out = format!("Found {} matches:", matches.len());
            for found in matches {
                out.push_str(&format!("\nID {}: {}", found.id, found.title));
            }
            out
        }
        ScanOutcome::NoMatches => format!(
            "No laws found in first {} for '{}'.",
            report.limit, report.keyword
        ),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

const BAR_TEMPLATE: &str = "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}";

/// Scan progress bar drawn on stderr.
struct CliScanProgress {
    bar: ProgressBar,
}

impl CliScanProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }
}

impl ScanProgress for CliScanProgress {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn checked(&self, id: u32, done: usize, _total: usize) {
        self.bar.set_position(done as u64);
        self.bar.set_message(format!("ID {id}"));
    }

    fn matched(&self, found: &ScanMatch) {
        let line = format!("  match  ID {}: {}", found.id, found.title);
        self.bar.println(line);
    }

    fn finished(&self, _report: &ScanReport) {
        self.bar.finish_and_clear();
    }
}
