//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use pagelens_core::{build_registry, run_report};
use pagelens_fetcher::HttpFetcher;
use pagelens_generator::OpenRouterGenerator;
use pagelens_pipeline::{RunObserver, RunResult};
use pagelens_shared::{AppConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PageLens — enriched readable-text reports for web pages.
#[derive(Parser)]
#[command(
    name = "pagelens",
    version,
    about = "Fetch a web page and produce an AI-enriched readable-text report.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Fetch a page and produce its enriched report.
    Report {
        /// Page URL to report on.
        url: String,

        /// Model to use, overriding the configured default.
        #[arg(short, long)]
        model: Option<String>,

        /// Print the raw run result as JSON instead of the readable report.
        #[arg(long)]
        json: bool,
    },

    /// List the registered pipelines.
    Pipelines,

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

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pagelens=info",
        1 => "pagelens=debug",
        _ => "pagelens=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Report { url, model, json } => cmd_report(&url, model.as_deref(), json).await,
        Command::Pipelines => cmd_pipelines().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// report
// ---------------------------------------------------------------------------

async fn cmd_report(url: &str, model: Option<&str>, json: bool) -> Result<()> {
    let mut config = load_config()?;
    if let Some(model) = model {
        config.openrouter.default_model = model.to_string();
    }

    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(
        config.defaults.timeout_secs,
    ))?);
    let generator = Arc::new(OpenRouterGenerator::from_config(&config)?);
    let registry = build_registry(fetcher, generator, &config.defaults)
        .map_err(|e| eyre!("pipeline setup failed: {e}"))?;

    info!(url, model = %config.openrouter.default_model, "running report");

    let progress = CliProgress::new();
    let result = run_report(&registry, url, &progress).await;
    progress.finish();

    if json {
        println!("{}", serde_json::to_string_pretty(&result.to_json())?);
        return match result {
            RunResult::Success(_) | RunResult::Suspended(_) => Ok(()),
            RunResult::Failed(error) => Err(eyre!(error)),
        };
    }

    match result {
        RunResult::Success(report) => {
            print_report(&report);
            Ok(())
        }
        RunResult::Failed(error) => Err(eyre!(error)),
        RunResult::Suspended(checkpoint) => {
            println!(
                "Run suspended before stage {} of '{}'.",
                checkpoint.next_stage, checkpoint.pipeline
            );
            Ok(())
        }
    }
}

fn print_report(report: &serde_json::Value) {
    let field = |name: &str| report.get(name).and_then(|v| v.as_str()).unwrap_or("");

    println!();
    println!("  {}", field("title"));
    println!("  {}", field("url"));
    println!();

    if report.get("success").and_then(|v| v.as_bool()) != Some(true) {
        println!("  The report is incomplete:");
        println!("  {}", field("content"));
        println!("  {}", field("aiSummary"));
        println!();
        return;
    }

    println!("  Summary");
    println!("  {}", field("aiSummary"));
    println!();

    if let Some(points) = report.get("keyPoints").and_then(|v| v.as_array()) {
        println!("  Key points");
        for point in points {
            println!("  - {}", point.as_str().unwrap_or(""));
        }
        println!();
    }

    if let Some(words) = report.get("wordList").and_then(|v| v.as_array()) {
        if !words.is_empty() {
            println!("  Vocabulary");
            for word in words {
                let get = |name: &str| word.get(name).and_then(|v| v.as_str()).unwrap_or("");
                println!("  {} ({}) — {}", get("kanji"), get("reading"), get("meaning"));
            }
            println!();
        }
    }

    println!(
        "  Excerpt: {}",
        report.get("basicSummary").and_then(|v| v.as_str()).unwrap_or("")
    );
    println!(
        "  Characters: {}",
        report.get("wordCount").and_then(|v| v.as_u64()).unwrap_or(0)
    );
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress observer
// ---------------------------------------------------------------------------

/// Spinner-backed progress observer using indicatif.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl RunObserver for CliProgress {
    fn stage_started(&self, _pipeline: &str, stage: &str, index: usize, total: usize) {
        self.spinner
            .set_message(format!("[{}/{total}] {stage}", index + 1));
    }

    fn stage_completed(&self, stage: &str, soft_ok: bool) {
        if !soft_ok {
            self.spinner.println(format!("  {stage}: reported a failure"));
        }
    }
}

// ---------------------------------------------------------------------------
// pipelines / config
// ---------------------------------------------------------------------------

async fn cmd_pipelines() -> Result<()> {
    // Listing needs no live collaborators; wire stubs that are never called.
    struct NoFetch;
    struct NoGenerate;

    #[async_trait::async_trait]
    impl pagelens_fetcher::ContentFetcher for NoFetch {
        async fn fetch(&self, url: &str) -> pagelens_shared::PageContent {
            pagelens_shared::PageContent::failure(url, "fetcher not configured")
        }
    }

    #[async_trait::async_trait]
    impl pagelens_generator::TextGenerator for NoGenerate {
        async fn generate(
            &self,
            _prompt: &str,
            _requested: &pagelens_contract::Contract,
        ) -> pagelens_shared::Result<serde_json::Value> {
            Err(pagelens_shared::PageLensError::Generation(
                "generator not configured".into(),
            ))
        }
    }

    let config = load_config()?;
    let registry = build_registry(Arc::new(NoFetch), Arc::new(NoGenerate), &config.defaults)
        .map_err(|e| eyre!("pipeline setup failed: {e}"))?;

    for name in registry.names() {
        let definition = registry.resolve(name).map_err(|e| eyre!(e))?;
        println!("{name}  —  {}", definition.description);
        for (index, stage) in definition.stages.iter().enumerate() {
            println!("  {}. {}", index + 1, stage.name());
        }
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
