//! # Smart Analyzer CLI (`sa`)
//!
//! ```bash
//! sa --config ./config/analyzer.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sa init` | Create the SQLite database and run schema migrations |
//! | `sa analyze <url>` | Fetch, analyze, and store one page |
//! | `sa batch <url>...` | Analyze several pages in order |
//! | `sa feed <url>` | Analyze pages linked from a feed |
//! | `sa history` | Most recent analyses |
//! | `sa sentiment <label>` | Analyses with one label |
//! | `sa keywords` | Keyword rollup across all analyses |
//! | `sa report` | Generate and store a summary report |
//! | `sa stats` | Database overview |
//! | `sa serve` | Start the HTTP tool server |
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use smart_analyzer::config::{self, Config};
use smart_analyzer::store::Store;
use smart_analyzer::tools::{validate_params, ToolContext, ToolRegistry};
use smart_analyzer::{server, stats};

/// Smart Analyzer: fetch web pages, score sentiment and keywords, and
/// aggregate the results.
#[derive(Parser)]
#[command(name = "sa", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// A missing file means all defaults.
    #[arg(long, global = true, default_value = "./config/analyzer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Fetch one URL, analyze it, and store the result.
    Analyze { url: String },

    /// Analyze several URLs in order, throttled.
    Batch {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Analyze the pages linked from a feed or index page.
    Feed {
        url: String,
        /// Linked pages to analyze. Defaults to 10, capped by `batch.feed_max_items`.
        #[arg(long)]
        max_items: Option<u64>,
    },

    /// Show the most recent analyses.
    History {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// List analyses with a sentiment label (positive, negative, neutral).
    Sentiment { label: String },

    /// Roll up keyword counts across every stored analysis.
    Keywords {
        #[arg(long, default_value_t = 0.01)]
        min_frequency: f64,
    },

    /// Generate and store a summary report.
    Report,

    /// Print database statistics.
    Stats,

    /// Start the HTTP tool server on `[server].bind`.
    Serve,
}

impl Commands {
    /// The tool backing this command and its parameters, if any.
    fn as_tool_call(&self) -> Option<(&'static str, Value)> {
        let call = match self {
            Commands::Analyze { url } => ("scrape_and_analyze", json!({ "url": url })),
            Commands::Batch { urls } => ("batch_analyze_urls", json!({ "urls": urls })),
            Commands::Feed { url, max_items } => {
                let mut params = json!({ "rss_url": url });
                if let Some(n) = max_items {
                    params["max_items"] = json!(n);
                }
                ("analyze_rss_feed", params)
            }
            Commands::History { limit } => ("get_analysis_history", json!({ "limit": limit })),
            Commands::Sentiment { label } => ("search_by_sentiment", json!({ "sentiment": label })),
            Commands::Keywords { min_frequency } => (
                "get_keyword_analysis",
                json!({ "min_frequency": min_frequency }),
            ),
            Commands::Report => ("generate_summary_report", json!({})),
            Commands::Init | Commands::Stats | Commands::Serve => return None,
        };
        Some(call)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smart_analyzer=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Validate and execute one tool, printing its JSON output.
async fn run_tool(cfg: &Config, name: &str, params: Value) -> anyhow::Result<()> {
    let registry = ToolRegistry::with_builtins(&cfg.batch);
    let tool = registry
        .find(name)
        .ok_or_else(|| anyhow::anyhow!("no tool registered with name: {}", name))?;
    let params = validate_params(&tool.parameters_schema(), &params)?;

    let ctx = ToolContext::from_config(cfg).await?;
    let result = tool.execute(params, &ctx).await;
    ctx.pipeline.store().close().await;

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    if let Some((name, params)) = cli.command.as_tool_call() {
        return run_tool(&cfg, name, params).await;
    }

    match cli.command {
        Commands::Init => {
            let store = Store::open(&cfg.db.path).await?;
            store.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        _ => {}
    }

    Ok(())
}
