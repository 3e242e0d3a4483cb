use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/analysis.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extracted text is cut to this many characters before storage.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}
fn default_max_content_chars() -> usize {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    /// Minimum spacing between outbound requests, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_max_urls")]
    pub max_urls: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_feed_max_items")]
    pub feed_max_items: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_urls: default_max_urls(),
            concurrency: default_concurrency(),
            feed_max_items: default_feed_max_items(),
        }
    }
}

fn default_delay_ms() -> u64 {
    1000
}
fn default_max_urls() -> usize {
    10
}
fn default_concurrency() -> usize {
    1
}
fn default_feed_max_items() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Keywords kept per analysis record.
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
    /// Keywords echoed back in a pipeline result.
    #[serde(default = "default_result_keywords")]
    pub result_keywords: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_keywords: default_top_keywords(),
            result_keywords: default_result_keywords(),
        }
    }
}

fn default_top_keywords() -> usize {
    10
}
fn default_result_keywords() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default = "default_server_description")]
    pub description: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            name: default_server_name(),
            description: default_server_description(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7331".to_string()
}
fn default_server_name() -> String {
    "Smart Information Analyzer".to_string()
}
fn default_server_description() -> String {
    "Web page collection with sentiment and keyword analysis".to_string()
}

/// Load the config file at `path`.
///
/// A missing file is not an error: the built-in defaults are used instead.
/// A file that exists but fails to parse or validate is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs must be > 0");
    }
    if config.fetch.max_content_chars == 0 {
        anyhow::bail!("fetch.max_content_chars must be > 0");
    }

    if !(1..=100).contains(&config.batch.max_urls) {
        anyhow::bail!("batch.max_urls must be in [1, 100]");
    }
    if config.batch.concurrency == 0 {
        anyhow::bail!("batch.concurrency must be >= 1");
    }
    if config.batch.feed_max_items == 0 {
        anyhow::bail!("batch.feed_max_items must be >= 1");
    }

    if config.analysis.result_keywords == 0 {
        anyhow::bail!("analysis.result_keywords must be >= 1");
    }
    if config.analysis.top_keywords < config.analysis.result_keywords {
        anyhow::bail!(
            "analysis.top_keywords ({}) must be >= analysis.result_keywords ({})",
            config.analysis.top_keywords,
            config.analysis.result_keywords
        );
    }

    Ok(())
}
