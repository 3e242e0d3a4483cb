//! Named tool calls over the analyzer.
//!
//! Every operation the HTTP server exposes is a [`Tool`]: a name, a JSON
//! Schema for its parameters, and an async `execute`. Parameters are checked
//! by [`validate_params`] before `execute` runs, so the pipeline only ever
//! sees validated input.
//!
//! # Built-in tools
//!
//! | Tool | Operation |
//! |------|-----------|
//! | `scrape_and_analyze` | fetch + analyze one URL |
//! | `batch_analyze_urls` | up to `batch.max_urls` URLs, throttled, in order |
//! | `get_analysis_history` | most recent analyses |
//! | `search_by_sentiment` | analyses with one label, by score |
//! | `get_keyword_analysis` | keyword rollup across documents |
//! | `generate_summary_report` | persist and return a statistics snapshot |
//! | `analyze_rss_feed` | analyze links found on a feed page |
//! | `get_server_info` | name, version, database path |

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::aggregate::Aggregator;
use crate::analyze::Analyzer;
use crate::config::{BatchConfig, Config};
use crate::error::Error;
use crate::fetch::Fetcher;
use crate::pipeline::{Pipeline, PipelineResult};
use crate::store::Store;

/// A named operation callable through `POST /tools/{name}`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route name, lowercase with underscores.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema (`type: "object"`) for the parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute with parameters that already passed [`validate_params`].
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Tool metadata returned by `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Shared handles every tool executes against.
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
    pub aggregator: Arc<Aggregator>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, pipeline: Arc<Pipeline>, aggregator: Arc<Aggregator>) -> Self {
        Self {
            config,
            pipeline,
            aggregator,
        }
    }

    /// Open the store and wire an HTTP-backed pipeline from `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = Store::open(&config.db.path).await?;
        let fetcher = Fetcher::from_config(&config.fetch)?;
        Ok(Self::with_fetcher(config, store, fetcher))
    }

    /// Wire a pipeline around an already-open store and a given fetcher.
    pub fn with_fetcher(config: &Config, store: Store, fetcher: Fetcher) -> Self {
        let analyzer = Analyzer::new().top_keywords(config.analysis.top_keywords);
        let pipeline = Pipeline::new(
            fetcher,
            analyzer,
            store.clone(),
            &config.batch,
            &config.analysis,
        );
        Self::new(
            Arc::new(config.clone()),
            Arc::new(pipeline),
            Arc::new(Aggregator::new(store)),
        )
    }
}

/// Check `params` against `schema` and fill in schema defaults.
///
/// Supports `required`, `type`, `enum`, `minimum`/`maximum`,
/// `minItems`/`maxItems`, `format: "uri"`, and `items` for arrays.
pub fn validate_params(schema: &Value, params: &Value) -> std::result::Result<Value, Error> {
    let params_obj = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => {
            return Err(Error::validation(format!(
                "parameters must be an object, got {}",
                json_type_name(other)
            )))
        }
    };

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    for req_field in &required {
        if !params_obj.contains_key(*req_field) {
            return Err(Error::validation(format!(
                "missing required parameter: {}",
                req_field
            )));
        }
    }

    let mut result = params_obj.clone();
    for (prop_name, prop_schema) in &properties {
        match params_obj.get(prop_name) {
            Some(value) => check_value(prop_name, prop_schema, value)?,
            None => {
                if let Some(default) = prop_schema.get("default") {
                    result.insert(prop_name.clone(), default.clone());
                }
            }
        }
    }

    Ok(Value::Object(result))
}

fn check_value(name: &str, schema: &Value, value: &Value) -> std::result::Result<(), Error> {
    if let Some(expected_type) = schema.get("type").and_then(|t| t.as_str()) {
        let type_ok = match expected_type {
            "string" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            _ => true,
        };
        if !type_ok {
            return Err(Error::validation(format!(
                "parameter '{}' must be of type '{}', got {}",
                name,
                expected_type,
                json_type_name(value)
            )));
        }
    }

    if let Some(enum_values) = schema.get("enum").and_then(|e| e.as_array()) {
        if !enum_values.contains(value) {
            let allowed: Vec<String> = enum_values.iter().map(|v| v.to_string()).collect();
            return Err(Error::validation(format!(
                "parameter '{}' must be one of [{}], got {}",
                name,
                allowed.join(", "),
                value
            )));
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(|m| m.as_f64()) {
            if n < min {
                return Err(Error::validation(format!(
                    "parameter '{}' must be >= {}, got {}",
                    name, min, value
                )));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(|m| m.as_f64()) {
            if n > max {
                return Err(Error::validation(format!(
                    "parameter '{}' must be <= {}, got {}",
                    name, max, value
                )));
            }
        }
    }

    if schema.get("format").and_then(|f| f.as_str()) == Some("uri") {
        if let Some(s) = value.as_str() {
            url::Url::parse(s).map_err(|e| {
                Error::validation(format!("parameter '{}' is not a valid URL: {}", name, e))
            })?;
        }
    }

    if let Some(items) = value.as_array() {
        if let Some(min) = schema.get("minItems").and_then(|m| m.as_u64()) {
            if (items.len() as u64) < min {
                return Err(Error::validation(format!(
                    "parameter '{}' needs at least {} items, got {}",
                    name,
                    min,
                    items.len()
                )));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(|m| m.as_u64()) {
            if items.len() as u64 > max {
                return Err(Error::validation(format!(
                    "parameter '{}' allows at most {} items, got {}",
                    name,
                    max,
                    items.len()
                )));
            }
        }
        if let Some(item_schema) = schema.get("items") {
            for (i, item) in items.iter().enumerate() {
                check_value(&format!("{}[{}]", name, i), item_schema, item)?;
            }
        }
    }

    Ok(())
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serialize a pipeline result with a top-level `success` flag.
fn outcome_json(result: &PipelineResult) -> Result<Value> {
    let mut value = serde_json::to_value(result)?;
    if let Value::Object(map) = &mut value {
        map.insert("success".to_string(), Value::Bool(result.is_success()));
    }
    Ok(value)
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params[key]
        .as_str()
        .ok_or_else(|| Error::validation(format!("{} must be a string", key)).into())
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

pub struct ScrapeAndAnalyzeTool;

#[async_trait]
impl Tool for ScrapeAndAnalyzeTool {
    fn name(&self) -> &str {
        "scrape_and_analyze"
    }

    fn description(&self) -> &str {
        "Fetch a URL, analyze its text, and store the result"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "format": "uri", "description": "Page to analyze" }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let url = str_param(&params, "url")?;
        let result = ctx.pipeline.analyze_url(url).await;
        outcome_json(&result)
    }
}

/// Feed page count used when the caller does not pass `max_items`.
pub const DEFAULT_FEED_ITEMS: usize = 10;

pub struct BatchAnalyzeTool {
    max_urls: usize,
}

impl BatchAnalyzeTool {
    /// Accepts at most `batch.max_urls` URLs.
    pub fn new(batch: &BatchConfig) -> Self {
        Self {
            max_urls: batch.max_urls,
        }
    }
}

#[async_trait]
impl Tool for BatchAnalyzeTool {
    fn name(&self) -> &str {
        "batch_analyze_urls"
    }

    fn description(&self) -> &str {
        "Analyze several URLs in order, throttling requests"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "urls": {
                    "type": "array",
                    "items": { "type": "string", "format": "uri" },
                    "maxItems": self.max_urls,
                    "description": format!("URLs to analyze (at most {})", self.max_urls)
                }
            },
            "required": ["urls"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let urls: Vec<String> = serde_json::from_value(params["urls"].clone())
            .map_err(|e| Error::validation(format!("urls: {}", e)))?;
        let report = ctx.pipeline.analyze_batch(&urls).await?;

        let results: Vec<Value> = report
            .results
            .iter()
            .map(|item| -> Result<Value> {
                Ok(json!({ "url": item.url, "result": outcome_json(&item.result)? }))
            })
            .collect::<Result<_>>()?;

        Ok(json!({
            "success": true,
            "total_urls": report.total,
            "successful": report.successful,
            "failed": report.failed,
            "results": results,
        }))
    }
}

pub struct HistoryTool;

#[async_trait]
impl Tool for HistoryTool {
    fn name(&self) -> &str {
        "get_analysis_history"
    }

    fn description(&self) -> &str {
        "List the most recent analyses"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 100,
                    "default": 10,
                    "description": "Number of entries"
                }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let limit = params["limit"].as_i64().unwrap_or(10);
        let history = ctx.pipeline.store().history(limit).await?;
        Ok(json!({ "success": true, "count": history.len(), "history": history }))
    }
}

pub struct SentimentSearchTool;

#[async_trait]
impl Tool for SentimentSearchTool {
    fn name(&self) -> &str {
        "search_by_sentiment"
    }

    fn description(&self) -> &str {
        "List analyses with a given sentiment label, highest score first"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sentiment": {
                    "type": "string",
                    "enum": ["positive", "negative", "neutral"],
                    "description": "Sentiment label"
                }
            },
            "required": ["sentiment"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let label = str_param(&params, "sentiment")?.parse()?;
        let results = ctx.pipeline.store().by_sentiment(label).await?;
        Ok(json!({
            "success": true,
            "sentiment": label,
            "count": results.len(),
            "results": results,
        }))
    }
}

pub struct KeywordAnalysisTool;

#[async_trait]
impl Tool for KeywordAnalysisTool {
    fn name(&self) -> &str {
        "get_keyword_analysis"
    }

    fn description(&self) -> &str {
        "Top keywords across all stored analyses"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "min_frequency": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 1,
                    "default": 0.01,
                    "description": "Ignore keywords below this in-document frequency"
                }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let min_frequency = params["min_frequency"].as_f64().unwrap_or(0.01);
        let rollup = ctx.aggregator.keyword_rollup(min_frequency).await?;
        let mut value = serde_json::to_value(&rollup)?;
        value["success"] = Value::Bool(true);
        Ok(value)
    }
}

pub struct SummaryReportTool;

#[async_trait]
impl Tool for SummaryReportTool {
    fn name(&self) -> &str {
        "generate_summary_report"
    }

    fn description(&self) -> &str {
        "Snapshot analysis statistics and store them as a report"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let report = ctx.aggregator.summary_report().await?;
        let mut value = serde_json::to_value(&report)?;
        value["success"] = Value::Bool(true);
        Ok(value)
    }
}

pub struct FeedAnalysisTool {
    max_items: usize,
    default_items: usize,
}

impl FeedAnalysisTool {
    pub fn new(batch: &BatchConfig) -> Self {
        Self {
            max_items: batch.feed_max_items,
            default_items: DEFAULT_FEED_ITEMS.min(batch.feed_max_items),
        }
    }
}

#[async_trait]
impl Tool for FeedAnalysisTool {
    fn name(&self) -> &str {
        "analyze_rss_feed"
    }

    fn description(&self) -> &str {
        "Analyze the pages linked from a feed or index page"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "rss_url": { "type": "string", "format": "uri", "description": "Feed URL" },
                "max_items": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": self.max_items,
                    "default": self.default_items,
                    "description": "Maximum linked pages to analyze"
                }
            },
            "required": ["rss_url"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let feed_url = str_param(&params, "rss_url")?;
        let max_items = params["max_items"]
            .as_u64()
            .map_or(self.default_items, |n| n as usize);

        match ctx.pipeline.analyze_feed(feed_url, max_items).await {
            Ok(report) => {
                let mut value = serde_json::to_value(&report)?;
                value["success"] = Value::Bool(true);
                Ok(value)
            }
            Err(e @ Error::Validation(_)) => Err(e.into()),
            Err(e) => Ok(json!({
                "success": false,
                "feed_url": feed_url,
                "error": "feed fetch failed",
                "error_kind": e.kind(),
                "details": e.to_string(),
            })),
        }
    }
}

pub struct ServerInfoTool {
    tool_count: usize,
}

#[async_trait]
impl Tool for ServerInfoTool {
    fn name(&self) -> &str {
        "get_server_info"
    }

    fn description(&self) -> &str {
        "Describe this server and its storage"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({
            "server_name": ctx.config.server.name,
            "version": env!("CARGO_PKG_VERSION"),
            "description": ctx.config.server.description,
            "database_path": ctx.config.db.path.display().to_string(),
            "tools_count": self.tool_count,
            "features": [
                "Web scraping",
                "Sentiment analysis",
                "Keyword extraction",
                "Text statistics",
                "Batch processing",
                "Data persistence"
            ]
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with every built-in analyzer tool. Batch and feed schemas
    /// advertise the limits from `batch`, so boundary validation and the
    /// pipeline agree.
    pub fn with_builtins(batch: &BatchConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ScrapeAndAnalyzeTool));
        registry.register(Box::new(BatchAnalyzeTool::new(batch)));
        registry.register(Box::new(HistoryTool));
        registry.register(Box::new(SentimentSearchTool));
        registry.register(Box::new(KeywordAnalysisTool));
        registry.register(Box::new(SummaryReportTool));
        registry.register(Box::new(FeedAnalysisTool::new(batch)));
        let tool_count = registry.len() + 1;
        registry.register(Box::new(ServerInfoTool { tool_count }));
        registry
    }

    /// Register a tool. Later registrations with a duplicate name are
    /// shadowed by the earlier one in [`find`](ToolRegistry::find).
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// All registered tools, in registration order.
    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Name, description, and schema of every tool, for `GET /tools/list`.
    pub fn info(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Returns `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_injects_defaults() {
        let schema = HistoryTool.parameters_schema();
        let v = validate_params(&schema, &json!({})).unwrap();
        assert_eq!(v["limit"], 10);

        let v = validate_params(&schema, &Value::Null).unwrap();
        assert_eq!(v["limit"], 10);
    }

    #[test]
    fn test_validate_range() {
        let schema = HistoryTool.parameters_schema();
        assert!(validate_params(&schema, &json!({ "limit": 0 })).is_err());
        assert!(validate_params(&schema, &json!({ "limit": 101 })).is_err());
        assert!(validate_params(&schema, &json!({ "limit": 100 })).is_ok());
        assert!(validate_params(&schema, &json!({ "limit": "5" })).is_err());
    }

    #[test]
    fn test_validate_enum_and_required() {
        let schema = SentimentSearchTool.parameters_schema();
        assert!(validate_params(&schema, &json!({})).is_err());
        assert!(validate_params(&schema, &json!({ "sentiment": "angry" })).is_err());
        assert!(validate_params(&schema, &json!({ "sentiment": "neutral" })).is_ok());
    }

    #[test]
    fn test_validate_url_format_and_max_items() {
        let schema = BatchAnalyzeTool::new(&BatchConfig::default()).parameters_schema();
        let err = validate_params(&schema, &json!({ "urls": ["not a url"] })).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("urls[0]"));

        let eleven: Vec<String> = (0..11).map(|i| format!("https://example.com/{}", i)).collect();
        assert!(validate_params(&schema, &json!({ "urls": eleven })).is_err());

        let ten: Vec<String> = (0..10).map(|i| format!("https://example.com/{}", i)).collect();
        assert!(validate_params(&schema, &json!({ "urls": ten })).is_ok());
    }

    #[test]
    fn test_validate_min_frequency_bounds() {
        let schema = KeywordAnalysisTool.parameters_schema();
        assert!(validate_params(&schema, &json!({ "min_frequency": 1.5 })).is_err());
        assert!(validate_params(&schema, &json!({ "min_frequency": -0.1 })).is_err());
        let v = validate_params(&schema, &json!({ "min_frequency": 0 })).unwrap();
        assert_eq!(v["min_frequency"], 0);
    }

    #[test]
    fn test_registry_builtins() {
        let registry = ToolRegistry::with_builtins(&BatchConfig::default());
        assert_eq!(registry.len(), 8);
        assert!(registry.find("scrape_and_analyze").is_some());
        assert!(registry.find("get_server_info").is_some());
        assert!(registry.find("nope").is_none());
        for info in registry.info() {
            assert_eq!(info.parameters["type"], "object", "{}", info.name);
        }
    }

    #[test]
    fn test_schemas_follow_configured_limits() {
        let batch = BatchConfig {
            max_urls: 20,
            feed_max_items: 5,
            ..BatchConfig::default()
        };

        let schema = BatchAnalyzeTool::new(&batch).parameters_schema();
        let fifteen: Vec<String> = (0..15).map(|i| format!("https://example.com/{}", i)).collect();
        assert!(validate_params(&schema, &json!({ "urls": fifteen })).is_ok());
        let too_many: Vec<String> = (0..21).map(|i| format!("https://example.com/{}", i)).collect();
        assert!(validate_params(&schema, &json!({ "urls": too_many })).is_err());

        let schema = FeedAnalysisTool::new(&batch).parameters_schema();
        let v = validate_params(&schema, &json!({ "rss_url": "https://example.com/feed" })).unwrap();
        assert_eq!(v["max_items"], 5);
        assert!(validate_params(
            &schema,
            &json!({ "rss_url": "https://example.com/feed", "max_items": 6 })
        )
        .is_err());
    }

    #[test]
    fn test_feed_default_with_stock_limits() {
        let schema = FeedAnalysisTool::new(&BatchConfig::default()).parameters_schema();
        let v = validate_params(&schema, &json!({ "rss_url": "https://example.com/feed" })).unwrap();
        assert_eq!(v["max_items"], DEFAULT_FEED_ITEMS);
        assert_eq!(schema["properties"]["max_items"]["maximum"], 20);
    }
}
