//! Tool server tests: routing, validation, and the error envelope.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use smart_analyzer::config::Config;
use smart_analyzer::error::{Error, Result};
use smart_analyzer::fetch::{Fetcher, Transport};
use smart_analyzer::server;
use smart_analyzer::store::Store;
use smart_analyzer::tools::{ToolContext, ToolRegistry};

struct CannedTransport {
    pages: HashMap<String, String>,
}

#[async_trait]
impl Transport for CannedTransport {
    async fn get(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::transport(url, "connection refused"))
    }
}

async fn spawn_server(tmp: &TempDir) -> String {
    let mut cfg = Config::default();
    cfg.batch.delay_ms = 0;
    cfg.db.path = tmp.path().join("analysis.sqlite");

    let store = Store::open(&cfg.db.path).await.unwrap();
    let transport = CannedTransport {
        pages: HashMap::from([
            (
                "https://example.com/good".to_string(),
                "<title>Good</title><body>Great news! This is amazing.</body>".to_string(),
            ),
            (
                "https://example.com/bad".to_string(),
                "<title>Bad</title><body>Terrible, awful, horrible day.</body>".to_string(),
            ),
        ]),
    };
    let fetcher = Fetcher::new(Box::new(transport), cfg.fetch.max_content_chars);
    let ctx = ToolContext::with_fetcher(&cfg, store, fetcher);

    let app = server::app(ctx, Arc::new(ToolRegistry::with_builtins(&cfg.batch)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn call(base: &str, tool: &str, params: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/tools/{}", base, tool))
        .json(&params)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_health_and_tool_list() {
    let tmp = TempDir::new().unwrap();
    let base = spawn_server(&tmp).await;

    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let list: Value = reqwest::get(format!("{}/tools/list", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = list["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 8);
    assert!(names.contains(&"scrape_and_analyze"));
    assert!(names.contains(&"analyze_rss_feed"));
}

#[tokio::test]
async fn test_analyze_then_query() {
    let tmp = TempDir::new().unwrap();
    let base = spawn_server(&tmp).await;

    let (status, body) = call(
        &base,
        "scrape_and_analyze",
        json!({ "url": "https://example.com/good" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["success"], true);
    assert_eq!(body["result"]["sentiment"]["label"], "positive");

    let (status, body) = call(
        &base,
        "batch_analyze_urls",
        json!({ "urls": ["https://example.com/bad", "https://example.com/gone"] }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["successful"], 1);
    assert_eq!(body["result"]["failed"], 1);
    assert_eq!(body["result"]["results"][1]["result"]["stage"], "scraping");
    assert_eq!(body["result"]["results"][1]["result"]["success"], false);

    let (_, body) = call(&base, "get_analysis_history", json!({})).await;
    assert_eq!(body["result"]["count"], 2);

    let (_, body) = call(&base, "search_by_sentiment", json!({ "sentiment": "negative" })).await;
    assert_eq!(body["result"]["count"], 1);
    assert_eq!(body["result"]["results"][0]["url"], "https://example.com/bad");

    let (_, body) = call(&base, "get_keyword_analysis", json!({ "min_frequency": 0 })).await;
    assert_eq!(body["result"]["analyzed_documents"], 2);

    let (status, body) = call(&base, "generate_summary_report", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["summary"]["total_analyses"], 2);
    assert!(body["result"]["report_id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_failed_fetch_is_not_an_http_error() {
    let tmp = TempDir::new().unwrap();
    let base = spawn_server(&tmp).await;

    let (status, body) = call(
        &base,
        "scrape_and_analyze",
        json!({ "url": "https://example.com/gone" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["success"], false);
    assert_eq!(body["result"]["stage"], "scraping");
    assert_eq!(body["result"]["error_kind"], "transport");
}

#[tokio::test]
async fn test_validation_errors_are_400() {
    let tmp = TempDir::new().unwrap();
    let base = spawn_server(&tmp).await;

    let (status, body) = call(&base, "scrape_and_analyze", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = call(&base, "search_by_sentiment", json!({ "sentiment": "angry" })).await;
    assert_eq!(status, 400);

    let (status, _) = call(&base, "get_analysis_history", json!({ "limit": 500 })).await;
    assert_eq!(status, 400);

    let urls: Vec<String> = (0..11).map(|i| format!("https://example.com/{}", i)).collect();
    let (status, _) = call(&base, "batch_analyze_urls", json!({ "urls": urls })).await;
    assert_eq!(status, 400);

    let (status, _) = call(&base, "analyze_rss_feed", json!({ "rss_url": "nope" })).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_unknown_tool_is_404() {
    let tmp = TempDir::new().unwrap();
    let base = spawn_server(&tmp).await;

    let (status, body) = call(&base, "delete_everything", json!({})).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_server_info() {
    let tmp = TempDir::new().unwrap();
    let base = spawn_server(&tmp).await;

    let (status, body) = call(&base, "get_server_info", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["tools_count"], 8);
    assert_eq!(body["result"]["version"], env!("CARGO_PKG_VERSION"));
}
