use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn sa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("sa");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/analysis.sqlite"

[fetch]
timeout_secs = 2

[batch]
delay_ms = 0
"#,
        root.display()
    );

    let config_path = config_dir.join("analyzer.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_sa(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = sa_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run sa binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_json(config_path: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, success) = run_sa(config_path, args);
    assert!(success, "sa {:?} failed: {}", args, stderr);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("bad JSON ({}): {}", e, stdout))
}

#[test]
fn test_init_is_idempotent() {
    let (tmp, config) = setup_test_env();

    let (stdout, stderr, success) = run_sa(&config, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/analysis.sqlite").exists());

    let (_, stderr, success) = run_sa(&config, &["init"]);
    assert!(success, "second init failed: {}", stderr);
}

#[test]
fn test_queries_on_empty_database() {
    let (_tmp, config) = setup_test_env();
    run_sa(&config, &["init"]);

    let history = run_json(&config, &["history"]);
    assert_eq!(history["success"], true);
    assert_eq!(history["count"], 0);

    let keywords = run_json(&config, &["keywords"]);
    assert_eq!(keywords["analyzed_documents"], 0);
    assert_eq!(keywords["top_keywords"].as_array().unwrap().len(), 0);

    let negative = run_json(&config, &["sentiment", "negative"]);
    assert_eq!(negative["count"], 0);
}

#[test]
fn test_report_on_empty_database() {
    let (_tmp, config) = setup_test_env();

    let report = run_json(&config, &["report"]);
    assert_eq!(report["success"], true);
    assert_eq!(report["summary"]["total_analyses"], 0);
    assert_eq!(report["summary"]["average_sentiment"], 0.0);

    let (stdout, stderr, success) = run_sa(&config, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Reports:     1"), "{}", stdout);
}

#[test]
fn test_invalid_arguments_fail() {
    let (_tmp, config) = setup_test_env();

    let (_, stderr, success) = run_sa(&config, &["sentiment", "angry"]);
    assert!(!success);
    assert!(stderr.contains("sentiment"), "{}", stderr);

    let urls: Vec<String> = (0..11).map(|i| format!("https://example.com/{}", i)).collect();
    let mut args = vec!["batch"];
    args.extend(urls.iter().map(String::as_str));
    let (_, _, success) = run_sa(&config, &args);
    assert!(!success);

    let (_, _, success) = run_sa(&config, &["history", "--limit", "0"]);
    assert!(!success);
}

#[test]
fn test_unreachable_url_reports_scraping_failure() {
    let (_tmp, config) = setup_test_env();

    let result = run_json(&config, &["analyze", "http://127.0.0.1:1/"]);
    assert_eq!(result["success"], false);
    assert_eq!(result["outcome"], "failed");
    assert_eq!(result["stage"], "scraping");

    let history = run_json(&config, &["history"]);
    assert_eq!(history["count"], 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[batch]\nmax_urls = 0\n").unwrap();

    let (_, stderr, success) = run_sa(&bad, &["history"]);
    assert!(!success);
    assert!(stderr.contains("max_urls"), "{}", stderr);
}

#[test]
fn test_batch_limit_follows_config() {
    let (tmp, _) = setup_test_env();
    let config = tmp.path().join("wide.toml");
    fs::write(
        &config,
        format!(
            "[db]\npath = \"{}/data/analysis.sqlite\"\n\n[fetch]\ntimeout_secs = 2\n\n[batch]\ndelay_ms = 0\nmax_urls = 12\n",
            tmp.path().display()
        ),
    )
    .unwrap();

    let urls: Vec<String> = (0..11).map(|i| format!("http://127.0.0.1:1/{}", i)).collect();
    let mut args = vec!["batch"];
    args.extend(urls.iter().map(String::as_str));

    let report = run_json(&config, &args);
    assert_eq!(report["total_urls"], 11);
    assert_eq!(report["failed"], 11);
}
