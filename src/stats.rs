//! Database overview for `sa stats`.
//!
//! Prints record counts, the sentiment distribution, and when the last
//! summary report was generated.

use anyhow::Result;

use crate::config::Config;
use crate::store::Store;

/// Open the store at `config.db.path` and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = Store::open(&config.db.path).await?;

    let urls = store.count_urls().await?;
    let analyses = store.count_analyses().await?;
    let reports = store.count_reports().await?;
    let stats = store.statistics().await?;
    let latest_report = store.latest_report().await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Smart Analyzer Database Stats");
    println!("=============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  URLs:        {}", urls);
    println!("  Analyses:    {}", analyses);
    println!("  Reports:     {}", reports);
    println!("  Last 7 days: {}", stats.recent_analyses_7days);
    println!("  Avg score:   {:.4}", stats.average_sentiment);

    if !stats.sentiment_distribution.is_empty() {
        println!();
        println!("  By sentiment:");
        println!("  {:<12} {:>8} {:>7}", "LABEL", "COUNT", "SHARE");
        println!("  {}", "-".repeat(29));
        for (label, count) in &stats.sentiment_distribution {
            println!(
                "  {:<12} {:>8} {:>6}%",
                label,
                count,
                percent(*count, stats.total_analyses)
            );
        }
    }

    println!();
    match latest_report {
        Some(r) => println!(
            "  Last report: #{} {}",
            r.id,
            format_ts_relative(r.created_at)
        ),
        None => println!("  Last report: never"),
    }
    println!();

    store.close().await;
    Ok(())
}

fn percent(part: i64, whole: i64) -> i64 {
    if whole > 0 {
        (part * 100) / whole
    } else {
        0
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    match delta {
        d if d < 0 => crate::store::format_ts_iso(ts),
        d if d < 60 => "just now".to_string(),
        d if d < 3600 => plural(d / 60, "min"),
        d if d < 86400 => plural(d / 3600, "hour"),
        d if d < 86400 * 30 => plural(d / 86400, "day"),
        _ => crate::store::format_ts_iso(ts),
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}
