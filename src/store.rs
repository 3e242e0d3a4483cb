//! Durable records for URLs, analyses, and reports.
//!
//! Every write is a single statement, so each record lands atomically; no
//! transaction spans the URL upsert and the analysis insert for one page.
//! Reads that reference a missing identifier return empty results.

use chrono::Utc;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;

use crate::db;
use crate::error::{Error, Result};
use crate::migrate;
use crate::models::{
    AnalysisRecord, AnalysisStatistics, HistoryEntry, NewAnalysis, NewReport, NewUrl, ReportRecord,
    SentimentLabel, UrlRecord,
};

const RECENT_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect to the database at `path` and make sure the schema exists.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Insert or overwrite the row for `new.url`, returning its id.
    ///
    /// An existing row keeps its id, so analyses that reference it stay valid.
    pub async fn upsert_url(&self, new: &NewUrl) -> Result<i64> {
        let now = Utc::now().timestamp();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO urls (url, title, content, status, scraped_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                status = excluded.status,
                scraped_at = excluded.scraped_at
            RETURNING id
            "#,
        )
        .bind(&new.url)
        .bind(&new.title)
        .bind(&new.content)
        .bind(new.status.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get_url(&self, id: i64) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            "SELECT id, url, title, content, status, scraped_at FROM urls WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let status: String = row.get("status");
            Ok(UrlRecord {
                id: row.get("id"),
                url: row.get("url"),
                title: row.get("title"),
                content: row.get("content"),
                status: status.parse()?,
                scraped_at: row.get("scraped_at"),
            })
        })
        .transpose()
    }

    /// Append a new analysis row. Fails if `url_id` does not exist.
    pub async fn insert_analysis(&self, new: &NewAnalysis) -> Result<i64> {
        self.insert_analysis_at(new, Utc::now().timestamp()).await
    }

    /// Like [`insert_analysis`](Store::insert_analysis) with an explicit
    /// `analyzed_at` (unix seconds), for backfills and imports.
    pub async fn insert_analysis_at(&self, new: &NewAnalysis, analyzed_at: i64) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO analyses (url_id, sentiment_score, sentiment_label, keywords, word_count, analyzed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.url_id)
        .bind(new.sentiment_score)
        .bind(new.sentiment_label.as_str())
        .bind(&new.keywords)
        .bind(new.word_count)
        .bind(analyzed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch one analysis by id, decoding its stored label.
    pub async fn get_analysis(&self, id: i64) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, url_id, sentiment_score, sentiment_label, keywords, word_count, analyzed_at
            FROM analyses WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let label: String = row.get("sentiment_label");
            Ok(AnalysisRecord {
                id: row.get("id"),
                url_id: row.get("url_id"),
                sentiment_score: row.get("sentiment_score"),
                sentiment_label: label.parse()?,
                keywords: row.get("keywords"),
                word_count: row.get("word_count"),
                analyzed_at: row.get("analyzed_at"),
            })
        })
        .transpose()
    }

    /// Store a generated report and return its id.
    pub async fn insert_report(&self, new: &NewReport) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO reports (name, description, data, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.data)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// The most recently generated report, if any.
    pub async fn latest_report(&self) -> Result<Option<ReportRecord>> {
        let row = sqlx::query(
            "SELECT id, name, description, data, created_at FROM reports ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ReportRecord {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            data: row.get("data"),
            created_at: row.get("created_at"),
        }))
    }

    /// Most recent analyses first, joined with their URL.
    pub async fn history(&self, limit: i64) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id AS analysis_id, a.url_id, u.url, u.title,
                   a.sentiment_score, a.sentiment_label, a.word_count, a.analyzed_at
            FROM analyses a
            JOIN urls u ON a.url_id = u.id
            ORDER BY a.analyzed_at DESC, a.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(history_entry).collect()
    }

    /// Analyses with exactly `label`, highest score first.
    pub async fn by_sentiment(&self, label: SentimentLabel) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id AS analysis_id, a.url_id, u.url, u.title,
                   a.sentiment_score, a.sentiment_label, a.word_count, a.analyzed_at
            FROM analyses a
            JOIN urls u ON a.url_id = u.id
            WHERE a.sentiment_label = ?
            ORDER BY a.sentiment_score DESC, a.id ASC
            "#,
        )
        .bind(label.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(history_entry).collect()
    }

    /// Stream every stored keyword blob without decoding it.
    pub fn keyword_blobs(&self) -> BoxStream<'_, Result<String>> {
        sqlx::query_scalar::<_, String>("SELECT keywords FROM analyses ORDER BY id ASC")
            .fetch(&self.pool)
            .map(|r| r.map_err(Error::from))
            .boxed()
    }

    /// Collected form of [`keyword_blobs`](Store::keyword_blobs).
    pub async fn all_keyword_blobs(&self) -> Result<Vec<String>> {
        self.keyword_blobs().try_collect().await
    }

    /// Label distribution and mean score over every analysis, plus the
    /// count from the last seven days. An empty table averages to `0.0`.
    pub async fn statistics(&self) -> Result<AnalysisStatistics> {
        let total_analyses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyses")
            .fetch_one(&self.pool)
            .await?;

        let label_rows = sqlx::query(
            "SELECT sentiment_label, COUNT(*) AS n FROM analyses GROUP BY sentiment_label",
        )
        .fetch_all(&self.pool)
        .await?;
        let sentiment_distribution: BTreeMap<String, i64> = label_rows
            .iter()
            .map(|row| (row.get("sentiment_label"), row.get("n")))
            .collect();

        let average_sentiment: Option<f64> =
            sqlx::query_scalar("SELECT AVG(sentiment_score) FROM analyses")
                .fetch_one(&self.pool)
                .await?;

        let cutoff = Utc::now().timestamp() - RECENT_WINDOW_SECS;
        let recent_analyses_7days: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM analyses WHERE analyzed_at > ?")
                .bind(cutoff)
                .fetch_one(&self.pool)
                .await?;

        Ok(AnalysisStatistics {
            total_analyses,
            sentiment_distribution,
            average_sentiment: average_sentiment.unwrap_or(0.0),
            recent_analyses_7days,
        })
    }

    /// Row counts, used by `sa stats`.
    pub async fn count_urls(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM urls").await
    }

    pub async fn count_analyses(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM analyses").await
    }

    pub async fn count_reports(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM reports").await
    }

    async fn count(&self, sql: &'static str) -> Result<i64> {
        Ok(sqlx::query_scalar(sql).fetch_one(&self.pool).await?)
    }
}

fn history_entry(row: &SqliteRow) -> Result<HistoryEntry> {
    let label: String = row.get("sentiment_label");
    let analyzed_at: i64 = row.get("analyzed_at");
    Ok(HistoryEntry {
        analysis_id: row.get("analysis_id"),
        url_id: row.get("url_id"),
        url: row.get("url"),
        title: row.get("title"),
        sentiment_score: row.get("sentiment_score"),
        sentiment_label: label
            .parse()
            .map_err(|_| Error::Persistence(format!("unknown sentiment label: {}", label)))?,
        word_count: row.get("word_count"),
        analyzed_at: format_ts_iso(analyzed_at),
    })
}

pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
