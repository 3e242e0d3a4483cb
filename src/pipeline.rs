//! Fetch → store → analyze → store orchestration.
//!
//! Each URL moves through `pending → fetched → analyzed → persisted`. A fetch
//! failure stops at stage `scraping` with nothing written; any later failure
//! stops at stage `processing`. Either way the caller gets a [`PipelineResult`]
//! value, never an `Err`.
//!
//! Batches run through a global rate limiter that spaces request starts by
//! `batch.delay_ms`. With `batch.concurrency > 1` several pages are in
//! flight at once, but results are always reported in input order.

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::analyze::Analyzer;
use crate::config::{AnalysisConfig, BatchConfig};
use crate::error::{Error, Result};
use crate::fetch::{collect_links, FetchedPage, Fetcher};
use crate::models::{
    KeywordResult, NewAnalysis, NewUrl, SentimentResult, TextStatistics, UrlStatus,
};
use crate::store::Store;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Where a failed run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Scraping,
    Processing,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedPage {
    pub url: String,
    pub title: String,
    pub content_length: usize,
    pub sentiment: SentimentResult,
    pub top_keywords: Vec<KeywordResult>,
    pub statistics: TextStatistics,
    pub url_id: i64,
    pub analysis_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineFailure {
    pub url: String,
    pub stage: FailureStage,
    pub error_kind: &'static str,
    pub error: String,
}

/// Outcome of running one URL through the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PipelineResult {
    Success(AnalyzedPage),
    Failed(PipelineFailure),
}

impl PipelineResult {
    fn failed(url: &str, stage: FailureStage, err: &Error) -> Self {
        PipelineResult::Failed(PipelineFailure {
            url: url.to_string(),
            stage,
            error_kind: err.kind(),
            error: err.to_string(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success(_))
    }

    pub fn stage(&self) -> Option<FailureStage> {
        match self {
            PipelineResult::Success(_) => None,
            PipelineResult::Failed(f) => Some(f.stage),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub url: String,
    pub result: PipelineResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BatchItem>,
}

impl BatchReport {
    fn from_items(results: Vec<BatchItem>) -> Self {
        let successful = results.iter().filter(|i| i.result.is_success()).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedReport {
    pub feed_url: String,
    pub links_found: usize,
    pub analyzed_items: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BatchItem>,
}

pub struct Pipeline {
    fetcher: Fetcher,
    analyzer: Analyzer,
    store: Store,
    batch: BatchConfig,
    result_keywords: usize,
    limiter: Option<DirectRateLimiter>,
}

impl Pipeline {
    pub fn new(
        fetcher: Fetcher,
        analyzer: Analyzer,
        store: Store,
        batch: &BatchConfig,
        analysis: &AnalysisConfig,
    ) -> Self {
        let limiter = Quota::with_period(Duration::from_millis(batch.delay_ms))
            .map(RateLimiter::direct);
        Self {
            fetcher,
            analyzer,
            store,
            batch: batch.clone(),
            result_keywords: analysis.result_keywords,
            limiter,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run one URL end to end.
    pub async fn analyze_url(&self, url: &str) -> PipelineResult {
        debug!(url, "pipeline: pending");
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url, error = %e, "fetch failed");
                return PipelineResult::failed(url, FailureStage::Scraping, &e);
            }
        };
        debug!(url, "pipeline: fetched");

        match self.process(page).await {
            Ok(analyzed) => {
                info!(
                    url,
                    label = %analyzed.sentiment.label,
                    analysis_id = analyzed.analysis_id,
                    "pipeline: persisted"
                );
                PipelineResult::Success(analyzed)
            }
            Err(e) => {
                warn!(url, error = %e, "processing failed");
                PipelineResult::failed(url, FailureStage::Processing, &e)
            }
        }
    }

    async fn process(&self, page: FetchedPage) -> Result<AnalyzedPage> {
        let url_id = self
            .store
            .upsert_url(&NewUrl {
                url: page.url.clone(),
                title: page.title.clone(),
                content: page.content.clone(),
                status: UrlStatus::Scraped,
            })
            .await?;

        let analysis = self.analyzer.analyze(&page.content);
        debug!(url = %page.url, "pipeline: analyzed");

        let keywords = serde_json::to_string(&analysis.keywords)?;
        let analysis_id = self
            .store
            .insert_analysis(&NewAnalysis {
                url_id,
                sentiment_score: analysis.sentiment.score,
                sentiment_label: analysis.sentiment.label,
                keywords,
                word_count: analysis.statistics.word_count as i64,
            })
            .await?;

        let mut top_keywords = analysis.keywords;
        top_keywords.truncate(self.result_keywords);

        Ok(AnalyzedPage {
            url: page.url,
            title: page.title,
            content_length: page.content_length,
            sentiment: analysis.sentiment,
            top_keywords,
            statistics: analysis.statistics,
            url_id,
            analysis_id,
        })
    }

    /// Run up to `batch.max_urls` URLs, never stopping on a single failure.
    pub async fn analyze_batch(&self, urls: &[String]) -> Result<BatchReport> {
        if urls.len() > self.batch.max_urls {
            return Err(Error::validation(format!(
                "at most {} URLs per batch, got {}",
                self.batch.max_urls,
                urls.len()
            )));
        }

        let report = BatchReport::from_items(self.run_all(urls).await);
        info!(
            total = report.total,
            successful = report.successful,
            failed = report.failed,
            "batch complete"
        );
        Ok(report)
    }

    /// Analyze the first `max_items` links found on `feed_url`.
    ///
    /// Returns `Err` only when the feed page itself cannot be fetched or
    /// `max_items` is out of range.
    pub async fn analyze_feed(&self, feed_url: &str, max_items: usize) -> Result<FeedReport> {
        if max_items == 0 || max_items > self.batch.feed_max_items {
            return Err(Error::validation(format!(
                "max_items must be in [1, {}], got {}",
                self.batch.feed_max_items, max_items
            )));
        }
        let base = Url::parse(feed_url)
            .map_err(|e| Error::validation(format!("invalid feed URL '{}': {}", feed_url, e)))?;

        self.throttle().await;
        let html = self.fetcher.fetch_html(feed_url).await?;
        let mut links = collect_links(&html, &base);
        let links_found = links.len();
        links.truncate(max_items);
        info!(feed_url, links_found, selected = links.len(), "feed links extracted");

        let batch = BatchReport::from_items(self.run_all(&links).await);
        Ok(FeedReport {
            feed_url: feed_url.to_string(),
            links_found,
            analyzed_items: batch.total,
            successful: batch.successful,
            failed: batch.failed,
            results: batch.results,
        })
    }

    async fn run_all(&self, urls: &[String]) -> Vec<BatchItem> {
        let total = urls.len();
        let items: Vec<BoxFuture<'_, BatchItem>> = urls
            .iter()
            .enumerate()
            .map(|(i, url)| self.run_item(url.clone(), i + 1, total))
            .collect();

        stream::iter(items)
            .buffered(self.batch.concurrency.max(1))
            .collect()
            .await
    }

    /// One throttled batch entry. Boxed so the buffered stream stays `Send`.
    fn run_item(&self, url: String, position: usize, total: usize) -> BoxFuture<'_, BatchItem> {
        Box::pin(async move {
            self.throttle().await;
            debug!(url = %url, position, total, "batch item");
            let result = self.analyze_url(&url).await;
            BatchItem { url, result }
        })
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}
