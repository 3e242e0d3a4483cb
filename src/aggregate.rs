//! Cross-document rollups over stored analyses.
//!
//! The aggregator only reads what the store has persisted. Keyword blobs that
//! fail to decode are logged and skipped.

use chrono::Utc;
use futures::TryStreamExt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{AnalysisStatistics, KeywordResult, NewReport};
use crate::store::{format_ts_iso, Store};

pub const ROLLUP_LIMIT: usize = 20;
pub const SUMMARY_REPORT_NAME: &str = "Summary Report";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordTotal {
    pub word: String,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordRollup {
    pub top_keywords: Vec<KeywordTotal>,
    /// Number of stored keyword lists read, including undecodable ones.
    pub analyzed_documents: usize,
}

/// Snapshot persisted as a report's `data` and returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarySnapshot {
    pub summary: AnalysisStatistics,
    pub generated_at: String, // ISO8601
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub report_id: i64,
    #[serde(flatten)]
    pub snapshot: SummarySnapshot,
}

/// Accumulates keyword counts across documents, first-seen order preserved.
#[derive(Debug, Default)]
pub struct KeywordTally {
    min_frequency: f64,
    totals: IndexMap<String, usize>,
    documents: usize,
    skipped: usize,
}

impl KeywordTally {
    pub fn new(min_frequency: f64) -> Self {
        Self {
            min_frequency,
            ..Default::default()
        }
    }

    /// Decode one stored keyword list and fold it in.
    pub fn add_blob(&mut self, blob: &str) {
        self.documents += 1;
        match serde_json::from_str::<Vec<KeywordResult>>(blob) {
            Ok(keywords) => {
                for kw in keywords {
                    if kw.frequency >= self.min_frequency {
                        *self.totals.entry(kw.word).or_insert(0) += kw.count;
                    }
                }
            }
            Err(e) => {
                self.skipped += 1;
                tracing::warn!(error = %e, "skipping undecodable keyword list");
            }
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn finish(self, limit: usize) -> KeywordRollup {
        let mut ranked: Vec<KeywordTotal> = self
            .totals
            .into_iter()
            .map(|(word, total_count)| KeywordTotal { word, total_count })
            .collect();
        ranked.sort_by(|a, b| b.total_count.cmp(&a.total_count));
        ranked.truncate(limit);

        KeywordRollup {
            top_keywords: ranked,
            analyzed_documents: self.documents,
        }
    }
}

pub struct Aggregator {
    store: Store,
}

impl Aggregator {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Sum per-stem counts across all analyses, ignoring keyword entries whose
    /// in-document frequency is below `min_frequency`.
    pub async fn keyword_rollup(&self, min_frequency: f64) -> Result<KeywordRollup> {
        let mut tally = KeywordTally::new(min_frequency);
        let mut blobs = self.store.keyword_blobs();
        while let Some(blob) = blobs.try_next().await? {
            tally.add_blob(&blob);
        }
        if tally.skipped() > 0 {
            tracing::info!(skipped = tally.skipped(), "keyword rollup skipped blobs");
        }
        Ok(tally.finish(ROLLUP_LIMIT))
    }

    /// Snapshot the store statistics and persist the snapshot as a report.
    pub async fn summary_report(&self) -> Result<SummaryReport> {
        let summary = self.store.statistics().await?;
        let snapshot = SummarySnapshot {
            generated_at: format_ts_iso(Utc::now().timestamp()),
            summary,
        };

        let report_id = self
            .store
            .insert_report(&NewReport {
                name: SUMMARY_REPORT_NAME.to_string(),
                description: format!(
                    "Generated summary report for {} analyses",
                    snapshot.summary.total_analyses
                ),
                data: serde_json::to_string(&snapshot)?,
            })
            .await?;

        Ok(SummaryReport {
            report_id,
            snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(entries: &[(&str, usize, f64)]) -> String {
        let kws: Vec<KeywordResult> = entries
            .iter()
            .map(|(w, c, f)| KeywordResult {
                word: w.to_string(),
                count: *c,
                frequency: *f,
            })
            .collect();
        serde_json::to_string(&kws).unwrap()
    }

    #[test]
    fn test_min_frequency_filters_per_document() {
        let mut tally = KeywordTally::new(0.5);
        tally.add_blob(&blob(&[("rust", 4, 1.0), ("tokio", 1, 0.1), ("serd", 1, 0.1)]));
        tally.add_blob(&blob(&[("rust", 3, 1.0), ("axum", 1, 0.1)]));
        let rollup = tally.finish(ROLLUP_LIMIT);

        assert_eq!(rollup.analyzed_documents, 2);
        assert_eq!(
            rollup.top_keywords,
            vec![KeywordTotal {
                word: "rust".into(),
                total_count: 7
            }]
        );
    }

    #[test]
    fn test_bad_blob_is_skipped() {
        let mut tally = KeywordTally::new(0.0);
        tally.add_blob("not json");
        tally.add_blob(&blob(&[("cat", 2, 0.5)]));
        assert_eq!(tally.skipped(), 1);
        let rollup = tally.finish(ROLLUP_LIMIT);
        assert_eq!(rollup.analyzed_documents, 2);
        assert_eq!(rollup.top_keywords.len(), 1);
    }

    #[test]
    fn test_ranking_and_limit() {
        let mut tally = KeywordTally::new(0.0);
        let entries: Vec<(String, usize, f64)> =
            (0..30).map(|i| (format!("w{:02}", i), i + 1, 0.01)).collect();
        let refs: Vec<(&str, usize, f64)> =
            entries.iter().map(|(w, c, f)| (w.as_str(), *c, *f)).collect();
        tally.add_blob(&blob(&refs));
        let rollup = tally.finish(ROLLUP_LIMIT);

        assert_eq!(rollup.top_keywords.len(), 20);
        assert_eq!(rollup.top_keywords[0].word, "w29");
        assert_eq!(rollup.top_keywords[0].total_count, 30);
        assert_eq!(rollup.top_keywords[19].total_count, 11);
    }

    #[test]
    fn test_equal_totals_keep_first_seen_order() {
        let mut tally = KeywordTally::new(0.0);
        tally.add_blob(&blob(&[("beta", 1, 0.5), ("alpha", 1, 0.5)]));
        let rollup = tally.finish(ROLLUP_LIMIT);
        let words: Vec<&str> = rollup.top_keywords.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["beta", "alpha"]);
    }
}
