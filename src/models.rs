//! Core data models used throughout the analyzer.
//!
//! Records mirror the three SQLite tables (`urls`, `analyses`, `reports`);
//! the remaining types are per-document values produced by the analyzer and
//! embedded in pipeline results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Lifecycle state of a stored URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStatus {
    Pending,
    Scraped,
    Failed,
}

impl UrlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlStatus::Pending => "pending",
            UrlStatus::Scraped => "scraped",
            UrlStatus::Failed => "failed",
        }
    }
}

impl FromStr for UrlStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UrlStatus::Pending),
            "scraped" => Ok(UrlStatus::Scraped),
            "failed" => Ok(UrlStatus::Failed),
            other => Err(Error::validation(format!("unknown url status: '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Label a score against a symmetric neutral band: strictly above
    /// `threshold` is positive, strictly below `-threshold` is negative.
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            SentimentLabel::Positive
        } else if score < -threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => Err(Error::validation(format!(
                "sentiment must be one of positive, negative, neutral; got '{}'",
                other
            ))),
        }
    }
}

/// Which scoring strategy produced a [`SentimentResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentMethod {
    /// Weighted lexicon, comparative score, ±0.1 neutral band.
    Lexicon,
    /// Word-list presence counts, ±0.2 neutral band.
    Fallback,
}

/// Diagnostic detail behind a sentiment score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SentimentBreakdown {
    Lexicon {
        raw_score: f64,
        tokens: usize,
        positive: Vec<String>,
        negative: Vec<String>,
    },
    Fallback {
        positive_count: usize,
        negative_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub score: f64,
    pub label: SentimentLabel,
    pub method: SentimentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<SentimentBreakdown>,
}

/// One stemmed keyword and its weight within a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub word: String,
    pub count: usize,
    /// `count` over the number of tokens that survived filtering.
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStatistics {
    pub word_count: usize,
    pub sentence_count: usize,
    pub character_count: usize,
    pub average_word_length: f64,
    pub average_sentence_length: f64,
}

/// Full analyzer output for one document.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub sentiment: SentimentResult,
    pub keywords: Vec<KeywordResult>,
    pub statistics: TextStatistics,
}

/// Insert shape for the `urls` table.
#[derive(Debug, Clone)]
pub struct NewUrl {
    pub url: String,
    pub title: String,
    pub content: String,
    pub status: UrlStatus,
}

/// Row in the `urls` table.
#[derive(Debug, Clone, Serialize)]
pub struct UrlRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub status: UrlStatus,
    pub scraped_at: i64,
}

/// Insert shape for the `analyses` table.
///
/// `keywords` is an already-serialized keyword list; the store keeps it opaque.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub url_id: i64,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub keywords: String,
    pub word_count: i64,
}

/// Row in the `analyses` table.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub url_id: i64,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub keywords: String,
    pub word_count: i64,
    pub analyzed_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub name: String,
    pub description: String,
    pub data: String,
}

/// Row in the `reports` table.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub data: String,
    pub created_at: i64,
}

/// An analysis joined with the URL it was computed for.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub analysis_id: i64,
    pub url_id: i64,
    pub url: String,
    pub title: String,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub word_count: i64,
    pub analyzed_at: String, // ISO8601
}

/// Aggregate counts over every stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatistics {
    pub total_analyses: i64,
    pub sentiment_distribution: BTreeMap<String, i64>,
    pub average_sentiment: f64,
    pub recent_analyses_7days: i64,
}
