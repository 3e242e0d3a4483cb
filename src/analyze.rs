//! Text analysis: sentiment, keywords, and basic statistics.
//!
//! The [`Analyzer`] is built once (stop words, lexicon, stemmer) and then
//! used by reference; every method is a pure function of its input text.
//!
//! # Sentiment strategies
//!
//! | Strategy | Score | Neutral band |
//! |----------|-------|--------------|
//! | [`SentimentMethod::Lexicon`] | sum of token weights / token count | ±0.1 |
//! | [`SentimentMethod::Fallback`] | (pos − neg) / (pos + neg) word-list hits | ±0.2 |
//!
//! The lexicon strategy runs whenever a lexicon is loaded and the text has at
//! least one token. Otherwise the fallback runs, so empty or punctuation-only
//! input is labelled by the cheaper, more conservative method.

use indexmap::IndexMap;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

use crate::lexicon::{self, Lexicon, FALLBACK_NEGATIVE, FALLBACK_POSITIVE};
use crate::models::{
    AnalysisResult, KeywordResult, SentimentBreakdown, SentimentLabel, SentimentMethod,
    SentimentResult, TextStatistics,
};

pub const LEXICON_THRESHOLD: f64 = 0.1;
pub const FALLBACK_THRESHOLD: f64 = 0.2;
pub const DEFAULT_TOP_KEYWORDS: usize = 10;

pub struct Analyzer {
    stop_words: HashSet<&'static str>,
    lexicon: Option<Lexicon>,
    stemmer: Stemmer,
    top_keywords: usize,
}

impl Analyzer {
    /// Analyzer with the built-in English lexicon.
    pub fn new() -> Self {
        Self::with_lexicon(Some(Lexicon::english()))
    }

    /// Analyzer that always scores sentiment with the fallback word lists.
    pub fn without_lexicon() -> Self {
        Self::with_lexicon(None)
    }

    fn with_lexicon(lexicon: Option<Lexicon>) -> Self {
        Self {
            stop_words: lexicon::stop_words(),
            lexicon,
            stemmer: Stemmer::create(Algorithm::English),
            top_keywords: DEFAULT_TOP_KEYWORDS,
        }
    }

    /// Override how many keywords [`analyze`](Analyzer::analyze) keeps.
    pub fn top_keywords(mut self, n: usize) -> Self {
        self.top_keywords = n;
        self
    }

    pub fn analyze(&self, text: &str) -> AnalysisResult {
        AnalysisResult {
            sentiment: self.sentiment(text),
            keywords: self.keywords(text, self.top_keywords),
            statistics: self.statistics(text),
        }
    }

    pub fn sentiment(&self, text: &str) -> SentimentResult {
        let tokens = sentiment_tokens(text);
        match &self.lexicon {
            Some(lex) if !tokens.is_empty() => lexicon_sentiment(lex, &tokens),
            _ => fallback_sentiment(text),
        }
    }

    /// Top `top_n` stems by count, ties kept in first-seen order.
    pub fn keywords(&self, text: &str, top_n: usize) -> Vec<KeywordResult> {
        let lowered = text.to_lowercase();
        let filtered: Vec<&str> = word_tokens(&lowered)
            .filter(|w| self.is_keyword_candidate(w))
            .collect();

        if filtered.is_empty() {
            return Vec::new();
        }

        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for word in &filtered {
            *counts.entry(self.stemmer.stem(word).into_owned()).or_insert(0) += 1;
        }

        let total = filtered.len() as f64;
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        // sort_by is stable, so equal counts keep insertion order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(top_n);

        ranked
            .into_iter()
            .map(|(word, count)| KeywordResult {
                word,
                count,
                frequency: count as f64 / total,
            })
            .collect()
    }

    pub fn statistics(&self, text: &str) -> TextStatistics {
        let words: Vec<&str> = word_tokens(text).collect();
        let sentence_count = text
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count();
        let word_chars: usize = words.iter().map(|w| w.chars().count()).sum();

        let word_count = words.len();
        TextStatistics {
            word_count,
            sentence_count,
            character_count: text.chars().count(),
            average_word_length: if word_count > 0 {
                word_chars as f64 / word_count as f64
            } else {
                0.0
            },
            average_sentence_length: if sentence_count > 0 {
                word_count as f64 / sentence_count as f64
            } else {
                0.0
            },
        }
    }

    fn is_keyword_candidate(&self, word: &str) -> bool {
        word.len() > 2
            && word.chars().all(|c| c.is_ascii_alphabetic())
            && !self.stop_words.contains(word)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Split on anything outside `[A-Za-z0-9_]`. Accented letters are
/// separators, so "résumé" yields "r" and "sum".
fn word_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
}

/// Lowercased tokens with apostrophes dropped, so "Don't" becomes "dont".
fn sentiment_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.replace('\'', ""))
        .filter(|t| !t.is_empty())
        .collect()
}

fn lexicon_sentiment(lex: &Lexicon, tokens: &[String]) -> SentimentResult {
    let mut raw_score = 0.0;
    let mut positive = Vec::new();
    let mut negative = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let Some(mut weight) = lex.weight(token) else {
            continue;
        };
        if i > 0 && lex.is_negator(&tokens[i - 1]) {
            weight = -weight;
        }
        if weight > 0.0 {
            positive.push(token.clone());
        } else if weight < 0.0 {
            negative.push(token.clone());
        }
        raw_score += weight;
    }

    let score = raw_score / tokens.len() as f64;
    SentimentResult {
        score,
        label: SentimentLabel::from_score(score, LEXICON_THRESHOLD),
        method: SentimentMethod::Lexicon,
        breakdown: Some(SentimentBreakdown::Lexicon {
            raw_score,
            tokens: tokens.len(),
            positive,
            negative,
        }),
    }
}

/// Word-list presence scoring. Each list word counts once if it occurs
/// anywhere in the text as a case-insensitive substring.
pub fn fallback_sentiment(text: &str) -> SentimentResult {
    let lowered = text.to_lowercase();
    let positive_count = FALLBACK_POSITIVE
        .iter()
        .filter(|w| lowered.contains(*w))
        .count();
    let negative_count = FALLBACK_NEGATIVE
        .iter()
        .filter(|w| lowered.contains(*w))
        .count();

    let total = positive_count + negative_count;
    let score = if total > 0 {
        (positive_count as f64 - negative_count as f64) / total as f64
    } else {
        0.0
    };

    SentimentResult {
        score,
        label: SentimentLabel::from_score(score, FALLBACK_THRESHOLD),
        method: SentimentMethod::Fallback,
        breakdown: Some(SentimentBreakdown::Fallback {
            positive_count,
            negative_count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_scenario_sentence() {
        let analyzer = Analyzer::new();
        let result = analyzer.analyze("Great news! This is amazing.");

        assert_eq!(result.sentiment.method, SentimentMethod::Lexicon);
        assert_eq!(result.sentiment.label, SentimentLabel::Positive);
        // (0.6 + 0.8) / 5 tokens
        assert!((result.sentiment.score - 0.28).abs() < 1e-9);

        let words: Vec<&str> = result.keywords.iter().map(|k| k.word.as_str()).collect();
        assert!(words.contains(&"great"), "{:?}", words);
        assert!(words.contains(&"amaz"), "{:?}", words);
    }

    #[test]
    fn test_negative_text() {
        let s = Analyzer::new().sentiment("This was a terrible, awful experience.");
        assert_eq!(s.label, SentimentLabel::Negative);
        assert!(s.score < -0.1);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let analyzer = Analyzer::new();
        let plain = analyzer.sentiment("good");
        let negated = analyzer.sentiment("not good");
        assert!(plain.score > 0.0);
        assert!(negated.score < 0.0);
    }

    #[test]
    fn test_lexicon_score_bounded() {
        let analyzer = Analyzer::new();
        for text in [
            "outstanding superb outstanding",
            "fraud fraud fraud",
            "not fraud never evil",
            "wow",
            "",
        ] {
            let s = analyzer.sentiment(text);
            assert!((-1.0..=1.0).contains(&s.score), "{}: {}", text, s.score);
        }
    }

    #[test]
    fn test_empty_text_uses_fallback_neutral() {
        let s = Analyzer::new().sentiment("  ... !!! ");
        assert_eq!(s.method, SentimentMethod::Fallback);
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn test_fallback_no_matches_is_neutral() {
        let s = fallback_sentiment("The committee met on Tuesday.");
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn test_fallback_tighter_band() {
        // 3 positive, 2 negative -> 0.2, which is not > 0.2
        let s = fallback_sentiment("good great best, bad poor");
        assert!((s.score - 0.2).abs() < 1e-9);
        assert_eq!(s.label, SentimentLabel::Neutral);

        let s = fallback_sentiment("I love this, it is the best");
        assert_eq!(s.label, SentimentLabel::Positive);
    }

    #[test]
    fn test_without_lexicon_uses_fallback() {
        let s = Analyzer::without_lexicon().sentiment("Awesome and wonderful");
        assert_eq!(s.method, SentimentMethod::Fallback);
        assert_eq!(s.label, SentimentLabel::Positive);
        assert_eq!(s.score, 1.0);
    }

    #[test]
    fn test_keywords_stem_variants_together() {
        let kws = Analyzer::new().keywords("running runs runner running", 10);
        assert_eq!(kws[0].word, "run");
        assert_eq!(kws[0].count, 3);
    }

    #[test]
    fn test_keywords_filter_and_frequency_denominator() {
        // "the", "is", "a", "on" are stop words; "ox" is too short; "abc123" is not alphabetic
        let kws = Analyzer::new().keywords("The cat is a cat on the mat ox abc123", 10);
        assert_eq!(kws.len(), 2);
        assert_eq!(kws[0].word, "cat");
        assert_eq!(kws[0].count, 2);
        // denominator is 3 filtered tokens, not 10 raw tokens
        assert!((kws[0].frequency - 2.0 / 3.0).abs() < 1e-9);
        let sum: f64 = kws.iter().map(|k| k.frequency).sum();
        assert!(sum <= 1.0 + 1e-9);
    }

    #[test]
    fn test_keywords_ties_keep_first_seen_order() {
        let kws = Analyzer::new().keywords("zebra apple mango", 10);
        let words: Vec<&str> = kws.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["zebra", "appl", "mango"]);
    }

    #[test]
    fn test_keywords_top_n() {
        let kws = Analyzer::new().keywords("alpha beta gamma delta epsilon alpha", 2);
        assert_eq!(kws.len(), 2);
        assert_eq!(kws[0].word, "alpha");
    }

    #[test]
    fn test_statistics() {
        let stats = Analyzer::new().statistics("Hello world. How are you? Fine!");
        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.sentence_count, 3);
        assert_eq!(stats.character_count, 31);
        assert!((stats.average_sentence_length - 2.0).abs() < 1e-9);
        // 5 + 5 + 3 + 3 + 3 + 4 = 23 chars over 6 words
        assert!((stats.average_word_length - 23.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_statistics_empty() {
        let stats = Analyzer::new().statistics("");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.sentence_count, 0);
        assert_eq!(stats.average_word_length, 0.0);
        assert_eq!(stats.average_sentence_length, 0.0);
    }

    #[test]
    fn test_non_ascii_letters_split_words() {
        let analyzer = Analyzer::new();
        let kws = analyzer.keywords("Résumé résumé", 10);
        assert_eq!(kws.len(), 1);
        assert_eq!(kws[0].word, "sum");
        assert_eq!(kws[0].count, 2);

        let stats = analyzer.statistics("Café résumé.");
        // caf, r, sum
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.sentence_count, 1);
    }
}
