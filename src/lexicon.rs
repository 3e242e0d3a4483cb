//! Fixed word lists used by the analyzer.
//!
//! Weights in [`POLARITY`] follow the AFINN convention of integers in
//! `-5..=5`; the analyzer divides them by [`MAX_POLARITY`] so a single token
//! never contributes more than ±1.

use std::collections::{HashMap, HashSet};

pub const MAX_POLARITY: f64 = 5.0;

pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with", "this", "but", "they", "have",
    "had", "what", "said", "each", "which", "she", "do", "how", "their", "if", "up", "out", "many",
    "then", "them", "these", "so", "some", "her", "would", "make", "like", "into", "him", "time",
    "two", "more", "go", "no", "way", "could", "my", "than", "first", "been", "call", "who", "oil",
    "sit", "now", "find", "down", "day", "did", "get", "come", "made", "may", "part", "or", "not",
    "can", "one", "all", "also", "about", "when", "new", "use", "see", "just", "only", "other",
    "over", "after", "work", "through", "very", "back", "where", "much", "before", "right", "too",
    "any", "same",
];

/// Tokens that flip the polarity of the lexicon word right after them.
pub const NEGATORS: &[&str] = &[
    "not", "no", "never", "dont", "doesnt", "didnt", "isnt", "wasnt", "arent", "cant", "cannot",
    "wont", "shouldnt", "wouldnt", "couldnt", "aint",
];

pub const FALLBACK_POSITIVE: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic", "awesome", "perfect", "best",
    "love",
];

pub const FALLBACK_NEGATIVE: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "worst", "hate", "disgusting", "disappointing", "poor",
    "fail",
];

const POLARITY: &[(&str, i8)] = &[
    // positive
    ("amazing", 4),
    ("amazed", 2),
    ("awesome", 4),
    ("beautiful", 3),
    ("benefit", 2),
    ("best", 3),
    ("better", 2),
    ("brilliant", 4),
    ("celebrate", 3),
    ("clean", 2),
    ("comfortable", 2),
    ("confident", 2),
    ("cool", 1),
    ("delight", 3),
    ("delighted", 3),
    ("easy", 1),
    ("effective", 2),
    ("enjoy", 2),
    ("enjoyed", 2),
    ("excellent", 3),
    ("excited", 3),
    ("exciting", 3),
    ("fabulous", 4),
    ("fantastic", 4),
    ("fair", 2),
    ("fine", 2),
    ("free", 1),
    ("fresh", 1),
    ("friendly", 2),
    ("fun", 4),
    ("glad", 3),
    ("good", 3),
    ("grateful", 3),
    ("great", 3),
    ("happy", 3),
    ("healthy", 2),
    ("helpful", 2),
    ("hope", 2),
    ("ideal", 2),
    ("impressive", 3),
    ("improve", 2),
    ("improved", 2),
    ("innovative", 2),
    ("inspiring", 3),
    ("interesting", 2),
    ("kind", 2),
    ("like", 2),
    ("love", 3),
    ("loved", 3),
    ("lovely", 3),
    ("lucky", 3),
    ("nice", 3),
    ("outstanding", 5),
    ("perfect", 3),
    ("pleasant", 3),
    ("pleased", 3),
    ("popular", 3),
    ("positive", 2),
    ("powerful", 2),
    ("recommend", 2),
    ("reliable", 2),
    ("safe", 1),
    ("success", 2),
    ("successful", 3),
    ("superb", 5),
    ("support", 2),
    ("thank", 2),
    ("thanks", 2),
    ("top", 2),
    ("useful", 2),
    ("win", 4),
    ("winner", 4),
    ("wonderful", 4),
    ("wow", 4),
    // negative
    ("abuse", -3),
    ("angry", -3),
    ("annoying", -2),
    ("anxious", -2),
    ("awful", -3),
    ("bad", -3),
    ("boring", -3),
    ("broken", -1),
    ("catastrophe", -3),
    ("crash", -2),
    ("crisis", -3),
    ("cruel", -3),
    ("damage", -3),
    ("danger", -2),
    ("dangerous", -2),
    ("dead", -3),
    ("death", -2),
    ("decline", -1),
    ("difficult", -1),
    ("disappointed", -2),
    ("disappointing", -2),
    ("disaster", -2),
    ("disgusting", -3),
    ("dislike", -2),
    ("error", -2),
    ("evil", -3),
    ("fail", -2),
    ("failed", -2),
    ("failure", -2),
    ("fake", -3),
    ("fear", -2),
    ("fraud", -4),
    ("frustrated", -2),
    ("hate", -3),
    ("hated", -3),
    ("horrible", -3),
    ("hurt", -2),
    ("ill", -2),
    ("kill", -3),
    ("lose", -3),
    ("loss", -3),
    ("mess", -2),
    ("negative", -2),
    ("pain", -2),
    ("panic", -3),
    ("poor", -2),
    ("problem", -2),
    ("problems", -2),
    ("risk", -2),
    ("sad", -2),
    ("scandal", -3),
    ("scary", -2),
    ("slow", -2),
    ("stupid", -2),
    ("terrible", -3),
    ("threat", -2),
    ("tragic", -2),
    ("ugly", -3),
    ("unfair", -2),
    ("unhappy", -2),
    ("useless", -2),
    ("violence", -3),
    ("war", -2),
    ("weak", -2),
    ("worried", -3),
    ("worse", -3),
    ("worst", -3),
    ("wrong", -2),
];

pub fn stop_words() -> HashSet<&'static str> {
    STOP_WORDS.iter().copied().collect()
}

/// Weighted polarity lexicon with weights normalized into `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct Lexicon {
    weights: HashMap<&'static str, f64>,
    negators: HashSet<&'static str>,
}

impl Lexicon {
    /// The built-in English lexicon.
    pub fn english() -> Self {
        Self {
            weights: POLARITY
                .iter()
                .map(|(word, weight)| (*word, f64::from(*weight) / MAX_POLARITY))
                .collect(),
            negators: NEGATORS.iter().copied().collect(),
        }
    }

    pub fn weight(&self, token: &str) -> Option<f64> {
        self.weights.get(token).copied()
    }

    pub fn is_negator(&self, token: &str) -> bool {
        self.negators.contains(token)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
