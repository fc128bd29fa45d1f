//! Shared text cleaning used by every extraction signal.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::KeywordConfig;

/// Built-in English stopwords, matching the usual NLP toolkit set
/// (contraction stems like "don" and "ve" included because cleaning
/// splits them off).
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
        "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
        "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn",
        "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
    ]
    .into_iter()
    .collect()
});

/// Lowercase, strip everything except word characters and hyphens, then
/// drop stopwords, out-of-range lengths, and purely numeric tokens.
pub(crate) fn clean_tokens(
    text: &str,
    config: &KeywordConfig,
    stopwords: &HashSet<String>,
) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !stopwords.contains(*word))
        .filter(|word| {
            let len = word.chars().count();
            len >= config.min_keyword_length && len <= config.max_keyword_length
        })
        .filter(|word| !word.chars().all(char::is_numeric))
        .map(str::to_string)
        .collect()
}

/// Sentence boundaries per UAX #29, trimmed and non-empty.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Word boundaries per UAX #29 (punctuation dropped), lowercased.
pub(crate) fn sentence_words(sentence: &str) -> Vec<String> {
    sentence
        .unicode_words()
        .map(str::to_lowercase)
        .collect()
}

/// Min-max normalization into `[0, 1]`. A constant map flattens to all
/// ones; an empty map stays empty.
pub(crate) fn normalize_scores(
    scores: std::collections::HashMap<String, f64>,
) -> std::collections::HashMap<String, f64> {
    if scores.is_empty() {
        return scores;
    }
    let min = scores.values().copied().fold(f64::INFINITY, f64::min);
    let max = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return scores.into_keys().map(|k| (k, 1.0)).collect();
    }
    scores
        .into_iter()
        .map(|(k, v)| (k, (v - min) / (max - min)))
        .collect()
}
