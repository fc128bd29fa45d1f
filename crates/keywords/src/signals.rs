//! The five scoring signals. Each returns a term map already min-max
//! normalized to `[0, 1]`; the scorer combines them with fixed weights.

use std::collections::{BTreeSet, HashMap, HashSet};

use ndarray::{Array1, Array2, Axis};

use crate::capability::{entity_label_weight, EntityRecognizer, PosTagger};
use crate::config::KeywordConfig;
use crate::tokenize::{clean_tokens, normalize_scores, sentence_words, split_sentences};

/// Term frequency times a length-heuristic inverse document frequency.
/// No corpus statistics: rarity is estimated from term length alone,
/// with configured domain terms doubled.
pub(crate) fn tfidf_scores(
    text: &str,
    config: &KeywordConfig,
    stopwords: &HashSet<String>,
    domain_terms: &HashSet<String>,
) -> HashMap<String, f64> {
    let words = clean_tokens(text, config, stopwords);
    let total = words.len() as f64;
    if words.is_empty() {
        return HashMap::new();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in words {
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut scores = HashMap::with_capacity(counts.len());
    for (word, count) in counts {
        let tf = count as f64 / total;
        let length_factor = (word.chars().count() as f64 / 10.0).min(1.0);
        let idf = (2.0_f64 / 1.5).ln() * (1.0 + length_factor);
        let mut score = tf * idf;
        if domain_terms.contains(&word) {
            score *= 2.0;
        }
        scores.insert(word, score);
    }
    normalize_scores(scores)
}

/// Graph ranking over token co-occurrence. A window of five positions
/// on each side within every sentence builds the adjacency counts; the
/// column-normalized matrix is iterated thirty times with damping 0.85
/// from a uniform start.
pub(crate) fn textrank_scores(
    text: &str,
    config: &KeywordConfig,
    stopwords: &HashSet<String>,
) -> HashMap<String, f64> {
    const WINDOW: usize = 5;
    const DAMPING: f64 = 0.85;
    const ITERATIONS: usize = 30;

    let sentences: Vec<Vec<String>> = split_sentences(text)
        .into_iter()
        .map(|s| clean_tokens(s, config, stopwords))
        .collect();

    let vocab: BTreeSet<&str> = sentences
        .iter()
        .flatten()
        .map(String::as_str)
        .collect();
    if vocab.is_empty() {
        return HashMap::new();
    }

    let vocab: Vec<&str> = vocab.into_iter().collect();
    let index: HashMap<&str, usize> = vocab.iter().enumerate().map(|(i, w)| (*w, i)).collect();
    let n = vocab.len();

    let mut co_occurrence = Array2::<f64>::zeros((n, n));
    for words in &sentences {
        for (i, word) in words.iter().enumerate() {
            let lo = i.saturating_sub(WINDOW);
            let hi = (i + WINDOW + 1).min(words.len());
            for j in lo..hi {
                if i != j {
                    co_occurrence[[index[word.as_str()], index[words[j].as_str()]]] += 1.0;
                }
            }
        }
    }

    let degrees = co_occurrence.sum_axis(Axis(0));
    let mut transition = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        if degrees[i] > 0.0 {
            let column = co_occurrence.column(i).mapv(|v| v / degrees[i]);
            transition.column_mut(i).assign(&column);
        }
    }

    let teleport = (1.0 - DAMPING) / n as f64;
    let mut ranks = Array1::<f64>::from_elem(n, 1.0 / n as f64);
    for _ in 0..ITERATIONS {
        ranks = transition.dot(&ranks) * DAMPING + teleport;
    }

    let scores = vocab
        .iter()
        .enumerate()
        .map(|(i, word)| ((*word).to_string(), ranks[i]))
        .collect();
    normalize_scores(scores)
}

/// Entity mentions weighted by label, summed over repeats.
pub(crate) fn ner_scores(
    text: &str,
    recognizer: &dyn EntityRecognizer,
) -> HashMap<String, f64> {
    let mut scores: HashMap<String, f64> = HashMap::new();
    for sentence in split_sentences(text) {
        for entity in recognizer.entities(sentence) {
            let weight = entity_label_weight(&entity.label);
            *scores.entry(entity.text.to_lowercase()).or_insert(0.0) += weight;
        }
    }
    normalize_scores(scores)
}

/// Part-of-speech patterns that form acceptable multi-word phrases.
const PHRASE_PATTERNS: &[&[&str]] = &[
    &["JJ", "NN"],
    &["JJ", "NNS"],
    &["NN", "NN"],
    &["NN", "NNS"],
    &["JJ", "JJ", "NN"],
    &["JJ", "NN", "NN"],
    &["NN", "IN", "NN"],
];

/// Stopword-free phrases matching the fixed tag patterns, scored by
/// relative frequency with a small bonus per extra word.
pub(crate) fn phrase_scores(
    text: &str,
    config: &KeywordConfig,
    stopwords: &HashSet<String>,
    tagger: &dyn PosTagger,
) -> HashMap<String, f64> {
    let mut frequencies: HashMap<String, usize> = HashMap::new();

    for sentence in split_sentences(text) {
        let words = sentence_words(sentence);
        if words.is_empty() {
            continue;
        }
        let tags = tagger.tag(&words);
        if tags.len() != words.len() {
            log::warn!(
                "Tagger returned {} tags for {} words; skipping sentence",
                tags.len(),
                words.len()
            );
            continue;
        }

        for pattern in PHRASE_PATTERNS {
            if pattern.len() > config.max_phrase_length || pattern.len() > words.len() {
                continue;
            }
            for start in 0..=(words.len() - pattern.len()) {
                let window_tags = &tags[start..start + pattern.len()];
                if window_tags.iter().map(String::as_str).ne(pattern.iter().copied()) {
                    continue;
                }
                let window_words = &words[start..start + pattern.len()];
                if window_words.iter().any(|w| stopwords.contains(w)) {
                    continue;
                }
                *frequencies.entry(window_words.join(" ")).or_insert(0) += 1;
            }
        }
    }

    if frequencies.is_empty() {
        return HashMap::new();
    }
    let max_frequency = frequencies.values().copied().max().unwrap_or(1) as f64;
    let scores = frequencies
        .into_iter()
        .map(|(phrase, frequency)| {
            let word_count = phrase.split(' ').count() as f64;
            let score = frequency as f64 / max_frequency * (1.0 + 0.1 * (word_count - 1.0));
            (phrase, score)
        })
        .collect();
    normalize_scores(scores)
}

/// Configured domain terms present in the text, scored by doubled raw
/// frequency.
pub(crate) fn domain_scores(
    text: &str,
    config: &KeywordConfig,
    stopwords: &HashSet<String>,
    domain_terms: &HashSet<String>,
) -> HashMap<String, f64> {
    if domain_terms.is_empty() {
        return HashMap::new();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in clean_tokens(text, config, stopwords) {
        *counts.entry(word).or_insert(0) += 1;
    }

    let scores: HashMap<String, f64> = domain_terms
        .iter()
        .filter_map(|term| {
            counts
                .get(term)
                .map(|&count| (term.clone(), count as f64 * 2.0))
        })
        .collect();
    normalize_scores(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Entity;
    use crate::tokenize::STOPWORDS;
    use pretty_assertions::assert_eq;

    fn stop_set() -> HashSet<String> {
        STOPWORDS.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn tfidf_favors_frequent_specific_terms() {
        let config = KeywordConfig::default();
        let scores = tfidf_scores(
            "indexing indexing indexing retrieval cat",
            &config,
            &stop_set(),
            &HashSet::new(),
        );

        assert_eq!(scores["indexing"], 1.0);
        assert!(scores["retrieval"] > scores["cat"]);
    }

    #[test]
    fn tfidf_doubles_domain_terms() {
        let config = KeywordConfig::default();
        let domain: HashSet<String> = ["quartzite".to_string()].into_iter().collect();
        let with_boost = tfidf_scores("quartzite sandstone", &config, &stop_set(), &domain);
        let without = tfidf_scores("quartzite sandstone", &config, &stop_set(), &HashSet::new());

        assert_eq!(with_boost["quartzite"], 1.0);
        assert_eq!(with_boost["sandstone"], 0.0);
        // Same length, same frequency: without the boost both normalize
        // to 1.0.
        assert_eq!(without["quartzite"], 1.0);
        assert_eq!(without["sandstone"], 1.0);
    }

    #[test]
    fn textrank_ranks_hub_terms_highest() {
        let config = KeywordConfig::default();
        let text = "graph search improves graph indexing. graph ranking helps search. \
                    indexing feeds ranking.";
        let scores = textrank_scores(text, &config, &stop_set());

        let top = scores
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(term, _)| term.as_str());
        assert_eq!(top, Some("graph"));
        assert!(scores.values().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn textrank_of_empty_text_is_empty() {
        let config = KeywordConfig::default();
        assert!(textrank_scores("", &config, &stop_set()).is_empty());
    }

    struct FixedRecognizer;

    impl EntityRecognizer for FixedRecognizer {
        fn entities(&self, sentence: &str) -> Vec<Entity> {
            let mut found = Vec::new();
            if sentence.contains("Acme") {
                found.push(Entity::new("Acme", "ORGANIZATION"));
            }
            if sentence.contains("Paris") {
                found.push(Entity::new("Paris", "GPE"));
            }
            found
        }
    }

    #[test]
    fn ner_sums_repeat_mentions_and_lowercases() {
        let scores = ner_scores("Acme ships. Acme hires in Paris.", &FixedRecognizer);

        // Two 0.9 mentions beat one 0.7 mention; min-max puts them at
        // the ends of the range.
        assert_eq!(scores["acme"], 1.0);
        assert_eq!(scores["paris"], 0.0);
    }

    struct LexiconTagger;

    impl PosTagger for LexiconTagger {
        fn tag(&self, words: &[String]) -> Vec<String> {
            words
                .iter()
                .map(|word| match word.as_str() {
                    "fast" | "hybrid" => "JJ",
                    "of" => "IN",
                    _ => "NN",
                })
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn phrases_match_tag_patterns_without_stopwords() {
        let config = KeywordConfig::default();
        let scores = phrase_scores(
            "fast search beats slow scans. fast search wins again.",
            &config,
            &stop_set(),
            &LexiconTagger,
        );

        assert!(scores.contains_key("fast search"));
        assert_eq!(scores["fast search"], 1.0);
    }

    #[test]
    fn phrases_longer_than_the_cap_are_skipped() {
        let config = KeywordConfig {
            max_phrase_length: 1,
            ..KeywordConfig::default()
        };
        let scores = phrase_scores("fast search", &config, &stop_set(), &LexiconTagger);
        assert!(scores.is_empty());
    }

    #[test]
    fn domain_scores_cover_only_present_terms() {
        let config = KeywordConfig::default();
        let domain: HashSet<String> =
            ["kernel".to_string(), "absent".to_string()].into_iter().collect();
        let scores = domain_scores(
            "kernel tuning notes mention kernel twice",
            &config,
            &stop_set(),
            &domain,
        );

        assert_eq!(scores.len(), 1);
        assert_eq!(scores["kernel"], 1.0);
    }
}
