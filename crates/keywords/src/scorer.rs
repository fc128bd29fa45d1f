use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::capability::{EntityRecognizer, PosTagger};
use crate::config::KeywordConfig;
use crate::signals;
use crate::tokenize::STOPWORDS;
use crate::Result;

/// Signal weights, in method order: TF-IDF, TextRank, entities,
/// phrases, domain terms.
const METHOD_WEIGHTS: [f64; 5] = [0.30, 0.25, 0.20, 0.15, 0.10];

/// Cap for the frequency-only fallback extractor.
const SIMPLE_KEYWORD_CAP: usize = 10;

/// One extracted term with its combined importance in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTerm {
    pub term: String,
    pub score: f32,
}

/// Multi-method keyword extraction.
///
/// Combines TF-IDF, TextRank, entity recognition, phrase extraction and
/// domain-term matching with fixed weights. The title is counted twice
/// so its terms outrank body-only terms of equal frequency. Entity and
/// phrase signals only run when the corresponding capability is
/// attached; absent capabilities are skipped, never an error.
pub struct KeywordScorer {
    config: KeywordConfig,
    stop_words: HashSet<String>,
    domain_terms: HashSet<String>,
    recognizer: Option<Box<dyn EntityRecognizer>>,
    tagger: Option<Box<dyn PosTagger>>,
}

impl KeywordScorer {
    pub fn new(config: KeywordConfig) -> Result<Self> {
        config.validate()?;
        let mut stop_words: HashSet<String> =
            STOPWORDS.iter().map(|s| (*s).to_string()).collect();
        stop_words.extend(config.additional_stopwords.iter().map(|s| s.to_lowercase()));
        let domain_terms = config.domain_terms.iter().map(|s| s.to_lowercase()).collect();
        Ok(Self {
            config,
            stop_words,
            domain_terms,
            recognizer: None,
            tagger: None,
        })
    }

    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Box<dyn EntityRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    #[must_use]
    pub fn with_tagger(mut self, tagger: Box<dyn PosTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    #[must_use]
    pub fn config(&self) -> &KeywordConfig {
        &self.config
    }

    /// Extract up to `max_keywords` terms, strongest first.
    #[must_use]
    pub fn extract(&self, title: &str, content: &str) -> Vec<ScoredTerm> {
        let text = format!("{title} {title} {content}");

        let tfidf =
            signals::tfidf_scores(&text, &self.config, &self.stop_words, &self.domain_terms);

        let textrank = if self.config.use_textrank {
            signals::textrank_scores(&text, &self.config, &self.stop_words)
        } else {
            HashMap::new()
        };

        let entities = match (&self.recognizer, self.config.use_ner) {
            (Some(recognizer), true) => signals::ner_scores(&text, recognizer.as_ref()),
            _ => HashMap::new(),
        };

        let phrases = match (&self.tagger, self.config.include_phrases) {
            (Some(tagger), true) => {
                signals::phrase_scores(&text, &self.config, &self.stop_words, tagger.as_ref())
            }
            _ => HashMap::new(),
        };

        let domain =
            signals::domain_scores(&text, &self.config, &self.stop_words, &self.domain_terms);

        let mut combined: HashMap<String, f64> = HashMap::new();
        let methods = [tfidf, textrank, entities, phrases, domain];
        for (scores, weight) in methods.into_iter().zip(METHOD_WEIGHTS) {
            for (term, score) in scores {
                *combined.entry(term).or_insert(0.0) += score * weight;
            }
        }

        let mut ranked: Vec<(String, f64)> = combined.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(self.config.max_keywords);

        log::debug!("Extracted {} keywords from {} chars", ranked.len(), text.len());
        ranked
            .into_iter()
            .map(|(term, score)| ScoredTerm { term, score: score as f32 })
            .collect()
    }
}

/// Frequency-only fallback: lowercase, drop punctuation outright, keep
/// non-stopword tokens longer than two characters, score by frequency
/// over the maximum frequency, return the top ten.
#[must_use]
pub fn simple_extract(title: &str, content: &str) -> Vec<ScoredTerm> {
    let text = format!("{title} {content}").to_lowercase();
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in cleaned
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(*word) && word.chars().count() > 2)
    {
        *counts.entry(word).or_insert(0) += 1;
    }

    let max_count = counts.values().copied().max().unwrap_or(1) as f64;
    let mut ranked: Vec<(String, f64)> = counts
        .into_iter()
        .map(|(word, count)| (word.to_string(), count as f64 / max_count))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(SIMPLE_KEYWORD_CAP);

    ranked
        .into_iter()
        .map(|(term, score)| ScoredTerm { term, score: score as f32 })
        .collect()
}
