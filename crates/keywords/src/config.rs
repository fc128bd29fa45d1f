use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Tuning surface for multi-method keyword extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Cap on emitted terms after combination.
    pub max_keywords: usize,
    /// Tokens shorter than this are dropped during cleaning.
    pub min_keyword_length: usize,
    /// Tokens longer than this are dropped during cleaning.
    pub max_keyword_length: usize,
    /// Run part-of-speech phrase extraction when a tagger is attached.
    pub include_phrases: bool,
    /// Longest part-of-speech pattern considered, in words.
    pub max_phrase_length: usize,
    /// Run the co-occurrence graph ranking signal.
    pub use_textrank: bool,
    /// Run entity scoring when a recognizer is attached.
    pub use_ner: bool,
    /// Terms whose frequency scores are doubled and that feed the
    /// dedicated domain signal.
    pub domain_terms: HashSet<String>,
    /// Extra stopwords merged into the built-in English set.
    pub additional_stopwords: HashSet<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            max_keywords: 20,
            min_keyword_length: 2,
            max_keyword_length: 30,
            include_phrases: true,
            max_phrase_length: 3,
            use_textrank: true,
            use_ner: true,
            domain_terms: HashSet::new(),
            additional_stopwords: HashSet::new(),
        }
    }
}

impl KeywordConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_keywords == 0 {
            return Err(crate::KeywordError::InvalidConfig(
                "max_keywords must be positive".to_string(),
            ));
        }
        if self.min_keyword_length > self.max_keyword_length {
            return Err(crate::KeywordError::InvalidConfig(format!(
                "min_keyword_length {} exceeds max_keyword_length {}",
                self.min_keyword_length, self.max_keyword_length
            )));
        }
        Ok(())
    }
}
