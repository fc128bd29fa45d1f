//! Pluggable language-analysis capabilities.
//!
//! Entity recognition and part-of-speech tagging are optional: when no
//! implementation is attached the corresponding signals contribute
//! nothing and extraction carries on with the remaining methods.

/// A named entity detected in a sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Surface text as it appeared.
    pub text: String,
    /// Recognizer label, e.g. `ORGANIZATION` or `PERSON`.
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self { text: text.into(), label: label.into() }
    }
}

/// Detects named entities in a sentence.
pub trait EntityRecognizer: Send + Sync {
    fn entities(&self, sentence: &str) -> Vec<Entity>;
}

/// Assigns one part-of-speech tag (Penn Treebank style: `NN`, `JJ`,
/// `IN`, ...) per input word.
pub trait PosTagger: Send + Sync {
    fn tag(&self, words: &[String]) -> Vec<String>;
}

/// Importance weight for an entity label; unknown labels score 0.5.
#[must_use]
pub fn entity_label_weight(label: &str) -> f64 {
    match label {
        "ORGANIZATION" => 0.9,
        "PERSON" | "PRODUCT" => 0.8,
        "GPE" | "FACILITY" | "EVENT" => 0.7,
        "LOCATION" | "WORK_OF_ART" => 0.6,
        "LANGUAGE" => 0.5,
        _ => 0.5,
    }
}
