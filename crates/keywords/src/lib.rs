//! Multi-method keyword extraction.
//!
//! Five weighted signals (TF-IDF, TextRank, entity recognition, phrase
//! patterns, domain terms) are min-max normalized and combined into a
//! single importance per term. Entity recognition and tagging are trait
//! seams so language tooling can be plugged in without this crate
//! depending on any model runtime.

mod capability;
mod config;
mod error;
mod scorer;
mod signals;
mod tokenize;

pub use capability::{entity_label_weight, Entity, EntityRecognizer, PosTagger};
pub use config::KeywordConfig;
pub use error::{KeywordError, Result};
pub use scorer::{simple_extract, KeywordScorer, ScoredTerm};
pub use tokenize::STOPWORDS;
