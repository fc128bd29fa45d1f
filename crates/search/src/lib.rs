//! Hybrid search over the hierarchical document index.
//!
//! Pipeline: configure (preset, auto-selected or explicit) -> expand the
//! query -> keyword and vector matching -> merge -> relationship
//! expansion -> rank with an optional diversity pass -> enrich with
//! document metadata, with a TTL result cache in front of the whole
//! thing.

mod cache;
mod error;
mod hybrid;
mod optimizer;
mod profile;
mod query_expansion;
mod rerank;

pub use cache::{CacheStats, ResultCache};
pub use error::{Result, SearchError};
pub use hybrid::{HybridSearch, MatchKind, ScoredResult};
pub use optimizer::StrategyOptimizer;
pub use profile::{SearchConfig, SearchStrategy};
pub use query_expansion::QueryExpander;
pub use rerank::DEFAULT_DIVERSITY_FACTOR;
