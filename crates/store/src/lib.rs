//! # Outline Store
//!
//! Data model and persistence for the hierarchical document index:
//! section nodes, weighted keywords, typed relationships, and the
//! embedding plumbing everything above it shares.
//!
//! The store boundary is two traits:
//! - [`NodeStore`]: atomic per-document persistence plus the similarity
//!   and relationship queries the search pipeline runs;
//! - [`EmbeddingProvider`]: black-box text-to-vector capability,
//!   deterministic for identical input.
//!
//! [`MemoryStore`] and [`FileStore`] implement the former;
//! [`HashEmbedder`] implements the latter without any model runtime, which
//! keeps index builds reproducible.

mod embedding;
mod error;
mod file;
mod store;
mod types;

pub use embedding::{
    cosine_similarity, model_spec, CachedEmbedder, EmbeddingModelSpec, EmbeddingProvider,
    HashEmbedder, DEFAULT_MODEL_ID, EMBEDDING_MODELS,
};
pub use error::{Result, StoreError};
pub use file::FileStore;
pub use store::{MemoryStore, NodeStore};
pub use types::{
    DocumentMeta, Keyword, KeywordHit, RelationKind, Relationship, SectionNode, SimilarityHit,
    StoreStats,
};
