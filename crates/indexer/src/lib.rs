//! # Outline Indexer
//!
//! Document indexing facade for hierarchical hybrid search.
//!
//! ## Pipeline
//!
//! ```text
//! Directory / content
//!     │
//!     ├──> Corpus Scanner (.gitignore aware, markdown only)
//!     │      └─> Documents
//!     │
//!     ├──> Segmenter ──> Keyword Scorer ──> Embeddings
//!     │      └─> Section nodes + keywords
//!     │
//!     ├──> Relationship Builder
//!     │      └─> Typed edges
//!     │
//!     └──> Node Store (atomic per-document swap)
//!            └─> Searchable index
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use outline_indexer::DocumentIndexer;
//! use outline_store::{HashEmbedder, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> outline_indexer::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let embedder = Arc::new(HashEmbedder::new(256));
//!     let indexer = DocumentIndexer::new(store, embedder)?;
//!
//!     let report = indexer.index("guide", "# Setup\n\nInstall the tool.").await?;
//!     println!("Indexed {} nodes, {} keywords", report.nodes, report.keywords);
//!
//!     let results = indexer.search("setup", Some(5), None).await;
//!     println!("Found {} results", results.len());
//!     Ok(())
//! }
//! ```

mod error;
mod index_lock;
mod indexer;
mod scanner;
mod stats;

pub use error::{IndexerError, Result};
pub use indexer::{DocumentIndexer, OutlineEntry};
pub use scanner::CorpusScanner;
pub use stats::IndexReport;
