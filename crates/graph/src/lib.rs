//! # Outline Graph
//!
//! Typed relationship derivation and traversal over document sections.
//!
//! ## Architecture
//!
//! ```text
//! SectionNode[]
//!     │
//!     ├──> Relationship Builder
//!     │      ├─ Parent-child edges (resolved hierarchy, strength 1.0)
//!     │      ├─ Sibling edges (same level, distance decay)
//!     │      └─ Semantic edges (embedding cosine, logistic rescale)
//!     │
//!     ├──> Threshold Table
//!     │      ├─ Per-kind bands (min / strong / very strong)
//!     │      ├─ Adaptive scaling (density, domain specificity)
//!     │      └─ Corpus calibration (mean + std re-anchoring)
//!     │
//!     └──> Section Graph (petgraph)
//!            ├─ Nodes: sections
//!            └─ Edges: kind + strength, traversable both ways
//! ```

mod builder;
mod error;
mod graph;
mod thresholds;

pub use builder::RelationshipBuilder;
pub use error::{GraphError, Result};
pub use graph::{EdgeWeight, SectionGraph};
pub use thresholds::{
    combined_strength, kind_weight, CorpusStats, ThresholdProfile, ThresholdTable,
};
