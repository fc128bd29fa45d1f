use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One hierarchical unit of a document: a header plus its body text.
///
/// `seq_num` is zero-based and strictly increasing in document order.
/// `parent_id` points at the nearest preceding node with a smaller level,
/// or `None` for root sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionNode {
    pub id: String,
    pub document_id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub content: String,
    /// Header depth, 1..=6.
    pub level: u8,
    pub seq_num: usize,
    pub embedding: Vec<f32>,
}

impl SectionNode {
    /// Derive the surrogate id for a node.
    ///
    /// Ids are stable across reindexes of identical content: the same
    /// document, position and text always hash to the same id.
    #[must_use]
    pub fn derive_id(document_id: &str, seq_num: usize, title: &str, content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(content.as_bytes());
        let digest = hasher.finalize();
        let hash8: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
        format!("{document_id}#{seq_num:04}-{hash8}")
    }

    /// Text fed to the embedding provider for this node.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// A weighted keyword attached to a section node. Recreated on every
/// reindex of the owning document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub node_id: String,
    pub term: String,
    /// Importance in `[0, 1]` as produced by the scorer.
    pub importance: f32,
    pub embedding: Vec<f32>,
}

/// Kinds of relationships between section nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ParentChild,
    Sibling,
    Semantic,
    KeywordBased,
    CrossReference,
    Implicit,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::ParentChild,
        RelationKind::Sibling,
        RelationKind::Semantic,
        RelationKind::KeywordBased,
        RelationKind::CrossReference,
        RelationKind::Implicit,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RelationKind::ParentChild => "parent_child",
            RelationKind::Sibling => "sibling",
            RelationKind::Semantic => "semantic",
            RelationKind::KeywordBased => "keyword_based",
            RelationKind::CrossReference => "cross_reference",
            RelationKind::Implicit => "implicit",
        }
    }
}

/// A typed, weighted edge between two section nodes.
///
/// An edge only exists when its strength clears the per-kind minimum, so
/// `strength` is always within `[min_strength(kind), 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    pub kind: RelationKind,
    pub strength: f32,
}

/// Document-level metadata used to enrich search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: String,
    pub title: String,
    pub path: String,
}

/// Counts over everything currently held by a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub documents: usize,
    pub nodes: usize,
    pub keywords: usize,
    pub relationships: usize,
}

/// One hit from a node similarity query.
#[derive(Debug, Clone)]
pub struct SimilarityHit {
    pub node: SectionNode,
    pub similarity: f32,
}

/// One hit from a keyword term lookup, carrying the cosine similarity of
/// the keyword embedding against the query embedding.
#[derive(Debug, Clone)]
pub struct KeywordHit {
    pub node: SectionNode,
    pub term: String,
    pub importance: f32,
    pub similarity: f32,
}
