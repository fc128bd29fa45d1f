use crate::embedding::cosine_similarity;
use crate::error::Result;
use crate::types::{
    DocumentMeta, Keyword, KeywordHit, Relationship, SectionNode, SimilarityHit, StoreStats,
};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

/// Persistence contract for the hierarchical index.
///
/// A document's nodes, keywords and relationships are always replaced as
/// one unit; readers never observe a partially rebuilt document.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Atomically replace every row belonging to `document_id`.
    async fn replace_document(
        &self,
        document_id: &str,
        nodes: Vec<SectionNode>,
        keywords: Vec<Keyword>,
        relationships: Vec<Relationship>,
    ) -> Result<()>;

    /// Drop every row belonging to `document_id`. Unknown ids are a no-op.
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    async fn node(&self, id: &str) -> Result<Option<SectionNode>>;

    /// All nodes of a document, ordered by `seq_num`.
    async fn document_nodes(&self, document_id: &str) -> Result<Vec<SectionNode>>;

    /// Top-k nodes by cosine similarity against `embedding`, optionally
    /// floored at `min_similarity`.
    async fn similar_nodes(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<SimilarityHit>>;

    /// Keywords whose term contains any of `terms` (case-insensitive
    /// substring), scored by cosine similarity of the keyword embedding
    /// against `query_embedding`, best first, at most `limit` hits.
    async fn matching_keywords(
        &self,
        terms: &[String],
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<KeywordHit>>;

    /// Relationships touching `node_id` with `strength > min_strength`,
    /// strongest first, at most `limit`, paired with the node on the far
    /// end. Edges are stored once per pair, so both directions match.
    async fn related_for(
        &self,
        node_id: &str,
        min_strength: f32,
        limit: usize,
    ) -> Result<Vec<(Relationship, SectionNode)>>;

    async fn node_keywords(&self, node_id: &str) -> Result<Vec<Keyword>>;

    async fn upsert_document_meta(&self, meta: DocumentMeta) -> Result<()>;

    async fn document_meta(&self, document_id: &str) -> Result<Option<DocumentMeta>>;

    async fn document_ids(&self) -> Result<Vec<String>>;

    async fn stats(&self) -> Result<StoreStats>;

    /// Up to `cap` node embeddings in stable (document, seq) order, for
    /// corpus-level threshold calibration.
    async fn sample_embeddings(&self, cap: usize) -> Result<Vec<Vec<f32>>>;
}

/// Shared synchronous state behind the in-memory and file-backed stores.
#[derive(Debug, Default)]
pub(crate) struct StoreInner {
    pub(crate) nodes: HashMap<String, SectionNode>,
    /// Node ids per document, kept in `seq_num` order.
    pub(crate) by_document: HashMap<String, Vec<String>>,
    /// Keywords per node id.
    pub(crate) keywords: HashMap<String, Vec<Keyword>>,
    pub(crate) relationships: Vec<Relationship>,
    pub(crate) documents: HashMap<String, DocumentMeta>,
}

impl StoreInner {
    pub(crate) fn replace_document(
        &mut self,
        document_id: &str,
        mut nodes: Vec<SectionNode>,
        keywords: Vec<Keyword>,
        relationships: Vec<Relationship>,
    ) {
        self.delete_document(document_id);

        nodes.sort_by_key(|n| n.seq_num);
        let ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        for node in nodes {
            self.nodes.insert(node.id.clone(), node);
        }
        self.by_document.insert(document_id.to_string(), ids);

        for keyword in keywords {
            self.keywords
                .entry(keyword.node_id.clone())
                .or_default()
                .push(keyword);
        }

        self.relationships.extend(relationships);
    }

    pub(crate) fn delete_document(&mut self, document_id: &str) {
        let Some(ids) = self.by_document.remove(document_id) else {
            return;
        };
        for id in &ids {
            self.nodes.remove(id);
            self.keywords.remove(id);
        }
        let owned: std::collections::HashSet<&String> = ids.iter().collect();
        self.relationships
            .retain(|r| !owned.contains(&r.source_id) && !owned.contains(&r.target_id));
    }

    pub(crate) fn document_nodes(&self, document_id: &str) -> Vec<SectionNode> {
        self.by_document
            .get(document_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.nodes.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn similar_nodes(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Vec<SimilarityHit> {
        let floor = min_similarity.unwrap_or(f32::MIN);
        let mut hits: Vec<SimilarityHit> = self
            .nodes
            .values()
            .map(|node| SimilarityHit {
                similarity: cosine_similarity(embedding, &node.embedding),
                node: node.clone(),
            })
            .filter(|hit| hit.similarity >= floor)
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        hits.truncate(top_k);
        hits
    }

    pub(crate) fn matching_keywords(
        &self,
        terms: &[String],
        query_embedding: &[f32],
        limit: usize,
    ) -> Vec<KeywordHit> {
        let needles: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        let mut hits = Vec::new();

        for keywords in self.keywords.values() {
            for keyword in keywords {
                let term = keyword.term.to_lowercase();
                if !needles.iter().any(|needle| term.contains(needle.as_str())) {
                    continue;
                }
                let Some(node) = self.nodes.get(&keyword.node_id) else {
                    continue;
                };
                hits.push(KeywordHit {
                    node: node.clone(),
                    term: keyword.term.clone(),
                    importance: keyword.importance,
                    similarity: cosine_similarity(query_embedding, &keyword.embedding),
                });
            }
        }

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        hits.truncate(limit);
        hits
    }

    pub(crate) fn related_for(
        &self,
        node_id: &str,
        min_strength: f32,
        limit: usize,
    ) -> Vec<(Relationship, SectionNode)> {
        let mut edges: Vec<(Relationship, SectionNode)> = self
            .relationships
            .iter()
            .filter(|r| r.strength > min_strength)
            .filter_map(|r| {
                let other = if r.source_id == node_id {
                    &r.target_id
                } else if r.target_id == node_id {
                    &r.source_id
                } else {
                    return None;
                };
                self.nodes.get(other).map(|node| (r.clone(), node.clone()))
            })
            .collect();

        edges.sort_by(|a, b| {
            b.0.strength
                .partial_cmp(&a.0.strength)
                .unwrap_or(Ordering::Equal)
        });
        edges.truncate(limit);
        edges
    }

    pub(crate) fn stats(&self) -> StoreStats {
        StoreStats {
            documents: self.by_document.len(),
            nodes: self.nodes.len(),
            keywords: self.keywords.values().map(Vec::len).sum(),
            relationships: self.relationships.len(),
        }
    }

    pub(crate) fn sample_embeddings(&self, cap: usize) -> Vec<Vec<f32>> {
        let mut document_ids: Vec<&String> = self.by_document.keys().collect();
        document_ids.sort();

        let mut out = Vec::new();
        for document_id in document_ids {
            for node in self.document_nodes(document_id) {
                if out.len() >= cap {
                    return out;
                }
                out.push(node.embedding);
            }
        }
        out
    }
}

/// In-memory [`NodeStore`]. The reference implementation; also the state
/// behind [`crate::FileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreInner> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreInner> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn replace_document(
        &self,
        document_id: &str,
        nodes: Vec<SectionNode>,
        keywords: Vec<Keyword>,
        relationships: Vec<Relationship>,
    ) -> Result<()> {
        let mut inner = self.write();
        inner.replace_document(document_id, nodes, keywords, relationships);
        log::debug!(
            "Replaced document {document_id}: {} nodes now stored",
            inner.nodes.len()
        );
        Ok(())
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.write().delete_document(document_id);
        Ok(())
    }

    async fn node(&self, id: &str) -> Result<Option<SectionNode>> {
        Ok(self.read().nodes.get(id).cloned())
    }

    async fn document_nodes(&self, document_id: &str) -> Result<Vec<SectionNode>> {
        Ok(self.read().document_nodes(document_id))
    }

    async fn similar_nodes(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<SimilarityHit>> {
        Ok(self.read().similar_nodes(embedding, top_k, min_similarity))
    }

    async fn matching_keywords(
        &self,
        terms: &[String],
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<KeywordHit>> {
        Ok(self.read().matching_keywords(terms, query_embedding, limit))
    }

    async fn related_for(
        &self,
        node_id: &str,
        min_strength: f32,
        limit: usize,
    ) -> Result<Vec<(Relationship, SectionNode)>> {
        Ok(self.read().related_for(node_id, min_strength, limit))
    }

    async fn node_keywords(&self, node_id: &str) -> Result<Vec<Keyword>> {
        Ok(self.read().keywords.get(node_id).cloned().unwrap_or_default())
    }

    async fn upsert_document_meta(&self, meta: DocumentMeta) -> Result<()> {
        self.write().documents.insert(meta.id.clone(), meta);
        Ok(())
    }

    async fn document_meta(&self, document_id: &str) -> Result<Option<DocumentMeta>> {
        Ok(self.read().documents.get(document_id).cloned())
    }

    async fn document_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.read().by_document.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(self.read().stats())
    }

    async fn sample_embeddings(&self, cap: usize) -> Result<Vec<Vec<f32>>> {
        Ok(self.read().sample_embeddings(cap))
    }
}
