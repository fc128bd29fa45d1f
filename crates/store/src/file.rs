use crate::error::Result;
use crate::store::{MemoryStore, NodeStore};
use crate::types::{
    DocumentMeta, Keyword, KeywordHit, Relationship, SectionNode, SimilarityHit, StoreStats,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    version: u32,
    documents: Vec<DocumentMeta>,
    nodes: Vec<SectionNode>,
    keywords: Vec<Keyword>,
    relationships: Vec<Relationship>,
}

/// [`NodeStore`] with a JSON snapshot on disk.
///
/// All reads and writes go through the in-memory state; [`FileStore::save`]
/// persists a snapshot atomically (tmp file + rename) and
/// [`FileStore::load`] restores one. Saving is explicit so the caller can
/// decide transaction boundaries.
pub struct FileStore {
    memory: MemoryStore,
    path: PathBuf,
}

impl FileStore {
    /// Empty store that will persist to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            memory: MemoryStore::new(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Restore a store from `path`, or start empty when the file does not
    /// exist yet.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Self::new(&path);

        if !path.exists() {
            log::debug!("No snapshot at {}, starting empty", path.display());
            return Ok(store);
        }

        let bytes = tokio::fs::read(&path).await?;
        let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            log::warn!(
                "Snapshot {} has version {}, expected {SNAPSHOT_VERSION}; starting empty",
                path.display(),
                snapshot.version
            );
            return Ok(store);
        }

        {
            let mut inner = store.memory.write();
            for meta in snapshot.documents {
                inner.documents.insert(meta.id.clone(), meta);
            }

            let mut grouped: std::collections::HashMap<String, Vec<SectionNode>> =
                std::collections::HashMap::new();
            for node in snapshot.nodes {
                grouped.entry(node.document_id.clone()).or_default().push(node);
            }
            for (document_id, mut nodes) in grouped {
                nodes.sort_by_key(|n| n.seq_num);
                let ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
                for node in nodes {
                    inner.nodes.insert(node.id.clone(), node);
                }
                inner.by_document.insert(document_id, ids);
            }

            for keyword in snapshot.keywords {
                inner
                    .keywords
                    .entry(keyword.node_id.clone())
                    .or_default()
                    .push(keyword);
            }
            inner.relationships = snapshot.relationships;
        }

        let stats = store.memory.read().stats();
        log::info!(
            "Loaded index from {}: {} documents, {} nodes, {} relationships",
            path.display(),
            stats.documents,
            stats.nodes,
            stats.relationships
        );
        Ok(store)
    }

    /// Persist the current state. The write is atomic: a concurrent crash
    /// leaves either the previous snapshot or the new one, never a torn
    /// file.
    pub async fn save(&self) -> Result<()> {
        let snapshot = {
            let inner = self.memory.read();

            let mut documents: Vec<DocumentMeta> = inner.documents.values().cloned().collect();
            documents.sort_by(|a, b| a.id.cmp(&b.id));

            let mut document_ids: Vec<&String> = inner.by_document.keys().collect();
            document_ids.sort();
            let mut nodes = Vec::with_capacity(inner.nodes.len());
            for document_id in document_ids {
                nodes.extend(inner.document_nodes(document_id));
            }

            let mut keywords: Vec<Keyword> = Vec::new();
            for node in &nodes {
                if let Some(terms) = inner.keywords.get(&node.id) {
                    keywords.extend(terms.iter().cloned());
                }
            }

            StoreSnapshot {
                version: SNAPSHOT_VERSION,
                documents,
                nodes,
                keywords,
                relationships: inner.relationships.clone(),
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec(&snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(err) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }

        log::debug!(
            "Saved index snapshot to {} ({} bytes)",
            self.path.display(),
            bytes.len()
        );
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl NodeStore for FileStore {
    async fn replace_document(
        &self,
        document_id: &str,
        nodes: Vec<SectionNode>,
        keywords: Vec<Keyword>,
        relationships: Vec<Relationship>,
    ) -> Result<()> {
        self.memory
            .replace_document(document_id, nodes, keywords, relationships)
            .await
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.memory.delete_document(document_id).await
    }

    async fn node(&self, id: &str) -> Result<Option<SectionNode>> {
        self.memory.node(id).await
    }

    async fn document_nodes(&self, document_id: &str) -> Result<Vec<SectionNode>> {
        self.memory.document_nodes(document_id).await
    }

    async fn similar_nodes(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<SimilarityHit>> {
        self.memory.similar_nodes(embedding, top_k, min_similarity).await
    }

    async fn matching_keywords(
        &self,
        terms: &[String],
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<KeywordHit>> {
        self.memory
            .matching_keywords(terms, query_embedding, limit)
            .await
    }

    async fn related_for(
        &self,
        node_id: &str,
        min_strength: f32,
        limit: usize,
    ) -> Result<Vec<(Relationship, SectionNode)>> {
        self.memory.related_for(node_id, min_strength, limit).await
    }

    async fn node_keywords(&self, node_id: &str) -> Result<Vec<Keyword>> {
        self.memory.node_keywords(node_id).await
    }

    async fn upsert_document_meta(&self, meta: DocumentMeta) -> Result<()> {
        self.memory.upsert_document_meta(meta).await
    }

    async fn document_meta(&self, document_id: &str) -> Result<Option<DocumentMeta>> {
        self.memory.document_meta(document_id).await
    }

    async fn document_ids(&self) -> Result<Vec<String>> {
        self.memory.document_ids().await
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.memory.stats().await
    }

    async fn sample_embeddings(&self, cap: usize) -> Result<Vec<Vec<f32>>> {
        self.memory.sample_embeddings(cap).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelationKind;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_node(id: &str, seq: usize) -> SectionNode {
        SectionNode {
            id: id.to_string(),
            document_id: "guide".to_string(),
            parent_id: None,
            title: format!("T{seq}"),
            content: "text".to_string(),
            level: 1,
            seq_num: seq,
            embedding: vec![0.5, 0.5],
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");

        let store = FileStore::new(&path);
        store
            .replace_document(
                "guide",
                vec![sample_node("a", 0), sample_node("b", 1)],
                vec![Keyword {
                    node_id: "a".into(),
                    term: "setup".into(),
                    importance: 0.8,
                    embedding: vec![1.0, 0.0],
                }],
                vec![Relationship {
                    source_id: "a".into(),
                    target_id: "b".into(),
                    kind: RelationKind::Sibling,
                    strength: 0.7,
                }],
            )
            .await
            .unwrap();
        store
            .upsert_document_meta(DocumentMeta {
                id: "guide".into(),
                title: "Guide".into(),
                path: "docs/guide.md".into(),
            })
            .await
            .unwrap();
        store.save().await.unwrap();

        let restored = FileStore::load(&path).await.unwrap();
        let stats = restored.stats().await.unwrap();
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.keywords, 1);
        assert_eq!(stats.relationships, 1);

        let nodes = restored.document_nodes("guide").await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].seq_num, 0);
        assert_eq!(nodes[1].seq_num, 1);

        let meta = restored.document_meta("guide").await.unwrap().unwrap();
        assert_eq!(meta.title, "Guide");
    }

    #[tokio::test]
    async fn load_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::load(dir.path().join("absent.json")).await.unwrap();
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
    }

    #[tokio::test]
    async fn save_leaves_no_tmp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");
        let store = FileStore::new(&path);
        store
            .replace_document("guide", vec![sample_node("a", 0)], vec![], vec![])
            .await
            .unwrap();
        store.save().await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
