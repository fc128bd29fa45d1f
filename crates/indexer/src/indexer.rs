use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use outline_graph::{CorpusStats, RelationshipBuilder};
use outline_keywords::{KeywordConfig, KeywordScorer};
use outline_search::{
    CacheStats, HybridSearch, ScoredResult, SearchConfig, SearchStrategy,
};
use outline_segment::{Section, Segmenter};
use outline_store::{
    cosine_similarity, DocumentMeta, EmbeddingProvider, FileStore, Keyword, NodeStore,
    SectionNode, StoreStats,
};

use crate::error::Result;
use crate::index_lock::acquire_index_write_lock;
use crate::scanner::CorpusScanner;
use crate::stats::IndexReport;

/// How many stored embeddings feed threshold calibration.
const CALIBRATION_SAMPLE: usize = 64;

/// One row of a document's section outline, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub id: String,
    pub title: String,
    pub level: u8,
    pub seq_num: usize,
    pub parent_id: Option<String>,
}

/// Facade over the whole indexing pipeline: segment, extract keywords,
/// embed, derive relationships, replace the document's index generation
/// in one store call.
///
/// Per-document rebuilds are all-or-nothing: any failure before the
/// store replacement leaves the previous generation untouched and
/// searchable. Search delegates to the hybrid engine and never fails
/// the caller.
pub struct DocumentIndexer {
    store: Arc<dyn NodeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    segmenter: Segmenter,
    keywords: KeywordScorer,
    relationships: RelationshipBuilder,
    search: HybridSearch,
    persist: Option<Arc<FileStore>>,
}

impl DocumentIndexer {
    /// Indexer over any store, without snapshot persistence.
    pub fn new(store: Arc<dyn NodeStore>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        Ok(Self {
            store: store.clone(),
            embedder: embedder.clone(),
            segmenter: Segmenter::default(),
            keywords: KeywordScorer::new(KeywordConfig::default())?,
            relationships: RelationshipBuilder::new(),
            search: HybridSearch::new(store, embedder),
            persist: None,
        })
    }

    /// Indexer over a file-backed store; every successful rebuild saves
    /// a snapshot under an exclusive write lock.
    pub fn with_persistence(
        store: Arc<FileStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let mut indexer = Self::new(store.clone(), embedder)?;
        indexer.persist = Some(store);
        Ok(indexer)
    }

    #[must_use]
    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    #[must_use]
    pub fn with_keyword_scorer(mut self, keywords: KeywordScorer) -> Self {
        self.keywords = keywords;
        self
    }

    #[must_use]
    pub fn with_relationship_builder(mut self, relationships: RelationshipBuilder) -> Self {
        self.relationships = relationships;
        self
    }

    #[must_use]
    pub fn with_search_defaults(mut self, defaults: SearchConfig) -> Self {
        self.search = HybridSearch::with_config(self.store.clone(), self.embedder.clone(), defaults);
        self
    }

    /// Rebuild one document's index generation from raw content.
    pub async fn index(&self, document_id: &str, content: &str) -> Result<IndexReport> {
        let start = Instant::now();

        let mut report = IndexReport::new();
        let (nodes, keywords, relationships) =
            self.rebuild_document(document_id, document_id, content).await?;
        report.add_document(nodes, keywords, relationships);

        self.search.invalidate_cache();
        self.persist_if_configured().await?;

        report.elapsed_ms = elapsed_ms(start);
        log::info!(
            "Indexed {document_id}: {nodes} nodes, {keywords} keywords, {relationships} relationships in {}ms",
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Index a single markdown file; the document id is its path.
    pub async fn index_file(&self, path: impl AsRef<Path>) -> Result<IndexReport> {
        let start = Instant::now();
        let path = path.as_ref();

        let mut report = IndexReport::new();
        let (nodes, keywords, relationships) = self.index_one_file(path, None).await?;
        report.add_document(nodes, keywords, relationships);

        self.search.invalidate_cache();
        self.persist_if_configured().await?;

        report.elapsed_ms = elapsed_ms(start);
        log::info!(
            "Indexed {}: {nodes} nodes, {keywords} keywords, {relationships} relationships in {}ms",
            path.display(),
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Index every markdown file under `root`.
    ///
    /// Per-file failures are recorded in the report and do not abort the
    /// sweep; document ids are paths relative to `root`.
    pub async fn index_corpus(&self, root: impl AsRef<Path>) -> Result<IndexReport> {
        let start = Instant::now();
        let root = root.as_ref();

        // 1. Scan for markdown files.
        let scanner = CorpusScanner::new(root)?;
        let files = scanner.scan();
        log::info!("Indexing corpus at {} ({} files)", root.display(), files.len());

        // 2. Rebuild each document, collecting failures instead of
        //    aborting the sweep.
        let mut report = IndexReport::new();
        for path in &files {
            match self.index_one_file(path, Some(root)).await {
                Ok((nodes, keywords, relationships)) => {
                    report.add_document(nodes, keywords, relationships);
                }
                Err(err) => {
                    log::warn!("Failed to index {}: {err}", path.display());
                    report.add_error(format!("{}: {err}", path.display()));
                }
            }
        }

        // 3. Drop stale cached results and snapshot once for the whole
        //    sweep.
        self.search.invalidate_cache();
        self.persist_if_configured().await?;

        report.elapsed_ms = elapsed_ms(start);
        log::info!(
            "Corpus indexing completed: {} documents, {} nodes, {} errors in {}ms",
            report.documents,
            report.nodes,
            report.errors.len(),
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Remove a document's index generation entirely.
    pub async fn remove_document(&self, document_id: &str) -> Result<()> {
        self.store.delete_document(document_id).await?;
        self.search.invalidate_cache();
        self.persist_if_configured().await?;
        log::info!("Removed document {document_id} from index");
        Ok(())
    }

    /// Search the index; never fails, with store or embedding trouble
    /// logged and surfaced as an empty result list.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
        strategy: Option<SearchStrategy>,
    ) -> Vec<ScoredResult> {
        match strategy {
            Some(strategy) => self.search.search_with_strategy(query, limit, strategy).await,
            None => self.search.search(query, limit).await,
        }
    }

    /// Search with a configuration picked from the query shape.
    pub async fn search_auto(&self, query: &str, limit: Option<usize>) -> Vec<ScoredResult> {
        self.search.search_auto(query, limit).await
    }

    /// Ordered section outline of an indexed document; empty when the
    /// document is unknown.
    pub async fn document_structure(&self, document_id: &str) -> Result<Vec<OutlineEntry>> {
        let nodes = self.store.document_nodes(document_id).await?;
        Ok(nodes
            .into_iter()
            .map(|node| OutlineEntry {
                id: node.id,
                title: node.title,
                level: node.level,
                seq_num: node.seq_num,
                parent_id: node.parent_id,
            })
            .collect())
    }

    /// Recalibrate relationship thresholds from similarity statistics
    /// over a sample of stored embeddings. Returns the observed stats,
    /// or `None` when fewer than two embeddings are stored.
    pub async fn calibrate_thresholds(&mut self) -> Result<Option<CorpusStats>> {
        let embeddings = self.store.sample_embeddings(CALIBRATION_SAMPLE).await?;
        if embeddings.len() < 2 {
            log::debug!("Not enough stored embeddings to calibrate thresholds");
            return Ok(None);
        }

        let mut similarities = Vec::new();
        for i in 0..embeddings.len() {
            for j in (i + 1)..embeddings.len() {
                similarities.push(cosine_similarity(&embeddings[i], &embeddings[j]));
            }
        }
        let mean = similarities.iter().sum::<f32>() / similarities.len() as f32;
        let variance = similarities.iter().map(|s| (s - mean).powi(2)).sum::<f32>()
            / similarities.len() as f32;
        let stats = CorpusStats {
            avg_similarity: mean,
            similarity_std: variance.sqrt(),
        };

        let table = self.relationships.thresholds().optimized_for_corpus(&stats);
        self.relationships = RelationshipBuilder::with_thresholds(table);
        log::info!(
            "Calibrated relationship thresholds from {} sampled embeddings (avg {:.3}, std {:.3})",
            embeddings.len(),
            stats.avg_similarity,
            stats.similarity_std
        );
        Ok(Some(stats))
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(self.store.stats().await?)
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.search.cache_stats()
    }

    async fn index_one_file(
        &self,
        path: &Path,
        root: Option<&Path>,
    ) -> Result<(usize, usize, usize)> {
        let content = tokio::fs::read_to_string(path).await?;
        let document_id = document_id_for(path, root);
        let source_path = path.to_string_lossy().to_string();
        self.rebuild_document(&document_id, &source_path, &content).await
    }

    /// The pipeline for one document. Everything up to the store call is
    /// pure computation; the replacement itself is a single atomic swap.
    async fn rebuild_document(
        &self,
        document_id: &str,
        source_path: &str,
        content: &str,
    ) -> Result<(usize, usize, usize)> {
        // 1. Segment into ordered sections.
        let sections = self.segmenter.segment(content);

        // 2. Resolve structure and assign final node ids.
        let mut nodes = resolve_nodes(document_id, &sections);

        // 3. Embed nodes in one batch.
        let texts: Vec<String> = nodes.iter().map(SectionNode::embedding_text).collect();
        let vectors = self.embedder.encode_batch(&texts).await?;
        for (node, vector) in nodes.iter_mut().zip(vectors) {
            node.embedding = vector;
        }

        // 4. Extract and embed keywords per node.
        let mut keywords: Vec<Keyword> = Vec::new();
        let mut terms: Vec<String> = Vec::new();
        for node in &nodes {
            for scored in self.keywords.extract(&node.title, &node.content) {
                terms.push(scored.term.clone());
                keywords.push(Keyword {
                    node_id: node.id.clone(),
                    term: scored.term,
                    importance: scored.score,
                    embedding: Vec::new(),
                });
            }
        }
        if !keywords.is_empty() {
            let vectors = self.embedder.encode_batch(&terms).await?;
            for (keyword, vector) in keywords.iter_mut().zip(vectors) {
                keyword.embedding = vector;
            }
        }

        // 5. Derive relationships from the fresh node set.
        let relationships = self.relationships.build(&nodes);

        // 6. Swap the document's index generation in one call.
        let counts = (nodes.len(), keywords.len(), relationships.len());
        let title = nodes
            .first()
            .map_or_else(|| document_id.to_string(), |node| node.title.clone());
        self.store
            .replace_document(document_id, nodes, keywords, relationships)
            .await?;
        self.store
            .upsert_document_meta(DocumentMeta {
                id: document_id.to_string(),
                title,
                path: source_path.to_string(),
            })
            .await?;

        Ok(counts)
    }

    async fn persist_if_configured(&self) -> Result<()> {
        let Some(file_store) = &self.persist else {
            return Ok(());
        };
        let _lock = acquire_index_write_lock(file_store.path()).await?;
        file_store.save().await?;
        Ok(())
    }
}

/// Two-pass structure resolution. Parents are found first in `(level,
/// seq_num)` key space via a header stack, then final content-hashed ids
/// are assigned and the parent links mapped through them.
fn resolve_nodes(document_id: &str, sections: &[Section]) -> Vec<SectionNode> {
    let mut parent_keys: Vec<Option<(u8, usize)>> = Vec::with_capacity(sections.len());
    let mut open: Vec<(u8, usize)> = Vec::new();
    for section in sections {
        while open.last().is_some_and(|&(level, _)| level >= section.level) {
            open.pop();
        }
        parent_keys.push(open.last().copied());
        open.push((section.level, section.seq_num));
    }

    let mut id_by_key: HashMap<(u8, usize), String> = HashMap::with_capacity(sections.len());
    for section in sections {
        let id = SectionNode::derive_id(document_id, section.seq_num, &section.title, &section.content);
        id_by_key.insert((section.level, section.seq_num), id);
    }

    sections
        .iter()
        .zip(&parent_keys)
        .map(|(section, parent_key)| SectionNode {
            id: id_by_key[&(section.level, section.seq_num)].clone(),
            document_id: document_id.to_string(),
            parent_id: parent_key.and_then(|key| id_by_key.get(&key).cloned()),
            title: section.title.clone(),
            content: section.content.clone(),
            level: section.level,
            seq_num: section.seq_num,
            embedding: Vec::new(),
        })
        .collect()
}

fn document_id_for(path: &Path, root: Option<&Path>) -> String {
    let relative = match root {
        Some(root) => path.strip_prefix(root).unwrap_or(path),
        None => path,
    };
    relative.to_string_lossy().replace('\\', "/")
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
