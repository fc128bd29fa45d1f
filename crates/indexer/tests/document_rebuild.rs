use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use outline_indexer::DocumentIndexer;
use outline_search::{MatchKind, SearchStrategy};
use outline_store::{
    EmbeddingProvider, FileStore, HashEmbedder, MemoryStore, NodeStore, RelationKind, StoreError,
};
use tempfile::TempDir;

const GUIDE: &str = "# Database Guide\n\n\
## Connection Pooling\n\
Connection pooling keeps a pool of open connections. Pooling cuts the\n\
setup cost of every request.\n\n\
## Timeouts\n\
Requests give up after a deadline and return the connection.\n";

fn indexer_over(store: Arc<MemoryStore>) -> DocumentIndexer {
    let embedder = Arc::new(HashEmbedder::new(64));
    DocumentIndexer::new(store, embedder).expect("indexer")
}

/// Embedding provider that can be switched into a failing mode.
struct FlakyEmbedder {
    inner: HashEmbedder,
    fail: AtomicBool,
}

impl FlakyEmbedder {
    fn new(dimension: usize) -> Self {
        Self {
            inner: HashEmbedder::new(dimension),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn encode(&self, text: &str) -> outline_store::Result<Vec<f32>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Embedding("embedding backend offline".into()));
        }
        self.inner.encode(text).await
    }
}

#[tokio::test]
async fn indexing_builds_hierarchy_keywords_and_relationships() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer_over(store.clone());

    let report = indexer.index("guide", GUIDE).await.expect("index");
    assert_eq!(report.documents, 1);
    assert_eq!(report.nodes, 3);
    assert!(report.keywords > 0, "expected extracted keywords");
    assert!(report.relationships >= 3, "expected hierarchy and sibling edges");
    assert!(report.errors.is_empty());

    let outline = indexer.document_structure("guide").await.expect("structure");
    assert_eq!(outline.len(), 3);
    assert_eq!(outline[0].title, "Database Guide");
    assert_eq!(outline[0].level, 1);
    assert_eq!(outline[0].parent_id, None);
    assert_eq!(outline[1].title, "Connection Pooling");
    assert_eq!(outline[1].parent_id, Some(outline[0].id.clone()));
    assert_eq!(outline[2].title, "Timeouts");
    assert_eq!(outline[2].parent_id, Some(outline[0].id.clone()));
    let seqs: Vec<usize> = outline.iter().map(|entry| entry.seq_num).collect();
    assert_eq!(seqs, vec![0, 1, 2]);

    // Adjacent same-level sections are siblings at the band ceiling.
    let related = store
        .related_for(&outline[1].id, 0.0, 10)
        .await
        .expect("related");
    let sibling = related
        .iter()
        .find(|(rel, _)| rel.kind == RelationKind::Sibling)
        .expect("sibling edge");
    assert!((sibling.0.strength - 0.7).abs() < 1e-6);
    assert_eq!(sibling.1.id, outline[2].id);
}

#[tokio::test]
async fn reindexing_replaces_the_previous_generation() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer_over(store.clone());

    indexer.index("guide", GUIDE).await.expect("first index");
    let first = indexer.document_structure("guide").await.expect("structure");

    indexer.index("guide", GUIDE).await.expect("second index");
    let second = indexer.document_structure("guide").await.expect("structure");

    // Unchanged content keeps identical node ids.
    let first_ids: Vec<&str> = first.iter().map(|e| e.id.as_str()).collect();
    let second_ids: Vec<&str> = second.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(first_ids, second_ids);

    let stats = indexer.stats().await.expect("stats");
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.nodes, 3);

    // Changed content swaps the whole generation.
    indexer
        .index("guide", "# Database Guide\n\n## Sharding\nSplit data across nodes.\n")
        .await
        .expect("reindex");
    let stats = indexer.stats().await.expect("stats");
    assert_eq!(stats.nodes, 2);
    let outline = indexer.document_structure("guide").await.expect("structure");
    assert_eq!(outline[1].title, "Sharding");
}

#[tokio::test]
async fn failed_reindex_leaves_the_previous_generation_searchable() {
    let store = Arc::new(MemoryStore::new());
    let embedder = Arc::new(FlakyEmbedder::new(64));
    let indexer = DocumentIndexer::new(store, embedder.clone()).expect("indexer");

    indexer.index("guide", GUIDE).await.expect("initial index");

    embedder.fail.store(true, Ordering::SeqCst);
    let err = indexer
        .index("guide", "# Database Guide\n\n## Replaced\nNew content.\n")
        .await
        .expect_err("index should fail");
    assert!(err.to_string().contains("embedding backend offline"), "{err}");

    // The previous generation is untouched and still searchable.
    let stats = indexer.stats().await.expect("stats");
    assert_eq!(stats.nodes, 3);
    embedder.fail.store(false, Ordering::SeqCst);
    let results = indexer.search("pooling", Some(5), None).await;
    assert!(!results.is_empty(), "previous generation should answer");
    assert_eq!(results[0].document_id, "guide");
}

#[tokio::test]
async fn search_finds_indexed_content_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer_over(store);

    indexer.index("db-guide", GUIDE).await.expect("index");

    let results = indexer.search("pooling", Some(5), None).await;
    assert!(!results.is_empty(), "expected a match for an indexed keyword");
    assert_eq!(results[0].document_id, "db-guide");
    assert_eq!(results[0].title, "Connection Pooling");
    assert_eq!(results[0].match_type, MatchKind::Keyword);
    assert!(results[0].relevance > 0.5);

    let fast = indexer
        .search("pooling", Some(3), Some(SearchStrategy::Fast))
        .await;
    assert!(!fast.is_empty(), "fast strategy should still match");
    assert_eq!(fast[0].title, "Connection Pooling");

    let auto = indexer.search_auto("pooling", Some(5)).await;
    assert!(!auto.is_empty(), "auto strategy should still match");
}

#[tokio::test]
async fn removing_a_document_empties_index_and_results() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer_over(store);

    indexer.index("guide", GUIDE).await.expect("index");
    assert!(!indexer.search("pooling", Some(5), None).await.is_empty());

    indexer.remove_document("guide").await.expect("remove");

    let stats = indexer.stats().await.expect("stats");
    assert_eq!(stats.documents, 0);
    assert_eq!(stats.nodes, 0);
    assert!(indexer.search("pooling", Some(5), None).await.is_empty());
}

#[tokio::test]
async fn corpus_indexing_takes_markdown_only_and_records_bad_files() {
    let temp = TempDir::new().expect("tempdir");
    tokio::fs::create_dir_all(temp.path().join("docs"))
        .await
        .expect("create docs");
    tokio::fs::write(temp.path().join("docs/setup.md"), GUIDE)
        .await
        .expect("write setup");
    tokio::fs::write(
        temp.path().join("notes.markdown"),
        "# Notes\n\nShort note body.\n",
    )
    .await
    .expect("write notes");
    tokio::fs::write(temp.path().join("readme.txt"), "not markdown")
        .await
        .expect("write txt");
    // Invalid UTF-8 so the read fails and lands in the error list.
    tokio::fs::write(temp.path().join("broken.md"), [0xFF, 0xFE, b'#'])
        .await
        .expect("write broken");

    let store = Arc::new(MemoryStore::new());
    let indexer = indexer_over(store);
    let report = indexer.index_corpus(temp.path()).await.expect("corpus");

    assert_eq!(report.documents, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("broken.md"), "{:?}", report.errors);

    // Document ids are root-relative paths.
    let outline = indexer
        .document_structure("docs/setup.md")
        .await
        .expect("structure");
    assert_eq!(outline.len(), 3);
    let outline = indexer
        .document_structure("notes.markdown")
        .await
        .expect("structure");
    assert_eq!(outline.len(), 1);
}

#[tokio::test]
async fn corpus_indexing_skips_oversized_markdown() {
    let temp = TempDir::new().expect("tempdir");
    tokio::fs::write(temp.path().join("small.md"), "# Small\n\nBody.\n")
        .await
        .expect("write small");
    let big = format!("# Big\n\n{}\n", "x".repeat(1_100_000));
    tokio::fs::write(temp.path().join("big.md"), big)
        .await
        .expect("write big");

    let store = Arc::new(MemoryStore::new());
    let indexer = indexer_over(store);
    let report = indexer.index_corpus(temp.path()).await.expect("corpus");

    assert_eq!(report.documents, 1);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(indexer
        .document_structure("big.md")
        .await
        .expect("structure")
        .is_empty());
}

#[tokio::test]
async fn file_backed_indexer_saves_snapshots_that_reload() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("state").join("outline.json");

    let store = Arc::new(FileStore::new(&path));
    let embedder = Arc::new(HashEmbedder::new(64));
    let indexer = DocumentIndexer::with_persistence(store, embedder).expect("indexer");

    indexer.index("guide", GUIDE).await.expect("index");
    assert!(path.exists(), "snapshot should be written");
    assert!(
        path.with_file_name("outline.json.lock").exists(),
        "write lock file should sit next to the snapshot"
    );

    let restored = FileStore::load(&path).await.expect("load");
    let stats = restored.stats().await.expect("stats");
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.nodes, 3);
    assert!(stats.keywords > 0);
}

#[tokio::test]
async fn threshold_calibration_needs_stored_embeddings() {
    let store = Arc::new(MemoryStore::new());
    let mut indexer = indexer_over(store);

    assert!(indexer
        .calibrate_thresholds()
        .await
        .expect("calibrate")
        .is_none());

    indexer.index("guide", GUIDE).await.expect("index");
    let stats = indexer
        .calibrate_thresholds()
        .await
        .expect("calibrate")
        .expect("stats");
    assert!(stats.avg_similarity.is_finite());
    assert!((-1.0..=1.0).contains(&stats.avg_similarity));
    assert!(stats.similarity_std >= 0.0);
}
