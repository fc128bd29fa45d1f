use crate::error::{Result, StoreError};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Shape and prompt prefixes of a known embedding model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingModelSpec {
    pub id: &'static str,
    pub dimension: usize,
    /// Prepended to query text before encoding (empty for most models).
    pub query_prefix: &'static str,
    /// Prepended to document text before encoding.
    pub document_prefix: &'static str,
}

/// Models the store knows how to size vectors for. The provider behind
/// [`EmbeddingProvider`] is external; this table only fixes dimensions
/// and prompt conventions.
pub const EMBEDDING_MODELS: &[EmbeddingModelSpec] = &[
    EmbeddingModelSpec {
        id: "all-MiniLM-L6-v2",
        dimension: 384,
        query_prefix: "",
        document_prefix: "",
    },
    EmbeddingModelSpec {
        id: "all-mpnet-base-v2",
        dimension: 768,
        query_prefix: "",
        document_prefix: "",
    },
    EmbeddingModelSpec {
        id: "text-embedding-ada-002",
        dimension: 1536,
        query_prefix: "",
        document_prefix: "",
    },
    EmbeddingModelSpec {
        id: "hkunlp/instructor-large",
        dimension: 768,
        query_prefix: "Represent the question for retrieving supporting documents: ",
        document_prefix: "Represent the document for retrieval: ",
    },
    EmbeddingModelSpec {
        id: "intfloat/e5-large-v2",
        dimension: 1024,
        query_prefix: "query: ",
        document_prefix: "passage: ",
    },
];

/// Default model spec (the smallest one).
pub const DEFAULT_MODEL_ID: &str = "all-MiniLM-L6-v2";

/// Look up a model spec by id.
pub fn model_spec(id: &str) -> Result<&'static EmbeddingModelSpec> {
    EMBEDDING_MODELS
        .iter()
        .find(|spec| spec.id == id)
        .ok_or_else(|| StoreError::UnknownModel(id.to_string()))
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 on dimension mismatch or when either vector has zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Black-box text-to-vector capability.
///
/// Implementations must be deterministic for identical input and model:
/// reindexing unchanged content has to reproduce the same vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Output vector length.
    fn dimension(&self) -> usize;

    async fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode a batch, preserving input order.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.encode(text).await?);
        }
        Ok(out)
    }
}

/// Deterministic hash-based embedder.
///
/// Each cleaned token is hashed into a pseudo-random unit direction and
/// the directions are summed and L2-normalized, so texts sharing tokens
/// land close together in cosine space while identical texts map to
/// identical vectors. Runs fully offline; the intended provider for
/// tests, local development and reproducible index builds.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    seed: u64,
}

impl HashEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension, seed: 0 }
    }

    /// Embedder sized for a known model id.
    pub fn for_model(model_id: &str) -> Result<Self> {
        Ok(Self::new(model_spec(model_id)?.dimension))
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn token_direction(&self, token: &str, out: &mut [f32]) {
        let mut state = fnv1a_64(token.as_bytes())
            ^ self.seed
            ^ (self.dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        for slot in out.iter_mut() {
            let bits = splitmix64(&mut state);
            let high = (bits >> 32) as u32;
            let mantissa = high >> 9;
            let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
            *slot += unit.mul_add(2.0, -1.0);
        }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimension];
        let mut saw_token = false;
        for token in text.split_whitespace() {
            let lowered = token.to_lowercase();
            let cleaned: String = lowered
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect();
            if cleaned.is_empty() {
                continue;
            }
            saw_token = true;
            self.token_direction(&cleaned, &mut vec);
        }
        if !saw_token {
            // Empty input still needs a stable, non-zero vector.
            self.token_direction("", &mut vec);
        }
        normalize(&mut vec);
        vec
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let this = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || texts.iter().map(|t| this.embed(t)).collect())
            .await
            .map_err(|e| StoreError::Embedding(format!("join embed task: {e}")))
    }
}

/// Memoizing wrapper around any provider.
///
/// Keeps an LRU of recently encoded texts keyed by content hash, so the
/// write path does not re-encode unchanged sections and repeated queries
/// skip the provider entirely.
pub struct CachedEmbedder<P> {
    inner: P,
    cache: Mutex<LruCache<u64, Vec<f32>>>,
}

impl<P: EmbeddingProvider> CachedEmbedder<P> {
    pub fn new(inner: P, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn cache_get(&self, key: u64) -> Option<Vec<f32>> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.get(&key).cloned()
    }

    fn cache_put(&self, key: u64, vector: Vec<f32>) {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.put(key, vector);
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<P> {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let key = fnv1a_64(text.as_bytes());
        if let Some(hit) = self.cache_get(key) {
            return Ok(hit);
        }
        let vector = self.inner.encode(text).await?;
        self.cache_put(key, vector.clone());
        Ok(vector)
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let key = fnv1a_64(text.as_bytes());
            match self.cache_get(key) {
                Some(hit) => out.push(Some(hit)),
                None => {
                    out.push(None);
                    missing.push((i, key, text.clone()));
                }
            }
        }

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|(_, _, t)| t.clone()).collect();
            let encoded = self.inner.encode_batch(&batch).await?;
            for ((i, key, _), vector) in missing.into_iter().zip(encoded) {
                self.cache_put(key, vector.clone());
                out[i] = Some(vector);
            }
        }

        Ok(out.into_iter().flatten().collect())
    }
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cosine_similarity_basics() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_or_zero_is_zero() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        let z = vec![0.0, 0.0];

        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&a[..], &z[..]), 0.0);
    }

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.encode("installation guide").await.unwrap();
        let b = embedder.encode("installation guide").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn shared_tokens_pull_vectors_together() {
        let embedder = HashEmbedder::new(128);
        let base = embedder.encode("database connection pooling").await.unwrap();
        let near = embedder.encode("database connection timeout").await.unwrap();
        let far = embedder.encode("frontend css animations").await.unwrap();

        let sim_near = cosine_similarity(&base, &near);
        let sim_far = cosine_similarity(&base, &far);
        assert!(sim_near > sim_far);
        assert!(sim_near > 0.5);
    }

    #[tokio::test]
    async fn case_and_punctuation_do_not_change_the_vector() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.encode("Database Pooling.").await.unwrap();
        let b = embedder.encode("database pooling").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_text_encodes_to_a_stable_unit_vector() {
        let embedder = HashEmbedder::new(32);
        let a = embedder.encode("").await.unwrap();
        let b = embedder.encode("   ").await.unwrap();

        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn batch_preserves_request_order() {
        let embedder = HashEmbedder::new(48);
        let texts = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        let batch = embedder.encode_batch(&texts).await.unwrap();

        for (text, vector) in texts.iter().zip(&batch) {
            let single = embedder.encode(text).await.unwrap();
            assert_eq!(&single, vector);
        }
    }

    #[tokio::test]
    async fn cached_embedder_returns_identical_vectors() {
        let cached = CachedEmbedder::new(HashEmbedder::new(32), 16);
        let a = cached.encode("repeated text").await.unwrap();
        let b = cached.encode("repeated text").await.unwrap();
        assert_eq!(a, b);

        let texts = vec!["repeated text".to_string(), "fresh text".to_string()];
        let batch = cached.encode_batch(&texts).await.unwrap();
        assert_eq!(batch[0], a);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn model_table_lookup() {
        let spec = model_spec("intfloat/e5-large-v2").unwrap();
        assert_eq!(spec.dimension, 1024);
        assert_eq!(spec.query_prefix, "query: ");
        assert_eq!(spec.document_prefix, "passage: ");

        assert!(model_spec("no-such-model").is_err());
        assert_eq!(model_spec(DEFAULT_MODEL_ID).unwrap().dimension, 384);
    }
}
