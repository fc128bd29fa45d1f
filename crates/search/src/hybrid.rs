use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use outline_store::{
    DocumentMeta, EmbeddingProvider, KeywordHit, NodeStore, RelationKind, SectionNode,
};

use crate::cache::{CacheStats, ResultCache};
use crate::error::{Result, SearchError};
use crate::optimizer::StrategyOptimizer;
use crate::profile::{SearchConfig, SearchStrategy};
use crate::query_expansion::QueryExpander;
use crate::rerank;

/// TTL for cached search results.
const SEARCH_CACHE_TTL: Duration = Duration::from_secs(300);
/// Strength floor for relationship expansion.
const RELATED_MIN_STRENGTH: f32 = 0.6;
/// Ceiling on results added through relationships per search.
const RELATED_CAP: usize = 10;
/// At most this many raw query tokens feed the keyword lookup.
const MAX_LEXICAL_TERMS: usize = 5;
/// Snippet length in characters.
const SNIPPET_CHARS: usize = 200;
/// Multiplier when a query token equals a matched keyword term.
const EXACT_TERM_BOOST: f32 = 1.5;

/// Lowercased query tokens longer than two characters.
pub(crate) fn query_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .filter(|token| token.chars().count() > 2)
        .map(String::from)
        .collect()
}

/// How a result earned its place in the ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    Keyword,
    Semantic,
    Related(RelationKind),
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword => f.write_str("keyword"),
            Self::Semantic => f.write_str("semantic"),
            Self::Related(kind) => write!(f, "related-{}", kind.as_str()),
        }
    }
}

impl FromStr for MatchKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "keyword" {
            return Ok(Self::Keyword);
        }
        if s == "semantic" {
            return Ok(Self::Semantic);
        }
        if let Some(rest) = s.strip_prefix("related-") {
            if let Some(kind) = RelationKind::ALL.iter().find(|k| k.as_str() == rest) {
                return Ok(Self::Related(*kind));
            }
        }
        Err(SearchError::Other(format!("unknown match type '{s}'")))
    }
}

impl Serialize for MatchKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MatchKind {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub node_id: String,
    pub document_id: String,
    pub title: String,
    pub level: u8,
    pub snippet: String,
    pub relevance: f32,
    pub match_type: MatchKind,
    /// Node this result was pulled in through, for related matches.
    pub related_to: Option<String>,
    pub doc_title: String,
    pub doc_path: String,
}

impl ScoredResult {
    fn from_node(node: &SectionNode, relevance: f32, match_type: MatchKind) -> Self {
        Self {
            node_id: node.id.clone(),
            document_id: node.document_id.clone(),
            title: node.title.clone(),
            level: node.level,
            snippet: snippet_of(&node.content),
            relevance,
            match_type,
            related_to: None,
            doc_title: "Unknown Document".to_string(),
            doc_path: "N/A".to_string(),
        }
    }
}

fn snippet_of(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn keyword_relevance(hit: &KeywordHit, tokens: &[String], config: &SearchConfig) -> f32 {
    let mut relevance = hit.similarity * config.keyword_weight * config.keyword_boost;
    let title = hit.node.title.to_lowercase();
    if tokens.iter().any(|token| title.contains(token.as_str())) {
        relevance *= config.title_boost;
    }
    let term = hit.term.to_lowercase();
    if tokens.iter().any(|token| *token == term) {
        relevance *= EXACT_TERM_BOOST;
    }
    relevance.min(1.0)
}

fn cache_key(query: &str, limit: usize) -> String {
    let digest = Sha256::digest(query.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("search:{hex}:{limit}")
}

/// Hybrid search over the hierarchical index: keyword and vector matches
/// merged with keyword priority, neighbours pulled in over the
/// relationship graph, results enriched with document metadata.
///
/// Read-only against the store. Every public entry point is fail-soft:
/// a failing stage logs the error and yields an empty result list.
pub struct HybridSearch {
    store: Arc<dyn NodeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    expander: QueryExpander,
    cache: ResultCache<Vec<ScoredResult>>,
    defaults: SearchConfig,
    diversity: Option<f32>,
}

impl HybridSearch {
    #[must_use]
    pub fn new(store: Arc<dyn NodeStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_config(store, embedder, SearchConfig::default())
    }

    #[must_use]
    pub fn with_config(
        store: Arc<dyn NodeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        defaults: SearchConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            expander: QueryExpander::new(),
            cache: ResultCache::new(),
            defaults,
            diversity: None,
        }
    }

    /// Enable the diversity rerank stage with the given blend factor.
    ///
    /// Off by default, in which case results come back strictly ordered
    /// by relevance.
    #[must_use]
    pub fn with_diversity(mut self, factor: f32) -> Self {
        self.diversity = Some(factor.clamp(0.0, 1.0));
        self
    }

    /// Search with the engine's default configuration.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Vec<ScoredResult> {
        self.run_guarded(query, limit, self.defaults.clone()).await
    }

    /// Search with a configuration picked from the query shape.
    pub async fn search_auto(&self, query: &str, limit: Option<usize>) -> Vec<ScoredResult> {
        self.run_guarded(query, limit, StrategyOptimizer::config_for(query))
            .await
    }

    /// Search with a named strategy preset.
    pub async fn search_with_strategy(
        &self,
        query: &str,
        limit: Option<usize>,
        strategy: SearchStrategy,
    ) -> Vec<ScoredResult> {
        self.run_guarded(query, limit, strategy.config()).await
    }

    /// Search with an explicit configuration.
    pub async fn search_with_config(
        &self,
        query: &str,
        limit: Option<usize>,
        config: SearchConfig,
    ) -> Vec<ScoredResult> {
        self.run_guarded(query, limit, config).await
    }

    /// Counters for the result cache.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop all cached results, e.g. after a reindex.
    pub fn invalidate_cache(&self) {
        self.cache.clear();
    }

    async fn run_guarded(
        &self,
        query: &str,
        limit: Option<usize>,
        config: SearchConfig,
    ) -> Vec<ScoredResult> {
        match self.run(query, limit, config).await {
            Ok(results) => results,
            Err(err) => {
                log::error!("Search failed for query '{query}': {err}");
                Vec::new()
            }
        }
    }

    async fn run(
        &self,
        query: &str,
        limit: Option<usize>,
        mut config: SearchConfig,
    ) -> Result<Vec<ScoredResult>> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if let Some(limit) = limit {
            config.top_k = limit.max(1);
        }
        log::debug!("Hybrid search: query='{query}', top_k={}", config.top_k);

        let key = cache_key(query, config.top_k);
        if config.use_cache {
            if let Some(cached) = self.cache.get(&key) {
                log::debug!("Cache hit for query '{query}'");
                return Ok(cached);
            }
        }

        let tokens = query_tokens(query);

        // 1. Expansion.
        let expansions = if config.enable_query_expansion {
            self.expander.expand(query, config.expansion_terms)
        } else {
            Vec::new()
        };
        if !expansions.is_empty() {
            log::debug!("Expanded '{query}' with {expansions:?}");
        }

        // 2. One query embedding serves both match branches.
        let query_embedding = self.embedder.encode(query).await?;

        // 3. Keyword match over raw tokens plus expansions.
        let mut terms: Vec<String> = tokens.iter().take(MAX_LEXICAL_TERMS).cloned().collect();
        terms.extend(expansions.iter().cloned());
        let keyword_hits = self
            .store
            .matching_keywords(&terms, &query_embedding, config.top_k)
            .await?;
        log::debug!("Keyword match: {} hits", keyword_hits.len());

        // 4. Vector match with the similarity floor.
        let semantic_hits = self
            .store
            .similar_nodes(
                &query_embedding,
                config.top_k,
                Some(config.similarity_threshold),
            )
            .await?;
        log::debug!("Semantic match: {} hits", semantic_hits.len());

        // 5. Merge; keyword matches win id collisions.
        let mut seen: HashSet<String> = HashSet::new();
        let mut results: Vec<ScoredResult> = Vec::new();
        for hit in &keyword_hits {
            if !seen.insert(hit.node.id.clone()) {
                continue;
            }
            let relevance = keyword_relevance(hit, &tokens, &config);
            results.push(ScoredResult::from_node(
                &hit.node,
                relevance,
                MatchKind::Keyword,
            ));
        }
        for hit in &semantic_hits {
            if hit.similarity < config.similarity_threshold {
                continue;
            }
            if !seen.insert(hit.node.id.clone()) {
                continue;
            }
            results.push(ScoredResult::from_node(
                &hit.node,
                hit.similarity * config.semantic_weight,
                MatchKind::Semantic,
            ));
        }
        log::debug!("Merged: {} unique candidates", results.len());

        // 6. Pull in related sections for the strongest candidates.
        rerank::sort_by_relevance(&mut results);
        let seeds: Vec<(String, f32)> = results
            .iter()
            .take(config.max_depth.min(results.len()))
            .map(|r| (r.node_id.clone(), r.relevance))
            .collect();
        let mut related = Vec::new();
        for (seed_id, seed_relevance) in seeds {
            let budget = RELATED_CAP.saturating_sub(related.len());
            if budget == 0 {
                break;
            }
            let neighbours = self
                .store
                .related_for(&seed_id, RELATED_MIN_STRENGTH, budget)
                .await?;
            for (edge, node) in neighbours {
                if !seen.insert(node.id.clone()) {
                    continue;
                }
                let relevance = seed_relevance * edge.strength * config.relationship_decay;
                let mut result =
                    ScoredResult::from_node(&node, relevance, MatchKind::Related(edge.kind));
                result.related_to = Some(seed_id.clone());
                related.push(result);
            }
        }
        if !related.is_empty() {
            log::debug!("Relationship expansion added {} results", related.len());
        }
        results.extend(related);

        // 7. Final ranking, with the optional diversity pass.
        rerank::sort_by_relevance(&mut results);
        if let Some(factor) = self.diversity {
            results = rerank::diversify(results, factor);
        }

        // 8. Enrich survivors with document metadata.
        results.truncate(config.top_k);
        self.enrich(&mut results).await;

        log::info!(
            "Search '{query}' -> {} results (top_k {})",
            results.len(),
            config.top_k
        );

        if config.use_cache {
            self.cache.set(key, results.clone(), SEARCH_CACHE_TTL);
        }
        Ok(results)
    }

    async fn enrich(&self, results: &mut [ScoredResult]) {
        let mut metas: HashMap<String, Option<DocumentMeta>> = HashMap::new();
        for result in results.iter_mut() {
            if !metas.contains_key(&result.document_id) {
                let meta = match self.store.document_meta(&result.document_id).await {
                    Ok(meta) => meta,
                    Err(err) => {
                        log::warn!(
                            "Could not load metadata for document {}: {err}",
                            result.document_id
                        );
                        None
                    }
                };
                metas.insert(result.document_id.clone(), meta);
            }
            if let Some(Some(meta)) = metas.get(&result.document_id) {
                result.doc_title = meta.title.clone();
                result.doc_path = meta.path.clone();
            }
        }
    }
}
