use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

const BUILTIN_PRECISION: &str = include_str!("../../../profiles/precision.toml");
const BUILTIN_RECALL: &str = include_str!("../../../profiles/recall.toml");
const BUILTIN_BALANCED: &str = include_str!("../../../profiles/balanced.toml");
const BUILTIN_FAST: &str = include_str!("../../../profiles/fast.toml");
const BUILTIN_COMPREHENSIVE: &str = include_str!("../../../profiles/comprehensive.toml");

/// Named search strategies, each backed by a bundled TOML profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Few, highly confident matches.
    Precision,
    /// Broad net, lower similarity floor.
    Recall,
    /// Default trade-off.
    Balanced,
    /// Keyword-heavy, shallow, latency-first.
    Fast,
    /// Widest net and deepest relationship traversal.
    Comprehensive,
}

impl SearchStrategy {
    pub const ALL: [SearchStrategy; 5] = [
        SearchStrategy::Precision,
        SearchStrategy::Recall,
        SearchStrategy::Balanced,
        SearchStrategy::Fast,
        SearchStrategy::Comprehensive,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::Precision => "precision",
            SearchStrategy::Recall => "recall",
            SearchStrategy::Balanced => "balanced",
            SearchStrategy::Fast => "fast",
            SearchStrategy::Comprehensive => "comprehensive",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == name)
    }

    /// Build the preset configuration for this strategy.
    #[must_use]
    pub fn config(self) -> SearchConfig {
        let raw = match self {
            SearchStrategy::Precision => BUILTIN_PRECISION,
            SearchStrategy::Recall => BUILTIN_RECALL,
            SearchStrategy::Balanced => BUILTIN_BALANCED,
            SearchStrategy::Fast => BUILTIN_FAST,
            SearchStrategy::Comprehensive => BUILTIN_COMPREHENSIVE,
        };
        SearchConfig::from_toml(self.as_str(), raw).expect("builtin profile must parse")
    }
}

/// Tunable parameters for one search run.
///
/// Built either from a [`SearchStrategy`] preset, from a caller-supplied
/// TOML profile, or from the query itself via
/// [`crate::StrategyOptimizer`]. A profile only has to name the keys it
/// changes; everything else keeps the baseline defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub keyword_weight: f32,
    pub semantic_weight: f32,
    pub enable_query_expansion: bool,
    pub expansion_terms: usize,
    pub synonym_threshold: f32,
    pub use_cache: bool,
    pub cache_ttl_seconds: u64,
    pub batch_size: usize,
    /// How many top-ranked results get their relationships expanded.
    pub max_depth: usize,
    pub title_boost: f32,
    pub keyword_boost: f32,
    pub relationship_decay: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            similarity_threshold: 0.7,
            keyword_weight: 0.6,
            semantic_weight: 0.4,
            enable_query_expansion: true,
            expansion_terms: 3,
            synonym_threshold: 0.8,
            use_cache: true,
            cache_ttl_seconds: 3600,
            batch_size: 100,
            max_depth: 3,
            title_boost: 2.0,
            keyword_boost: 1.5,
            relationship_decay: 0.8,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProfile {
    #[allow(dead_code)]
    name: Option<String>,
    #[allow(dead_code)]
    description: Option<String>,
    top_k: Option<usize>,
    similarity_threshold: Option<f32>,
    keyword_weight: Option<f32>,
    semantic_weight: Option<f32>,
    enable_query_expansion: Option<bool>,
    expansion_terms: Option<usize>,
    synonym_threshold: Option<f32>,
    use_cache: Option<bool>,
    cache_ttl_seconds: Option<u64>,
    batch_size: Option<usize>,
    max_depth: Option<usize>,
    title_boost: Option<f32>,
    keyword_boost: Option<f32>,
    relationship_decay: Option<f32>,
}

impl SearchConfig {
    /// Parse a TOML profile, overlaying its keys onto the defaults.
    ///
    /// Unknown keys are rejected; weight-like floats must stay in
    /// `[0, 1]`; count-like knobs are clamped to sane ranges.
    pub fn from_toml(profile_name: &str, text: &str) -> Result<Self> {
        let raw: RawProfile = toml::from_str(text).map_err(|e| SearchError::InvalidProfile {
            name: profile_name.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_raw(profile_name, raw)
    }

    fn from_raw(profile_name: &str, raw: RawProfile) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            top_k: raw.top_k.unwrap_or(defaults.top_k).clamp(1, 100),
            similarity_threshold: raw
                .similarity_threshold
                .unwrap_or(defaults.similarity_threshold),
            keyword_weight: raw.keyword_weight.unwrap_or(defaults.keyword_weight),
            semantic_weight: raw.semantic_weight.unwrap_or(defaults.semantic_weight),
            enable_query_expansion: raw
                .enable_query_expansion
                .unwrap_or(defaults.enable_query_expansion),
            expansion_terms: raw
                .expansion_terms
                .unwrap_or(defaults.expansion_terms)
                .clamp(0, 25),
            synonym_threshold: raw.synonym_threshold.unwrap_or(defaults.synonym_threshold),
            use_cache: raw.use_cache.unwrap_or(defaults.use_cache),
            cache_ttl_seconds: raw.cache_ttl_seconds.unwrap_or(defaults.cache_ttl_seconds),
            batch_size: raw.batch_size.unwrap_or(defaults.batch_size).clamp(1, 1000),
            max_depth: raw.max_depth.unwrap_or(defaults.max_depth).clamp(1, 10),
            title_boost: raw.title_boost.unwrap_or(defaults.title_boost),
            keyword_boost: raw.keyword_boost.unwrap_or(defaults.keyword_boost),
            relationship_decay: raw
                .relationship_decay
                .unwrap_or(defaults.relationship_decay),
        };
        config.validate(profile_name)?;
        Ok(config)
    }

    fn validate(&self, profile_name: &str) -> Result<()> {
        let invalid = |reason: String| SearchError::InvalidProfile {
            name: profile_name.to_string(),
            reason,
        };

        for (field, value) in [
            ("similarity_threshold", self.similarity_threshold),
            ("keyword_weight", self.keyword_weight),
            ("semantic_weight", self.semantic_weight),
            ("synonym_threshold", self.synonym_threshold),
            ("relationship_decay", self.relationship_decay),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!(
                    "{field} must be in [0.0, 1.0] (got {value})"
                )));
            }
        }

        for (field, value) in [
            ("title_boost", self.title_boost),
            ("keyword_boost", self.keyword_boost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{field} must be a non-negative number (got {value})"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_profiles_all_parse() {
        for strategy in SearchStrategy::ALL {
            let config = strategy.config();
            assert!(config.top_k >= 1, "{strategy:?}");
        }
    }

    #[test]
    fn precision_profile_matches_the_preset_table() {
        let c = SearchStrategy::Precision.config();
        assert_eq!(c.top_k, 5);
        assert!((c.similarity_threshold - 0.85).abs() < 1e-6);
        assert!((c.keyword_weight - 0.7).abs() < 1e-6);
        assert!((c.semantic_weight - 0.3).abs() < 1e-6);
        assert!(!c.enable_query_expansion);
        assert_eq!(c.max_depth, 2);
        // Unset keys fall back to the baseline defaults.
        assert_eq!(c.expansion_terms, 3);
        assert_eq!(c.cache_ttl_seconds, 3600);
        assert!((c.title_boost - 2.0).abs() < 1e-6);
    }

    #[test]
    fn recall_and_comprehensive_widen_the_net() {
        let recall = SearchStrategy::Recall.config();
        assert_eq!(recall.top_k, 20);
        assert_eq!(recall.expansion_terms, 5);
        assert_eq!(recall.max_depth, 4);
        assert!(recall.enable_query_expansion);
        assert!((recall.similarity_threshold - 0.6).abs() < 1e-6);

        let comprehensive = SearchStrategy::Comprehensive.config();
        assert_eq!(comprehensive.top_k, 25);
        assert_eq!(comprehensive.expansion_terms, 7);
        assert_eq!(comprehensive.max_depth, 5);
        assert!((comprehensive.similarity_threshold - 0.5).abs() < 1e-6);
        assert!((comprehensive.synonym_threshold - 0.7).abs() < 1e-6);
    }

    #[test]
    fn fast_profile_is_keyword_heavy_and_shallow() {
        let c = SearchStrategy::Fast.config();
        assert_eq!(c.top_k, 5);
        assert!((c.keyword_weight - 0.8).abs() < 1e-6);
        assert!((c.semantic_weight - 0.2).abs() < 1e-6);
        assert_eq!(c.max_depth, 1);
        assert!(!c.enable_query_expansion);
        assert!(c.use_cache);
    }

    #[test]
    fn custom_profile_overrides_only_named_keys() {
        let config = SearchConfig::from_toml("custom", "top_k = 7\ntitle_boost = 3.0\n").unwrap();
        assert_eq!(config.top_k, 7);
        assert!((config.title_boost - 3.0).abs() < 1e-6);
        assert!((config.keyword_weight - 0.6).abs() < 1e-6);
        assert_eq!(config.max_depth, 3);
    }

    #[test]
    fn unknown_keys_are_rejected_with_the_profile_name() {
        let err = SearchConfig::from_toml("custom", "oops = 1\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("custom"), "{msg}");
        assert!(msg.contains("oops"), "{msg}");
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let err = SearchConfig::from_toml("custom", "keyword_weight = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("keyword_weight"));
    }

    #[test]
    fn count_knobs_are_clamped_not_rejected() {
        let config = SearchConfig::from_toml("custom", "top_k = 0\nmax_depth = 99\n").unwrap();
        assert_eq!(config.top_k, 1);
        assert_eq!(config.max_depth, 10);
    }

    #[test]
    fn strategy_names_round_trip() {
        for strategy in SearchStrategy::ALL {
            assert_eq!(SearchStrategy::parse(strategy.as_str()), Some(strategy));
        }
        assert_eq!(SearchStrategy::parse("nope"), None);
    }
}
