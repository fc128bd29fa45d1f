use crate::profile::{SearchConfig, SearchStrategy};

/// Question-style prefixes that signal a semantic-leaning query.
const INTERROGATIVES: [&str; 6] = ["what", "how", "why", "when", "where", "who"];

/// Picks a search configuration from the shape of the query alone.
///
/// Short queries behave like keyword lookups, long ones like natural
/// language questions; the preset tables encode that trade-off.
pub struct StrategyOptimizer;

impl StrategyOptimizer {
    /// Strategy bucket by query token count.
    #[must_use]
    pub fn strategy_for(query: &str) -> SearchStrategy {
        match query.split_whitespace().count() {
            0..=2 => SearchStrategy::Precision,
            3..=5 => SearchStrategy::Balanced,
            _ => SearchStrategy::Recall,
        }
    }

    /// Auto-tuned configuration for `query`.
    ///
    /// Starts from the bucket's preset, then leans the weights further
    /// toward keywords for very short queries and toward semantics for
    /// long ones. An interrogative prefix forces query expansion and
    /// shifts another 0.1 of weight from keyword to semantic.
    #[must_use]
    pub fn config_for(query: &str) -> SearchConfig {
        let strategy = Self::strategy_for(query);
        let mut config = strategy.config();

        match strategy {
            SearchStrategy::Precision => {
                config.keyword_weight = 0.8;
                config.semantic_weight = 0.2;
            }
            SearchStrategy::Recall => {
                config.keyword_weight = 0.3;
                config.semantic_weight = 0.7;
            }
            _ => {}
        }

        if Self::is_interrogative(query) {
            config.enable_query_expansion = true;
            config.semantic_weight += 0.1;
            config.keyword_weight -= 0.1;
        }

        log::debug!(
            "Auto-selected '{}' strategy for query ({} tokens)",
            strategy.as_str(),
            query.split_whitespace().count()
        );
        config
    }

    fn is_interrogative(query: &str) -> bool {
        let lowered = query.to_lowercase();
        INTERROGATIVES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
    }
}
