use std::collections::{HashMap, HashSet};

/// Built-in synonym table for documentation-flavored queries.
const SYNONYMS: [(&str, &[&str]); 6] = [
    ("find", &["search", "locate", "get"]),
    ("create", &["make", "build", "generate"]),
    ("update", &["modify", "change", "edit"]),
    ("delete", &["remove", "destroy", "erase"]),
    ("doc", &["document", "documentation", "docs"]),
    ("config", &["configuration", "settings", "setup"]),
];

/// Query expander with plural variants and domain synonyms.
pub struct QueryExpander {
    /// Synonym dictionary: term -> [synonyms]
    synonyms: HashMap<String, Vec<String>>,
}

impl QueryExpander {
    /// Create a new expander with the built-in synonym table.
    #[must_use]
    pub fn new() -> Self {
        let mut synonyms = HashMap::new();
        for (term, entries) in SYNONYMS {
            synonyms.insert(
                term.to_string(),
                entries.iter().map(|s| (*s).to_string()).collect(),
            );
        }
        Self { synonyms }
    }

    /// Expand `query` into at most `max_terms` extra search terms.
    ///
    /// Every word gets its plural/singular counterpart, then words with
    /// a synonym entry contribute up to `max_terms` synonyms each. The
    /// combined list is deduplicated in order and truncated.
    #[must_use]
    pub fn expand(&self, query: &str, max_terms: usize) -> Vec<String> {
        if max_terms == 0 {
            return Vec::new();
        }

        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();

        let mut expansions = Vec::new();
        for word in &words {
            match word.strip_suffix('s') {
                Some(stem) if !stem.is_empty() => expansions.push(stem.to_string()),
                Some(_) => {}
                None => expansions.push(format!("{word}s")),
            }
        }

        for word in &words {
            if let Some(syns) = self.synonyms.get(word) {
                expansions.extend(syns.iter().take(max_terms).cloned());
            }
        }

        let mut seen = HashSet::new();
        expansions.retain(|term| seen.insert(term.clone()));
        expansions.truncate(max_terms);
        expansions
    }
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plural_toggle_runs_both_directions() {
        let expander = QueryExpander::new();

        let expansions = expander.expand("documents config", 3);
        assert_eq!(expansions, vec!["document", "configs", "configuration"]);
    }

    #[test]
    fn synonyms_follow_the_plural_variants() {
        let expander = QueryExpander::new();

        let expansions = expander.expand("find", 5);
        assert_eq!(expansions, vec!["finds", "search", "locate", "get"]);
    }

    #[test]
    fn duplicates_are_removed_in_order() {
        let expander = QueryExpander::new();

        let expansions = expander.expand("docs doc", 6);
        let unique: HashSet<&String> = expansions.iter().collect();
        assert_eq!(unique.len(), expansions.len());
        assert!(expansions.contains(&"document".to_string()));
        // "doc" toggles to "docs" and vice versa; each appears once.
        assert_eq!(
            expansions.iter().filter(|t| t.as_str() == "docs").count(),
            1
        );
    }

    #[test]
    fn bare_s_produces_no_empty_stem() {
        let expander = QueryExpander::new();

        let expansions = expander.expand("s", 3);
        assert!(expansions.iter().all(|t| !t.is_empty()));
    }

    #[test]
    fn zero_budget_expands_to_nothing() {
        let expander = QueryExpander::new();
        assert!(expander.expand("find the docs", 0).is_empty());
    }

    #[test]
    fn casing_is_normalized_before_lookup() {
        let expander = QueryExpander::new();

        let expansions = expander.expand("Create", 4);
        assert!(expansions.contains(&"creates".to_string()));
        assert!(expansions.contains(&"make".to_string()));
    }
}
