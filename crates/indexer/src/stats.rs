use serde::{Deserialize, Serialize};

/// Outcome summary of an indexing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexReport {
    /// Documents successfully (re)indexed.
    pub documents: usize,

    /// Section nodes written.
    pub nodes: usize,

    /// Keywords written.
    pub keywords: usize,

    /// Relationship edges written.
    pub relationships: usize,

    /// Wall time spent, in milliseconds.
    pub elapsed_ms: u64,

    /// Per-file failures; a corpus sweep continues past them.
    pub errors: Vec<String>,
}

impl IndexReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, nodes: usize, keywords: usize, relationships: usize) {
        self.documents += 1;
        self.nodes += nodes;
        self.keywords += keywords;
        self.relationships += relationships;
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}
