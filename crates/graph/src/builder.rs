use outline_store::{cosine_similarity, RelationKind, Relationship, SectionNode};

use crate::thresholds::ThresholdTable;

/// Derives the typed relationship set for one document's rebuilt nodes.
///
/// Three kinds are produced: parent-child edges from resolved parents
/// (always strength 1.0), sibling edges between same-level nodes with
/// distance decay, and semantic edges from embedding cosine similarity.
/// Sibling and semantic edges are stored once per unordered pair with
/// the lower sequence number as the source; parent-child edges always
/// point from parent to child.
#[derive(Debug, Clone, Default)]
pub struct RelationshipBuilder {
    thresholds: ThresholdTable,
}

impl RelationshipBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_thresholds(thresholds: ThresholdTable) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    #[must_use]
    pub fn build(&self, nodes: &[SectionNode]) -> Vec<Relationship> {
        let mut relationships = Vec::new();

        // Phase 1: hierarchy edges from resolved parents.
        let mut parent_child = 0usize;
        for node in nodes {
            if let Some(parent_id) = &node.parent_id {
                relationships.push(Relationship {
                    source_id: parent_id.clone(),
                    target_id: node.id.clone(),
                    kind: RelationKind::ParentChild,
                    strength: 1.0,
                });
                parent_child += 1;
            }
        }

        // Phase 2: pairwise sibling and semantic edges.
        let mut sibling = 0usize;
        let mut semantic = 0usize;
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let a = &nodes[i];
                let b = &nodes[j];
                let (source, target) = if a.seq_num <= b.seq_num { (a, b) } else { (b, a) };

                let strength = self
                    .thresholds
                    .sibling_strength(a.level.abs_diff(b.level), a.seq_num.abs_diff(b.seq_num));
                if self.thresholds.should_create(RelationKind::Sibling, strength) {
                    relationships.push(Relationship {
                        source_id: source.id.clone(),
                        target_id: target.id.clone(),
                        kind: RelationKind::Sibling,
                        strength,
                    });
                    sibling += 1;
                }

                let similarity = cosine_similarity(&a.embedding, &b.embedding);
                let strength = self.thresholds.semantic_strength(similarity);
                if self.thresholds.should_create(RelationKind::Semantic, strength) {
                    relationships.push(Relationship {
                        source_id: source.id.clone(),
                        target_id: target.id.clone(),
                        kind: RelationKind::Semantic,
                        strength,
                    });
                    semantic += 1;
                }
            }
        }

        log::info!(
            "Built {} relationships for {} nodes ({} parent-child, {} sibling, {} semantic)",
            relationships.len(),
            nodes.len(),
            parent_child,
            sibling,
            semantic
        );
        relationships
    }
}
