use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use outline_store::{RelationKind, Relationship, SectionNode};

use crate::error::{GraphError, Result};

/// Kind and strength carried on one graph edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeWeight {
    pub kind: RelationKind,
    pub strength: f32,
}

/// In-memory section graph for traversal over one or more documents.
///
/// Nodes hold the full section records; edges carry kind and strength.
/// Lookup by section id goes through a side index.
#[derive(Debug, Default)]
pub struct SectionGraph {
    graph: DiGraph<SectionNode, EdgeWeight>,
    index: HashMap<String, NodeIndex>,
}

impl SectionGraph {
    /// Assemble a graph from stored nodes and relationships. Duplicate
    /// node ids and edges referencing unknown nodes are build errors.
    pub fn from_parts(nodes: Vec<SectionNode>, relationships: &[Relationship]) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(nodes.len(), relationships.len());
        let mut index = HashMap::with_capacity(nodes.len());

        for node in nodes {
            let id = node.id.clone();
            let idx = graph.add_node(node);
            if index.insert(id.clone(), idx).is_some() {
                return Err(GraphError::BuildError(format!("duplicate node id {id}")));
            }
        }

        for relationship in relationships {
            let source = index.get(&relationship.source_id).ok_or_else(|| {
                GraphError::NodeNotFound(relationship.source_id.clone())
            })?;
            let target = index.get(&relationship.target_id).ok_or_else(|| {
                GraphError::NodeNotFound(relationship.target_id.clone())
            })?;
            graph.add_edge(
                *source,
                *target,
                EdgeWeight { kind: relationship.kind, strength: relationship.strength },
            );
        }

        log::debug!(
            "Assembled section graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(Self { graph, index })
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&SectionNode> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// Hierarchy parent, if the node has one in the graph.
    #[must_use]
    pub fn parent(&self, id: &str) -> Option<&SectionNode> {
        let idx = *self.index.get(id)?;
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .find(|e| e.weight().kind == RelationKind::ParentChild)
            .map(|e| &self.graph[e.source()])
    }

    /// Direct hierarchy children in document order.
    #[must_use]
    pub fn children(&self, id: &str) -> Vec<&SectionNode> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut children: Vec<&SectionNode> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| e.weight().kind == RelationKind::ParentChild)
            .map(|e| &self.graph[e.target()])
            .collect();
        children.sort_by_key(|node| node.seq_num);
        children
    }

    /// Nodes without a hierarchy parent, in document order.
    #[must_use]
    pub fn roots(&self) -> Vec<&SectionNode> {
        let mut roots: Vec<&SectionNode> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                !self
                    .graph
                    .edges_directed(idx, Direction::Incoming)
                    .any(|e| e.weight().kind == RelationKind::ParentChild)
            })
            .map(|idx| &self.graph[idx])
            .collect();
        roots.sort_by(|a, b| {
            a.document_id
                .cmp(&b.document_id)
                .then(a.seq_num.cmp(&b.seq_num))
        });
        roots
    }

    /// Neighbors over edges in either direction with strength above
    /// `min_strength`, strongest first.
    #[must_use]
    pub fn related(&self, id: &str, min_strength: f32) -> Vec<(EdgeWeight, &SectionNode)> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };

        let mut related: Vec<(EdgeWeight, &SectionNode)> = Vec::new();
        for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
            if edge.weight().strength > min_strength {
                related.push((*edge.weight(), &self.graph[edge.target()]));
            }
        }
        for edge in self.graph.edges_directed(idx, Direction::Incoming) {
            if edge.weight().strength > min_strength {
                related.push((*edge.weight(), &self.graph[edge.source()]));
            }
        }

        related.sort_by(|a, b| {
            b.0.strength
                .partial_cmp(&a.0.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        related
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(id: &str, level: u8, seq_num: usize) -> SectionNode {
        SectionNode {
            id: id.to_string(),
            document_id: "doc".to_string(),
            parent_id: None,
            title: format!("Section {id}"),
            content: String::new(),
            level,
            seq_num,
            embedding: Vec::new(),
        }
    }

    fn edge(source: &str, target: &str, kind: RelationKind, strength: f32) -> Relationship {
        Relationship {
            source_id: source.to_string(),
            target_id: target.to_string(),
            kind,
            strength,
        }
    }

    fn sample_graph() -> SectionGraph {
        let nodes = vec![node("a", 1, 0), node("b", 2, 1), node("c", 2, 2)];
        let relationships = vec![
            edge("a", "b", RelationKind::ParentChild, 1.0),
            edge("a", "c", RelationKind::ParentChild, 1.0),
            edge("b", "c", RelationKind::Sibling, 0.7),
            edge("b", "c", RelationKind::Semantic, 0.9),
        ];
        SectionGraph::from_parts(nodes, &relationships).unwrap()
    }

    #[test]
    fn counts_reflect_parts() {
        let graph = sample_graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn parent_and_children_follow_hierarchy_edges() {
        let graph = sample_graph();

        assert_eq!(graph.parent("b").map(|n| n.id.as_str()), Some("a"));
        assert_eq!(graph.parent("a"), None);

        let children: Vec<&str> = graph.children("a").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(children, vec!["b", "c"]);
        assert!(graph.children("c").is_empty());
    }

    #[test]
    fn roots_are_nodes_without_hierarchy_parents() {
        let graph = sample_graph();
        let roots: Vec<&str> = graph.roots().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(roots, vec!["a"]);
    }

    #[test]
    fn related_spans_both_directions_sorted_by_strength() {
        let graph = sample_graph();

        let related = graph.related("c", 0.0);
        let ids: Vec<(&str, RelationKind)> =
            related.iter().map(|(w, n)| (n.id.as_str(), w.kind)).collect();
        assert_eq!(
            ids,
            vec![
                ("a", RelationKind::ParentChild),
                ("b", RelationKind::Semantic),
                ("b", RelationKind::Sibling),
            ]
        );
    }

    #[test]
    fn related_applies_the_strength_floor_strictly() {
        let graph = sample_graph();
        let related = graph.related("c", 0.7);
        // The 0.7 sibling edge does not clear a 0.7 floor.
        let kinds: Vec<RelationKind> = related.iter().map(|(w, _)| w.kind).collect();
        assert_eq!(kinds, vec![RelationKind::ParentChild, RelationKind::Semantic]);
    }

    #[test]
    fn unknown_edge_endpoints_fail_the_build() {
        let nodes = vec![node("a", 1, 0)];
        let relationships = vec![edge("a", "ghost", RelationKind::Sibling, 0.5)];
        let result = SectionGraph::from_parts(nodes, &relationships);
        assert!(matches!(result, Err(GraphError::NodeNotFound(_))));
    }

    #[test]
    fn duplicate_node_ids_fail_the_build() {
        let nodes = vec![node("a", 1, 0), node("a", 1, 1)];
        let result = SectionGraph::from_parts(nodes, &[]);
        assert!(matches!(result, Err(GraphError::BuildError(_))));
    }

    #[test]
    fn lookups_on_missing_ids_are_empty() {
        let graph = sample_graph();
        assert!(graph.node("ghost").is_none());
        assert!(graph.children("ghost").is_empty());
        assert!(graph.related("ghost", 0.0).is_empty());
    }
}
