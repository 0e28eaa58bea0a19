use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;
use texdep_expand::SourceLocation;
use texdep_scan::CanonicalKind;

/// A tracked statement, identified by its label.
///
/// Created when the builder sees the environment's `\label`, mutated only
/// while that environment is still open, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementNode {
    /// Project-wide unique identity.
    pub label: String,

    /// Canonical kind resolved via the alias table.
    pub kind: CanonicalKind,

    /// Title of the owning chapter, when the document has chapters.
    pub chapter: Option<String>,

    /// Labels named by `\uses` inside the statement body itself, in
    /// declaration order.
    pub uses: Vec<String>,

    /// Where the label was declared.
    pub location: SourceLocation,
}

/// Dependency edge style.
///
/// Dashed: declared in the statement body (conceptual prerequisite).
/// Solid: declared in the bound proof (used in the argument).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Dashed,
    Solid,
}

impl EdgeKind {
    pub fn dot_style(self) -> &'static str {
        match self {
            EdgeKind::Dashed => "dashed",
            EdgeKind::Solid => "solid",
        }
    }
}

/// The finished dependency graph.
///
/// Edges run dependency -> dependent: an edge `a -> b` means statement `b`
/// relies on statement `a`, either in its own body (dashed) or in its
/// proof (solid).
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    /// Node and edge store. Node iteration order is the creation order
    /// fixed during the build pass, edge iteration order is retention
    /// order; the serializer relies on both.
    pub graph: DiGraph<StatementNode, EdgeKind>,

    /// Label -> node index, for O(1) lookup.
    pub label_index: HashMap<String, NodeIndex>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and index it by label.
    pub fn add_node(&mut self, node: StatementNode) -> NodeIndex {
        let label = node.label.clone();
        let idx = self.graph.add_node(node);
        self.label_index.insert(label, idx);
        idx
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) {
        self.graph.add_edge(from, to, kind);
    }

    pub fn find_node(&self, label: &str) -> Option<NodeIndex> {
        self.label_index.get(label).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&StatementNode> {
        self.graph.node_weight(idx)
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &StatementNode)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|node| (idx, node)))
    }

    /// Edges in retention order as `(source, target, kind)` label triples.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, EdgeKind)> {
        use petgraph::visit::EdgeRef;
        self.graph.edge_references().filter_map(move |e| {
            let src = self.graph.node_weight(e.source())?;
            let dst = self.graph.node_weight(e.target())?;
            Some((src.label.as_str(), dst.label.as_str(), *e.weight()))
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
