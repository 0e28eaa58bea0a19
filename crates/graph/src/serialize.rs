use crate::types::DepGraph;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;

/// The two textual payloads handed to the rendering collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct GraphArtifacts {
    /// Node/edge attribute text (DOT).
    pub dot: String,

    /// Drawing text for a vector consumer (TikZ).
    pub tikz: String,
}

/// Serialize the finished graph.
///
/// Both payloads carry the full attribute set per node (label, shape,
/// border color, fill color) and per edge (dashed/solid), in stable order:
/// nodes as created by the build pass, edges as retained after reduction.
pub fn serialize(graph: &DepGraph) -> GraphArtifacts {
    GraphArtifacts {
        dot: to_dot(graph),
        tikz: to_tikz(graph),
    }
}

fn to_dot(graph: &DepGraph) -> String {
    let mut out = String::new();
    out.push_str("digraph dependencies {\n");
    out.push_str("\tbgcolor=transparent;\n");
    out.push_str("\tnode [penwidth=1.8];\n");
    out.push_str("\tedge [arrowhead=vee];\n");

    for (_, node) in graph.nodes() {
        out.push_str(&format!(
            "\t{} [label={}, shape={}, style=filled, color={}, fillcolor={}];\n",
            quoted(&node.label),
            quoted(short_label(&node.label)),
            node.kind.shape(),
            node.kind.border_color(),
            node.kind.fill_color()
        ));
    }
    for (src, dst, kind) in graph.edges() {
        out.push_str(&format!(
            "\t{} -> {} [style={}];\n",
            quoted(src),
            quoted(dst),
            kind.dot_style()
        ));
    }

    out.push_str("}\n");
    out
}

fn to_tikz(graph: &DepGraph) -> String {
    let positions = layout(graph);
    let mut out = String::new();
    out.push_str("\\begin{tikzpicture}[>=stealth, line width=0.9pt]\n");

    for (idx, node) in graph.nodes() {
        let (col, layer) = positions[&idx];
        out.push_str(&format!(
            "  \\node[{}, draw={}, fill={}] (n{}) at ({}, {}) {{{}}};\n",
            tikz_shape(node.kind.shape()),
            node.kind.border_color(),
            node.kind.fill_color(),
            idx.index(),
            col as i64 * 3,
            layer as i64 * -2,
            tex_escaped(short_label(&node.label))
        ));
    }
    for e in graph.graph.edge_references() {
        out.push_str(&format!(
            "  \\draw[->, {}] (n{}) -- (n{});\n",
            e.weight().dot_style(),
            e.source().index(),
            e.target().index()
        ));
    }

    out.push_str("\\end{tikzpicture}\n");
    out
}

/// Deterministic layered layout: SCC condensation, longest-path layering,
/// columns in node creation order. Cheap stand-in for a real layout engine,
/// which the consumer is free to substitute.
fn layout(graph: &DepGraph) -> HashMap<NodeIndex, (usize, usize)> {
    let sccs = tarjan_scc(&graph.graph);
    let mut component = HashMap::new();
    for (ci, scc) in sccs.iter().enumerate() {
        for &node in scc {
            component.insert(node, ci);
        }
    }

    // tarjan emits components in reverse topological order
    let mut comp_layer = vec![0usize; sccs.len()];
    for ci in (0..sccs.len()).rev() {
        for &node in &sccs[ci] {
            for e in graph.graph.edges(node) {
                let target_comp = component[&e.target()];
                if target_comp != ci {
                    comp_layer[target_comp] = comp_layer[target_comp].max(comp_layer[ci] + 1);
                }
            }
        }
    }

    let mut next_col: HashMap<usize, usize> = HashMap::new();
    let mut positions = HashMap::new();
    for idx in graph.graph.node_indices() {
        let layer = comp_layer[component[&idx]];
        let col = next_col.entry(layer).or_insert(0);
        positions.insert(idx, (*col, layer));
        *col += 1;
    }
    positions
}

fn tikz_shape(shape: &str) -> &'static str {
    match shape {
        "box" => "rectangle",
        "diamond" => "diamond",
        "doublecircle" => "circle, double",
        _ => "ellipse",
    }
}

/// Nodes display only the part after the last `:` of their label.
fn short_label(label: &str) -> &str {
    label.rsplit(':').next().unwrap_or(label)
}

fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

fn tex_escaped(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '#' | '$' | '%' | '&' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeKind, StatementNode};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use texdep_expand::SourceLocation;
    use texdep_scan::CanonicalKind;

    fn fixture() -> DepGraph {
        let mut graph = DepGraph::new();
        for (label, kind) in [
            ("def:ring", CanonicalKind::Definition),
            ("lem:ring-unit", CanonicalKind::Lemma),
            ("cor:trivial-ring", CanonicalKind::Corollary),
        ] {
            graph.add_node(StatementNode {
                label: label.to_string(),
                kind,
                chapter: None,
                uses: Vec::new(),
                location: SourceLocation {
                    file: PathBuf::from("test.tex"),
                    line: 1,
                },
            });
        }
        let d = graph.find_node("def:ring").unwrap();
        let l = graph.find_node("lem:ring-unit").unwrap();
        let c = graph.find_node("cor:trivial-ring").unwrap();
        graph.add_edge(d, l, EdgeKind::Dashed);
        graph.add_edge(d, c, EdgeKind::Dashed);
        graph.add_edge(l, c, EdgeKind::Solid);
        graph
    }

    #[test]
    fn dot_carries_the_full_node_attribute_set() {
        let dot = to_dot(&fixture());

        assert!(dot.contains(
            "\"def:ring\" [label=\"ring\", shape=box, style=filled, color=Purple, fillcolor=Lavender];"
        ));
        assert!(dot.contains(
            "\"lem:ring-unit\" [label=\"ring-unit\", shape=ellipse, style=filled, color=Blue, fillcolor=SkyBlue];"
        ));
    }

    #[test]
    fn dot_distinguishes_dashed_and_solid_edges() {
        let dot = to_dot(&fixture());

        assert!(dot.contains("\"def:ring\" -> \"lem:ring-unit\" [style=dashed];"));
        assert!(dot.contains("\"lem:ring-unit\" -> \"cor:trivial-ring\" [style=solid];"));
    }

    #[test]
    fn dot_nodes_appear_in_creation_order() {
        let dot = to_dot(&fixture());
        let d = dot.find("\"def:ring\" [").unwrap();
        let l = dot.find("\"lem:ring-unit\" [").unwrap();
        let c = dot.find("\"cor:trivial-ring\" [").unwrap();
        assert!(d < l && l < c);
    }

    #[test]
    fn tikz_draws_every_node_and_edge() {
        let tikz = to_tikz(&fixture());

        assert_eq!(tikz.matches("\\node[").count(), 3);
        assert_eq!(tikz.matches("\\draw[").count(), 3);
        assert!(tikz.contains("rectangle, draw=Purple, fill=Lavender"));
        assert!(tikz.contains("\\draw[->, dashed]"));
        assert!(tikz.contains("\\draw[->, solid]"));
    }

    #[test]
    fn tikz_layers_dependencies_above_dependents() {
        let tikz = to_tikz(&fixture());
        // def:ring is a source, so it sits at layer 0 / y = 0; the
        // corollary depends on both others and lands two layers down
        assert!(tikz.contains("at (0, 0) {ring}"));
        assert!(tikz.contains("at (0, -2) {ring-unit}"));
        assert!(tikz.contains("at (0, -4) {trivial-ring}"));
    }

    #[test]
    fn serialization_is_deterministic() {
        let graph = fixture();
        let first = serialize(&graph);
        let second = serialize(&graph);
        assert_eq!(first.dot, second.dot);
        assert_eq!(first.tikz, second.tikz);
    }

    #[test]
    fn labels_with_quotes_are_escaped() {
        assert_eq!(quoted("a\"b"), "\"a\\\"b\"");
        assert_eq!(quoted("plain"), "\"plain\"");
    }

    #[test]
    fn display_labels_drop_the_kind_prefix() {
        assert_eq!(short_label("lem:ring-unit"), "ring-unit");
        assert_eq!(short_label("noprefix"), "noprefix");
        assert_eq!(tex_escaped("has_underscore"), "has\\_underscore");
    }
}
