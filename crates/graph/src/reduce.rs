use crate::types::{DepGraph, EdgeKind};
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashSet;

/// Whether to run the transitive reduction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReductionMode {
    #[default]
    Reduced,
    Nonreduced,
}

/// A dependency chain that loops back on itself.
///
/// A modeling anomaly in the source material, not a parsing failure:
/// reported as a warning next to a still-valid graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DependencyCycle {
    /// Sorted labels of the statements on the cycle.
    pub members: Vec<String>,
}

/// Reduce the graph (or pass it through untouched in `Nonreduced` mode)
/// and report any dependency cycles.
///
/// Reduction removes every edge whose endpoints stay connected through a
/// longer path, treating dashed and solid edges as one reachability
/// relation; surviving edges keep their kind. Cycles do not stop it —
/// reachability is well-defined on cyclic graphs too.
pub fn reduce(graph: &DepGraph, mode: ReductionMode) -> (DepGraph, Vec<DependencyCycle>) {
    let cycles = detect_cycles(graph);
    for cycle in &cycles {
        log::warn!("dependency cycle: {}", cycle.members.join(" -> "));
    }

    let reduced = match mode {
        ReductionMode::Nonreduced => graph.clone(),
        ReductionMode::Reduced => {
            let before = graph.edge_count();
            let out = transitive_reduction(graph);
            log::info!(
                "transitive reduction removed {} of {} edge(s)",
                before - out.edge_count(),
                before
            );
            out
        }
    };
    (reduced, cycles)
}

fn detect_cycles(graph: &DepGraph) -> Vec<DependencyCycle> {
    let mut cycles = Vec::new();
    for scc in tarjan_scc(&graph.graph) {
        let cyclic = scc.len() > 1 || graph.graph.contains_edge(scc[0], scc[0]);
        if cyclic {
            let mut members: Vec<String> = scc
                .iter()
                .filter_map(|&idx| graph.node(idx).map(|n| n.label.clone()))
                .collect();
            members.sort();
            cycles.push(DependencyCycle { members });
        }
    }
    cycles.sort();
    cycles
}

#[derive(Clone, Copy)]
struct Candidate {
    from: NodeIndex,
    to: NodeIndex,
    kind: EdgeKind,
}

fn transitive_reduction(src: &DepGraph) -> DepGraph {
    let mut candidates: Vec<Candidate> = src
        .graph
        .edge_references()
        .map(|e| Candidate {
            from: e.source(),
            to: e.target(),
            kind: *e.weight(),
        })
        .collect();

    // stable processing order keeps the result reproducible
    candidates.sort_by(|a, b| {
        let ka = (&src.graph[a.from].label, &src.graph[a.to].label, a.kind);
        let kb = (&src.graph[b.from].label, &src.graph[b.to].label, b.kind);
        ka.cmp(&kb)
    });

    let mut retained = vec![true; candidates.len()];
    for i in 0..candidates.len() {
        let Candidate { from, to, .. } = candidates[i];
        if has_long_path(&candidates, &retained, i, from, to) {
            retained[i] = false;
        }
    }

    let mut out = DepGraph::new();
    for (_, node) in src.nodes() {
        out.add_node(node.clone());
    }
    // node indices coincide: same nodes added in the same order
    for (i, c) in candidates.iter().enumerate() {
        if retained[i] {
            out.add_edge(c.from, c.to, c.kind);
        }
    }
    out
}

/// Is `to` reachable from `from` through a path of length >= 2 that avoids
/// the candidate edge itself? Parallel direct edges do not count.
fn has_long_path(
    candidates: &[Candidate],
    retained: &[bool],
    skip: usize,
    from: NodeIndex,
    to: NodeIndex,
) -> bool {
    candidates.iter().enumerate().any(|(j, c)| {
        j != skip
            && retained[j]
            && c.from == from
            && c.to != to
            && reaches(candidates, retained, skip, c.to, to)
    })
}

fn reaches(
    candidates: &[Candidate],
    retained: &[bool],
    skip: usize,
    start: NodeIndex,
    goal: NodeIndex,
) -> bool {
    if start == goal {
        return true;
    }
    let mut visited = HashSet::new();
    visited.insert(start);
    let mut queue = vec![start];
    while let Some(node) = queue.pop() {
        for (j, c) in candidates.iter().enumerate() {
            if j == skip || !retained[j] || c.from != node {
                continue;
            }
            if c.to == goal {
                return true;
            }
            if visited.insert(c.to) {
                queue.push(c.to);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatementNode;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use texdep_expand::SourceLocation;
    use texdep_scan::CanonicalKind;

    fn fixture(labels: &[&str], edges: &[(&str, &str, EdgeKind)]) -> DepGraph {
        let mut graph = DepGraph::new();
        for label in labels {
            graph.add_node(StatementNode {
                label: label.to_string(),
                kind: CanonicalKind::Lemma,
                chapter: None,
                uses: Vec::new(),
                location: SourceLocation {
                    file: PathBuf::from("test.tex"),
                    line: 1,
                },
            });
        }
        for (from, to, kind) in edges {
            let f = graph.find_node(from).unwrap();
            let t = graph.find_node(to).unwrap();
            graph.add_edge(f, t, *kind);
        }
        graph
    }

    fn edge_set(graph: &DepGraph) -> BTreeSet<(String, String, EdgeKind)> {
        graph
            .edges()
            .map(|(s, t, k)| (s.to_string(), t.to_string(), k))
            .collect()
    }

    /// Labels reachable from each label, irrespective of edge kind.
    fn reachability(graph: &DepGraph) -> BTreeSet<(String, String)> {
        let mut out = BTreeSet::new();
        for (start, _) in graph.nodes() {
            let mut visited = HashSet::new();
            visited.insert(start);
            let mut queue = vec![start];
            while let Some(n) = queue.pop() {
                for succ in graph.graph.neighbors(n) {
                    if visited.insert(succ) {
                        queue.push(succ);
                    }
                }
            }
            for v in visited {
                if v != start {
                    out.insert((
                        graph.node(start).unwrap().label.clone(),
                        graph.node(v).unwrap().label.clone(),
                    ));
                }
            }
        }
        out
    }

    #[test]
    fn shortcut_edges_are_removed() {
        let graph = fixture(
            &["a", "b", "c"],
            &[
                ("a", "b", EdgeKind::Dashed),
                ("b", "c", EdgeKind::Dashed),
                ("a", "c", EdgeKind::Dashed),
            ],
        );
        let (reduced, cycles) = reduce(&graph, ReductionMode::Reduced);

        assert!(cycles.is_empty());
        assert_eq!(
            edge_set(&reduced),
            BTreeSet::from([
                ("a".to_string(), "b".to_string(), EdgeKind::Dashed),
                ("b".to_string(), "c".to_string(), EdgeKind::Dashed),
            ])
        );
    }

    #[test]
    fn reduction_merges_edge_kinds_into_one_relation() {
        // the solid shortcut is redundant against the dashed chain
        let graph = fixture(
            &["a", "b", "c"],
            &[
                ("a", "b", EdgeKind::Dashed),
                ("b", "c", EdgeKind::Dashed),
                ("a", "c", EdgeKind::Solid),
            ],
        );
        let (reduced, _) = reduce(&graph, ReductionMode::Reduced);

        assert_eq!(reduced.edge_count(), 2);
        assert!(reduced
            .edges()
            .all(|(_, _, kind)| kind == EdgeKind::Dashed));
    }

    #[test]
    fn nonreduced_mode_is_the_identity_transform() {
        let graph = fixture(
            &["a", "b", "c"],
            &[
                ("a", "b", EdgeKind::Dashed),
                ("b", "c", EdgeKind::Dashed),
                ("a", "c", EdgeKind::Solid),
            ],
        );
        let (same, _) = reduce(&graph, ReductionMode::Nonreduced);
        assert_eq!(edge_set(&same), edge_set(&graph));
        assert_eq!(same.edge_count(), 3);
    }

    #[test]
    fn reduction_never_changes_reachability() {
        let graph = fixture(
            &["a", "b", "c", "d", "e"],
            &[
                ("a", "b", EdgeKind::Dashed),
                ("a", "c", EdgeKind::Dashed),
                ("b", "d", EdgeKind::Solid),
                ("c", "d", EdgeKind::Dashed),
                ("a", "d", EdgeKind::Dashed),
                ("d", "e", EdgeKind::Solid),
                ("a", "e", EdgeKind::Solid),
            ],
        );
        let (reduced, _) = reduce(&graph, ReductionMode::Reduced);

        assert_eq!(reachability(&reduced), reachability(&graph));
        assert!(reduced.edge_count() < graph.edge_count());
    }

    #[test]
    fn reducing_twice_is_a_no_op() {
        let graph = fixture(
            &["a", "b", "c", "d"],
            &[
                ("a", "b", EdgeKind::Dashed),
                ("b", "c", EdgeKind::Dashed),
                ("c", "d", EdgeKind::Dashed),
                ("a", "d", EdgeKind::Solid),
                ("a", "c", EdgeKind::Dashed),
            ],
        );
        let (once, _) = reduce(&graph, ReductionMode::Reduced);
        let (twice, _) = reduce(&once, ReductionMode::Reduced);

        assert_eq!(edge_set(&once), edge_set(&twice));
        assert_eq!(once.edge_count(), twice.edge_count());
    }

    #[test]
    fn two_cycles_are_reported_with_sorted_members() {
        let graph = fixture(
            &["a", "b", "x", "y", "lone"],
            &[
                ("a", "b", EdgeKind::Dashed),
                ("b", "a", EdgeKind::Solid),
                ("x", "y", EdgeKind::Dashed),
                ("y", "x", EdgeKind::Dashed),
                ("lone", "a", EdgeKind::Dashed),
            ],
        );
        let (_, cycles) = reduce(&graph, ReductionMode::Reduced);

        assert_eq!(
            cycles,
            vec![
                DependencyCycle {
                    members: vec!["a".to_string(), "b".to_string()]
                },
                DependencyCycle {
                    members: vec!["x".to_string(), "y".to_string()]
                },
            ]
        );
    }

    #[test]
    fn a_two_cycle_survives_reduction_intact() {
        let graph = fixture(
            &["a", "b"],
            &[
                ("a", "b", EdgeKind::Dashed),
                ("b", "a", EdgeKind::Dashed),
            ],
        );
        let (reduced, cycles) = reduce(&graph, ReductionMode::Reduced);

        assert_eq!(reduced.edge_count(), 2);
        assert_eq!(cycles.len(), 1);
    }

    #[test]
    fn self_loops_are_flagged_as_cycles() {
        let graph = fixture(&["a"], &[("a", "a", EdgeKind::Dashed)]);
        let (_, cycles) = reduce(&graph, ReductionMode::Nonreduced);

        assert_eq!(
            cycles,
            vec![DependencyCycle {
                members: vec!["a".to_string()]
            }]
        );
    }

    #[test]
    fn cycles_are_detected_in_both_modes() {
        let graph = fixture(
            &["a", "b"],
            &[
                ("a", "b", EdgeKind::Dashed),
                ("b", "a", EdgeKind::Dashed),
            ],
        );
        let (_, warn_reduced) = reduce(&graph, ReductionMode::Reduced);
        let (_, warn_plain) = reduce(&graph, ReductionMode::Nonreduced);
        assert_eq!(warn_reduced, warn_plain);
    }
}
