use crate::error::{GraphError, Result};
use crate::types::{DepGraph, EdgeKind, StatementNode};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};
use texdep_expand::SourceLocation;
use texdep_scan::{is_proof, resolve, CanonicalKind, ScanEvent};

/// Chapter filter entry: chapters can be named by 1-based ordinal or by
/// exact title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChapterRef {
    Ordinal(usize),
    Title(String),
}

/// Which chapters to scan. Supplied by the caller; `All` is the default.
#[derive(Debug, Clone, Default)]
pub enum ChapterSelection {
    #[default]
    All,
    Selected(Vec<ChapterRef>),
}

impl ChapterSelection {
    fn selects(&self, ordinal: usize, title: &str) -> bool {
        match self {
            ChapterSelection::All => true,
            ChapterSelection::Selected(refs) => refs.iter().any(|r| match r {
                ChapterRef::Ordinal(n) => *n == ordinal,
                ChapterRef::Title(t) => t == title,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub chapters: ChapterSelection,

    /// Canonical kinds added to the graph. An excluded kind's statements
    /// still consume their labels but contribute no nodes or edges.
    pub kinds: HashSet<CanonicalKind>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            chapters: ChapterSelection::All,
            kinds: CanonicalKind::ALL.into_iter().collect(),
        }
    }
}

/// Build the dependency graph from the scanner's event stream.
///
/// One forward pass: statement nodes are created at their `\label`, proofs
/// bind at their `\end`, and edges are resolved against the full label
/// table once the pass is over (so forward `\uses` references are fine).
pub fn build(events: &[ScanEvent], options: &BuildOptions) -> Result<DepGraph> {
    // A document without chapters is scanned whole; with chapters, only
    // selected chapter ranges count and the preamble is skipped.
    let has_chapters = events
        .iter()
        .any(|e| matches!(e, ScanEvent::ChapterStart { .. }));

    let mut builder = Builder {
        options,
        graph: DepGraph::new(),
        labels: HashMap::new(),
        scopes: Vec::new(),
        last_statement: None,
        pending: Vec::new(),
        chapter_ordinal: 0,
        current_chapter: None,
        active: !has_chapters,
    };

    for event in events {
        builder.handle(event)?;
    }
    builder.finish()
}

struct LabelEntry {
    location: SourceLocation,
    /// `None` when the owning statement's kind is excluded from the run.
    node: Option<NodeIndex>,
}

enum Scope {
    Statement {
        kind: CanonicalKind,
        included: bool,
        labeled: bool,
        node: Option<NodeIndex>,
        uses: Vec<(String, SourceLocation)>,
    },
    Proof {
        opened_at: SourceLocation,
        proves: Option<(String, SourceLocation)>,
        uses: Vec<(String, SourceLocation)>,
    },
    /// Unrecognized environment: not tracked, contents pass through to the
    /// enclosing tracked scope.
    Transparent,
}

struct PendingEdge {
    /// The used label (the dependency end of the edge).
    from_label: String,
    /// The dependent statement.
    to: NodeIndex,
    kind: EdgeKind,
    location: SourceLocation,
}

struct Builder<'a> {
    options: &'a BuildOptions,
    graph: DepGraph,
    labels: HashMap<String, LabelEntry>,
    scopes: Vec<Scope>,
    /// Implicit `\proves` binds here: the most recently created statement
    /// node, in document order. Scoped to this run.
    last_statement: Option<NodeIndex>,
    pending: Vec<PendingEdge>,
    chapter_ordinal: usize,
    current_chapter: Option<String>,
    active: bool,
}

impl Builder<'_> {
    fn handle(&mut self, event: &ScanEvent) -> Result<()> {
        match event {
            ScanEvent::ChapterStart { title, .. } => {
                self.chapter_ordinal += 1;
                self.active = self.options.chapters.selects(self.chapter_ordinal, title);
                self.current_chapter = Some(title.clone());
                if !self.active {
                    log::debug!("skipping chapter {} `{title}`", self.chapter_ordinal);
                }
            }
            ScanEvent::EnvironmentStart { name, location } => {
                let scope = if !self.active {
                    Scope::Transparent
                } else if let Some(kind) = resolve(name) {
                    Scope::Statement {
                        kind,
                        included: self.options.kinds.contains(&kind),
                        labeled: false,
                        node: None,
                        uses: Vec::new(),
                    }
                } else if is_proof(name) {
                    Scope::Proof {
                        opened_at: location.clone(),
                        proves: None,
                        uses: Vec::new(),
                    }
                } else {
                    Scope::Transparent
                };
                self.scopes.push(scope);
            }
            ScanEvent::EnvironmentEnd { .. } => {
                if let Some(scope) = self.scopes.pop() {
                    self.close_scope(scope)?;
                }
            }
            ScanEvent::Label { name, location } => {
                if self.active {
                    self.on_label(name, location)?;
                }
            }
            ScanEvent::Uses { labels, location } => {
                if self.active {
                    self.on_uses(labels, location);
                }
            }
            ScanEvent::Proves { label, location } => {
                if self.active {
                    self.on_proves(label, location);
                }
            }
        }
        Ok(())
    }

    /// Innermost scope that is not a transparent wrapper.
    fn tracked_scope(&self) -> Option<usize> {
        self.scopes
            .iter()
            .rposition(|s| !matches!(s, Scope::Transparent))
    }

    fn on_label(&mut self, name: &str, location: &SourceLocation) -> Result<()> {
        let Some(scope_idx) = self.tracked_scope() else {
            return Ok(()); // stray label outside any tracked environment
        };
        let (kind, included) = match &self.scopes[scope_idx] {
            Scope::Statement {
                kind,
                included,
                labeled,
                ..
            } => {
                if *labeled {
                    // secondary labels (equations etc.) are not statements
                    return Ok(());
                }
                (*kind, *included)
            }
            // proofs carry no identity of their own
            Scope::Proof { .. } => return Ok(()),
            Scope::Transparent => unreachable!("tracked_scope skips transparent scopes"),
        };

        if let Some(existing) = self.labels.get(name) {
            return Err(GraphError::DuplicateLabel {
                label: name.to_string(),
                first: existing.location.clone(),
                second: location.clone(),
            });
        }

        let node = if included {
            let idx = self.graph.add_node(StatementNode {
                label: name.to_string(),
                kind,
                chapter: self.current_chapter.clone(),
                uses: Vec::new(),
                location: location.clone(),
            });
            self.last_statement = Some(idx);
            Some(idx)
        } else {
            // label is consumed either way, so reuse still collides
            None
        };
        self.labels.insert(
            name.to_string(),
            LabelEntry {
                location: location.clone(),
                node,
            },
        );
        if let Scope::Statement {
            labeled,
            node: scope_node,
            ..
        } = &mut self.scopes[scope_idx]
        {
            *labeled = true;
            *scope_node = node;
        }
        Ok(())
    }

    fn on_uses(&mut self, labels: &[String], location: &SourceLocation) {
        let Some(scope_idx) = self.tracked_scope() else {
            return;
        };
        match &mut self.scopes[scope_idx] {
            Scope::Statement { uses, .. } | Scope::Proof { uses, .. } => {
                uses.extend(labels.iter().map(|l| (l.clone(), location.clone())));
            }
            Scope::Transparent => {}
        }
    }

    fn on_proves(&mut self, label: &str, location: &SourceLocation) {
        let Some(scope_idx) = self.tracked_scope() else {
            return;
        };
        if let Scope::Proof { proves, .. } = &mut self.scopes[scope_idx] {
            if proves.is_none() {
                *proves = Some((label.to_string(), location.clone()));
            }
        }
    }

    fn close_scope(&mut self, scope: Scope) -> Result<()> {
        match scope {
            Scope::Transparent => {}
            Scope::Statement { node, uses, .. } => {
                if let Some(idx) = node {
                    if let Some(weight) = self.graph.graph.node_weight_mut(idx) {
                        weight.uses = uses.iter().map(|(l, _)| l.clone()).collect();
                    }
                    for (label, location) in uses {
                        self.pending.push(PendingEdge {
                            from_label: label,
                            to: idx,
                            kind: EdgeKind::Dashed,
                            location,
                        });
                    }
                }
            }
            Scope::Proof {
                opened_at,
                proves,
                uses,
            } => {
                let bound = match proves {
                    Some((label, location)) => match self.labels.get(&label) {
                        None => {
                            return Err(GraphError::UnresolvedProvesTarget { label, location });
                        }
                        Some(entry) => {
                            if entry.node.is_none() {
                                log::debug!("dropping proof of excluded statement `{label}`");
                            }
                            entry.node
                        }
                    },
                    None => match self.last_statement {
                        Some(idx) => Some(idx),
                        None => {
                            return Err(GraphError::OrphanProof {
                                location: opened_at,
                            })
                        }
                    },
                };
                if let Some(idx) = bound {
                    for (label, location) in uses {
                        self.pending.push(PendingEdge {
                            from_label: label,
                            to: idx,
                            kind: EdgeKind::Solid,
                            location,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<DepGraph> {
        for edge in std::mem::take(&mut self.pending) {
            match self.labels.get(&edge.from_label) {
                None => {
                    return Err(GraphError::UnresolvedUsesLabel {
                        label: edge.from_label,
                        location: edge.location,
                    });
                }
                Some(entry) => match entry.node {
                    Some(src) => self.graph.add_edge(src, edge.to, edge.kind),
                    None => {
                        log::debug!("dropping edge from excluded statement `{}`", edge.from_label);
                    }
                },
            }
        }

        log::info!(
            "built dependency graph: {} node(s), {} edge(s)",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        Ok(self.graph)
    }
}
