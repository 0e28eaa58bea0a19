use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use texdep_graph::{
    build, reduce, serialize, BuildOptions, ChapterSelection, DepGraph, DependencyCycle,
    GraphArtifacts, ReductionMode,
};
use texdep_scan::{CanonicalKind, ScanEvent};

/// Inputs of one analysis run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub root: PathBuf,
    pub chapters: ChapterSelection,
    pub kinds: HashSet<CanonicalKind>,
    pub mode: ReductionMode,
}

impl PipelineOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chapters: ChapterSelection::All,
            kinds: CanonicalKind::ALL.into_iter().collect(),
            mode: ReductionMode::Reduced,
        }
    }
}

/// Everything a caller needs after a run: the graph, any cycle warnings,
/// and the serialized artifacts.
pub struct Analysis {
    pub graph: DepGraph,
    pub cycles: Vec<DependencyCycle>,
    pub artifacts: GraphArtifacts,
}

/// Resolver -> Scanner -> Builder -> Reducer -> Serializer, strictly in
/// that order. Any fatal error aborts the run with no partial graph.
pub fn run_pipeline(options: &PipelineOptions) -> Result<Analysis> {
    let document = texdep_expand::expand_project(&options.root)?;
    let events = texdep_scan::scan(&document)?;
    let build_options = BuildOptions {
        chapters: options.chapters.clone(),
        kinds: options.kinds.clone(),
    };
    let graph = build(&events, &build_options)?;
    let (graph, cycles) = reduce(&graph, options.mode);
    let artifacts = serialize(&graph);
    Ok(Analysis {
        graph,
        cycles,
        artifacts,
    })
}

/// A chapter of the expanded document, as a selection UI would list it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterInfo {
    /// 1-based position in reading order.
    pub ordinal: usize,
    pub title: String,
}

/// Expand the project and list its chapters without building a graph.
pub fn list_chapters(root: &Path) -> Result<Vec<ChapterInfo>> {
    let document = texdep_expand::expand_project(root)?;
    let events = texdep_scan::scan(&document)?;
    Ok(events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::ChapterStart { title, .. } => Some(title.clone()),
            _ => None,
        })
        .enumerate()
        .map(|(i, title)| ChapterInfo {
            ordinal: i + 1,
            title,
        })
        .collect())
}

/// Statement count per canonical kind, in legend order.
pub fn kind_counts(graph: &DepGraph) -> Vec<(CanonicalKind, usize)> {
    CanonicalKind::ALL
        .into_iter()
        .map(|kind| {
            let count = graph.nodes().filter(|(_, n)| n.kind == kind).count();
            (kind, count)
        })
        .collect()
}
