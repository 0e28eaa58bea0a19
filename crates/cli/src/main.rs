use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use texdep_cli::{kind_counts, list_chapters, run_pipeline, PipelineOptions};
use texdep_graph::{ChapterRef, ChapterSelection, ReductionMode};
use texdep_scan::CanonicalKind;

#[derive(Parser)]
#[command(name = "texdep")]
#[command(about = "Statement dependency graphs for TeX projects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the chapters of the expanded project
    Chapters(ChaptersArgs),

    /// Scan a project and report statement counts per category
    Scan(ScanArgs),

    /// Build the dependency graph and emit DOT and TikZ artifacts
    Graph(GraphArgs),
}

#[derive(Args)]
struct ChaptersArgs {
    /// Root .tex file of the project
    root: PathBuf,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ScanArgs {
    /// Root .tex file of the project
    root: PathBuf,

    /// Chapters to scan: 1-based ordinals and/or exact titles (default: all)
    #[arg(long, value_delimiter = ',')]
    chapters: Vec<String>,

    /// Categories to include (default: all 8)
    #[arg(long, value_delimiter = ',')]
    kinds: Vec<String>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct GraphArgs {
    /// Root .tex file of the project
    root: PathBuf,

    /// Chapters to scan: 1-based ordinals and/or exact titles (default: all)
    #[arg(long, value_delimiter = ',')]
    chapters: Vec<String>,

    /// Categories to include (default: all 8)
    #[arg(long, value_delimiter = ',')]
    kinds: Vec<String>,

    /// Keep all edges (skip transitive reduction)
    #[arg(long)]
    nonreduced: bool,

    /// Write the DOT attribute graph here (default: stdout)
    #[arg(long)]
    dot: Option<PathBuf>,

    /// Write the TikZ drawing here
    #[arg(long)]
    tikz: Option<PathBuf>,

    /// Print a JSON run summary instead of the DOT text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Chapters(args) => run_chapters(args),
        Commands::Scan(args) => run_scan(args),
        Commands::Graph(args) => run_graph(args),
    }
}

fn run_chapters(args: ChaptersArgs) -> Result<()> {
    let chapters = list_chapters(&args.root)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&chapters)?);
    } else if chapters.is_empty() {
        eprintln!("No chapters found; the whole document is one scanning unit.");
    } else {
        for chapter in &chapters {
            println!("{}. {}", chapter.ordinal, chapter.title);
        }
    }
    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let kinds = parse_kinds(&args.kinds)?;
    let options = PipelineOptions {
        root: args.root.clone(),
        chapters: parse_chapters(&args.chapters),
        kinds: kinds.clone(),
        // counting does not need the reduction pass
        mode: ReductionMode::Nonreduced,
    };
    let analysis = run_pipeline(&options)?;
    let counts = kind_counts(&analysis.graph);

    if args.json {
        let report: Vec<KindCount> = counts
            .iter()
            .filter(|(kind, _)| kinds.contains(kind))
            .map(|(kind, count)| KindCount {
                kind: kind.name(),
                count: *count,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let pretty: Vec<String> = counts
            .iter()
            .filter(|(kind, _)| kinds.contains(kind))
            .map(|(kind, count)| format!("{}:{}", kind.display_name(), count))
            .collect();
        println!("Found: {}", pretty.join(", "));
    }
    Ok(())
}

fn run_graph(args: GraphArgs) -> Result<()> {
    let options = PipelineOptions {
        root: args.root.clone(),
        chapters: parse_chapters(&args.chapters),
        kinds: parse_kinds(&args.kinds)?,
        mode: if args.nonreduced {
            ReductionMode::Nonreduced
        } else {
            ReductionMode::Reduced
        },
    };
    let analysis = run_pipeline(&options)?;

    if let Some(path) = &args.dot {
        fs::write(path, &analysis.artifacts.dot)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.tikz {
        fs::write(path, &analysis.artifacts.tikz)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if args.json {
        let summary = GraphSummary {
            nodes: analysis.graph.node_count(),
            edges: analysis.graph.edge_count(),
            cycles: analysis
                .cycles
                .iter()
                .map(|c| c.members.clone())
                .collect(),
            dot: args.dot.clone(),
            tikz: args.tikz.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if args.dot.is_none() {
        print!("{}", analysis.artifacts.dot);
    } else {
        eprintln!(
            "graph: {} node(s), {} edge(s)",
            analysis.graph.node_count(),
            analysis.graph.edge_count()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct KindCount {
    kind: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct GraphSummary {
    nodes: usize,
    edges: usize,
    cycles: Vec<Vec<String>>,
    dot: Option<PathBuf>,
    tikz: Option<PathBuf>,
}

/// Entries that parse as numbers select by ordinal, the rest by title.
fn parse_chapters(entries: &[String]) -> ChapterSelection {
    if entries.is_empty() {
        return ChapterSelection::All;
    }
    ChapterSelection::Selected(
        entries
            .iter()
            .map(|entry| match entry.trim().parse::<usize>() {
                Ok(ordinal) => ChapterRef::Ordinal(ordinal),
                Err(_) => ChapterRef::Title(entry.trim().to_string()),
            })
            .collect(),
    )
}

fn parse_kinds(entries: &[String]) -> Result<HashSet<CanonicalKind>> {
    if entries.is_empty() {
        return Ok(CanonicalKind::ALL.into_iter().collect());
    }
    entries
        .iter()
        .map(|entry| {
            texdep_scan::resolve(entry).ok_or_else(|| anyhow!("unknown category: {entry}"))
        })
        .collect()
}
