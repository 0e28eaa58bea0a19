use crate::types::SourceLocation;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExpandError>;

#[derive(Error, Debug)]
pub enum ExpandError {
    #[error("missing file {}{}", .path.display(), origin(.included_from))]
    MissingFile {
        path: PathBuf,
        included_from: Option<SourceLocation>,
    },

    #[error("inclusion cycle: {}", join_paths(.cycle))]
    InclusionCycle { cycle: Vec<PathBuf> },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn origin(from: &Option<SourceLocation>) -> String {
    match from {
        Some(loc) => format!(" (included from {loc})"),
        None => String::new(),
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
