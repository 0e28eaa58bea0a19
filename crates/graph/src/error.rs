use texdep_expand::SourceLocation;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Builder failures. Each one aborts the run: a graph built over
/// unresolved labels would misrepresent the actual dependency structure.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("duplicate label `{label}`: declared at {first}, declared again at {second}")]
    DuplicateLabel {
        label: String,
        first: SourceLocation,
        second: SourceLocation,
    },

    #[error("\\proves{{{label}}} at {location} does not name a previously declared statement")]
    UnresolvedProvesTarget {
        label: String,
        location: SourceLocation,
    },

    #[error("proof at {location} has no \\proves and no preceding statement to bind to")]
    OrphanProof { location: SourceLocation },

    #[error("\\uses{{{label}}} at {location}: label is never declared in the scanned project")]
    UnresolvedUsesLabel {
        label: String,
        location: SourceLocation,
    },
}
