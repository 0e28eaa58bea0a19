//! # texdep-graph
//!
//! Dependency graph construction for mathematical TeX projects.
//!
//! ## Architecture
//!
//! ```text
//! ScanEvent[]
//!     │
//!     ├──> Builder (single forward pass)
//!     │      ├─ Chapter / category filtering
//!     │      ├─ Statement nodes keyed by \label
//!     │      ├─ Dashed edges from statement \uses
//!     │      └─ Solid edges from proof \uses, via proof binding
//!     │
//!     ├──> DepGraph (petgraph)
//!     │      ├─ Nodes: statements (label, kind, chapter)
//!     │      └─ Edges: dependency -> dependent, dashed or solid
//!     │
//!     ├──> Reducer (optional transitive reduction + cycle warnings)
//!     │
//!     └──> Serializer (DOT attribute text + TikZ drawing text)
//! ```

mod builder;
mod error;
mod reduce;
mod serialize;
mod types;

pub use builder::{build, BuildOptions, ChapterRef, ChapterSelection};
pub use error::{GraphError, Result};
pub use reduce::{reduce, DependencyCycle, ReductionMode};
pub use serialize::{serialize, GraphArtifacts};
pub use types::{DepGraph, EdgeKind, StatementNode};
