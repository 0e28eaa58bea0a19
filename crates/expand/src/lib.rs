//! # texdep-expand
//!
//! Project expansion for TeX dependency analysis.
//!
//! ## Pipeline position
//!
//! ```text
//! Root .tex file
//!     │
//!     ├──> Comment stripping (line numbers preserved)
//!     │
//!     ├──> Directive expansion
//!     │      ├─ \input{f} / \input f
//!     │      ├─ \include{f} (honoring \includeonly)
//!     │      └─ \import{dir}{f} / \subimport{dir}{f}
//!     │
//!     └──> LogicalDocument
//!            └─> SourceFragment[] in depth-first textual order
//! ```
//!
//! The output ordering matters: downstream proof binding relies on the
//! document's natural reading order, so fragments come out exactly as a
//! reader of the root file would encounter them.

mod error;
mod expander;
mod types;

pub use error::{ExpandError, Result};
pub use expander::expand_project;
pub use types::{LogicalDocument, SourceFragment, SourceLocation};
