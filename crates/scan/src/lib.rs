//! # texdep-scan
//!
//! Lightweight lexical scanning of an expanded TeX project.
//!
//! No full grammar: only the constructs the dependency pipeline cares
//! about are recognized — chapter starts, environment begin/end markers,
//! `\label`, and the two annotation commands `\uses`/`\proves`. Everything
//! else is passed over.
//!
//! ```text
//! LogicalDocument
//!     │
//!     ├──> Event scan (regex, single pass)
//!     │      ├─ \chapter{..}        -> ChapterStart
//!     │      ├─ \begin{..}/\end{..} -> EnvironmentStart/End (stack-checked)
//!     │      ├─ \label{..}          -> Label
//!     │      ├─ \uses{a,b}          -> Uses
//!     │      └─ \proves{l}          -> Proves
//!     │
//!     └──> ScanEvent[] in document order
//! ```
//!
//! The category table lives here too: the flat mapping from environment
//! name aliases to the eight canonical statement kinds, plus the visual
//! attributes the serializer attaches to each kind.

mod category;
mod error;
mod scanner;

pub use category::{is_proof, resolve, CanonicalKind};
pub use error::{Result, ScanError};
pub use scanner::{scan, ScanEvent};
