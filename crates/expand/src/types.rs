use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A contiguous span of text from one physical file.
///
/// Fragments are emitted by the expander in depth-first textual order and
/// never mutated afterwards. `start_line` is the 1-based line in `file`
/// where the span begins, so downstream stages can report exact locations
/// without re-reading sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFragment {
    /// Physical file the span came from.
    pub file: PathBuf,

    /// 1-based line in `file` where the span begins.
    pub start_line: usize,

    /// Span text, comments already stripped.
    pub text: String,
}

/// A position in a physical source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,

    /// 1-based line number.
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// The fully expanded project: every included file's content, in the order
/// a reader of the root document would encounter it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalDocument {
    pub fragments: Vec<SourceFragment>,
}

impl LogicalDocument {
    /// Concatenated text of all fragments.
    pub fn full_text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// Number of distinct physical files that contributed fragments.
    pub fn file_count(&self) -> usize {
        let mut files: Vec<&PathBuf> = self.fragments.iter().map(|f| &f.file).collect();
        files.sort();
        files.dedup();
        files.len()
    }
}
