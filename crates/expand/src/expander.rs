use crate::error::{ExpandError, Result};
use crate::types::{LogicalDocument, SourceFragment, SourceLocation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// One pattern for all four inclusion forms. Alternation order matters:
/// braced `\input{..}` must win over the bare space form.
static DIRECTIVE_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\\(?:import|subimport)\s*\{(?P<impdir>[^}]*)\}\s*\{(?P<impfile>[^}]*)\}",
        r"|\\include\s*\{(?P<inc>[^}]+)\}",
        r"|\\input\s*\{(?P<inpb>[^}]+)\}",
        r"|\\input\s+(?P<inps>[^\s%{}\\]+)",
    ))
    .expect("directive pattern")
});

static INCLUDEONLY_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\includeonly\s*\{([^}]*)\}").expect("includeonly pattern"));

/// Expand a project starting at `root` into its logical document.
///
/// Inclusion is depth-first in textual order; each file contributes at most
/// once per run. A file re-included while still on the expansion stack is an
/// inclusion cycle and fails the run.
pub fn expand_project(root: &Path) -> Result<LogicalDocument> {
    Expander::new().run(root)
}

struct Expander {
    includeonly: HashSet<String>,
    expanded: HashSet<PathBuf>,
    in_progress: Vec<PathBuf>,
    fragments: Vec<SourceFragment>,
}

impl Expander {
    fn new() -> Self {
        Self {
            includeonly: HashSet::new(),
            expanded: HashSet::new(),
            in_progress: Vec::new(),
            fragments: Vec::new(),
        }
    }

    fn run(mut self, root: &Path) -> Result<LogicalDocument> {
        let root = normalize(root);
        let root_text = read_stripped(&root, None)?;
        self.includeonly = collect_includeonly(&root_text);
        if !self.includeonly.is_empty() {
            log::debug!(
                "\\includeonly restricts expansion to: {:?}",
                self.includeonly
            );
        }

        self.expand_file(&root, root_text)?;

        log::info!(
            "expanded {} file(s) into {} fragment(s)",
            self.expanded.len(),
            self.fragments.len()
        );
        Ok(LogicalDocument {
            fragments: self.fragments,
        })
    }

    /// Expand one file whose stripped text has already been read.
    fn expand_file(&mut self, path: &Path, text: String) -> Result<()> {
        self.expanded.insert(path.to_path_buf());
        self.in_progress.push(path.to_path_buf());
        let result = self.expand_text(path, &text);
        self.in_progress.pop();
        result
    }

    /// Resolve a directive target: read it and recurse, skip it if already
    /// expanded, or fail on a cycle.
    fn enter(&mut self, target: &Path, from: &SourceLocation) -> Result<()> {
        if self.in_progress.iter().any(|p| p == target) {
            let start = self
                .in_progress
                .iter()
                .position(|p| p == target)
                .unwrap_or(0);
            let mut cycle: Vec<PathBuf> = self.in_progress[start..].to_vec();
            cycle.push(target.to_path_buf());
            return Err(ExpandError::InclusionCycle { cycle });
        }
        if self.expanded.contains(target) {
            log::debug!("skipping already-expanded {}", target.display());
            return Ok(());
        }
        let text = read_stripped(target, Some(from))?;
        self.expand_file(target, text)
    }

    fn expand_text(&mut self, file: &Path, text: &str) -> Result<()> {
        let dir = file.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        let mut pos = 0usize;
        let mut line = 1usize;

        // captures_iter is non-overlapping and in document order, which is
        // what keeps the fragment sequence in natural reading order.
        let matches: Vec<regex::Captures> = DIRECTIVE_RX.captures_iter(text).collect();
        for caps in matches {
            let m = caps.get(0).expect("whole match");
            let before = &text[pos..m.start()];
            self.push_fragment(file, line, before);
            line += count_lines(before);

            let here = SourceLocation {
                file: file.to_path_buf(),
                line,
            };
            if let (Some(prefix), Some(target)) = (caps.name("impdir"), caps.name("impfile")) {
                let inc_dir = normalize(&dir.join(prefix.as_str().trim()));
                let inc_path = ensure_tex_ext(normalize(&inc_dir.join(target.as_str().trim())));
                self.enter(&inc_path, &here)?;
            } else if let Some(name) = caps.name("inc") {
                let name = name.as_str().trim();
                if self.skipped_by_includeonly(name) {
                    log::debug!("skipped by \\includeonly: {name}");
                } else {
                    let inc_path = ensure_tex_ext(normalize(&dir.join(name)));
                    self.enter(&inc_path, &here)?;
                }
            } else if let Some(name) = caps.name("inpb").or_else(|| caps.name("inps")) {
                let inc_path = ensure_tex_ext(normalize(&dir.join(name.as_str().trim())));
                self.enter(&inc_path, &here)?;
            }

            line += count_lines(&text[m.start()..m.end()]);
            pos = m.end();
        }

        self.push_fragment(file, line, &text[pos..]);
        Ok(())
    }

    fn push_fragment(&mut self, file: &Path, start_line: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        self.fragments.push(SourceFragment {
            file: file.to_path_buf(),
            start_line,
            text: text.to_string(),
        });
    }

    /// `\includeonly` names targets as written; match either the written
    /// name or its basename so `\include{chapters/ch1}` pairs with both
    /// `\includeonly{ch1}` and `\includeonly{chapters/ch1}`.
    fn skipped_by_includeonly(&self, name: &str) -> bool {
        if self.includeonly.is_empty() {
            return false;
        }
        let basename = Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        !self.includeonly.contains(name) && !self.includeonly.contains(&basename)
    }
}

fn read_stripped(path: &Path, from: Option<&SourceLocation>) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(strip_comments(&raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExpandError::MissingFile {
            path: path.to_path_buf(),
            included_from: from.cloned(),
        }),
        Err(e) => Err(ExpandError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn collect_includeonly(text: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    for caps in INCLUDEONLY_RX.captures_iter(text) {
        for name in caps[1].split(',') {
            let name = name.trim();
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
    }
    names
}

/// Remove TeX comments: everything from the first unescaped `%` to the end
/// of each line. Newlines are kept so line numbers stay stable.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(strip_comment_from_line(line));
    }
    out
}

fn strip_comment_from_line(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2, // skip the escaped character, covers \%
            b'%' => return &line[..i],
            _ => i += 1,
        }
    }
    line
}

fn ensure_tex_ext(path: PathBuf) -> PathBuf {
    if path.extension().is_none() {
        path.with_extension("tex")
    } else {
        path
    }
}

/// Lexical path normalization, no filesystem access. Keeps the include-once
/// and cycle bookkeeping stable across `./`- and `..`-flavored spellings.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if !(can_pop && out.pop()) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn count_lines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}
