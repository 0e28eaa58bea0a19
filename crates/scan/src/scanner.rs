use crate::error::{Result, ScanError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use texdep_expand::{LogicalDocument, SourceLocation};

/// Everything the scanner can report, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum ScanEvent {
    ChapterStart {
        title: String,
        location: SourceLocation,
    },
    EnvironmentStart {
        name: String,
        location: SourceLocation,
    },
    EnvironmentEnd {
        location: SourceLocation,
    },
    Label {
        name: String,
        location: SourceLocation,
    },
    Uses {
        labels: Vec<String>,
        location: SourceLocation,
    },
    Proves {
        label: String,
        location: SourceLocation,
    },
}

/// Chapter starts tolerate a star and an optional short title, like the
/// sectioning command itself does.
static EVENT_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\\begin\s*\{(?P<begin>[^}]*)\}",
        r"|\\end\s*\{(?P<end>[^}]*)\}",
        r"|\\chapter\*?\s*(?:\[[^\]]*\])?\s*\{(?P<chapter>[^}]*)\}",
        r"|\\label\s*\{(?P<label>[^}]+)\}",
        r"|\\uses\s*\{(?P<uses>[^}]*)\}",
        r"|\\proves\s*\{(?P<proves>[^}]*)\}",
    ))
    .expect("event pattern")
});

/// Scan the expanded document into its typed event stream.
///
/// Purely lexical; the only state is the open-environment stack used to
/// reject unbalanced begin/end pairs. Environments may span fragment
/// boundaries (an environment opened before an inclusion directive and
/// closed after it is fine).
pub fn scan(doc: &LogicalDocument) -> Result<Vec<ScanEvent>> {
    let mut events = Vec::new();
    let mut open: Vec<(String, SourceLocation)> = Vec::new();

    for fragment in &doc.fragments {
        let mut line = fragment.start_line;
        let mut last = 0usize;

        for caps in EVENT_RX.captures_iter(&fragment.text) {
            let m = caps.get(0).expect("whole match");
            line += count_lines(&fragment.text[last..m.start()]);
            last = m.start();
            let location = SourceLocation {
                file: fragment.file.clone(),
                line,
            };

            if let Some(name) = caps.name("begin") {
                let name = name.as_str().trim().to_string();
                open.push((name.clone(), location.clone()));
                events.push(ScanEvent::EnvironmentStart { name, location });
            } else if let Some(name) = caps.name("end") {
                let name = name.as_str().trim();
                match open.pop() {
                    Some((ref opened, _)) if opened == name => {
                        events.push(ScanEvent::EnvironmentEnd { location });
                    }
                    Some((opened, opened_at)) => {
                        return Err(ScanError::MalformedEnvironment {
                            name: opened,
                            location: opened_at,
                            detail: format!("closed by \\end{{{name}}} at {location}"),
                        });
                    }
                    None => {
                        return Err(ScanError::MalformedEnvironment {
                            name: name.to_string(),
                            location,
                            detail: "\\end without a matching \\begin".to_string(),
                        });
                    }
                }
            } else if let Some(title) = caps.name("chapter") {
                events.push(ScanEvent::ChapterStart {
                    title: title.as_str().trim().to_string(),
                    location,
                });
            } else if let Some(name) = caps.name("label") {
                events.push(ScanEvent::Label {
                    name: name.as_str().trim().to_string(),
                    location,
                });
            } else if let Some(list) = caps.name("uses") {
                let labels = split_labels(list.as_str());
                if !labels.is_empty() {
                    events.push(ScanEvent::Uses { labels, location });
                }
            } else if let Some(label) = caps.name("proves") {
                let label = label.as_str().trim();
                if !label.is_empty() {
                    events.push(ScanEvent::Proves {
                        label: label.to_string(),
                        location,
                    });
                }
            }
        }
    }

    if let Some((name, opened_at)) = open.pop() {
        return Err(ScanError::MalformedEnvironment {
            name,
            location: opened_at,
            detail: "never closed".to_string(),
        });
    }

    log::debug!("scanned {} event(s)", events.len());
    Ok(events)
}

fn split_labels(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn count_lines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use texdep_expand::SourceFragment;

    fn doc(text: &str) -> LogicalDocument {
        LogicalDocument {
            fragments: vec![SourceFragment {
                file: PathBuf::from("test.tex"),
                start_line: 1,
                text: text.to_string(),
            }],
        }
    }

    fn kinds(events: &[ScanEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                ScanEvent::ChapterStart { .. } => "chapter",
                ScanEvent::EnvironmentStart { .. } => "begin",
                ScanEvent::EnvironmentEnd { .. } => "end",
                ScanEvent::Label { .. } => "label",
                ScanEvent::Uses { .. } => "uses",
                ScanEvent::Proves { .. } => "proves",
            })
            .collect()
    }

    #[test]
    fn events_come_out_in_document_order() {
        let events = scan(&doc(
            "\\chapter{Rings}\n\
             \\begin{definition}\\label{def:ring}\\end{definition}\n\
             \\begin{proof}\\proves{def:ring}\\uses{def:ring}\\end{proof}\n",
        ))
        .unwrap();

        assert_eq!(
            kinds(&events),
            vec!["chapter", "begin", "label", "end", "begin", "proves", "uses", "end"]
        );
    }

    #[test]
    fn chapter_variants_are_recognized() {
        let events = scan(&doc(
            "\\chapter{Plain}\n\\chapter*{Starred}\n\\chapter[Short]{Long Title}\n",
        ))
        .unwrap();
        let titles: Vec<&str> = events
            .iter()
            .map(|e| match e {
                ScanEvent::ChapterStart { title, .. } => title.as_str(),
                _ => panic!("expected chapters only"),
            })
            .collect();
        assert_eq!(titles, vec!["Plain", "Starred", "Long Title"]);
    }

    #[test]
    fn uses_lists_are_split_and_trimmed() {
        let events = scan(&doc("\\begin{lemma}\\uses{a, b , ,c}\\end{lemma}\n")).unwrap();
        match &events[1] {
            ScanEvent::Uses { labels, .. } => assert_eq!(labels, &["a", "b", "c"]),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn empty_uses_and_proves_are_dropped() {
        let events = scan(&doc("\\begin{lemma}\\uses{}\\proves{ }\\end{lemma}\n")).unwrap();
        assert_eq!(kinds(&events), vec!["begin", "end"]);
    }

    #[test]
    fn locations_carry_file_and_line() {
        let events = scan(&doc("line one\n\\label{l:two}\n")).unwrap();
        match &events[0] {
            ScanEvent::Label { name, location } => {
                assert_eq!(name, "l:two");
                assert_eq!(location.line, 2);
                assert_eq!(location.file, PathBuf::from("test.tex"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn environments_may_span_fragments() {
        let doc = LogicalDocument {
            fragments: vec![
                SourceFragment {
                    file: PathBuf::from("a.tex"),
                    start_line: 1,
                    text: "\\begin{theorem}\n".to_string(),
                },
                SourceFragment {
                    file: PathBuf::from("b.tex"),
                    start_line: 1,
                    text: "\\label{thm:x}\\end{theorem}\n".to_string(),
                },
            ],
        };
        let events = scan(&doc).unwrap();
        assert_eq!(kinds(&events), vec!["begin", "label", "end"]);
    }

    #[test]
    fn mismatched_end_is_fatal() {
        let err = scan(&doc("\\begin{lemma}\\end{theorem}\n")).unwrap_err();
        let ScanError::MalformedEnvironment { name, detail, .. } = err;
        assert_eq!(name, "lemma");
        assert!(detail.contains("\\end{theorem}"));
    }

    #[test]
    fn stray_end_is_fatal() {
        let err = scan(&doc("\\end{lemma}\n")).unwrap_err();
        let ScanError::MalformedEnvironment { name, detail, .. } = err;
        assert_eq!(name, "lemma");
        assert!(detail.contains("without a matching"));
    }

    #[test]
    fn unterminated_environment_is_fatal() {
        let err = scan(&doc("text\n\\begin{remark}\nmore\n")).unwrap_err();
        let ScanError::MalformedEnvironment {
            name,
            location,
            detail,
        } = err;
        assert_eq!(name, "remark");
        assert_eq!(location.line, 2);
        assert_eq!(detail, "never closed");
    }
}
