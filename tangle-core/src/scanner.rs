//! C2 — Document Scanner.
//!
//! A single forward pass over a document's lines, producing an ordered
//! `Vec<Block>`. Directive recognition only fires at column zero; everything
//! else is either example-block filler (discarded) or src-block content.

use crate::header;
use crate::types::{ArgMap, Block, FileProperties};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InExample,
    InSrc,
}

static BEGIN_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^#\+begin_src\b\s*(.*)$").unwrap());
static END_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^#\+end_src\s*$").unwrap());
static BEGIN_EXAMPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#\+begin_example\b.*$").unwrap());
static END_EXAMPLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^#\+end_example\s*$").unwrap());
static NAME_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^#\+name:\s*(\S+)\s*$").unwrap());

struct OpenBlock {
    name: Option<String>,
    language: String,
    args: ArgMap,
    start_line: usize,
    lines: Vec<String>,
}

/// Scan `text` (already CRLF-normalized by the caller) into an ordered list
/// of blocks, merging each block's directive args against `props`
/// (document-global <- language-scoped <- block-local).
pub fn scan_document(text: &str, source_path: &Path, props: &FileProperties) -> Vec<Block> {
    let mut state = State::Outside;
    let mut pending_name: Option<String> = None;
    let mut open: Option<OpenBlock> = None;
    let mut blocks = Vec::new();

    for (idx, raw_line) in normalize_crlf(text).lines().enumerate() {
        let line_no = idx + 1;
        match state {
            State::Outside => {
                if BEGIN_EXAMPLE.is_match(raw_line) {
                    state = State::InExample;
                } else if let Some(caps) = NAME_DIRECTIVE.captures(raw_line) {
                    pending_name = Some(caps[1].to_string());
                } else if let Some(caps) = BEGIN_SRC.captures(raw_line) {
                    let (language, local_args) = header::parse_header_line(&caps[1]);
                    let mut args = props.merged_for(&language);
                    for (k, v) in local_args {
                        args.insert(k, v);
                    }
                    if args.contains_key("noweb-ref") && !args.contains_key("tangle") {
                        args.insert(
                            "tangle".to_string(),
                            crate::types::ArgValue::Str("no".to_string()),
                        );
                    }
                    open = Some(OpenBlock {
                        name: pending_name.take(),
                        language,
                        args,
                        start_line: line_no,
                        lines: Vec::new(),
                    });
                    state = State::InSrc;
                }
                // other Outside lines (prose) are discarded
            }
            State::InExample => {
                if END_EXAMPLE.is_match(raw_line) {
                    state = State::Outside;
                }
                // example content is ignored
            }
            State::InSrc => {
                if END_SRC.is_match(raw_line) {
                    let ob = open.take().expect("InSrc implies an open block");
                    let content = strip_escapes(&ob.lines.join("\n"));
                    blocks.push(Block {
                        name: ob.name,
                        language: ob.language,
                        content,
                        args: ob.args,
                        source_path: source_path.to_path_buf(),
                        start_line: ob.start_line,
                        end_line: line_no,
                    });
                    state = State::Outside;
                } else if let Some(ob) = open.as_mut() {
                    ob.lines.push(raw_line.to_string());
                }
            }
        }
    }

    blocks
}

fn normalize_crlf(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Undo the source format's comma-escaping convention:
/// - a leading comma on a content line is removed (one comma only), and
/// - a comma immediately before `#+` is also stripped when it sits right
///   after a backtick (template-literal safety), since that case is not at
///   true column zero and the per-line rule above wouldn't reach it.
fn strip_escapes(content: &str) -> String {
    let per_line: Vec<String> = content
        .lines()
        .map(|line| {
            if let Some(rest) = line.strip_prefix(',') {
                rest.to_string()
            } else {
                line.to_string()
            }
        })
        .collect();
    per_line.join("\n").replace("`,#+", "`#+")
}

/// Resolve the path a source document would be scanned under for
/// `document_basename_without_extension` purposes (used by the target
/// assembler, kept here since it's a property of the same path).
pub fn document_stem(source_path: &Path) -> String {
    source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn document_dir(source_path: &Path) -> PathBuf {
    source_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scan(text: &str) -> Vec<Block> {
        scan_document(text, &PathBuf::from("doc.org"), &FileProperties::default())
    }

    #[test]
    fn single_block_with_explicit_tangle() {
        let blocks = scan("#+begin_src ts :tangle out.ts\nconst x = 1;\n#+end_src\n");
        assert_eq!(blocks.len(), 1);
        let b = &blocks[0];
        assert_eq!(b.language, "ts");
        assert_eq!(b.content, "const x = 1;");
        assert_eq!(b.tangle_arg().unwrap().as_str(), Some("out.ts"));
    }

    #[test]
    fn name_binds_to_next_block_only() {
        let blocks = scan(
            "#+name: greet\n#+begin_src sh\necho hi\n#+end_src\n#+begin_src sh\necho bye\n#+end_src\n",
        );
        assert_eq!(blocks[0].name.as_deref(), Some("greet"));
        assert_eq!(blocks[1].name, None);
    }

    #[test]
    fn indented_directive_is_not_recognized() {
        let blocks = scan("  #+begin_src sh\necho hi\n#+end_src\n");
        assert!(blocks.is_empty());
    }

    #[test]
    fn example_block_content_is_discarded() {
        let blocks = scan("#+begin_example\n#+begin_src sh\nfoo\n#+end_src\n#+end_example\n");
        assert!(blocks.is_empty());
    }

    #[test]
    fn noweb_ref_without_explicit_tangle_forces_no() {
        let blocks = scan("#+begin_src sh :noweb-ref greet\necho hi\n#+end_src\n");
        assert!(blocks[0].tangle_arg().unwrap().is_falsy_no());
    }

    #[test]
    fn noweb_ref_with_explicit_tangle_overrides() {
        let blocks =
            scan("#+begin_src sh :noweb-ref greet :tangle greet.sh\necho hi\n#+end_src\n");
        assert_eq!(blocks[0].tangle_arg().unwrap().as_str(), Some("greet.sh"));
    }

    #[test]
    fn escape_symmetry() {
        let blocks = scan("#+begin_src sh\n,begin_src\n,,begin_src\n#+end_src\n");
        assert_eq!(blocks[0].content, "begin_src\n,begin_src");
    }

    #[test]
    fn inheritance_precedence_block_local_wins() {
        let mut props = FileProperties::default();
        props
            .global
            .insert("tangle".to_string(), crate::types::ArgValue::Str("a.ts".to_string()));
        let blocks = scan_document(
            "#+begin_src ts :tangle b.ts\nx\n#+end_src\n",
            &PathBuf::from("doc.org"),
            &props,
        );
        assert_eq!(blocks[0].tangle_arg().unwrap().as_str(), Some("b.ts"));
    }
}
