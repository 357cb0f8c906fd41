//! C4 — Expander.
//!
//! Recursively substitutes `<<name>>` references, preserving (and
//! additively nesting) indentation, and reporting cycles inline instead of
//! aborting.

use crate::types::{Block, ReferenceIndex};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static REFERENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([ \t]*)<<([^<>]+)>>(.*)$").unwrap());

/// Expand `content` against `index`, with `stack` tracking names on the
/// active expansion chain (cycle detection) and `outer_indent` the indent
/// prefix accumulated by the caller so far.
pub fn expand(
    content: &str,
    blocks: &[Block],
    index: &ReferenceIndex,
    stack: &mut HashSet<String>,
    outer_indent: &str,
) -> String {
    let mut out_lines: Vec<String> = Vec::new();

    for line in content.lines() {
        if let Some(caps) = REFERENCE_LINE.captures(line) {
            let indent = &caps[1];
            let name = &caps[2];
            let trailing = &caps[3];
            let total_indent = format!("{outer_indent}{indent}");

            if stack.contains(name) {
                out_lines.push(format!(
                    "{total_indent}/* ERROR: Circular reference to {name} */{trailing}"
                ));
                continue;
            }

            let ids = index.get(name).filter(|ids| !ids.is_empty());
            let Some(ids) = ids else {
                out_lines.push(format!("{total_indent}<<{name}>>{trailing}"));
                continue;
            };

            stack.insert(name.to_string());
            let mut combined: Vec<String> = Vec::new();
            for (i, id) in ids.iter().enumerate() {
                if i > 0 {
                    combined.push(String::new());
                }
                let block = &blocks[id.0];
                let expanded = expand(&block.content, blocks, index, stack, &total_indent);
                combined.extend(expanded.lines().map(str::to_string));
            }
            stack.remove(name);

            if !trailing.is_empty() {
                match combined.last_mut() {
                    Some(last) => last.push_str(trailing),
                    None => combined.push(trailing.to_string()),
                }
            }
            out_lines.extend(combined);
        } else {
            out_lines.push(format!("{outer_indent}{line}"));
        }
    }

    out_lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_reference_index;
    use crate::types::ArgMap;
    use std::path::PathBuf;

    fn block(name: Option<&str>, content: &str) -> Block {
        Block {
            name: name.map(str::to_string),
            language: "sh".to_string(),
            content: content.to_string(),
            args: ArgMap::new(),
            source_path: PathBuf::from("doc.org"),
            start_line: 1,
            end_line: 1,
        }
    }

    #[test]
    fn unresolved_reference_is_left_literal() {
        let blocks = vec![];
        let index = build_reference_index(&blocks);
        let mut stack = HashSet::new();
        let out = expand("<<missing>>", &blocks, &index, &mut stack, "");
        assert_eq!(out, "<<missing>>");
    }

    #[test]
    fn fan_in_joins_with_blank_line() {
        let blocks = vec![block(None, "hi"), block(None, "bye")];
        let mut idx = ReferenceIndex::new();
        idx.insert("greet", crate::types::BlockId(0));
        idx.insert("greet", crate::types::BlockId(1));
        let mut stack = HashSet::new();
        let out = expand("<<greet>>", &blocks, &idx, &mut stack, "");
        assert_eq!(out, "hi\n\nbye");
    }

    #[test]
    fn indentation_is_preserved_and_additive() {
        let blocks = vec![block(Some("body"), "a\nb")];
        let index = build_reference_index(&blocks);
        let mut stack = HashSet::new();
        let out = expand("    <<body>>", &blocks, &index, &mut stack, "");
        assert_eq!(out, "    a\n    b");
    }

    #[test]
    fn nested_indentation_is_additive() {
        let inner = block(Some("inner"), "x");
        let outer = block(Some("outer"), "  <<inner>>");
        let blocks = vec![inner, outer];
        let index = build_reference_index(&blocks);
        let mut stack = HashSet::new();
        let out = expand("  <<outer>>", &blocks, &index, &mut stack, "");
        assert_eq!(out, "    x");
    }

    #[test]
    fn cycle_is_reported_inline_without_looping() {
        let a = block(Some("a"), "<<b>>");
        let b = block(Some("b"), "<<a>>");
        let blocks = vec![a, b];
        let index = build_reference_index(&blocks);
        let mut stack = HashSet::new();
        let out = expand("<<a>>", &blocks, &index, &mut stack, "");
        assert_eq!(out, "/* ERROR: Circular reference to a */");
    }

    #[test]
    fn trailing_text_appends_to_last_expanded_line() {
        let blocks = vec![block(Some("body"), "a\nb")];
        let index = build_reference_index(&blocks);
        let mut stack = HashSet::new();
        let out = expand("<<body>> // trail", &blocks, &index, &mut stack, "");
        assert_eq!(out, "a\nb // trail");
    }

    #[test]
    fn reference_only_line_has_no_extra_whitespace() {
        let blocks = vec![block(Some("body"), "a")];
        let index = build_reference_index(&blocks);
        let mut stack = HashSet::new();
        let out = expand("<<body>>", &blocks, &index, &mut stack, "");
        assert_eq!(out, "a");
    }
}
