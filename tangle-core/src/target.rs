//! C5 — Target Assembler.
//!
//! Groups tangleable blocks by resolved output path, then renders each
//! group's final bytes: shebang, optional framing (banner / location
//! comments / footers), and the noweb-expanded block bodies.

use crate::expander;
use crate::scanner;
use crate::types::{ArgValue, Block, BlockId, ReferenceIndex, Target};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

enum TangleDecision {
    Skip,
    DerivePath,
    Path(String),
}

fn tangle_decision(block: &Block) -> TangleDecision {
    match block.tangle_arg() {
        None => TangleDecision::Skip,
        Some(ArgValue::Bool(false)) => TangleDecision::Skip,
        Some(ArgValue::Bool(true)) => TangleDecision::DerivePath,
        Some(ArgValue::Str(s)) => {
            let low = s.to_ascii_lowercase();
            if low == "no" || low == "false" {
                TangleDecision::Skip
            } else if low == "yes" || low == "true" {
                TangleDecision::DerivePath
            } else {
                TangleDecision::Path(s.clone())
            }
        }
    }
}

/// Extension a given `language` tag tangles to when a block asks for a
/// derived path. Unknown languages fall back to `.txt`.
pub fn language_extension(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "typescript" => ".ts",
        "javascript" => ".js",
        "python" => ".py",
        "rust" => ".rs",
        "go" => ".go",
        "java" => ".java",
        "c" => ".c",
        "cpp" => ".cpp",
        "sh" | "bash" => ".sh",
        "ruby" => ".rb",
        "json" => ".json",
        "yaml" => ".yaml",
        "yml" => ".yml",
        "markdown" => ".md",
        "org" => ".org",
        _ => ".txt",
    }
}

fn resolve_output_path(block: &Block, path_str: Option<&str>) -> Option<PathBuf> {
    let dir = scanner::document_dir(&block.source_path);
    match path_str {
        None => {
            let stem = scanner::document_stem(&block.source_path);
            let ext = language_extension(&block.language);
            Some(dir.join(format!("{stem}{ext}")))
        }
        Some(p) => Some(dir.join(p)),
    }
}

/// Partition `blocks` into [`Target`]s in discovery order. A block with
/// `noweb-ref` and no explicit `tangle` was already forced to `tangle: no`
/// by the scanner, so it is naturally skipped here too.
pub fn resolve_targets(blocks: &[Block]) -> Vec<Target> {
    let mut targets: Vec<Target> = Vec::new();
    let mut path_index: HashMap<PathBuf, usize> = HashMap::new();

    for (i, block) in blocks.iter().enumerate() {
        let id = BlockId(i);
        let output_path = match tangle_decision(block) {
            TangleDecision::Skip => continue,
            TangleDecision::DerivePath => resolve_output_path(block, None),
            TangleDecision::Path(p) => resolve_output_path(block, Some(&p)),
        };
        let Some(output_path) = output_path else { continue };

        match path_index.get(&output_path) {
            Some(&idx) => targets[idx].blocks.push(id),
            None => {
                path_index.insert(output_path.clone(), targets.len());
                targets.push(Target {
                    output_path,
                    blocks: vec![id],
                });
            }
        }
    }

    targets
}

/// Line-comment or block-comment framing for a given (dotted) extension.
/// `None` means framing is fully suppressed for this extension.
fn comment_style(ext: &str) -> Option<(&'static str, &'static str)> {
    const NO_COMMENT: &[&str] = &[".json", ".yaml", ".yml", ".md", ".org", ".wasm", ".txt"];
    if NO_COMMENT.contains(&ext) {
        return None;
    }
    Some(match ext {
        ".py" | ".sh" | ".bash" | ".zsh" | ".fish" | ".toml" | ".rb" | ".pl" | ".r" => ("#", ""),
        ".lisp" | ".el" | ".clj" | ".scm" => (";;", ""),
        ".lua" | ".sql" | ".hs" => ("--", ""),
        ".css" => ("/*", "*/"),
        ".html" | ".xml" => ("<!--", "-->"),
        _ => ("//", ""),
    })
}

fn framed_line(style: (&str, &str), text: &str) -> String {
    let (lead_in, lead_out) = style;
    if lead_out.is_empty() {
        format!("{lead_in} {text}")
    } else {
        format!("{lead_in} {text} {lead_out}")
    }
}

/// Render one target's final bytes.
///
/// `blocks` is the full arena (so block ids resolve across documents),
/// `index` is the global reference index built from all documents.
pub fn assemble(target: &Target, blocks: &[Block], index: &ReferenceIndex) -> Vec<u8> {
    let ext = target
        .output_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let contributing: Vec<&Block> = target.blocks.iter().map(|id| &blocks[id.0]).collect();

    let comments_enabled =
        !contributing.iter().any(|b| b.comments_disabled()) && comment_style(&ext).is_some();

    // Shebang resolution: first block with an explicit :shebang arg wins;
    // otherwise, if the first contributing block's raw content begins with
    // "#!", lift that line out of its content.
    let explicit_shebang = contributing.iter().find_map(|b| b.shebang());
    let mut lifted_first_content: Option<String> = None;
    let shebang_line: Option<String> = match explicit_shebang {
        Some(s) => Some(s.to_string()),
        None => contributing.first().and_then(|first| {
            first.content.strip_prefix("#!").map(|_| {
                let mut lines = first.content.splitn(2, '\n');
                let she = lines.next().unwrap_or_default().to_string();
                lifted_first_content = Some(lines.next().unwrap_or_default().to_string());
                she
            })
        }),
    };

    let mut out = String::new();
    if let Some(she) = &shebang_line {
        out.push_str(she);
        out.push('\n');
    }

    if comments_enabled {
        let style = comment_style(&ext).expect("checked above");
        out.push_str(&framed_line(
            style,
            "Code generated by tangle. DO NOT EDIT.",
        ));
        out.push('\n');

        let target_dir = target.output_path.parent().unwrap_or_else(|| Path::new("."));
        let mut sources: Vec<String> = Vec::new();
        for b in &contributing {
            let rel = pathdiff::diff_paths(&b.source_path, target_dir)
                .unwrap_or_else(|| b.source_path.clone());
            let p = rel.to_string_lossy().into_owned();
            if !sources.contains(&p) {
                sources.push(p);
            }
        }
        out.push_str(&framed_line(style, &format!("Source: {}", sources.join(", "))));
        out.push('\n');
        out.push('\n');
    }

    let bypass_expansion = ext == ".org";

    for (i, block) in contributing.iter().enumerate() {
        if comments_enabled {
            out.push_str(&framed_line(
                comment_style(&ext).expect("checked above"),
                &format!("file:{}::{}", block.source_path.display(), block.start_line + 1),
            ));
            out.push('\n');
        }

        let content = if i == 0 {
            lifted_first_content.as_deref().unwrap_or(&block.content)
        } else {
            block.content.as_str()
        };

        let expanded = if bypass_expansion {
            content.to_string()
        } else {
            let mut stack = HashSet::new();
            expander::expand(content, blocks, index, &mut stack, "")
        };
        out.push_str(&expanded);
        out.push('\n');

        if comments_enabled {
            if let Some(name) = &block.name {
                out.push_str(&framed_line(comment_style(&ext).expect("checked above"), &format!("{name} ends here")));
                out.push('\n');
            }
        }
        if i + 1 < contributing.len() {
            out.push('\n');
        }
    }

    out.into_bytes()
}
