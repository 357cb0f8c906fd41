//! Core data model: [`Block`], its directive arguments, the per-document
//! [`FileProperties`] inheritance seed, and the name-keyed [`ReferenceIndex`].

use std::collections::BTreeMap;
use std::path::PathBuf;

/// A directive value: either a bare string or a normalized boolean.
///
/// Recognized boolean-ish tokens (`yes`, `no`, `t`, `nil`, case-insensitive)
/// always collapse to [`ArgValue::Bool`], even when the source text was
/// quoted — see the header-parser aliasing note in the design notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Str(String),
    Bool(bool),
}

impl ArgValue {
    /// True if this value is the boolean `true`, or the string `"yes"`/`"true"`.
    pub fn is_truthy_yes(&self) -> bool {
        matches!(self, ArgValue::Bool(true))
            || matches!(self, ArgValue::Str(s) if s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true"))
    }

    /// True if this value is the boolean `false`, or the string `"no"`/`"false"`.
    pub fn is_falsy_no(&self) -> bool {
        matches!(self, ArgValue::Bool(false))
            || matches!(self, ArgValue::Str(s) if s.eq_ignore_ascii_case("no") || s.eq_ignore_ascii_case("false"))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s.as_str()),
            ArgValue::Bool(_) => None,
        }
    }
}

/// Directive key/value map, ordered for stable debugging but looked up by key.
pub type ArgMap = BTreeMap<String, ArgValue>;

/// `{language_tag | "*"} -> args`, seeded from a document's `#+PROPERTY:
/// header-args[:LANG]` lines.
#[derive(Debug, Clone, Default)]
pub struct FileProperties {
    pub global: ArgMap,
    pub by_language: BTreeMap<String, ArgMap>,
}

impl FileProperties {
    /// Merge global args with the args scoped to `language` (language wins).
    pub fn merged_for(&self, language: &str) -> ArgMap {
        let mut merged = self.global.clone();
        if let Some(scoped) = self.by_language.get(&language.to_ascii_lowercase()) {
            for (k, v) in scoped {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

/// Stable index into the block arena built by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub usize);

/// The atomic unit extracted from a document: a `#+begin_src ... #+end_src`
/// region together with its resolved directive arguments and provenance.
#[derive(Debug, Clone)]
pub struct Block {
    pub name: Option<String>,
    pub language: String,
    pub content: String,
    pub args: ArgMap,
    pub source_path: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

impl Block {
    pub fn noweb_ref(&self) -> Option<&str> {
        self.args.get("noweb-ref").and_then(ArgValue::as_str)
    }

    pub fn comments_disabled(&self) -> bool {
        self.args
            .get("comments")
            .map(ArgValue::is_falsy_no)
            .unwrap_or(false)
    }

    pub fn shebang(&self) -> Option<&str> {
        self.args.get("shebang").and_then(ArgValue::as_str)
    }

    /// The effective `tangle` directive, if present.
    pub fn tangle_arg(&self) -> Option<&ArgValue> {
        self.args.get("tangle")
    }
}

/// `name -> ordered list of blocks`, built once scanning completes.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    map: BTreeMap<String, Vec<BlockId>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `block` under `key`, appending in discovery order and
    /// skipping a duplicate push if the block is already last under this key
    /// (covers `name == noweb-ref` on the same block).
    pub fn insert(&mut self, key: &str, id: BlockId) {
        let entry = self.map.entry(key.to_string()).or_default();
        if entry.last() != Some(&id) {
            entry.push(id);
        }
    }

    /// Ids registered under `name`, or `None`/empty if unresolved.
    pub fn get(&self, name: &str) -> Option<&[BlockId]> {
        self.map.get(name).map(|v| v.as_slice())
    }
}

/// `{output_path, ordered list of contributing blocks}`.
#[derive(Debug, Clone)]
pub struct Target {
    pub output_path: PathBuf,
    pub blocks: Vec<BlockId>,
}
