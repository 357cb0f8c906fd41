//! Block extraction and noweb-style reference expansion engine.
//!
//! Five components, each its own module:
//! - [`header`] — directive line parsing
//! - [`scanner`] — per-document block extraction
//! - [`index`] — the global name -> blocks map
//! - [`expander`] — recursive `<<name>>` substitution
//! - [`target`] — grouping blocks into output targets and framing them
//!
//! [`run`] wires all five into the end-to-end pipeline: read documents in,
//! get rendered target bytes out. Filesystem I/O, CLI parsing, and logging
//! are deliberately left to the caller (the `tangle` binary) — this crate
//! never touches disk.

pub mod expander;
pub mod header;
pub mod index;
pub mod properties;
pub mod scanner;
pub mod target;
pub mod types;

pub use types::{ArgMap, ArgValue, Block, BlockId, FileProperties, ReferenceIndex, Target};

use std::path::PathBuf;

/// A document already read into memory: its path (for provenance and for
/// resolving relative `tangle` directives) and its raw text.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
}

/// One rendered output target, ready to be written to disk.
#[derive(Debug, Clone)]
pub struct AssembledTarget {
    pub output_path: PathBuf,
    pub bytes: Vec<u8>,
    pub block_count: usize,
}

/// The outcome of tangling a set of documents: the rendered targets plus a
/// per-document block count (for `--verbose` reporting).
#[derive(Debug, Clone)]
pub struct TangleRun {
    pub targets: Vec<AssembledTarget>,
    pub blocks_per_document: Vec<(PathBuf, usize)>,
}

/// Run the full pipeline: scan every document, build one global reference
/// index, resolve targets, and render their bytes.
///
/// Documents are scanned in the order given, and each document's blocks are
/// appended in discovery order — this is the ordering the reference index
/// and target assembler rely on for deterministic output (see the
/// determinism and order-stability properties in the design doc).
pub fn run(documents: &[Document]) -> TangleRun {
    let mut blocks = Vec::new();
    let mut blocks_per_document = Vec::with_capacity(documents.len());

    for doc in documents {
        let props = properties::extract_file_properties(&doc.text);
        let doc_blocks = scanner::scan_document(&doc.text, &doc.path, &props);
        blocks_per_document.push((doc.path.clone(), doc_blocks.len()));
        blocks.extend(doc_blocks);
    }

    let index = index::build_reference_index(&blocks);
    let targets = target::resolve_targets(&blocks);

    let assembled = targets
        .into_iter()
        .map(|t| {
            let bytes = target::assemble(&t, &blocks, &index);
            AssembledTarget {
                output_path: t.output_path,
                block_count: t.blocks.len(),
                bytes,
            }
        })
        .collect();

    TangleRun {
        targets: assembled,
        blocks_per_document,
    }
}
