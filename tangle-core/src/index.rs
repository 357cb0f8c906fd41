//! C3 — Reference Index.
//!
//! Builds the global `name -> [BlockId...]` map once every document has been
//! scanned. A block contributes under its `name` and, if different, under
//! its `noweb-ref`; order within a list is insertion (= discovery) order.

use crate::types::{Block, BlockId, ReferenceIndex};

pub fn build_reference_index(blocks: &[Block]) -> ReferenceIndex {
    let mut index = ReferenceIndex::new();
    for (i, block) in blocks.iter().enumerate() {
        let id = BlockId(i);
        if let Some(name) = &block.name {
            index.insert(name, id);
        }
        if let Some(noweb_ref) = block.noweb_ref() {
            index.insert(noweb_ref, id);
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArgMap;
    use std::path::PathBuf;

    fn block(name: Option<&str>, noweb_ref: Option<&str>) -> Block {
        let mut args = ArgMap::new();
        if let Some(r) = noweb_ref {
            args.insert(
                "noweb-ref".to_string(),
                crate::types::ArgValue::Str(r.to_string()),
            );
        }
        Block {
            name: name.map(str::to_string),
            language: "sh".to_string(),
            content: String::new(),
            args,
            source_path: PathBuf::from("doc.org"),
            start_line: 1,
            end_line: 1,
        }
    }

    #[test]
    fn fan_in_preserves_discovery_order() {
        let blocks = vec![block(None, Some("greet")), block(None, Some("greet"))];
        let index = build_reference_index(&blocks);
        assert_eq!(index.get("greet").unwrap(), &[BlockId(0), BlockId(1)]);
    }

    #[test]
    fn name_and_noweb_ref_dedupe_when_equal() {
        let blocks = vec![block(Some("greet"), Some("greet"))];
        let index = build_reference_index(&blocks);
        assert_eq!(index.get("greet").unwrap(), &[BlockId(0)]);
    }

    #[test]
    fn name_and_noweb_ref_both_register_when_different() {
        let blocks = vec![block(Some("body"), Some("alias"))];
        let index = build_reference_index(&blocks);
        assert_eq!(index.get("body").unwrap(), &[BlockId(0)]);
        assert_eq!(index.get("alias").unwrap(), &[BlockId(0)]);
    }
}
