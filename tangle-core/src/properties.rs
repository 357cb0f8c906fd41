//! Extraction of document-level [`FileProperties`] from top-of-document
//! `#+PROPERTY: header-args[:LANG] …` directives.
//!
//! This is a separate, earlier pass than the scanner (C2): properties seed
//! the inheritance chain the scanner merges into every block it opens, so
//! they must all be known before scanning a block's args.

use crate::header;
use crate::types::FileProperties;
use once_cell::sync::Lazy;
use regex::Regex;

static PROPERTY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#\+PROPERTY:\s*(\S.*)$").unwrap());

/// Scan `text` for column-zero `#+PROPERTY: header-args[:LANG] …` lines and
/// fold them into a [`FileProperties`]. Lines that don't match `header-args`
/// (case-insensitive) are ignored — other property keywords are out of
/// scope for tangling.
pub fn extract_file_properties(text: &str) -> FileProperties {
    let mut props = FileProperties::default();

    for line in text.lines() {
        let Some(caps) = PROPERTY_LINE.captures(line) else {
            continue;
        };
        let rest = &caps[1];
        let mut tokens = header::tokenize(rest).into_iter();
        let Some(head) = tokens.next() else { continue };

        let (keyword, lang) = match head.split_once(':') {
            Some((k, l)) => (k.to_string(), Some(l.to_string())),
            None => (head, None),
        };
        if !keyword.eq_ignore_ascii_case("header-args") {
            continue;
        }

        let args = header::parse_args(tokens);
        match lang {
            Some(l) => {
                let scoped = props.by_language.entry(l.to_ascii_lowercase()).or_default();
                for (k, v) in args {
                    scoped.insert(k, v);
                }
            }
            None => {
                for (k, v) in args {
                    props.global.insert(k, v);
                }
            }
        }
    }

    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_property_seeds_global_args() {
        let props = extract_file_properties("#+PROPERTY: header-args :tangle yes\n");
        assert_eq!(
            props.global.get("tangle").unwrap().as_str(),
            None // normalized to Bool(true)
        );
        assert!(props.global.get("tangle").unwrap().is_truthy_yes());
    }

    #[test]
    fn language_scoped_property_is_isolated() {
        let props =
            extract_file_properties("#+PROPERTY: header-args:python :tangle script.py\n");
        assert!(props.global.is_empty());
        let py = props.by_language.get("python").unwrap();
        assert_eq!(py.get("tangle").unwrap().as_str(), Some("script.py"));
    }

    #[test]
    fn indented_property_line_is_ignored() {
        let props = extract_file_properties("  #+PROPERTY: header-args :tangle yes\n");
        assert!(props.global.is_empty());
    }
}
