//! C1 — Header Parser.
//!
//! Turns the tail of a `#+begin_src` line (or a `#+PROPERTY: header-args…`
//! line) into tokens, then into `(language, args)` / a bare [`ArgMap`].
//!
//! Quoting and the `yes`/`no`/`t`/`nil` boolean aliasing are handled here so
//! every caller (scanner, file-properties extraction) sees the same
//! normalization.

use crate::types::{ArgMap, ArgValue};
use once_cell::sync::Lazy;
use regex::Regex;

static VALID_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Split `s` into whitespace-delimited tokens, treating a `"..."` run as a
/// single token with the quotes stripped.
pub fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            None => break,
            Some('"') => {
                chars.next();
                let mut buf = String::new();
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                    buf.push(c);
                }
                tokens.push(buf);
            }
            Some(_) => {
                let mut buf = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    buf.push(c);
                    chars.next();
                }
                tokens.push(buf);
            }
        }
    }
    tokens
}

/// Normalize a raw (quote-stripped) value token: `yes`/`t` -> `true`,
/// `no`/`nil` -> `false` (case-insensitive), anything else stays a string.
/// The boolean form wins even when the original token was quoted — a
/// consumer that really meant the literal string `"yes"` cannot be
/// distinguished from the flag `yes`. This is a known aliasing collision;
/// see the design notes rather than trying to special-case it here.
fn normalize_value(raw: &str) -> ArgValue {
    if raw.eq_ignore_ascii_case("yes") || raw.eq_ignore_ascii_case("t") {
        ArgValue::Bool(true)
    } else if raw.eq_ignore_ascii_case("no") || raw.eq_ignore_ascii_case("nil") {
        ArgValue::Bool(false)
    } else {
        ArgValue::Str(raw.to_string())
    }
}

/// Consume a token stream of `:key value` pairs into an [`ArgMap`].
///
/// A token starting with `:` whose remainder matches `[A-Za-z0-9_-]+` opens a
/// key; the following token is its value. A bare token with no open key is
/// silently dropped (malformed input; the scanner still delimits the block).
pub fn parse_args<I: Iterator<Item = String>>(tokens: I) -> ArgMap {
    let mut args = ArgMap::new();
    let mut pending: Option<String> = None;

    for tok in tokens {
        if let Some(key) = tok.strip_prefix(':') {
            if VALID_KEY.is_match(key) {
                pending = Some(key.to_string());
                continue;
            }
        }
        if let Some(key) = pending.take() {
            args.insert(key, normalize_value(&tok));
        }
    }
    canonicalize_aliases(&mut args);
    args
}

/// Fold the `nowebRef` alias into the canonical `noweb-ref` key. An explicit
/// `noweb-ref` always wins over the alias spelling.
pub fn canonicalize_aliases(args: &mut ArgMap) {
    if let Some(alias) = args.remove("nowebRef")
        && !args.contains_key("noweb-ref")
    {
        args.insert("noweb-ref".to_string(), alias);
    }
}

/// Parse the tail of a `#+begin_src` directive line: `LANG :key val …`.
///
/// Returns `(language, args)`. A malformed fence with no language token
/// yields `("".to_string(), {})` — the caller still opens a block, it just
/// cannot be tangled unless inheritance later supplies `tangle`.
pub fn parse_header_line(rest: &str) -> (String, ArgMap) {
    let mut tokens = tokenize(rest).into_iter();
    let language = tokens.next().unwrap_or_default();
    let args = parse_args(tokens);
    (language, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_language_and_args() {
        let (lang, args) = parse_header_line(r#"ts :tangle out.ts :flag yes"#);
        assert_eq!(lang, "ts");
        assert_eq!(args.get("tangle").unwrap().as_str(), Some("out.ts"));
        assert_eq!(args.get("flag").unwrap(), &ArgValue::Bool(true));
    }

    #[test]
    fn quoted_value_keeps_spaces() {
        let (_, args) = parse_header_line(r#"sh :tangle "a file.sh""#);
        assert_eq!(args.get("tangle").unwrap().as_str(), Some("a file.sh"));
    }

    #[test]
    fn boolean_alias_wins_even_when_quoted() {
        let (_, args) = parse_header_line(r#"sh :tangle "yes""#);
        assert_eq!(args.get("tangle").unwrap(), &ArgValue::Bool(true));
    }

    #[test]
    fn malformed_fence_has_empty_language() {
        let (lang, args) = parse_header_line("");
        assert_eq!(lang, "");
        assert!(args.is_empty());
    }

    #[test]
    fn noweb_ref_alias_canonicalizes() {
        let (_, args) = parse_header_line(r#"sh :nowebRef greet"#);
        assert_eq!(args.get("noweb-ref").unwrap().as_str(), Some("greet"));
        assert!(!args.contains_key("nowebRef"));
    }

    #[test]
    fn explicit_noweb_ref_beats_alias() {
        let (_, args) = parse_header_line(r#"sh :nowebRef alias-name :noweb-ref real-name"#);
        assert_eq!(args.get("noweb-ref").unwrap().as_str(), Some("real-name"));
    }
}
