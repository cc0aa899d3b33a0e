//! Metavariable and wildcard lexing
//!
//! Placeholders are found lexically before parsing and rewritten to
//! same-length identifier spellings the grammar accepts (`$X` -> `_X`,
//! `$...ARGS` -> `____ARGS`, `...` -> `___`). Offsets in the parse therefore
//! map 1:1 to the original fragment, and the recorded sites tell the parser
//! which nodes to retag afterwards.

use crate::grammar::{MetavariableConvention, WildcardStyle};
use std::ops::Range;

const WILDCARD: &str = "...";

/// What sits at a placeholder site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteKind {
    Metavariable { name: String, ellipsis: bool },
    Wildcard,
}

/// One placeholder occurrence in the fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub range: Range<usize>,
    pub kind: SiteKind,
}

/// Placeholder sites of a fragment plus the rewritten buffer to parse
#[derive(Debug, Clone)]
pub struct Placeholders {
    sites: Vec<Site>,
    rewritten: Vec<u8>,
}

impl Placeholders {
    /// Find the placeholders in `fragment`, in source order
    pub fn scan(fragment: &str, convention: &MetavariableConvention, wildcard: WildcardStyle) -> Self {
        let bytes = fragment.as_bytes();
        let mut rewritten = bytes.to_vec();
        let mut sites = Vec::new();

        for found in convention.regex().find_iter(fragment) {
            // `a$B` is one identifier in grammars that allow `$` in names
            if found.start() > 0 && is_ident_byte(bytes[found.start() - 1]) {
                continue;
            }
            let name = found.as_str().to_string();
            let ellipsis = name[1..].starts_with(WILDCARD);
            let sigil_len = if ellipsis { 1 + WILDCARD.len() } else { 1 };
            rewritten[found.start()..found.start() + sigil_len].fill(b'_');
            sites.push(Site {
                range: found.range(),
                kind: SiteKind::Metavariable { name, ellipsis },
            });
        }

        let mut from = 0;
        while let Some(pos) = fragment[from..].find(WILDCARD).map(|p| p + from) {
            let range = pos..pos + WILDCARD.len();
            from = range.end;
            if sites.iter().any(|s| s.range.start < range.end && range.start < s.range.end) {
                continue;
            }
            // `...rest` is spread syntax, `....` is not a wildcard either
            if bytes.get(range.end).is_some_and(|b| is_ident_byte(*b) || *b == b'.') {
                continue;
            }
            // `xs...` and `$ARGS...` are variadic arguments, left to the grammar
            if range.start > 0 && is_operand_end(bytes[range.start - 1]) {
                continue;
            }
            if wildcard == WildcardStyle::Identifier {
                rewritten[range.clone()].fill(b'_');
            }
            sites.push(Site {
                range,
                kind: SiteKind::Wildcard,
            });
        }

        sites.sort_by_key(|s| s.range.start);
        Self { sites, rewritten }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// The buffer handed to the parser; same length as the fragment
    pub fn rewritten(&self) -> &[u8] {
        &self.rewritten
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte that can end an operand (`xs`, `f(x)`, `a[i]`)
fn is_operand_end(b: u8) -> bool {
    is_ident_byte(b) || b == b')' || b == b']'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(fragment: &str, wildcard: WildcardStyle) -> Placeholders {
        Placeholders::scan(fragment, &MetavariableConvention::dollar().unwrap(), wildcard)
    }

    #[test]
    fn test_metavariables_rewritten_in_place() {
        let found = scan("print($X, $FOO_1)", WildcardStyle::Native);
        assert_eq!(found.rewritten(), b"print(_X, _FOO_1)");
        assert_eq!(found.sites().len(), 2);
        assert_eq!(found.sites()[0].range, 6..8);
        assert_eq!(
            found.sites()[1].kind,
            SiteKind::Metavariable { name: "$FOO_1".to_string(), ellipsis: false }
        );
    }

    #[test]
    fn test_ellipsis_metavariable() {
        let found = scan("f($...ARGS)", WildcardStyle::Identifier);
        assert_eq!(found.rewritten(), b"f(____ARGS)");
        assert_eq!(found.sites().len(), 1);
        assert_eq!(
            found.sites()[0].kind,
            SiteKind::Metavariable { name: "$...ARGS".to_string(), ellipsis: true }
        );
    }

    #[test]
    fn test_lowercase_and_embedded_dollars_are_not_metavariables() {
        let found = scan("$x + a$B + $", WildcardStyle::Native);
        assert!(found.is_empty());
        assert_eq!(found.rewritten(), b"$x + a$B + $");
    }

    #[test]
    fn test_wildcards_by_style() {
        let native = scan("f(...)", WildcardStyle::Native);
        assert_eq!(native.rewritten(), b"f(...)");
        assert_eq!(native.sites()[0].kind, SiteKind::Wildcard);

        let ident = scan("f(...)", WildcardStyle::Identifier);
        assert_eq!(ident.rewritten(), b"f(___)");
        assert_eq!(ident.sites()[0].range, 2..5);
    }

    #[test]
    fn test_spread_is_not_a_wildcard() {
        let found = scan("f(...rest, ...)", WildcardStyle::Identifier);
        assert_eq!(found.rewritten(), b"f(...rest, ___)");
        assert_eq!(found.sites().len(), 1);
        assert_eq!(found.sites()[0].range, 11..14);
    }

    #[test]
    fn test_trailing_ellipsis_is_variadic() {
        let found = scan("f(xs...)", WildcardStyle::Identifier);
        assert!(found.is_empty());
        assert_eq!(found.rewritten(), b"f(xs...)");

        let found = scan("f($ARGS...)", WildcardStyle::Identifier);
        assert_eq!(found.rewritten(), b"f(_ARGS...)");
        assert_eq!(found.sites().len(), 1);
        assert_eq!(found.sites()[0].range, 2..7);

        let found = scan("append(g(x)..., h[0]...)", WildcardStyle::Identifier);
        assert!(found.is_empty());
    }
}
