//! Target Parser
//!
//! Parses whole source files with the grammar's standard start rule. Real
//! files are often mid-edit or partially checked out, so a malformed file
//! still yields a tree; its broken regions are error-recovery nodes.
//! Pattern placeholders get no special treatment here: `$X` in a target is
//! whatever the grammar says it is.

use crate::grammar::Grammar;
use crate::language::LanguageId;
use crate::tree::{SyntaxTree, TreeBuilder};
use std::path::{Path, PathBuf};

/// What to parse as a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    /// In-memory source text
    Text(String),
    /// In-memory raw bytes (need not be UTF-8)
    Bytes(Vec<u8>),
    /// A file, read through the engine's source provider
    Path(PathBuf),
}

impl TargetSource {
    pub fn text(text: impl Into<String>) -> Self {
        TargetSource::Text(text.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        TargetSource::Path(path.into())
    }
}

impl From<&str> for TargetSource {
    fn from(text: &str) -> Self {
        TargetSource::Text(text.to_string())
    }
}

impl From<String> for TargetSource {
    fn from(text: String) -> Self {
        TargetSource::Text(text)
    }
}

impl From<Vec<u8>> for TargetSource {
    fn from(bytes: Vec<u8>) -> Self {
        TargetSource::Bytes(bytes)
    }
}

impl From<&Path> for TargetSource {
    fn from(path: &Path) -> Self {
        TargetSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for TargetSource {
    fn from(path: PathBuf) -> Self {
        TargetSource::Path(path)
    }
}

/// Parses target files for one grammar
pub struct TargetParser<'g> {
    grammar: &'g Grammar,
}

impl<'g> TargetParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    /// Parse a whole buffer. Never fails: syntax problems become error nodes.
    pub fn parse(&self, language: LanguageId, source: Vec<u8>) -> SyntaxTree {
        let len = source.len();
        let tree = TreeBuilder::new(self.grammar).build(language, source);
        if tree.has_errors() {
            tracing::warn!(
                "{} target ({} bytes) parsed with {} error regions",
                tree.language(),
                len,
                tree.error_nodes().len()
            );
        } else {
            tracing::debug!("{} target ({} bytes) parsed cleanly", tree.language(), len);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::builtin;
    use crate::tree::NodeKind;

    #[test]
    fn test_target_uses_target_rule() {
        let grammar = builtin::go().unwrap();
        let tree = TargetParser::new(&grammar).parse(
            LanguageId::new("go"),
            b"package main\n\nfunc main() {}\n".to_vec(),
        );
        assert_eq!(tree.root().kind, NodeKind::Syntax("source_file"));
        assert!(!tree.has_errors());
    }

    #[test]
    fn test_dollar_identifier_is_not_a_metavariable() {
        let grammar = builtin::javascript().unwrap();
        let tree = TargetParser::new(&grammar).parse(LanguageId::new("javascript"), b"foo($X);".to_vec());

        assert!(!tree.root().walk().any(|n| n.is_metavariable()));
        let ident = tree
            .root()
            .walk()
            .find(|n| tree.text(n) == "$X" && n.kind == NodeKind::Syntax("identifier"));
        assert!(ident.is_some());
    }

    #[test]
    fn test_wildcard_is_not_tagged() {
        let grammar = builtin::python().unwrap();
        let tree = TargetParser::new(&grammar).parse(LanguageId::new("python"), b"foo(...)\n".to_vec());
        assert!(!tree.root().walk().any(|n| n.is_wildcard()));
        assert!(tree.root().walk().any(|n| n.kind == NodeKind::Syntax("ellipsis")));
    }

    #[test]
    fn test_non_utf8_bytes() {
        let grammar = builtin::html().unwrap();
        let source = vec![b'<', b'p', b'>', 0xff, 0xfe, b'<', b'/', b'p', b'>'];
        let tree = TargetParser::new(&grammar).parse(LanguageId::new("html"), source.clone());
        let joined: Vec<u8> = tree.leaves().iter().flat_map(|n| tree.bytes(n).to_vec()).collect();
        assert_eq!(joined, source);
    }
}
