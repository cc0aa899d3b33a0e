//! Owned syntax trees
//!
//! Every parse, pattern or target, ends up as a `SyntaxTree`: an immutable tree
//! of `Node`s over the bytes that were parsed. Trees are span-complete: the
//! leaves, in order, cover the source exactly once, whitespace included.
//!
//! Reserved node kinds:
//! - `Error` / `Missing`: error recovery. The parse went on past a syntactic gap.
//! - `Trivia`: whitespace between tokens.
//! - `Fragment`: root of a pattern tree.
//! - `Metavariable` / `Wildcard`: pattern placeholders, never produced for targets.

pub mod builder;
pub mod line_index;

pub use builder::TreeBuilder;
pub use line_index::LineIndex;

use crate::language::LanguageId;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Line/column position (line 1-indexed, column is a 0-indexed byte offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open byte range `[start, end)` plus its line/column endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub start_pos: Position,
    pub end_pos: Position,
}

impl Span {
    /// Create a span, resolving positions through a line index
    pub fn new(start: usize, end: usize, index: &LineIndex) -> Self {
        Self {
            start,
            end,
            start_pos: index.position(start),
            end_pos: index.position(end),
        }
    }

    /// Span covering a whole buffer
    pub fn whole(source: &[u8]) -> Self {
        Self::new(0, source.len(), &LineIndex::new(source))
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies within this span
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether a byte offset lies within this span
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Same byte range, ignoring positions
    pub fn same_range(&self, start: usize, end: usize) -> bool {
        self.start == start && self.end == end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_pos, self.end_pos)
    }
}

/// Kind of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A node kind of the grammar (`identifier`, `call`, `element`, ...)
    Syntax(&'static str),
    /// Error recovery: a region the grammar could not fit anywhere
    Error,
    /// Error recovery: a zero-width token the parser had to assume
    Missing(&'static str),
    /// Whitespace between tokens
    Trivia,
    /// Root of a pattern tree
    Fragment,
    /// Pattern placeholder bound to "match anything"
    Metavariable { name: String, ellipsis: bool },
    /// Pattern wildcard (`...`)
    Wildcard,
}

impl NodeKind {
    /// Kind name as used in s-expressions
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Syntax(kind) => *kind,
            NodeKind::Error => "ERROR",
            NodeKind::Missing(_) => "MISSING",
            NodeKind::Trivia => "trivia",
            NodeKind::Fragment => "fragment",
            NodeKind::Metavariable { .. } => "metavariable",
            NodeKind::Wildcard => "wildcard",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Missing(kind) => write!(f, "MISSING {}", kind),
            NodeKind::Metavariable { name, .. } => write!(f, "metavariable {}", name),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A node of a syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    /// Named in the grammar (as opposed to punctuation/keyword tokens)
    pub named: bool,
    pub span: Span,
    /// Children in source order, spans ordered and non-overlapping
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a leaf node
    pub fn leaf(kind: NodeKind, named: bool, span: Span) -> Self {
        Self {
            kind,
            named,
            span,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Error or missing node
    pub fn is_error_recovery(&self) -> bool {
        matches!(self.kind, NodeKind::Error | NodeKind::Missing(_))
    }

    pub fn is_trivia(&self) -> bool {
        self.kind == NodeKind::Trivia
    }

    pub fn is_metavariable(&self) -> bool {
        matches!(self.kind, NodeKind::Metavariable { .. })
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind == NodeKind::Wildcard
    }

    /// Pre-order traversal over this node and its descendants
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// All descendants (self included) matching a predicate, in source order
    pub fn find_all<F>(&self, predicate: F) -> Vec<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        self.walk().filter(|n| predicate(n)).collect()
    }

    /// Children that are not whitespace
    pub fn non_trivia_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|c| !c.is_trivia())
    }

    fn write_sexp(&self, out: &mut String) {
        out.push('(');
        out.push_str(&self.kind.to_string());
        for child in &self.children {
            if child.named || child.is_error_recovery() {
                out.push(' ');
                child.write_sexp(out);
            }
        }
        out.push(')');
    }
}

/// Pre-order iterator over a subtree
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// An owned, immutable concrete syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxTree {
    language: LanguageId,
    root: Node,
    #[serde(skip)]
    source: Vec<u8>,
}

impl SyntaxTree {
    pub(crate) fn new(language: LanguageId, root: Node, source: Vec<u8>) -> Self {
        Self {
            language,
            root,
            source,
        }
    }

    /// Language the tree was parsed as
    pub fn language(&self) -> &LanguageId {
        &self.language
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The bytes the tree was parsed from
    pub fn source_bytes(&self) -> &[u8] {
        &self.source
    }

    /// Source bytes under a node
    pub fn bytes(&self, node: &Node) -> &[u8] {
        &self.source[node.span.start..node.span.end]
    }

    /// Source text under a node (lossy for non UTF-8 input)
    pub fn text(&self, node: &Node) -> Cow<'_, str> {
        String::from_utf8_lossy(self.bytes(node))
    }

    /// Leaves in source order; their bytes concatenate to the source
    pub fn leaves(&self) -> Vec<&Node> {
        self.root.walk().filter(|n| n.is_leaf()).collect()
    }

    /// Whether any error-recovery node is present
    pub fn has_errors(&self) -> bool {
        self.root.walk().any(Node::is_error_recovery)
    }

    /// Error-recovery nodes, outermost first
    pub fn error_nodes(&self) -> Vec<&Node> {
        self.root.find_all(Node::is_error_recovery)
    }

    /// S-expression over named and error nodes, for debugging and tests
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.root.write_sexp(&mut out);
        out
    }

    /// JSON rendering for hosts
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> Span {
        Span::new(start, end, &LineIndex::new(b"ab cd"))
    }

    fn sample() -> SyntaxTree {
        let root = Node {
            kind: NodeKind::Syntax("pair"),
            named: true,
            span: span(0, 5),
            children: vec![
                Node::leaf(NodeKind::Syntax("identifier"), true, span(0, 2)),
                Node::leaf(NodeKind::Trivia, false, span(2, 3)),
                Node::leaf(NodeKind::Error, true, span(3, 5)),
            ],
        };
        SyntaxTree::new(LanguageId::new("test"), root, b"ab cd".to_vec())
    }

    #[test]
    fn test_walk_is_preorder() {
        let tree = sample();
        let kinds: Vec<_> = tree.root().walk().map(|n| n.kind.as_str().to_string()).collect();
        assert_eq!(kinds, vec!["pair", "identifier", "trivia", "ERROR"]);
    }

    #[test]
    fn test_leaves_reconstruct_source() {
        let tree = sample();
        let joined: Vec<u8> = tree.leaves().iter().flat_map(|n| tree.bytes(n).to_vec()).collect();
        assert_eq!(joined, b"ab cd");
    }

    #[test]
    fn test_errors_and_sexp() {
        let tree = sample();
        assert!(tree.has_errors());
        assert_eq!(tree.error_nodes().len(), 1);
        assert_eq!(tree.text(tree.error_nodes()[0]), "cd");
        assert_eq!(tree.to_sexp(), "(pair (identifier) (ERROR))");
    }

    #[test]
    fn test_span_display() {
        let index = LineIndex::new(b"a\nbc");
        assert_eq!(Span::new(0, 4, &index).to_string(), "1:0-2:2");
    }
}
