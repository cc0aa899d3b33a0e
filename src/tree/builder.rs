//! Tree Builder
//!
//! Drives one grammar over a buffer and lowers the borrowed tree-sitter tree
//! into an owned `SyntaxTree`. Parsing is total: any byte sequence yields a
//! tree, with syntax problems kept as `Error`/`Missing` nodes.
//!
//! Lowering guarantees the span invariants regardless of what the backend
//! produced:
//! - child spans are clamped into the parent and made monotonic;
//! - every byte the backend left uncovered gets a leaf (`Trivia` for
//!   whitespace, `Error` for anything else);
//! - the root covers the whole input.

use super::{LineIndex, Node, NodeKind, Span, SyntaxTree};
use crate::grammar::{Grammar, PatternRule};
use crate::language::LanguageId;
use std::ops::Range;
use tree_sitter::{Node as TsNode, Parser, Tree};

/// Result of parsing one pattern fragment under one start rule
#[derive(Debug)]
pub struct FragmentParse<'g> {
    pub rule: &'g PatternRule,
    /// `Fragment` root over the fragment's bytes
    pub root: Node,
    /// Error-recovery nodes in the whole wrapped parse
    pub error_count: usize,
}

/// Builds syntax trees for one grammar
pub struct TreeBuilder<'g> {
    grammar: &'g Grammar,
}

impl<'g> TreeBuilder<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    /// Parse a whole buffer with the grammar's target start rule
    pub fn build(&self, language: LanguageId, source: Vec<u8>) -> SyntaxTree {
        let index = LineIndex::new(&source);
        let lowering = Lowering {
            source: &source,
            index: &index,
            shift: 0,
        };
        let whole = 0..source.len();

        let root = match self.parse_raw(&source) {
            Some(tree) => {
                let ts_root = tree.root_node();
                let kind = if ts_root.is_error() {
                    NodeKind::Syntax(self.grammar.target_rule())
                } else {
                    NodeKind::Syntax(ts_root.kind())
                };
                // An ERROR root still gets a proper root above it
                let pieces = if ts_root.is_error() {
                    vec![Piece::Ts(ts_root)]
                } else {
                    children_of(ts_root).into_iter().map(Piece::Ts).collect()
                };
                Node {
                    kind,
                    named: true,
                    span: lowering.span(whole.start, whole.end),
                    children: lowering.assemble(pieces, whole.start, whole.end),
                }
            }
            None => lowering.unparsed_root(self.grammar.target_rule(), whole),
        };

        SyntaxTree::new(language, root, source)
    }

    /// Parse a pattern fragment under one start rule.
    ///
    /// `parsed` is what the backend sees (placeholders rewritten); it must have
    /// the same length as `fragment`. Positions and whitespace come from it,
    /// which is safe since rewriting only touches non-whitespace ASCII.
    pub fn build_fragment(&self, rule: &'g PatternRule, parsed: &[u8]) -> FragmentParse<'g> {
        let (buffer, window) = rule.wrap(parsed);
        let index = LineIndex::new(parsed);
        let lowering = Lowering {
            source: &buffer,
            index: &index,
            shift: window.start,
        };

        let (children, error_count) = match self.parse_raw(&buffer) {
            Some(tree) => {
                let mut pieces = Vec::new();
                let ts_root = tree.root_node();
                if ts_root.is_error() {
                    collect_window(ts_root, &window, &mut pieces);
                } else {
                    for child in children_of(ts_root) {
                        collect_window(child, &window, &mut pieces);
                    }
                }
                (
                    lowering.assemble(pieces, window.start, window.end),
                    count_errors(ts_root),
                )
            }
            None => (
                lowering.assemble(vec![Piece::Unparsed(window.clone())], window.start, window.end),
                1,
            ),
        };

        FragmentParse {
            rule,
            root: Node {
                kind: NodeKind::Fragment,
                named: true,
                span: lowering.span(window.start, window.end),
                children,
            },
            error_count,
        }
    }

    /// Run the backend parser. `None` only if the backend gives up entirely.
    fn parse_raw(&self, source: &[u8]) -> Option<Tree> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(self.grammar.language()) {
            tracing::warn!("Failed to load {} grammar: {}", self.grammar.name(), e);
            return None;
        }
        let tree = parser.parse(source, None);
        if tree.is_none() {
            tracing::warn!(
                "{} parser returned no tree for {} bytes",
                self.grammar.name(),
                source.len()
            );
        }
        tree
    }
}

/// Count error-recovery nodes in a backend tree
pub fn count_errors(root: TsNode) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            count += 1;
        }
        if node.has_error() {
            stack.extend(children_of(node));
        }
    }
    count
}

fn children_of(node: TsNode) -> Vec<TsNode> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Something to lower into the owned tree
enum Piece<'t> {
    /// A backend node
    Ts(TsNode<'t>),
    /// A byte range with no usable backend node
    Unparsed(Range<usize>),
}

/// Collect the outermost backend nodes lying inside `window`, in source order.
///
/// Nodes straddling the window edge are split open; a straddling leaf is
/// clipped to the window as unparsed bytes.
fn collect_window<'t>(node: TsNode<'t>, window: &Range<usize>, out: &mut Vec<Piece<'t>>) {
    let (start, end) = (node.start_byte(), node.end_byte());
    if window.start <= start && end <= window.end {
        out.push(Piece::Ts(node));
    } else if start < window.end && end > window.start {
        if node.child_count() == 0 {
            out.push(Piece::Unparsed(start.max(window.start)..end.min(window.end)));
        } else {
            for child in children_of(node) {
                collect_window(child, window, out);
            }
        }
    }
}

struct Lowering<'a> {
    /// Buffer the backend parsed
    source: &'a [u8],
    /// Line index over the output buffer
    index: &'a LineIndex,
    /// Offset of the output buffer inside `source`
    shift: usize,
}

impl Lowering<'_> {
    /// Span in output coordinates for a `source` range
    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(start - self.shift, end - self.shift, self.index)
    }

    fn node(&self, node: TsNode, lo: usize, hi: usize) -> Node {
        let start = node.start_byte().clamp(lo, hi);
        let end = node.end_byte().clamp(start, hi);

        let kind = if node.is_error() {
            NodeKind::Error
        } else if node.is_missing() {
            NodeKind::Missing(node.kind())
        } else {
            NodeKind::Syntax(node.kind())
        };

        let children = if node.child_count() == 0 {
            Vec::new()
        } else {
            let pieces = children_of(node).into_iter().map(Piece::Ts).collect();
            self.assemble(pieces, start, end)
        };

        Node {
            kind,
            named: node.is_named() || node.is_error(),
            span: self.span(start, end),
            children,
        }
    }

    /// Lower pieces into `[start, end)`, filling every uncovered byte
    fn assemble(&self, pieces: Vec<Piece<'_>>, start: usize, end: usize) -> Vec<Node> {
        let mut children = Vec::with_capacity(pieces.len());
        let mut cursor = start;

        for piece in pieces {
            let child = match piece {
                Piece::Ts(node) => self.node(node, cursor, end),
                Piece::Unparsed(range) => {
                    let s = range.start.clamp(cursor, end);
                    let e = range.end.clamp(s, end);
                    Node::leaf(NodeKind::Error, true, self.span(s, e))
                }
            };
            let (child_start, child_end) = (child.span.start + self.shift, child.span.end + self.shift);
            if child_start > cursor {
                children.push(self.gap(cursor, child_start));
            }
            cursor = child_end;
            children.push(child);
        }

        if cursor < end {
            children.push(self.gap(cursor, end));
        }
        children
    }

    /// Leaf for bytes no backend node covers
    fn gap(&self, start: usize, end: usize) -> Node {
        if self.source[start..end].iter().all(u8::is_ascii_whitespace) {
            Node::leaf(NodeKind::Trivia, false, self.span(start, end))
        } else {
            Node::leaf(NodeKind::Error, true, self.span(start, end))
        }
    }

    /// Root used when the backend produced nothing at all
    fn unparsed_root(&self, kind: &'static str, range: Range<usize>) -> Node {
        Node {
            kind: NodeKind::Syntax(kind),
            named: true,
            span: self.span(range.start, range.end),
            children: self.assemble(vec![Piece::Unparsed(range.clone())], range.start, range.end),
        }
    }
}
