//! Pattern Parser
//!
//! Parses short, possibly incomplete fragments describing a code shape to
//! search for. Each grammar offers one or more permissive start rules; the
//! parser tries them in a fixed order and keeps the first clean parse (or the
//! one with fewest error-recovery nodes). Metavariables and wildcards are
//! tagged here so downstream matching never has to know the grammar.

pub mod placeholder;

use crate::grammar::{FragmentShape, Grammar};
use crate::language::LanguageId;
use crate::tree::builder::FragmentParse;
use crate::tree::{Node, NodeKind, Span, SyntaxTree, TreeBuilder};
use crate::{Error, Result};
use placeholder::{Placeholders, Site, SiteKind};
use serde::Serialize;

/// A metavariable tagged in a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metavariable {
    /// Name including the sigil (`$X`, `$...ARGS`)
    pub name: String,
    /// `$...NAME` form, matching a sequence
    pub ellipsis: bool,
    pub span: Span,
}

/// A parsed pattern: a syntax tree with placeholders tagged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternTree {
    tree: SyntaxTree,
    rule: &'static str,
    shape: FragmentShape,
    metavariables: Vec<Metavariable>,
    wildcards: Vec<Span>,
}

impl PatternTree {
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn into_tree(self) -> SyntaxTree {
        self.tree
    }

    /// Root node, of kind `Fragment`
    pub fn root(&self) -> &Node {
        self.tree.root()
    }

    /// Name of the start rule the fragment was parsed with
    pub fn rule(&self) -> &'static str {
        self.rule
    }

    pub fn shape(&self) -> FragmentShape {
        self.shape
    }

    /// Tagged metavariables, in source order
    pub fn metavariables(&self) -> &[Metavariable] {
        &self.metavariables
    }

    /// Tagged wildcards, in source order
    pub fn wildcards(&self) -> &[Span] {
        &self.wildcards
    }

    /// Whether the pattern parsed with error recovery
    pub fn has_errors(&self) -> bool {
        self.tree.has_errors()
    }
}

/// Parses pattern fragments for one grammar
pub struct PatternParser<'g> {
    grammar: &'g Grammar,
    strict: bool,
}

impl<'g> PatternParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            strict: false,
        }
    }

    /// Reject any pattern that needed error recovery
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse a fragment.
    ///
    /// `expression_only` restricts the candidate start rules to the
    /// expression-shaped ones when the grammar has any.
    pub fn parse(&self, language: LanguageId, expression_only: bool, text: &str) -> Result<PatternTree> {
        let source = text.as_bytes();
        if text.trim().is_empty() {
            return Err(Error::UnparseablePattern {
                span: Span::whole(source),
                reason: "empty pattern".to_string(),
            });
        }

        let placeholders = Placeholders::scan(text, self.grammar.metavariables(), self.grammar.wildcard());
        let best = self.best_candidate(expression_only, placeholders.rewritten());
        tracing::debug!(
            "Pattern for {} parsed with rule {} ({} errors)",
            language,
            best.rule.name,
            best.error_count
        );

        self.check_usable(&best.root, source)?;

        let (rule, shape) = (best.rule.name, best.rule.shape);
        let mut root = best.root;
        let (metavariables, wildcards) = tag_placeholders(&mut root, placeholders.sites());

        Ok(PatternTree {
            tree: SyntaxTree::new(language, root, source.to_vec()),
            rule,
            shape,
            metavariables,
            wildcards,
        })
    }

    /// First clean candidate, else the one with fewest errors (earliest on ties)
    fn best_candidate(&self, expression_only: bool, parsed: &[u8]) -> FragmentParse<'g> {
        let builder = TreeBuilder::new(self.grammar);
        let mut best: Option<FragmentParse<'g>> = None;

        for rule in self.grammar.pattern_candidates(expression_only) {
            let candidate = builder.build_fragment(rule, parsed);
            tracing::trace!("Rule {} scored {} errors", rule.name, candidate.error_count);
            if candidate.error_count == 0 {
                return candidate;
            }
            if best.as_ref().is_none_or(|b| candidate.error_count < b.error_count) {
                best = Some(candidate);
            }
        }

        // Candidates are never empty: grammars fall back to their target rule
        match best {
            Some(best) => best,
            None => {
                let fallback = self.grammar.pattern_candidates(false)[0];
                builder.build_fragment(fallback, parsed)
            }
        }
    }

    /// A fragment with no structure at all is not worth returning
    fn check_usable(&self, root: &Node, source: &[u8]) -> Result<()> {
        let significant: Vec<&Node> = root
            .non_trivia_children()
            .filter(|n| !self.grammar.is_comment_kind(n.kind.as_str()))
            .collect();

        if significant.is_empty() {
            return Err(Error::UnparseablePattern {
                span: Span::whole(source),
                reason: "pattern has no code".to_string(),
            });
        }

        // Punctuation and error recovery alone carry no structure
        if !significant.iter().any(|n| n.named && !n.is_error_recovery()) {
            let offending = significant
                .iter()
                .find(|n| n.is_error_recovery())
                .unwrap_or(&significant[0]);
            return Err(Error::UnparseablePattern {
                span: offending.span,
                reason: format!("not a {} fragment", self.grammar.name()),
            });
        }

        if self.strict {
            if let Some(error) = root.walk().find(|n| n.is_error_recovery()) {
                return Err(Error::UnparseablePattern {
                    span: error.span,
                    reason: "pattern contains a syntax error".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Retag the deepest node exactly covering each site
fn tag_placeholders(root: &mut Node, sites: &[Site]) -> (Vec<Metavariable>, Vec<Span>) {
    let mut metavariables = Vec::new();
    let mut wildcards = Vec::new();

    for site in sites {
        let Some(path) = exact_path(root, site) else {
            continue;
        };
        let node = node_at_mut(root, &path);
        node.kind = match &site.kind {
            SiteKind::Metavariable { name, ellipsis } => {
                metavariables.push(Metavariable {
                    name: name.clone(),
                    ellipsis: *ellipsis,
                    span: node.span,
                });
                NodeKind::Metavariable {
                    name: name.clone(),
                    ellipsis: *ellipsis,
                }
            }
            SiteKind::Wildcard => {
                wildcards.push(node.span);
                NodeKind::Wildcard
            }
        };
        node.named = true;
        node.children.clear();
    }
    (metavariables, wildcards)
}

/// Child-index path to the deepest taggable node spanning exactly `site`
fn exact_path(root: &Node, site: &Site) -> Option<Vec<usize>> {
    let (start, end) = (site.range.start, site.range.end);
    let mut path = Vec::new();
    let mut found = None;
    let mut node = root;

    loop {
        let next = node
            .children
            .iter()
            .position(|c| c.span.start <= start && end <= c.span.end && !c.span.is_empty());
        let Some(i) = next else { break };
        path.push(i);
        node = &node.children[i];
        if node.span.same_range(start, end) && !node.is_trivia() && !node.is_error_recovery() {
            found = Some(path.clone());
        }
    }
    found
}

fn node_at_mut<'a>(root: &'a mut Node, path: &[usize]) -> &'a mut Node {
    path.iter().fold(root, |node, i| &mut node.children[*i])
}
