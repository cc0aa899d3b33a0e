//! Grammar definitions
//!
//! A `Grammar` is a compiled tree-sitter table plus the metadata the engine
//! needs around it: the target (full-file) start rule, the permissive pattern
//! start rules, and the lexical conventions for pattern placeholders.
//! Grammars are immutable once built and shared behind `Arc`.

pub mod builtin;
pub mod registry;

pub use registry::GrammarRegistry;

use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tree_sitter::{Language, Parser};

/// Shape of code a pattern start rule accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentShape {
    /// Top-level items (definitions, imports, markup)
    Items,
    /// Statements inside a function body
    Statements,
    /// Members inside a class/impl body
    Members,
    /// A bare expression
    Expression,
}

/// A permissive start rule for pattern fragments.
///
/// A tree-sitter table has one start symbol, so other entry points are
/// expressed by embedding the fragment between `prefix` and `suffix`. The
/// wrapper must make a complete, valid program whenever the fragment has the
/// rule's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    pub name: &'static str,
    pub shape: FragmentShape,
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl PatternRule {
    pub const fn new(
        name: &'static str,
        shape: FragmentShape,
        prefix: &'static str,
        suffix: &'static str,
    ) -> Self {
        Self {
            name,
            shape,
            prefix,
            suffix,
        }
    }

    /// Rule that parses the fragment as-is
    pub const fn bare(name: &'static str, shape: FragmentShape) -> Self {
        Self::new(name, shape, "", "")
    }

    /// The buffer handed to the parser, and the fragment's byte range inside it
    pub fn wrap(&self, fragment: &[u8]) -> (Vec<u8>, std::ops::Range<usize>) {
        let mut buffer = Vec::with_capacity(self.prefix.len() + fragment.len() + self.suffix.len());
        buffer.extend_from_slice(self.prefix.as_bytes());
        buffer.extend_from_slice(fragment);
        buffer.extend_from_slice(self.suffix.as_bytes());
        let start = self.prefix.len();
        (buffer, start..start + fragment.len())
    }
}

/// How a grammar sees the `...` wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardStyle {
    /// `...` already parses as a single node (Python `ellipsis`, markup text)
    Native,
    /// `...` is rewritten to an identifier of the same length before parsing
    Identifier,
}

/// Lexical convention for metavariables: a sigil followed by an uppercase name
/// (`$X`, `$ARG_1`, `$_`), or an ellipsis metavariable (`$...ARGS`).
#[derive(Debug, Clone)]
pub struct MetavariableConvention {
    sigil: char,
    regex: Regex,
}

impl MetavariableConvention {
    /// Create a convention for an ASCII sigil
    pub fn new(sigil: char) -> Result<Self> {
        if !sigil.is_ascii() || sigil.is_ascii_alphanumeric() || sigil.is_ascii_whitespace() {
            return Err(Error::Grammar(format!("Invalid metavariable sigil: {:?}", sigil)));
        }
        let pattern = format!(r"{}(\.\.\.)?[A-Z_][A-Z0-9_]*", regex::escape(&sigil.to_string()));
        let regex = Regex::new(&pattern)
            .map_err(|e| Error::Grammar(format!("Metavariable regex error: {}", e)))?;
        Ok(Self { sigil, regex })
    }

    /// The `$X` convention
    pub fn dollar() -> Result<Self> {
        Self::new('$')
    }

    pub fn sigil(&self) -> char {
        self.sigil
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// A compiled grammar plus its metadata
pub struct Grammar {
    name: &'static str,
    language: Language,
    target_rule: &'static str,
    pattern_rules: Vec<PatternRule>,
    fallback_rule: PatternRule,
    metavariables: MetavariableConvention,
    wildcard: WildcardStyle,
    comment_kinds: Vec<&'static str>,
    node_kinds: Vec<&'static str>,
}

impl Grammar {
    /// Create a grammar from a tree-sitter language.
    ///
    /// Fails if the table's ABI cannot be loaded or if `target_rule` is not a
    /// named node kind of the table.
    pub fn new(name: &'static str, language: Language, target_rule: &'static str) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| Error::Grammar(format!("Failed to load {} grammar: {}", name, e)))?;

        if language.id_for_node_kind(target_rule, true) == 0 {
            return Err(Error::Grammar(format!(
                "{} grammar has no start rule named {}",
                name, target_rule
            )));
        }

        let mut node_kinds: Vec<&'static str> = (0..language.node_kind_count())
            .filter_map(|id| u16::try_from(id).ok())
            .filter(|id| language.node_kind_is_named(*id) && language.node_kind_is_visible(*id))
            .filter_map(|id| language.node_kind_for_id(id))
            .collect();
        node_kinds.sort_unstable();
        node_kinds.dedup();

        Ok(Self {
            name,
            language,
            target_rule,
            pattern_rules: Vec::new(),
            fallback_rule: PatternRule::bare(target_rule, FragmentShape::Items),
            metavariables: MetavariableConvention::dollar()?,
            wildcard: WildcardStyle::Native,
            comment_kinds: vec!["comment"],
            node_kinds,
        })
    }

    /// Add a pattern start rule (tried in the order added)
    pub fn with_pattern_rule(mut self, rule: PatternRule) -> Self {
        self.pattern_rules.push(rule);
        self
    }

    pub fn with_wildcard(mut self, wildcard: WildcardStyle) -> Self {
        self.wildcard = wildcard;
        self
    }

    pub fn with_metavariables(mut self, convention: MetavariableConvention) -> Self {
        self.metavariables = convention;
        self
    }

    /// Node kinds treated as comments rather than pattern content
    pub fn with_comment_kinds(mut self, kinds: &[&'static str]) -> Self {
        self.comment_kinds = kinds.to_vec();
        self
    }

    /// Grammar name (the physical grammar, not a dialect id)
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Start rule used for whole files
    pub fn target_rule(&self) -> &'static str {
        self.target_rule
    }

    /// Declared pattern start rules
    pub fn pattern_rules(&self) -> &[PatternRule] {
        &self.pattern_rules
    }

    /// Start rules a pattern parse tries, in order.
    ///
    /// Expression-only patterns try the expression-shaped rules; if the
    /// grammar declares none, every rule is tried.
    pub fn pattern_candidates(&self, expression_only: bool) -> Vec<&PatternRule> {
        if self.pattern_rules.is_empty() {
            return vec![&self.fallback_rule];
        }
        if expression_only {
            let expressions: Vec<_> = self
                .pattern_rules
                .iter()
                .filter(|r| r.shape == FragmentShape::Expression)
                .collect();
            if !expressions.is_empty() {
                return expressions;
            }
        }
        self.pattern_rules.iter().collect()
    }

    pub fn metavariables(&self) -> &MetavariableConvention {
        &self.metavariables
    }

    pub fn wildcard(&self) -> WildcardStyle {
        self.wildcard
    }

    pub fn is_comment_kind(&self, kind: &str) -> bool {
        self.comment_kinds.iter().any(|k| *k == kind)
    }

    /// Named node kinds of the table, sorted
    pub fn node_kinds(&self) -> &[&'static str] {
        &self.node_kinds
    }

    pub fn has_node_kind(&self, kind: &str) -> bool {
        self.node_kinds.binary_search_by(|k| (*k).cmp(kind)).is_ok()
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("target_rule", &self.target_rule)
            .field("pattern_rules", &self.pattern_rules)
            .field("wildcard", &self.wildcard)
            .field("node_kinds", &self.node_kinds.len())
            .finish()
    }
}
