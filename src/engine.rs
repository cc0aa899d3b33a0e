//! Engine Facade
//!
//! The single entry point hosts use. An `Engine` owns (a shared handle to) an
//! immutable Grammar Registry and a source bytes provider; every call is a
//! pure function of its inputs plus that registry, so one engine can serve
//! any number of threads.

use crate::config::EngineConfig;
use crate::grammar::{GrammarRegistry, builtin};
use crate::language::LanguageId;
use crate::pattern::{PatternParser, PatternTree};
use crate::source::{FsSourceProvider, SourceProvider};
use crate::target::{TargetParser, TargetSource};
use crate::tree::{LineIndex, Span, SyntaxTree};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Parse mode of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Pattern fragment; `expression_only` picks the expression start rules
    Pattern { expression_only: bool },
    /// Whole source file
    Target,
}

/// One parse request
#[derive(Debug, Clone)]
pub struct ParseRequest {
    pub language: String,
    pub source: TargetSource,
    pub mode: Mode,
}

impl ParseRequest {
    pub fn pattern(language: impl Into<String>, text: impl Into<String>, expression_only: bool) -> Self {
        Self {
            language: language.into(),
            source: TargetSource::Text(text.into()),
            mode: Mode::Pattern { expression_only },
        }
    }

    pub fn target(language: impl Into<String>, source: impl Into<TargetSource>) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
            mode: Mode::Target,
        }
    }
}

/// Result of a parse request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Pattern(PatternTree),
    Target(SyntaxTree),
}

impl Parsed {
    /// The underlying syntax tree, whatever the mode
    pub fn tree(&self) -> &SyntaxTree {
        match self {
            Parsed::Pattern(pattern) => pattern.tree(),
            Parsed::Target(tree) => tree,
        }
    }
}

/// The parsing engine
#[derive(Clone)]
pub struct Engine {
    registry: Arc<GrammarRegistry>,
    source: Arc<dyn SourceProvider>,
    strict_patterns: bool,
}

impl Engine {
    /// Create an engine over a registry, reading files from the filesystem
    pub fn new(registry: Arc<GrammarRegistry>) -> Self {
        Self {
            registry,
            source: Arc::new(FsSourceProvider),
            strict_patterns: false,
        }
    }

    /// Engine over the process-wide built-in registry
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(builtin::shared_registry()?))
    }

    /// Engine configured from an `EngineConfig`
    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        let registry = match &config.languages {
            Some(languages) => Arc::new(builtin::registry_with(Some(languages.as_slice()))?),
            None => builtin::shared_registry()?,
        };
        Ok(Self::new(registry).strict_patterns(config.pattern.strict))
    }

    /// Replace the source bytes provider used for path targets
    pub fn with_source_provider(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.source = Arc::new(provider);
        self
    }

    /// Reject patterns that need any error recovery
    pub fn strict_patterns(mut self, strict: bool) -> Self {
        self.strict_patterns = strict;
        self
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    /// Supported language ids, in registration order
    pub fn get_langs(&self) -> Vec<LanguageId> {
        self.registry.list_languages()
    }

    /// Parse a pattern fragment
    pub fn parse_pattern(&self, expression_only: bool, language: &str, text: &str) -> Result<PatternTree> {
        let (id, grammar) = self.registry.resolve_entry(language)?;
        PatternParser::new(grammar)
            .strict(self.strict_patterns)
            .parse(id.clone(), expression_only, text)
    }

    /// Parse a target from text, bytes, or a path read through the provider
    pub fn parse_target(&self, language: &str, source: impl Into<TargetSource>) -> Result<SyntaxTree> {
        let (id, grammar) = self.registry.resolve_entry(language)?;
        let bytes = match source.into() {
            TargetSource::Text(text) => text.into_bytes(),
            TargetSource::Bytes(bytes) => bytes,
            TargetSource::Path(path) => {
                tracing::debug!("Reading target {}", path.display());
                self.source.read(&path)?
            }
        };
        Ok(TargetParser::new(grammar).parse(id.clone(), bytes))
    }

    /// Dispatch a request by mode
    pub fn parse(&self, request: ParseRequest) -> Result<Parsed> {
        match request.mode {
            Mode::Target => self
                .parse_target(&request.language, request.source)
                .map(Parsed::Target),
            Mode::Pattern { expression_only } => {
                let text = match request.source {
                    TargetSource::Text(text) => text,
                    TargetSource::Bytes(bytes) => pattern_text(bytes)?,
                    TargetSource::Path(path) => pattern_text(self.source.read(&path)?)?,
                };
                self.parse_pattern(expression_only, &request.language, &text)
                    .map(Parsed::Pattern)
            }
        }
    }
}

/// Patterns are text: invalid UTF-8 is rejected, never replaced
fn pattern_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        let utf8 = e.utf8_error();
        let bytes = e.into_bytes();
        let start = utf8.valid_up_to();
        let end = utf8.error_len().map_or(bytes.len(), |len| start + len);
        Error::UnparseablePattern {
            span: Span::new(start, end, &LineIndex::new(&bytes)),
            reason: "pattern is not valid UTF-8".to_string(),
        }
    })
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("languages", &self.registry.len())
            .field("strict_patterns", &self.strict_patterns)
            .finish()
    }
}
