//! # Polyparse - Multi-language pattern and target parsing engine
//!
//! Many grammars compiled into one addressable unit, behind a uniform interface.
//!
//! Polyparse provides:
//! - A Grammar Registry with ordered, aliasable language identifiers
//! - An error-tolerant Tree Builder producing span-complete syntax trees
//! - Pattern parsing of incomplete fragments with metavariable tagging
//! - Target parsing of whole source files for structural comparison
//! - An Engine facade dispatching `get_langs`, `parse_pattern`, `parse_target`

pub mod language;
pub mod grammar;
pub mod tree;
pub mod pattern;
pub mod target;
pub mod source;
pub mod engine;
pub mod config;
pub mod logging;

// Re-exports for convenient access
pub use language::LanguageId;
pub use grammar::{Grammar, GrammarRegistry, PatternRule, FragmentShape};
pub use tree::{Node, NodeKind, Position, Span, SyntaxTree};
pub use pattern::{Metavariable, PatternTree};
pub use target::TargetSource;
pub use source::{FsSourceProvider, SourceProvider};
pub use engine::{Engine, Mode, ParseRequest, Parsed};
pub use config::EngineConfig;

use std::path::PathBuf;

/// Result type alias for Polyparse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Polyparse operations
///
/// A syntax problem in the input is never an error: it shows up as
/// error-recovery nodes inside an otherwise returned tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Language already registered: {0}")]
    DuplicateLanguage(String),

    #[error("Unparseable pattern at {span}: {reason}")]
    UnparseablePattern { span: Span, reason: String },

    #[error("Source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Grammar error: {0}")]
    Grammar(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// The requested language id is not registered
    pub fn is_unknown_language(&self) -> bool {
        matches!(self, Error::UnknownLanguage(_))
    }

    /// The pattern fragment matched no permissive start rule
    pub fn is_unparseable_pattern(&self) -> bool {
        matches!(self, Error::UnparseablePattern { .. })
    }

    /// The source bytes provider failed
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Error::SourceNotFound { .. } | Error::PermissionDenied { .. } | Error::Io { .. }
        )
    }
}
