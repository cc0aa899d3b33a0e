//! Built-in grammar set
//!
//! The order of `FAMILIES`, and of the ids inside each family, is the order
//! `get_langs` reports. It is part of the public contract.

use super::{FragmentShape, Grammar, GrammarRegistry, PatternRule, WildcardStyle};
use crate::{Error, Result};
use std::sync::{Arc, OnceLock};

struct Family {
    ids: &'static [&'static str],
    grammar: fn() -> Result<Grammar>,
}

const FAMILIES: &[Family] = &[
    Family { ids: &["html", "xml"], grammar: html },
    Family { ids: &["python", "python2", "python3"], grammar: python },
    Family { ids: &["javascript"], grammar: javascript },
    Family { ids: &["rust"], grammar: rust },
    Family { ids: &["go"], grammar: go },
];

/// HTML grammar, also serving XML documents
pub fn html() -> Result<Grammar> {
    Ok(Grammar::new("html", tree_sitter_html::LANGUAGE.into(), "document")?
        .with_pattern_rule(PatternRule::bare("document", FragmentShape::Items)))
}

/// Python grammar, serving both Python 2 and Python 3 ids
pub fn python() -> Result<Grammar> {
    Ok(Grammar::new("python", tree_sitter_python::LANGUAGE.into(), "module")?
        .with_pattern_rule(PatternRule::bare("module", FragmentShape::Statements))
        .with_pattern_rule(PatternRule::new(
            "expression",
            FragmentShape::Expression,
            "(\n",
            "\n)",
        )))
}

pub fn javascript() -> Result<Grammar> {
    Ok(Grammar::new("javascript", tree_sitter_javascript::LANGUAGE.into(), "program")?
        .with_wildcard(WildcardStyle::Identifier)
        .with_pattern_rule(PatternRule::bare("program", FragmentShape::Statements))
        .with_pattern_rule(PatternRule::new(
            "class_body",
            FragmentShape::Members,
            "class __Pattern__ {\n",
            "\n}",
        ))
        .with_pattern_rule(PatternRule::new(
            "expression",
            FragmentShape::Expression,
            "(\n",
            "\n)",
        )))
}

pub fn rust() -> Result<Grammar> {
    Ok(Grammar::new("rust", tree_sitter_rust::LANGUAGE.into(), "source_file")?
        .with_wildcard(WildcardStyle::Identifier)
        .with_comment_kinds(&["line_comment", "block_comment"])
        .with_pattern_rule(PatternRule::bare("source_file", FragmentShape::Items))
        .with_pattern_rule(PatternRule::new(
            "block",
            FragmentShape::Statements,
            "fn __pattern__() {\n",
            "\n}",
        ))
        .with_pattern_rule(PatternRule::new(
            "impl_body",
            FragmentShape::Members,
            "impl __Pattern__ {\n",
            "\n}",
        ))
        .with_pattern_rule(PatternRule::new(
            "expression",
            FragmentShape::Expression,
            "const __PATTERN__: () = (\n",
            "\n);",
        )))
}

pub fn go() -> Result<Grammar> {
    Ok(Grammar::new("go", tree_sitter_go::LANGUAGE.into(), "source_file")?
        .with_wildcard(WildcardStyle::Identifier)
        .with_pattern_rule(PatternRule::new(
            "source_file",
            FragmentShape::Items,
            "package __pattern__\n",
            "\n",
        ))
        .with_pattern_rule(PatternRule::new(
            "block",
            FragmentShape::Statements,
            "package __pattern__\nfunc __pattern__() {\n",
            "\n}\n",
        ))
        .with_pattern_rule(PatternRule::new(
            "expression",
            FragmentShape::Expression,
            "package __pattern__\nvar __pattern__ = (\n",
            "\n)\n",
        )))
}

/// All built-in language ids, in declaration order
pub fn language_ids() -> Vec<&'static str> {
    FAMILIES.iter().flat_map(|f| f.ids.iter().copied()).collect()
}

/// Create a registry with every built-in grammar
pub fn default_registry() -> Result<GrammarRegistry> {
    registry_with(None)
}

/// Create a registry with the built-in grammars, optionally restricted to a
/// subset of ids. Ids keep declaration order whatever order `only` lists them in.
pub fn registry_with(only: Option<&[String]>) -> Result<GrammarRegistry> {
    if let Some(only) = only {
        let known = language_ids();
        if let Some(unknown) = only
            .iter()
            .find(|id| !known.contains(&crate::language::normalize(id).as_str()))
        {
            return Err(Error::UnknownLanguage(unknown.clone()));
        }
    }

    let mut registry = GrammarRegistry::new();
    for family in FAMILIES {
        let ids: Vec<&str> = family
            .ids
            .iter()
            .copied()
            .filter(|id| match only {
                Some(only) => only.iter().any(|o| crate::language::normalize(o) == *id),
                None => true,
            })
            .collect();
        if ids.is_empty() {
            continue;
        }
        registry.register_family(&ids, (family.grammar)()?)?;
    }
    Ok(registry)
}

static SHARED: OnceLock<std::result::Result<Arc<GrammarRegistry>, String>> = OnceLock::new();

/// Process-wide registry of every built-in grammar.
///
/// Built on first use; concurrent first callers wait for the one initialization.
pub fn shared_registry() -> Result<Arc<GrammarRegistry>> {
    SHARED
        .get_or_init(|| {
            tracing::debug!("Initializing built-in grammar registry");
            default_registry().map(Arc::new).map_err(|e| e.to_string())
        })
        .clone()
        .map_err(Error::Grammar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let registry = default_registry().unwrap();
        assert_eq!(
            registry.list_languages(),
            vec!["html", "xml", "python", "python2", "python3", "javascript", "rust", "go"]
        );
    }

    #[test]
    fn test_builtin_families() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.family("python").unwrap(), vec!["python", "python2", "python3"]);
        assert_eq!(registry.family("xml").unwrap(), vec!["html", "xml"]);
        assert_eq!(registry.family("go").unwrap(), vec!["go"]);
        assert_eq!(registry.grammars().len(), 5);
    }

    #[test]
    fn test_every_rule_wrapper_is_valid() {
        // Wrapping a fragment of the rule's shape must never introduce errors
        let samples: &[(&str, &str, &str)] = &[
            ("html", "document", "<p>hi</p>"),
            ("python", "module", "x = 1"),
            ("python", "expression", "a + b"),
            ("javascript", "program", "foo(1);"),
            ("javascript", "class_body", "bar() { return 1; }"),
            ("javascript", "expression", "a + b"),
            ("rust", "source_file", "fn f() {}"),
            ("rust", "block", "let x = 1;"),
            ("rust", "impl_body", "fn f(&self) {}"),
            ("rust", "expression", "a + b"),
            ("go", "source_file", "func f() {}"),
            ("go", "block", "x := 1"),
            ("go", "expression", "a + b"),
        ];
        let registry = default_registry().unwrap();
        for (lang, rule_name, fragment) in samples {
            let grammar = registry.resolve(lang).unwrap();
            let rule = grammar
                .pattern_rules()
                .iter()
                .find(|r| r.name == *rule_name)
                .unwrap();
            let (buffer, _) = rule.wrap(fragment.as_bytes());
            let mut parser = tree_sitter::Parser::new();
            parser.set_language(grammar.language()).unwrap();
            let tree = parser.parse(&buffer, None).unwrap();
            assert!(
                !tree.root_node().has_error(),
                "{}/{} wrapper broke {:?}",
                lang,
                rule_name,
                fragment
            );
        }
    }

    #[test]
    fn test_restricted_registry_keeps_declaration_order() {
        let only = vec!["xml".to_string(), "python3".to_string(), "HTML".to_string()];
        let registry = registry_with(Some(only.as_slice())).unwrap();
        let ids: Vec<String> = registry.list_languages().into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["html", "xml", "python3"]);
    }

    #[test]
    fn test_restricted_registry_rejects_unknown_ids() {
        let only = vec!["cobol".to_string()];
        let err = registry_with(Some(only.as_slice())).unwrap_err();
        assert!(err.is_unknown_language());
    }

    #[test]
    fn test_shared_registry_is_single() {
        let a = shared_registry().unwrap();
        let b = shared_registry().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
