//! Source grammars the built-in extractor understands.

use serde::{
    Deserialize,
    Serialize,
};

/// Grammar used to extract a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSyntax {
    /// `.js`, `.jsx`, `.mjs`, `.cjs`
    JavaScript,
    /// `.ts`
    TypeScript,
    /// `.tsx`
    Tsx,
    /// HTML and server-side template dialects.
    Html,
}

impl SourceSyntax {
    /// Tree-sitter grammar of this syntax.
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Html => tree_sitter_html::LANGUAGE.into(),
        }
    }

    /// Returns true for JavaScript and its dialects.
    #[must_use]
    pub const fn is_script(self) -> bool {
        !matches!(self, Self::Html)
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case(SourceSyntax::JavaScript)]
    #[case(SourceSyntax::TypeScript)]
    #[case(SourceSyntax::Tsx)]
    #[case(SourceSyntax::Html)]
    fn grammar_loads(#[case] syntax: SourceSyntax) {
        let mut parser = tree_sitter::Parser::new();

        assert!(parser.set_language(&syntax.tree_sitter_language()).is_ok());
    }

    #[rstest]
    fn deserializes_lowercase_names() {
        let syntax: SourceSyntax =
            serde_json::from_str("\"javascript\"").unwrap_or(SourceSyntax::Html);

        assert_eq!(syntax, SourceSyntax::JavaScript);
    }
}
