//! amble_syntax: lexer, parser and typed AST for the Amble world DSL.
//!
//! Source text goes through three stages, each usable on its own:
//! - [`lexer::tokenize`] turns text into classified tokens (trivia included).
//! - [`parser::parse`] builds a generic [`parser::SyntaxTree`] and collects syntax errors.
//! - [`builder::build`] folds the tree into the typed [`ast::SourceFile`] and checks
//!   block cardinality, closed word sets and numeric ranges.
//!
//! [`parse_source`] runs the whole pipeline:
//!
//! ```
//! let outcome = amble_syntax::parse_source(r#"room kitchen { name "Kitchen" desc "A cozy room." }"#);
//! assert!(outcome.is_ok());
//! let file = outcome.file.expect("parsed");
//! assert_eq!(file.rooms().next().map(|r| r.id.as_str()), Some("kitchen"));
//! ```
//!
//! Identifiers are never resolved against definitions here; a trigger may
//! name a room that does not exist and still produce a valid AST.

pub mod ast;
pub mod builder;
pub mod config;
pub mod error;
pub mod lexer;
pub mod lint;
pub mod parser;
pub mod report;
pub mod span;

pub use ast::SourceFile;
pub use config::{ParseOptions, Recovery};
pub use error::{AstError, LexError, SemanticShapeError, SyntaxError, SyntaxErrorKind};
pub use lint::Lint;
pub use span::Span;

use log::debug;

/// Everything one pass over a document produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// The typed document. `None` when lexing failed or the parse was aborted
    /// before any definition survived; otherwise it holds every definition
    /// that parsed and built cleanly.
    pub file: Option<SourceFile>,
    /// Lex, syntax and shape errors in the order they were found.
    pub errors: Vec<AstError>,
    pub warnings: Vec<Lint>,
}

impl ParseOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.file.is_some()
    }

    /// The document if there were no errors, otherwise the first error.
    ///
    /// # Errors
    /// Returns the first entry of [`ParseOutcome::errors`] when there is one.
    pub fn into_result(self) -> Result<SourceFile, AstError> {
        match (self.file, self.errors.into_iter().next()) {
            (_, Some(err)) => Err(err),
            (Some(file), None) => Ok(file),
            (None, None) => Ok(SourceFile::default()),
        }
    }
}

/// Parse `src` with default options.
pub fn parse_source(src: &str) -> ParseOutcome {
    parse_source_with(src, &ParseOptions::default())
}

/// Run lexer, parser, lint and builder over `src`.
///
/// `options` picks the recovery mode, caps syntax errors and nesting depth,
/// and toggles the lint. Errors never panic or abort the call; they are
/// returned in [`ParseOutcome::errors`] next to whatever definitions survived.
pub fn parse_source_with(src: &str, options: &ParseOptions) -> ParseOutcome {
    let tokens = match lexer::tokenize(src) {
        Ok(tokens) => tokens,
        Err(err) => {
            debug!("lexing failed: {err}");
            return ParseOutcome {
                file: None,
                errors: vec![err.into()],
                warnings: Vec::new(),
            };
        },
    };
    let (tree, syntax_errors) = parser::parse_with(tokens, options);
    let warnings = if syntax_errors.is_empty() {
        lint::check(&tree, options)
    } else {
        Vec::new()
    };
    let (file, shape_errors) = builder::build_with(&tree, options);
    let mut errors: Vec<AstError> = syntax_errors.into_iter().map(AstError::from).collect();
    errors.extend(shape_errors.into_iter().map(AstError::from));
    let file = (!file.definitions.is_empty() || errors.is_empty()).then_some(file);
    ParseOutcome { file, errors, warnings }
}

/// Parse a whole document, failing on the first error of any kind.
///
/// # Errors
/// Returns the first lex, syntax or shape error. Syntax recovery is off, so
/// at most one syntax error is ever found.
pub fn parse_program(src: &str) -> Result<SourceFile, AstError> {
    parse_source_with(src, &ParseOptions::strict()).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_short_circuits() {
        let outcome = parse_source("room x { name \"oops }");
        assert!(outcome.file.is_none());
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(
            outcome.errors[0],
            AstError::Lex(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn partial_file_survives_errors() {
        let outcome = parse_source(r#"room a { name 5 } room b { name "B" }"#);
        assert_eq!(outcome.errors.len(), 1);
        let file = outcome.file.expect("partial file");
        assert_eq!(file.rooms().count(), 1);
    }

    #[test]
    fn parse_program_returns_first_error() {
        let err = parse_program("npc ghost { }").expect_err("empty npc block");
        assert!(matches!(err, AstError::Shape(SemanticShapeError::EmptyBlock { .. })));
    }

    #[test]
    fn warnings_do_not_fail_the_parse() {
        let outcome = parse_source(
            r#"trigger "t" when always { if all(ambient wind, in rooms cliff) { do spinner message wind } }"#,
        );
        assert!(outcome.is_ok(), "{:?}", outcome.errors);
        assert_eq!(outcome.warnings.len(), 1);
    }
}
