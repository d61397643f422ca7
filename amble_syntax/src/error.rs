//! Error taxonomy for the lexer, parser, and AST builder.

use std::fmt;

use thiserror::Error;

use crate::span::Span;

/// Tokenization failures. These abort lexing of the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A string literal has no closing delimiter; `span` points at the opening quote.
    #[error("unterminated string literal starting at {span}")]
    UnterminatedString { span: Span },
    /// Malformed UTF-8 or a control byte outside a string literal.
    #[error("invalid byte 0x{byte:02x} at {span}")]
    InvalidByte { byte: u8, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span } | LexError::InvalidByte { span, .. } => *span,
        }
    }
}

/// What went wrong at a syntax error site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("expected {}, found {found}", ExpectedSet(expected))]
    UnexpectedToken {
        expected: Vec<&'static str>,
        found: String,
    },
    #[error("expected {}, found end of input", ExpectedSet(expected))]
    UnexpectedEof { expected: Vec<&'static str> },
    #[error("malformed number '{text}'")]
    MalformedNumber { text: String },
    #[error("`if` blocks cannot be nested inside another `if` block")]
    NestedConditional,
    #[error("document contains no definitions")]
    EmptyDocument,
    /// Condition groups or schedule bodies opened more than `limit` levels deep.
    #[error("nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// A located syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {span}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The alternatives the parser would have accepted, if any.
    pub fn expected(&self) -> &[&'static str] {
        match &self.kind {
            SyntaxErrorKind::UnexpectedToken { expected, .. } | SyntaxErrorKind::UnexpectedEof { expected } => expected,
            _ => &[],
        }
    }
}

struct ExpectedSet<'a>(&'a [&'static str]);

impl fmt::Display for ExpectedSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [] => f.write_str("something else"),
            [one] => write!(f, "{one}"),
            [a, b] => write!(f, "{a} or {b}"),
            [rest @ .., last] => write!(f, "one of {}, or {last}", rest.join(", ")),
        }
    }
}

/// Shape violations found while folding the syntax tree into typed definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticShapeError {
    #[error("{what} is missing at {span}")]
    MissingField { what: &'static str, span: Span },
    #[error("{what} must contain at least one entry at {span}")]
    EmptyBlock { what: &'static str, span: Span },
    #[error("invalid {what} '{value}' at {span} (expected one of: {})", .expected.join(", "))]
    InvalidEnumValue {
        what: &'static str,
        value: String,
        expected: &'static [&'static str],
        span: Span,
    },
    #[error("{what} is given more than once at {span}")]
    DuplicateField { what: &'static str, span: Span },
    #[error("{what} out of range ({value}) at {span}")]
    OutOfRange { what: &'static str, value: i64, span: Span },
}

impl SemanticShapeError {
    pub fn span(&self) -> Span {
        match self {
            SemanticShapeError::MissingField { span, .. }
            | SemanticShapeError::EmptyBlock { span, .. }
            | SemanticShapeError::InvalidEnumValue { span, .. }
            | SemanticShapeError::DuplicateField { span, .. }
            | SemanticShapeError::OutOfRange { span, .. } => *span,
        }
    }
}

/// Any diagnostic produced while turning source text into a `SourceFile`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("shape error: {0}")]
    Shape(#[from] SemanticShapeError),
}

impl AstError {
    pub fn span(&self) -> Span {
        match self {
            AstError::Lex(e) => e.span(),
            AstError::Syntax(e) => e.span,
            AstError::Shape(e) => e.span(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_set_formatting() {
        let err = SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken {
                expected: vec!["name", "desc", "exit"],
                found: "'banana'".into(),
            },
            Span::new(10, 16, 2, 5),
        );
        assert_eq!(err.to_string(), "expected one of name, desc, or exit, found 'banana' at 2:5");

        let eof = SyntaxErrorKind::UnexpectedEof { expected: vec!["}"] };
        assert_eq!(eof.to_string(), "expected }, found end of input");
    }

    #[test]
    fn ast_error_wraps_and_reports_span() {
        let lex = LexError::UnterminatedString {
            span: Span::new(14, 20, 1, 15),
        };
        let err: AstError = lex.clone().into();
        assert_eq!(err.span(), lex.span());
        assert!(err.to_string().starts_with("lex error: unterminated string"));
    }
}
