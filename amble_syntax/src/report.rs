//! Human-readable diagnostics: the message, the offending source line, and a caret.

use crate::{error::AstError, lint::Lint, span::{SourceMap, Span}};

/// Render an error found while parsing `source` (read from `path`).
pub fn render_error(path: &str, source: &str, err: &AstError) -> String {
    render(path, source, "error", &err.to_string(), err.span())
}

pub fn render_lint(path: &str, source: &str, lint: &Lint) -> String {
    render(path, source, "warning", &lint.message, lint.span)
}

/// ```text
/// world.amble:3:14: error: syntax error: expected string, found number 5 at 3:14
///   3 |     name 5
///     |          ^
/// ```
pub fn render(path: &str, source: &str, severity: &str, message: &str, span: Span) -> String {
    let map = SourceMap::new(source);
    let (line, column) = map.line_col(span.start);
    let text = map.line_snippet(line);
    let gutter = line.to_string();
    let pad = " ".repeat(gutter.len());
    let remaining = text.chars().count().saturating_sub(column - 1);
    let width = span.text(source).chars().take_while(|c| *c != '\n').count().clamp(1, remaining.max(1));
    format!(
        "{path}:{line}:{column}: {severity}: {message}\n {gutter} | {text}\n {pad} | {}{}",
        " ".repeat(column - 1),
        "^".repeat(width)
    )
}
