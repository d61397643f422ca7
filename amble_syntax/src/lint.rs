//! Non-fatal checks run over the syntax tree after a clean parse.

use std::fmt;

use log::warn;
use serde::Serialize;

use crate::{
    config::ParseOptions,
    parser::{Rule, SyntaxNode, SyntaxTree},
    span::Span,
};

/// A warning about valid but suspicious source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lint {
    pub message: String,
    pub span: Span,
}

impl fmt::Display for Lint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning: {} at {}", self.message, self.span)
    }
}

/// Run every lint enabled in `options`.
pub fn check(tree: &SyntaxTree, options: &ParseOptions) -> Vec<Lint> {
    let mut lints = Vec::new();
    if options.lint_bare_in_rooms {
        bare_in_rooms(&tree.root, &mut lints);
    }
    for lint in &lints {
        warn!("{lint}");
    }
    lints
}

/// Inside `any(...)`/`all(...)`, flag `ambient S, in rooms ...` where the room
/// list was most likely meant for the ambient spinner.
fn bare_in_rooms(node: &SyntaxNode, out: &mut Vec<Lint>) {
    if matches!(node.rule, Rule::CondAny | Rule::CondAll) {
        let members: Vec<_> = node.nodes().collect();
        for pair in members.windows(2) {
            let [prev, next] = pair else { continue };
            if prev.rule == Rule::CondAmbient && prev.find(Rule::IdList).is_none() && next.rule == Rule::CondInRooms {
                out.push(Lint {
                    message: "bare `in rooms` follows an `ambient` without rooms; did you mean `ambient ... in rooms ...`?"
                        .to_string(),
                    span: next.span,
                });
            }
        }
    }
    for child in node.nodes() {
        bare_in_rooms(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::tokenize, parser::parse};

    fn lints_for(cond: &str, options: &ParseOptions) -> Vec<Lint> {
        let src = format!("trigger \"t\" when always {{ if {cond} {{ do show \"x\" }} }}");
        let (tree, errors) = parse(tokenize(&src).expect("lex ok"));
        assert!(errors.is_empty(), "{errors:?}");
        check(&tree, options)
    }

    #[test]
    fn flags_bare_in_rooms_after_ambient() {
        let lints = lints_for("all(ambient wind, in rooms cliff, beach)", &ParseOptions::default());
        assert_eq!(lints.len(), 1);
        assert_eq!(lints[0].span.line, 1);
    }

    #[test]
    fn ambient_with_its_own_rooms_is_fine() {
        let lints = lints_for("any(ambient wind in rooms cliff, in rooms beach)", &ParseOptions::default());
        assert!(lints.is_empty());
    }

    #[test]
    fn lint_can_be_disabled() {
        let options = ParseOptions {
            lint_bare_in_rooms: false,
            ..ParseOptions::default()
        };
        assert!(lints_for("all(ambient wind, in rooms cliff)", &options).is_empty());
    }
}
