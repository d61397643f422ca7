use super::{PResult, Parser, Rule, SyntaxNode};

impl Parser {
    /// `spinner ID { wedge "text" [width N] ... }`. The id may also be quoted.
    pub(super) fn spinner_def(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::SpinnerDef);
        self.expect_kw("spinner")?;
        b.token(self.expect_word_or_string("spinner id")?);
        self.block(&mut b, &["wedge"], Self::wedge)?;
        Ok(self.finish(b))
    }

    fn wedge(&mut self) -> PResult<SyntaxNode> {
        self.leaf(Rule::Wedge, |p, b| {
            p.expect_kw("wedge")?;
            b.token(p.expect_string()?);
            if p.at_kw("width") {
                b.node(p.keyword_then_number(Rule::Width, "width")?);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        lexer::tokenize,
        parser::{Rule, parse},
    };

    #[test]
    fn wedges_with_optional_width() {
        let src = r#"spinner "ambient-hall" {
            wedge "A clock ticks." width 3
            wedge 'Footsteps echo.'
        }"#;
        let (tree, errors) = parse(tokenize(src).expect("lex ok"));
        assert!(errors.is_empty(), "{errors:?}");
        let spinner = tree.root.nodes().next().expect("spinner");
        assert_eq!(spinner.tokens().next().and_then(|t| t.string_value()), Some("ambient-hall"));
        let wedges: Vec<_> = spinner.nodes().collect();
        assert_eq!(wedges.len(), 2);
        assert!(wedges[0].find(Rule::Width).is_some());
        assert!(wedges[1].find(Rule::Width).is_none());
    }
}
