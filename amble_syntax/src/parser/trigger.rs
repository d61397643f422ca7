use super::{PResult, Parser, Rule, SyntaxNode, conditions::ListContext};
use crate::{
    error::{SyntaxError, SyntaxErrorKind},
    lexer::Punct,
};

const TRIGGER_STMTS: &[&str] = &["do", "if"];
const EVENT_STARTERS: &[&str] = &[
    "always", "enter", "leave", "take", "drop", "open", "unlock", "look", "talk", "use", "act", "give", "insert", "eat",
    "drink", "inhale",
];

impl Parser {
    /// `trigger "name" [only once] [note "..."] when EVENT { ... }`
    pub(super) fn trigger_def(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::TriggerDef);
        self.expect_kw("trigger")?;
        b.token(self.expect_string()?);
        loop {
            if self.at_kw("only once") {
                b.node(self.leaf(Rule::OnlyOnce, |p, _| p.expect_kw("only once").map(drop))?);
            } else if self.at_kw("note") {
                b.node(self.keyword_then_string(Rule::Note, "note")?);
            } else {
                break;
            }
        }
        if !self.eat_kw("when") {
            return Err(self.unexpected(&["only once", "note", "when"]));
        }
        b.node(self.event()?);
        b.node(self.trigger_block()?);
        Ok(self.finish(b))
    }

    /// `{ (do ACTION | if COND { ... })* }`, shared by triggers and schedules.
    pub(super) fn trigger_block(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::TriggerBlock);
        self.block(&mut b, TRIGGER_STMTS, |p| {
            if p.at_kw("do") {
                p.do_stmt()
            } else {
                p.cond_block()
            }
        })?;
        Ok(self.finish(b))
    }

    fn do_stmt(&mut self) -> PResult<SyntaxNode> {
        self.leaf(Rule::DoStmt, |p, b| {
            p.expect_kw("do")?;
            b.node(p.action()?);
            Ok(())
        })
    }

    /// `if COND { do ... }`. Only `do` statements are allowed inside.
    fn cond_block(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::CondBlock);
        self.expect_kw("if")?;
        b.node(self.condition(ListContext::Standalone)?);
        self.expect_punct(Punct::LBrace)?;
        let depth = self.depth;
        loop {
            if self.depth < depth || self.eat_punct(Punct::RBrace) {
                break;
            }
            if self.at_end() {
                return Err(self.unexpected(&["}"]));
            }
            let stmt_start = self.pos;
            let result = if self.at_kw("do") {
                self.do_stmt()
            } else if self.at_kw("if") {
                Err(SyntaxError::new(SyntaxErrorKind::NestedConditional, self.current_span()))
            } else {
                Err(self.unexpected(&["do", "}"]))
            };
            match result {
                Ok(node) => b.node(node),
                Err(err) => self.recover(err, depth, &["do"], stmt_start)?,
            }
        }
        Ok(self.finish(b))
    }

    fn event(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::EvAlways);
        if !self.at_any_kw(EVENT_STARTERS) {
            return Err(self.unexpected(EVENT_STARTERS));
        }
        let Some(head) = self.bump() else {
            return Err(self.unexpected(EVENT_STARTERS));
        };
        let kw = head.text.as_str();
        match kw {
            "always" => {},
            "enter" | "leave" => {
                self.expect_kw("room")?;
                b.rule = if kw == "enter" {
                    Rule::EvEnterRoom
                } else {
                    Rule::EvLeaveRoom
                };
                b.token(self.expect_word("room id")?);
            },
            "take" => {
                self.expect_kw("item")?;
                b.rule = Rule::EvTakeItem;
                b.token(self.expect_word("item id")?);
                if self.eat_kw("from") {
                    self.expect_kw("npc")?;
                    b.rule = Rule::EvTakeFromNpc;
                    b.token(self.expect_word("npc id")?);
                }
            },
            "drop" | "open" | "unlock" => {
                self.expect_kw("item")?;
                b.rule = match kw {
                    "drop" => Rule::EvDropItem,
                    "open" => Rule::EvOpenItem,
                    _ => Rule::EvUnlockItem,
                };
                b.token(self.expect_word("item id")?);
            },
            "look" => {
                self.expect_kw("at")?;
                self.expect_kw("item")?;
                b.rule = Rule::EvLookAtItem;
                b.token(self.expect_word("item id")?);
            },
            "talk" => {
                self.expect_kw("to")?;
                self.expect_kw("npc")?;
                b.rule = Rule::EvTalkToNpc;
                b.token(self.expect_word("npc id")?);
            },
            "use" => {
                self.expect_kw("item")?;
                b.rule = Rule::EvUseItem;
                b.token(self.expect_word("item id")?);
                if self.eat_kw("on") {
                    self.expect_kw("item")?;
                    b.rule = Rule::EvUseItemOnItem;
                    b.token(self.expect_word("target item id")?);
                    self.expect_kw("interaction")?;
                    b.token(self.expect_word("interaction name")?);
                } else if self.eat_kw("ability") {
                    b.token(self.expect_word("ability name")?);
                }
            },
            "act" => {
                b.rule = Rule::EvActOnItem;
                b.token(self.expect_word("interaction name")?);
                self.expect_kw("on")?;
                self.expect_kw("item")?;
                b.token(self.expect_word("item id")?);
            },
            "give" => {
                self.expect_kw("item")?;
                b.rule = Rule::EvGiveToNpc;
                b.token(self.expect_word("item id")?);
                self.expect_kw("to")?;
                self.expect_kw("npc")?;
                b.token(self.expect_word("npc id")?);
            },
            "insert" => {
                self.expect_kw("item")?;
                b.rule = Rule::EvInsertItem;
                b.token(self.expect_word("item id")?);
                self.expect_kw("into")?;
                self.expect_kw("item")?;
                b.token(self.expect_word("container item id")?);
            },
            _ => {
                b.rule = Rule::EvIngest;
                b.token(head.clone());
                self.expect_kw("item")?;
                b.token(self.expect_word("item id")?);
            },
        }
        Ok(self.finish(b))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::SyntaxErrorKind,
        lexer::tokenize,
        parser::{Rule, SyntaxTree, parse},
    };

    fn event_rule(event: &str) -> Rule {
        let src = format!("trigger \"t\" when {event} {{ do show \"x\" }}");
        let (tree, errors) = parse(tokenize(&src).expect("lex ok"));
        assert!(errors.is_empty(), "{event}: {errors:?}");
        let trigger = tree.root.nodes().next().expect("trigger");
        trigger.nodes().next().expect("event").rule
    }

    fn parse_src(src: &str) -> (SyntaxTree, Vec<crate::error::SyntaxError>) {
        parse(tokenize(src).expect("lex ok"))
    }

    #[test]
    fn all_events() {
        let cases = [
            ("always", Rule::EvAlways),
            ("enter room hall", Rule::EvEnterRoom),
            ("leave room hall", Rule::EvLeaveRoom),
            ("take item lamp", Rule::EvTakeItem),
            ("take item lamp from npc bob", Rule::EvTakeFromNpc),
            ("drop item lamp", Rule::EvDropItem),
            ("open item chest", Rule::EvOpenItem),
            ("unlock item chest", Rule::EvUnlockItem),
            ("look at item lamp", Rule::EvLookAtItem),
            ("talk to npc bob", Rule::EvTalkToNpc),
            ("use item lamp", Rule::EvUseItem),
            ("use item lamp ability ignite", Rule::EvUseItem),
            ("use item knife on item rope interaction cut", Rule::EvUseItemOnItem),
            ("act burn on item paper", Rule::EvActOnItem),
            ("give item coin to npc bob", Rule::EvGiveToNpc),
            ("insert item coin into item slot", Rule::EvInsertItem),
            ("drink item potion", Rule::EvIngest),
        ];
        for (event, rule) in cases {
            assert_eq!(event_rule(event), rule, "{event}");
        }
    }

    #[test]
    fn modifiers_in_any_order() {
        let (tree, errors) = parse_src("trigger \"t\" note \"n1\" only once note \"n2\" when always { do show \"x\" }");
        assert!(errors.is_empty(), "{errors:?}");
        let trigger = tree.root.nodes().next().expect("trigger");
        let rules: Vec<_> = trigger.nodes().map(|n| n.rule).collect();
        assert_eq!(
            rules,
            vec![Rule::Note, Rule::OnlyOnce, Rule::Note, Rule::EvAlways, Rule::TriggerBlock]
        );
    }

    #[test]
    fn nested_if_is_rejected() {
        let src = r#"trigger "t" when always {
            if has flag a {
                if has flag b { do show "no" }
                do show "yes"
            }
        }"#;
        let (tree, errors) = parse_src(src);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[0].kind, SyntaxErrorKind::NestedConditional);
        assert_eq!(errors[0].span.line, 3);
        assert!(tree.root.children.is_empty());
    }

    #[test]
    fn missing_when_lists_modifiers() {
        let (_, errors) = parse_src("trigger \"t\" always { do show \"x\" }");
        assert_eq!(errors[0].expected(), &["only once", "note", "when"]);
    }
}
