use super::{PResult, Parser, Rule, SyntaxNode};
use crate::lexer::Punct;

const NPC_STMTS: &[&str] = &["name", "desc", "description", "location", "state", "movement", "dialogue"];

impl Parser {
    /// `npc ID { npc_stmt+ }`
    pub(super) fn npc_def(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::NpcDef);
        self.expect_kw("npc")?;
        b.token(self.expect_word("npc id")?);
        self.block(&mut b, NPC_STMTS, Self::npc_stmt)?;
        Ok(self.finish(b))
    }

    fn npc_stmt(&mut self) -> PResult<SyntaxNode> {
        if self.at_kw("name") {
            self.keyword_then_string(Rule::NpcName, "name")
        } else if self.at_any_kw(&["desc", "description"]) {
            self.description(Rule::NpcDesc)
        } else if self.at_kw("location") {
            let mut b = self.start(Rule::LocRoom);
            self.expect_kw("location")?;
            if self.eat_kw("nowhere") {
                b.rule = Rule::LocNowhere;
                b.token(self.expect_string()?);
            } else {
                self.expect_one_of(&["room", "nowhere"])?;
                b.token(self.expect_word("room id")?);
            }
            Ok(self.finish(b))
        } else if self.at_kw("state") {
            self.leaf(Rule::NpcState, |p, b| {
                p.expect_kw("state")?;
                b.node(p.state_ref()?);
                Ok(())
            })
        } else if self.at_kw("movement") {
            self.movement()
        } else if self.at_kw("dialogue") {
            self.dialogue()
        } else {
            Err(self.unexpected(NPC_STMTS))
        }
    }

    /// `movement route|random rooms (a, b) [timing T] [active BOOL] [loop BOOL]`
    fn movement(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::NpcMovement);
        self.expect_kw("movement")?;
        b.token(self.expect_one_of(&["route", "random"])?);
        self.expect_kw("rooms")?;
        b.node(self.paren_id_list("room id")?);
        loop {
            if self.at_kw("timing") {
                b.node(self.leaf(Rule::MovementTiming, |p, b| {
                    p.expect_kw("timing")?;
                    b.token(p.expect_word("timing tag")?);
                    Ok(())
                })?);
            } else if self.at_kw("active") {
                b.node(self.keyword_then_bool(Rule::MovementActive, "active")?);
            } else if self.at_kw("loop") {
                b.node(self.keyword_then_bool(Rule::MovementLoop, "loop")?);
            } else {
                break;
            }
        }
        Ok(self.finish(b))
    }

    /// `dialogue STATE { "line" ... }`
    fn dialogue(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::Dialogue);
        self.expect_kw("dialogue")?;
        b.node(self.state_ref()?);
        self.expect_punct(Punct::LBrace)?;
        while !self.eat_punct(Punct::RBrace) {
            if self.at_end() {
                return Err(self.unexpected(&["string", "}"]));
            }
            let line = self.expect_where(&["string", "}"], |t| t.string_value().is_some())?;
            b.token(line);
        }
        Ok(self.finish(b))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        lexer::tokenize,
        parser::{Rule, parse},
    };

    #[test]
    fn movement_options_in_any_order() {
        let src = r#"npc robot {
            movement route rooms (lab, hall, dock) loop true timing every_3_turns active false
        }"#;
        let (tree, errors) = parse(tokenize(src).expect("lex ok"));
        assert!(errors.is_empty(), "{errors:?}");
        let npc = tree.root.nodes().next().expect("npc");
        let movement = npc.find(Rule::NpcMovement).expect("movement");
        let opts: Vec<_> = movement.nodes().map(|n| n.rule).collect();
        assert_eq!(
            opts,
            vec![Rule::IdList, Rule::MovementLoop, Rule::MovementTiming, Rule::MovementActive]
        );
    }

    #[test]
    fn dialogue_rejects_non_strings() {
        let src = "npc a { dialogue happy { \"hi\" there } }";
        let (_, errors) = parse(tokenize(src).expect("lex ok"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].expected(), &["string", "}"]);
    }
}
