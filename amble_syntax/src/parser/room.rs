use super::{PResult, Parser, Rule, SyntaxNode};
use crate::lexer::Punct;

const ROOM_STMTS: &[&str] = &["name", "desc", "description", "visited", "exit", "overlay"];
const EXIT_OPTS: &[&str] = &["required_items", "required_flags", "barred", "hidden", "locked"];
const OVERLAY_ATOMS: &[&str] = &["flag", "item", "player", "npc"];
const NPC_STATE_LINE_STARTERS: &[&str] = &["normal", "happy", "bored", "tired", "sad", "mad", "custom"];

impl Parser {
    /// `room ID { room_stmt* }`
    pub(super) fn room_def(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::RoomDef);
        self.expect_kw("room")?;
        b.token(self.expect_word("room id")?);
        self.block(&mut b, ROOM_STMTS, Self::room_stmt)?;
        Ok(self.finish(b))
    }

    fn room_stmt(&mut self) -> PResult<SyntaxNode> {
        if self.at_kw("name") {
            self.keyword_then_string(Rule::RoomName, "name")
        } else if self.at_any_kw(&["desc", "description"]) {
            self.description(Rule::RoomDesc)
        } else if self.at_kw("visited") {
            self.keyword_then_bool(Rule::RoomVisited, "visited")
        } else if self.at_kw("exit") {
            self.exit()
        } else if self.at_kw("overlay") {
            self.overlay()
        } else {
            Err(self.unexpected(ROOM_STMTS))
        }
    }

    /// `exit DIR -> ROOM [ { opt [,] ... } ]`
    fn exit(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::Exit);
        self.expect_kw("exit")?;
        b.token(self.expect_word_or_string("direction")?);
        self.expect_punct(Punct::Arrow)?;
        b.token(self.expect_word("destination room id")?);
        if self.at_punct(Punct::LBrace) {
            b.node(self.exit_block()?);
        }
        Ok(self.finish(b))
    }

    /// Exit options may be separated by commas, with one optional trailing comma.
    fn exit_block(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::ExitBlock);
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
            let result = if self.at_any_kw(EXIT_OPTS) {
                self.exit_opt()
            } else {
                let mut expected = EXIT_OPTS.to_vec();
                expected.push("}");
                Err(self.unexpected(&expected))
            };
            match result {
                Ok(node) => {
                    b.node(node);
                    self.eat_punct(Punct::Comma);
                },
                Err(err) => self.recover(err, depth, EXIT_OPTS, stmt_start)?,
            }
        }
        Ok(self.finish(b))
    }

    fn exit_opt(&mut self) -> PResult<SyntaxNode> {
        if self.at_kw("required_items") {
            self.leaf(Rule::ExitRequiredItems, |p, b| {
                p.expect_kw("required_items")?;
                b.node(p.paren_id_list("item id")?);
                Ok(())
            })
        } else if self.at_kw("required_flags") {
            self.leaf(Rule::ExitRequiredFlags, |p, b| {
                p.expect_kw("required_flags")?;
                b.node(p.paren_id_list("flag name")?);
                Ok(())
            })
        } else if self.at_kw("barred") {
            self.keyword_then_string(Rule::ExitBarred, "barred")
        } else if self.at_kw("hidden") {
            self.leaf(Rule::ExitHidden, |p, _| p.expect_kw("hidden").map(drop))
        } else if self.at_kw("locked") {
            self.leaf(Rule::ExitLocked, |p, _| p.expect_kw("locked").map(drop))
        } else {
            Err(self.unexpected(EXIT_OPTS))
        }
    }

    /// `overlay if ...`; the shape after `if` picks one of four overlay forms.
    fn overlay(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::OverlayConditional);
        self.expect_kw("overlay")?;
        self.expect_kw("if")?;
        let brace_at_2 = self.nth_is_punct(2, Punct::LBrace);
        if self.at_kw("flag") && brace_at_2 {
            b.rule = Rule::OverlayFlagBinary;
            self.bump();
            b.token(self.expect_word("flag name")?);
            self.block(&mut b, &["set", "unset"], |p| {
                if p.at_kw("set") {
                    p.keyword_then_string(Rule::OverlaySetText, "set")
                } else {
                    p.keyword_then_string(Rule::OverlayUnsetText, "unset")
                }
            })?;
        } else if self.at_any_kw(&["item", "npc"]) && brace_at_2 {
            b.rule = if self.at_kw("item") {
                Rule::OverlayItemPresence
            } else {
                Rule::OverlayNpcPresence
            };
            self.bump();
            b.token(self.expect_word("id")?);
            self.block(&mut b, &["present", "absent"], |p| {
                if p.at_kw("present") {
                    p.keyword_then_string(Rule::OverlayPresentText, "present")
                } else {
                    p.keyword_then_string(Rule::OverlayAbsentText, "absent")
                }
            })?;
        } else if self.at_kw("npc") && self.nth_is_kw(2, "here") && self.nth_is_punct(3, Punct::LBrace) {
            b.rule = Rule::OverlayNpcStates;
            self.bump();
            b.token(self.expect_word("npc id")?);
            self.expect_kw("here")?;
            self.block(&mut b, NPC_STATE_LINE_STARTERS, |p| {
                p.leaf(Rule::OverlayStateLine, |p, b| {
                    b.node(p.state_ref()?);
                    b.token(p.expect_string()?);
                    Ok(())
                })
            })?;
        } else {
            let parenthesized = self.eat_punct(Punct::LParen);
            loop {
                b.node(self.overlay_atom()?);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
            if parenthesized {
                self.expect_punct(Punct::RParen)?;
            }
            self.block(&mut b, &["text"], |p| p.keyword_then_string(Rule::OverlayText, "text"))?;
        }
        Ok(self.finish(b))
    }

    fn overlay_atom(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::OvFlagSet);
        if self.eat_kw("flag") {
            let which = self.expect_one_of(&["set", "unset", "complete"])?;
            b.rule = match which.text.as_str() {
                "set" => Rule::OvFlagSet,
                "unset" => Rule::OvFlagUnset,
                _ => Rule::OvFlagComplete,
            };
            b.token(self.expect_word("flag name")?);
        } else if self.eat_kw("item") {
            if self.eat_kw("in") {
                self.expect_kw("room")?;
                b.rule = Rule::OvItemInRoom;
                b.token(self.expect_word("item id")?);
                b.token(self.expect_word("room id")?);
            } else {
                let which = self.expect_one_of(&["present", "absent", "in"])?;
                b.rule = if which.text == "present" {
                    Rule::OvItemPresent
                } else {
                    Rule::OvItemAbsent
                };
                b.token(self.expect_word("item id")?);
            }
        } else if self.eat_kw("player") {
            let which = self.expect_one_of(&["has", "missing"])?;
            self.expect_kw("item")?;
            b.rule = if which.text == "has" {
                Rule::OvPlayerHasItem
            } else {
                Rule::OvPlayerMissingItem
            };
            b.token(self.expect_word("item id")?);
        } else if self.eat_kw("npc") {
            if self.eat_kw("in") {
                self.expect_kw("state")?;
                b.rule = Rule::OvNpcInState;
                b.token(self.expect_word("npc id")?);
                b.node(self.state_ref()?);
            } else {
                let which = self.expect_one_of(&["present", "absent", "in"])?;
                b.rule = if which.text == "present" {
                    Rule::OvNpcPresent
                } else {
                    Rule::OvNpcAbsent
                };
                b.token(self.expect_word("npc id")?);
            }
        } else {
            return Err(self.unexpected(OVERLAY_ATOMS));
        }
        Ok(self.finish(b))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::SyntaxError,
        lexer::tokenize,
        parser::{Rule, SyntaxTree, parse},
    };

    fn parse_src(src: &str) -> (SyntaxTree, Vec<SyntaxError>) {
        parse(tokenize(src).expect("lex ok"))
    }

    fn stmt_rules(tree: &SyntaxTree) -> Vec<Rule> {
        tree.root
            .nodes()
            .next()
            .expect("one definition")
            .nodes()
            .map(|n| n.rule)
            .collect()
    }

    #[test]
    fn exit_block_accepts_commas_and_trailing_comma() {
        let src = r#"room a {
            exit north -> b { locked, required_items (key), barred "Locked.", }
            exit "down the hatch" -> c
        }"#;
        let (tree, errors) = parse_src(src);
        assert!(errors.is_empty(), "{errors:?}");
        let room = tree.root.nodes().next().expect("room");
        let exit = room.find(Rule::Exit).expect("exit");
        let opts = exit.find(Rule::ExitBlock).expect("exit block");
        let rules: Vec<_> = opts.nodes().map(|n| n.rule).collect();
        assert_eq!(rules, vec![Rule::ExitLocked, Rule::ExitRequiredItems, Rule::ExitBarred]);
    }

    #[test]
    fn double_trailing_comma_is_rejected() {
        let (_, errors) = parse_src("room a { exit n -> b { hidden,, } }");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn overlay_forms_are_distinguished() {
        let src = r#"room a {
            overlay if flag set { set "s" unset "u" }
            overlay if flag set lamp_lit { text "lit" }
            overlay if item lamp { present "here" absent "gone" }
            overlay if npc guard here { happy "smiles" custom(angry) "scowls" }
            overlay if npc guard { present "p" absent "a" }
            overlay if (item present lamp, npc in state guard custom angry) { text "t" }
            overlay if player missing item key, item in room lamp cellar { text "t" }
        }"#;
        let (tree, errors) = parse_src(src);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            stmt_rules(&tree),
            vec![
                Rule::OverlayFlagBinary,
                Rule::OverlayConditional,
                Rule::OverlayItemPresence,
                Rule::OverlayNpcStates,
                Rule::OverlayNpcPresence,
                Rule::OverlayConditional,
                Rule::OverlayConditional,
            ]
        );
    }

    #[test]
    fn keywords_work_as_room_ids() {
        let (tree, errors) = parse_src("room has { exit in -> room }");
        assert!(errors.is_empty(), "{errors:?}");
        let room = tree.root.nodes().next().expect("room");
        assert_eq!(room.tokens().next().expect("id").text, "has");
    }
}
