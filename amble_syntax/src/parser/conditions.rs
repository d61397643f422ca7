use super::{PResult, Parser, Rule, SyntaxNode};
use crate::lexer::{Punct, Token};

/// Keywords that can begin a trigger condition.
pub(super) const CONDITION_STARTERS: &[&str] = &[
    "any",
    "all",
    "has",
    "missing",
    "flag",
    "with",
    "npc",
    "player",
    "container",
    "chance",
    "ambient",
    "in",
];

/// Where a condition sits. Inside `any(...)`/`all(...)` a comma may belong to
/// the enclosing group rather than to a room list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ListContext {
    Standalone,
    Grouped,
}

fn starts_condition(tok: &Token) -> bool {
    CONDITION_STARTERS.iter().any(|kw| tok.is_keyword(kw))
}

impl Parser {
    pub(super) fn condition(&mut self, ctx: ListContext) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::CondHasFlag);
        if self.at_any_kw(&["any", "all"]) {
            let group = self.expect_one_of(&["any", "all"])?;
            b.rule = if group.text == "any" {
                Rule::CondAny
            } else {
                Rule::CondAll
            };
            self.expect_punct(Punct::LParen)?;
            if !self.at_punct(Punct::RParen) {
                loop {
                    b.node(self.nested(|p| p.condition(ListContext::Grouped))?);
                    if !self.eat_punct(Punct::Comma) {
                        break;
                    }
                }
            }
            self.expect_punct(Punct::RParen)?;
        } else if self.eat_kw("has") {
            let what = self.expect_one_of(&["flag", "item", "visited"])?;
            b.rule = match what.text.as_str() {
                "flag" => Rule::CondHasFlag,
                "item" => Rule::CondHasItem,
                _ => {
                    self.expect_kw("room")?;
                    Rule::CondHasVisited
                },
            };
            b.token(self.expect_word("id")?);
        } else if self.eat_kw("missing") {
            let what = self.expect_one_of(&["flag", "item"])?;
            b.rule = if what.text == "flag" {
                Rule::CondMissingFlag
            } else {
                Rule::CondMissingItem
            };
            b.token(self.expect_word("id")?);
        } else if self.eat_kw("flag") {
            if self.eat_kw("in") {
                self.expect_kw("progress")?;
                b.rule = Rule::CondFlagInProgress;
            } else {
                self.expect_one_of(&["in", "complete"])?;
                b.rule = Rule::CondFlagComplete;
            }
            b.token(self.expect_word("flag name")?);
        } else if self.eat_kw("with") {
            self.expect_kw("npc")?;
            b.rule = Rule::CondWithNpc;
            b.token(self.expect_word("npc id")?);
        } else if self.eat_kw("npc") {
            if self.eat_kw("has") {
                self.expect_kw("item")?;
                b.rule = Rule::CondNpcHasItem;
                b.token(self.expect_word("npc id")?);
                b.token(self.expect_word("item id")?);
            } else {
                self.expect_one_of(&["has", "in"])?;
                self.expect_kw("state")?;
                b.rule = Rule::CondNpcInState;
                b.token(self.expect_word("npc id")?);
                b.node(self.state_ref()?);
            }
        } else if self.eat_kw("player") {
            self.expect_kw("in")?;
            self.expect_kw("room")?;
            b.rule = Rule::CondPlayerInRoom;
            b.token(self.expect_word("room id")?);
        } else if self.eat_kw("container") {
            b.rule = Rule::CondContainerHasItem;
            b.token(self.expect_word("container item id")?);
            self.expect_kw("has")?;
            self.expect_kw("item")?;
            b.token(self.expect_word("item id")?);
        } else if self.eat_kw("chance") {
            b.rule = Rule::CondChance;
            b.token(self.expect_number()?);
            self.expect_punct(Punct::Percent)?;
        } else if self.eat_kw("ambient") {
            b.rule = Rule::CondAmbient;
            b.token(self.expect_word("spinner id")?);
            if self.at_kw("in") && self.nth_is_kw(1, "rooms") {
                self.bump();
                self.bump();
                b.node(self.room_list(ctx)?);
            }
        } else if self.eat_kw("in") {
            self.expect_kw("rooms")?;
            b.rule = Rule::CondInRooms;
            b.node(self.room_list(ctx)?);
        } else {
            return Err(self.unexpected(CONDITION_STARTERS));
        }
        Ok(self.finish(b))
    }

    /// Unparenthesized `a, b, c` after `in rooms`.
    ///
    /// Standalone, every comma continues the list. Inside a group the list
    /// stops before a comma whose next token is not a word or starts a new
    /// condition, leaving that comma to the group.
    fn room_list(&mut self, ctx: ListContext) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::IdList);
        b.token(self.expect_word("room id")?);
        while self.at_punct(Punct::Comma) {
            if ctx == ListContext::Grouped
                && self.nth(1).is_none_or(|t| !t.is_word() || starts_condition(t))
            {
                break;
            }
            self.bump();
            b.token(self.expect_word("room id")?);
        }
        Ok(self.finish(b))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        lexer::tokenize,
        parser::{Rule, SyntaxNode, SyntaxTree, parse},
    };

    fn first_condition(tree: &SyntaxTree) -> &SyntaxNode {
        let trigger = tree.root.nodes().next().expect("trigger");
        let block = trigger.find(Rule::TriggerBlock).expect("block");
        let cond_block = block.find(Rule::CondBlock).expect("cond block");
        cond_block.nodes().next().expect("condition")
    }

    fn parse_condition_src(cond: &str) -> SyntaxTree {
        let src = format!("trigger \"t\" when always {{ if {cond} {{ do show \"x\" }} }}");
        let (tree, errors) = parse(tokenize(&src).expect("lex ok"));
        assert!(errors.is_empty(), "{cond}: {errors:?}");
        tree
    }

    fn room_texts(list: &SyntaxNode) -> Vec<String> {
        list.tokens().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn grouped_room_list_yields_to_next_condition() {
        let tree = parse_condition_src("any(ambient s1 in rooms r1, r2, has flag f)");
        let any = first_condition(&tree);
        assert_eq!(any.rule, Rule::CondAny);
        let members: Vec<_> = any.nodes().collect();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].rule, Rule::CondAmbient);
        let rooms = members[0].find(Rule::IdList).expect("room list");
        assert_eq!(room_texts(rooms), vec!["r1", "r2"]);
        assert_eq!(members[1].rule, Rule::CondHasFlag);
    }

    #[test]
    fn bare_in_rooms_inside_group() {
        let tree = parse_condition_src("all(in rooms a, b, c, in rooms d, missing item key)");
        let all = first_condition(&tree);
        let members: Vec<_> = all.nodes().collect();
        assert_eq!(members.len(), 3);
        assert_eq!(room_texts(members[0].find(Rule::IdList).expect("list")), vec!["a", "b", "c"]);
        assert_eq!(room_texts(members[1].find(Rule::IdList).expect("list")), vec!["d"]);
        assert_eq!(members[2].rule, Rule::CondMissingItem);
    }

    #[test]
    fn standalone_room_list_takes_every_comma() {
        let tree = parse_condition_src("in rooms hall, flag, has");
        let cond = first_condition(&tree);
        assert_eq!(cond.rule, Rule::CondInRooms);
        assert_eq!(
            room_texts(cond.find(Rule::IdList).expect("list")),
            vec!["hall", "flag", "has"]
        );
    }

    #[test]
    fn groups_nest() {
        let tree = parse_condition_src("any(all(has flag a, chance 25 %), any(with npc bob))");
        let any = first_condition(&tree);
        let inner: Vec<_> = any.nodes().map(|n| n.rule).collect();
        assert_eq!(inner, vec![Rule::CondAll, Rule::CondAny]);
    }

    #[test]
    fn every_atom_parses() {
        for cond in [
            "has flag f",
            "missing flag f",
            "has item i",
            "missing item i",
            "has visited room r",
            "flag in progress f",
            "flag complete f",
            "with npc n",
            "npc has item n i",
            "npc in state n happy",
            "npc in state n custom grumpy",
            "player in room r",
            "container box has item i",
            "chance 40 %",
            "ambient wind",
            "ambient wind in rooms a, b",
            "in rooms a",
        ] {
            parse_condition_src(cond);
        }
    }

    #[test]
    fn chance_needs_its_percent_sign() {
        let src = "trigger \"t\" when always { if chance 40 { do show \"x\" } }";
        let (_, errors) = parse(tokenize(src).expect("lex ok"));
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[0].expected(), &["%"]);
    }

    #[test]
    fn has_in_condition_position_is_a_keyword() {
        let src = "trigger \"t\" when always { if has { do show \"x\" } }";
        let (_, errors) = parse(tokenize(src).expect("lex ok"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].expected(), &["flag", "item", "visited"]);
    }
}
