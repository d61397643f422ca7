use super::{PResult, Parser, Rule, SyntaxNode, conditions::ListContext, tree::NodeBuilder};

const ACTION_STARTERS: &[&str] = &[
    "show", "add", "remove", "reset", "advance", "replace", "spawn", "despawn", "award", "lock", "unlock", "reveal",
    "push", "set", "npc", "deny", "restrict", "give", "spinner", "modify", "schedule",
];
const PATCH_STMTS: &[&str] = &[
    "name",
    "desc",
    "description",
    "text",
    "portable",
    "restricted",
    "container",
    "add",
    "remove",
];

impl Parser {
    /// A single action following `do`.
    pub(super) fn action(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::ActShow);
        if !self.at_any_kw(ACTION_STARTERS) {
            return Err(self.unexpected(ACTION_STARTERS));
        }
        let Some(head) = self.bump() else {
            return Err(self.unexpected(ACTION_STARTERS));
        };
        match head.text.as_str() {
            "show" => {
                b.token(self.expect_string()?);
            },
            "add" => {
                if self.eat_kw("flag") {
                    b.rule = Rule::ActAddFlag;
                    b.token(self.expect_word("flag name")?);
                } else if self.eat_kw("seq") {
                    self.expect_kw("flag")?;
                    b.rule = Rule::ActAddSeqFlag;
                    b.token(self.expect_word("flag name")?);
                    if self.at_kw("limit") {
                        b.node(self.keyword_then_number(Rule::Limit, "limit")?);
                    }
                } else if self.eat_kw("wedge") {
                    b.rule = Rule::ActAddWedge;
                    b.token(self.expect_string()?);
                    if self.at_kw("width") {
                        b.node(self.keyword_then_number(Rule::Width, "width")?);
                    }
                    self.expect_kw("spinner")?;
                    b.token(self.expect_word("spinner id")?);
                } else {
                    return Err(self.unexpected(&["flag", "seq", "wedge"]));
                }
            },
            kw @ ("remove" | "reset" | "advance") => {
                self.expect_kw("flag")?;
                b.rule = match kw {
                    "remove" => Rule::ActRemoveFlag,
                    "reset" => Rule::ActResetFlag,
                    _ => Rule::ActAdvanceFlag,
                };
                b.token(self.expect_word("flag name")?);
            },
            "replace" => {
                b.rule = if self.eat_kw("drop") {
                    Rule::ActReplaceDropItem
                } else {
                    Rule::ActReplaceItem
                };
                self.expect_kw("item")?;
                b.token(self.expect_word("item id")?);
                self.expect_kw("with")?;
                b.token(self.expect_word("replacement item id")?);
            },
            "spawn" => self.spawn(&mut b)?,
            "despawn" => {
                let what = self.expect_one_of(&["item", "npc"])?;
                b.rule = if what.text == "item" {
                    Rule::ActDespawnItem
                } else {
                    Rule::ActDespawnNpc
                };
                b.token(self.expect_word("id")?);
            },
            "award" => {
                self.expect_kw("points")?;
                b.rule = Rule::ActAwardPoints;
                b.token(self.expect_number()?);
                if self.at_kw("reason") {
                    b.node(self.keyword_then_string(Rule::Reason, "reason")?);
                }
            },
            kw @ ("lock" | "unlock") => {
                let locking = kw == "lock";
                let what = self.expect_one_of(&["item", "exit"])?;
                if what.text == "item" {
                    b.rule = if locking { Rule::ActLockItem } else { Rule::ActUnlockItem };
                    b.token(self.expect_word("item id")?);
                } else {
                    b.rule = if locking { Rule::ActLockExit } else { Rule::ActUnlockExit };
                    self.expect_kw("from")?;
                    b.token(self.expect_word("room id")?);
                    self.expect_kw("direction")?;
                    b.token(self.expect_word_or_string("direction")?);
                }
            },
            "reveal" => {
                b.rule = Rule::ActRevealExit;
                self.expect_kw("exit")?;
                self.expect_kw("from")?;
                b.token(self.expect_word("room id")?);
                self.expect_kw("to")?;
                b.token(self.expect_word("room id")?);
                self.expect_kw("direction")?;
                b.token(self.expect_word_or_string("direction")?);
            },
            "push" => {
                b.rule = Rule::ActPushPlayer;
                self.expect_kw("player")?;
                self.expect_kw("to")?;
                b.token(self.expect_word("room id")?);
            },
            "set" => self.set_action(&mut b)?,
            "npc" => {
                let what = self.expect_one_of(&["says", "random", "refuse"])?;
                match what.text.as_str() {
                    "says" => {
                        b.rule = Rule::ActNpcSays;
                        b.token(self.expect_word("npc id")?);
                        b.token(self.expect_string()?);
                    },
                    "random" => {
                        self.expect_kw("dialogue")?;
                        b.rule = Rule::ActNpcRandomDialogue;
                        b.token(self.expect_word("npc id")?);
                    },
                    _ => {
                        self.expect_kw("item")?;
                        b.rule = Rule::ActNpcRefuseItem;
                        b.token(self.expect_word("npc id")?);
                        b.token(self.expect_string()?);
                    },
                }
            },
            "deny" => {
                self.expect_kw("read")?;
                b.rule = Rule::ActDenyRead;
                b.token(self.expect_string()?);
            },
            "restrict" => {
                self.expect_kw("item")?;
                b.rule = Rule::ActRestrictItem;
                b.token(self.expect_word("item id")?);
            },
            "give" => {
                b.rule = Rule::ActGiveItemToPlayer;
                self.expect_kw("item")?;
                b.token(self.expect_word("item id")?);
                self.expect_kw("to")?;
                self.expect_kw("player")?;
                self.expect_kw("from")?;
                self.expect_kw("npc")?;
                b.token(self.expect_word("npc id")?);
            },
            "spinner" => {
                self.expect_kw("message")?;
                b.rule = Rule::ActSpinnerMessage;
                b.token(self.expect_word("spinner id")?);
            },
            "modify" => {
                self.expect_kw("item")?;
                b.rule = Rule::ActModifyItem;
                b.token(self.expect_word("item id")?);
                self.block(&mut b, PATCH_STMTS, Self::patch_stmt)?;
            },
            _ => self.schedule(&mut b)?,
        }
        Ok(self.finish(b))
    }

    fn spawn(&mut self, b: &mut NodeBuilder) -> PResult<()> {
        if self.eat_kw("npc") {
            b.rule = Rule::ActSpawnNpc;
            b.token(self.expect_word("npc id")?);
            self.expect_kw("into")?;
            self.expect_kw("room")?;
            b.token(self.expect_word("room id")?);
            return Ok(());
        }
        self.expect_one_of(&["item", "npc"])?;
        b.token(self.expect_word("item id")?);
        if self.eat_kw("into") {
            let target = self.expect_one_of(&["room", "container"])?;
            b.rule = if target.text == "room" {
                Rule::ActSpawnItemRoom
            } else {
                Rule::ActSpawnItemContainer
            };
            b.token(self.expect_word("id")?);
        } else if self.eat_kw("in") {
            let target = self.expect_one_of(&["container", "inventory", "current"])?;
            match target.text.as_str() {
                "container" => {
                    b.rule = Rule::ActSpawnItemContainer;
                    b.token(self.expect_word("container item id")?);
                },
                "inventory" => b.rule = Rule::ActSpawnItemInventory,
                _ => {
                    self.expect_kw("room")?;
                    b.rule = Rule::ActSpawnItemCurrentRoom;
                },
            }
        } else {
            return Err(self.unexpected(&["into", "in"]));
        }
        Ok(())
    }

    fn set_action(&mut self, b: &mut NodeBuilder) -> PResult<()> {
        let what = self.expect_one_of(&["item", "npc", "barred", "container"])?;
        match what.text.as_str() {
            "item" => {
                self.expect_kw("description")?;
                b.rule = Rule::ActSetItemDesc;
                b.token(self.expect_word("item id")?);
                b.token(self.expect_string()?);
            },
            "npc" => {
                let field = self.expect_one_of(&["active", "state"])?;
                b.token(self.expect_word("npc id")?);
                if field.text == "active" {
                    b.rule = Rule::ActSetNpcActive;
                    b.token(self.expect_bool()?);
                } else {
                    b.rule = Rule::ActSetNpcState;
                    b.node(self.state_ref()?);
                }
            },
            "barred" => {
                self.expect_kw("message")?;
                self.expect_kw("from")?;
                b.rule = Rule::ActSetBarredMessage;
                b.token(self.expect_word("room id")?);
                self.expect_kw("to")?;
                b.token(self.expect_word("room id")?);
                b.token(self.expect_string()?);
            },
            _ => {
                self.expect_kw("state")?;
                b.rule = Rule::ActSetContainerState;
                b.token(self.expect_word("item id")?);
                b.token(self.expect_word("container state")?);
            },
        }
        Ok(())
    }

    /// `schedule in|on N [if COND [onFalse POLICY]] [note STR] { ... }`
    fn schedule(&mut self, b: &mut NodeBuilder) -> PResult<()> {
        b.rule = Rule::ActSchedule;
        b.token(self.expect_one_of(&["in", "on"])?);
        b.token(self.expect_number()?);
        if self.eat_kw("if") {
            b.rule = Rule::ActScheduleIf;
            b.node(self.condition(ListContext::Standalone)?);
            if self.at_kw("onFalse") {
                b.node(self.on_false()?);
            }
        }
        if self.at_kw("note") {
            b.node(self.keyword_then_string(Rule::Note, "note")?);
        }
        b.node(self.nested(Self::trigger_block)?);
        Ok(())
    }

    fn on_false(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::OnFalseCancel);
        self.expect_kw("onFalse")?;
        let policy = self.expect_one_of(&["cancel", "retryNextTurn", "retryAfter"])?;
        match policy.text.as_str() {
            "cancel" => {},
            "retryNextTurn" => b.rule = Rule::OnFalseRetryNextTurn,
            _ => {
                b.rule = Rule::OnFalseRetryAfter;
                b.token(self.expect_number()?);
            },
        }
        Ok(self.finish(b))
    }

    fn patch_stmt(&mut self) -> PResult<SyntaxNode> {
        if self.at_kw("name") {
            self.keyword_then_string(Rule::PatchName, "name")
        } else if self.at_any_kw(&["desc", "description"]) {
            self.description(Rule::PatchDesc)
        } else if self.at_kw("text") {
            self.keyword_then_string(Rule::PatchText, "text")
        } else if self.at_kw("portable") {
            self.keyword_then_bool(Rule::PatchPortable, "portable")
        } else if self.at_kw("restricted") {
            self.keyword_then_bool(Rule::PatchRestricted, "restricted")
        } else if self.at_kw("container") {
            self.leaf(Rule::PatchContainerState, |p, b| {
                p.expect_kw("container")?;
                p.expect_kw("state")?;
                b.token(p.expect_word("container state")?);
                Ok(())
            })
        } else {
            let mut b = self.start(Rule::PatchAddAbility);
            if self.expect_one_of(&["add", "remove"])?.text == "remove" {
                b.rule = Rule::PatchRemoveAbility;
            }
            b.node(self.ability()?);
            Ok(self.finish(b))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        lexer::tokenize,
        parser::{Rule, SyntaxNode, SyntaxTree, parse},
    };

    fn parse_actions(actions: &str) -> SyntaxTree {
        let src = format!("trigger \"t\" when always {{ {actions} }}");
        let (tree, errors) = parse(tokenize(&src).expect("lex ok"));
        assert!(errors.is_empty(), "{actions}: {errors:?}");
        tree
    }

    fn action_nodes(tree: &SyntaxTree) -> Vec<&SyntaxNode> {
        let trigger = tree.root.nodes().next().expect("trigger");
        let block = trigger.find(Rule::TriggerBlock).expect("block");
        block
            .nodes()
            .map(|stmt| stmt.nodes().next().expect("action"))
            .collect()
    }

    fn action_rule(action: &str) -> Rule {
        let tree = parse_actions(&format!("do {action}"));
        action_nodes(&tree)[0].rule
    }

    #[test]
    fn every_action_form() {
        let cases = [
            ("show \"hi\"", Rule::ActShow),
            ("add flag f", Rule::ActAddFlag),
            ("add seq flag f limit 3", Rule::ActAddSeqFlag),
            ("add wedge \"gust\" width 2 spinner wind", Rule::ActAddWedge),
            ("remove flag f", Rule::ActRemoveFlag),
            ("reset flag f", Rule::ActResetFlag),
            ("advance flag f", Rule::ActAdvanceFlag),
            ("replace item a with b", Rule::ActReplaceItem),
            ("replace drop item a with b", Rule::ActReplaceDropItem),
            ("spawn item a into room r", Rule::ActSpawnItemRoom),
            ("spawn item a into container box", Rule::ActSpawnItemContainer),
            ("spawn item a in container box", Rule::ActSpawnItemContainer),
            ("spawn item a in inventory", Rule::ActSpawnItemInventory),
            ("spawn item a in current room", Rule::ActSpawnItemCurrentRoom),
            ("spawn npc bob into room r", Rule::ActSpawnNpc),
            ("despawn item a", Rule::ActDespawnItem),
            ("despawn npc bob", Rule::ActDespawnNpc),
            ("award points -5 reason \"oops\"", Rule::ActAwardPoints),
            ("lock item door", Rule::ActLockItem),
            ("unlock item door", Rule::ActUnlockItem),
            ("lock exit from hall direction north", Rule::ActLockExit),
            ("unlock exit from hall direction \"up the stairs\"", Rule::ActUnlockExit),
            ("reveal exit from hall to attic direction up", Rule::ActRevealExit),
            ("push player to cellar", Rule::ActPushPlayer),
            ("set item description lamp \"Lit.\"", Rule::ActSetItemDesc),
            ("npc says bob \"Hello\"", Rule::ActNpcSays),
            ("npc random dialogue bob", Rule::ActNpcRandomDialogue),
            ("npc refuse item bob \"No thanks\"", Rule::ActNpcRefuseItem),
            ("set npc active bob false", Rule::ActSetNpcActive),
            ("set npc state bob custom(grumpy)", Rule::ActSetNpcState),
            ("deny read \"Too dark.\"", Rule::ActDenyRead),
            ("restrict item lamp", Rule::ActRestrictItem),
            ("give item coin to player from npc bob", Rule::ActGiveItemToPlayer),
            ("set barred message from hall to vault \"Sealed.\"", Rule::ActSetBarredMessage),
            ("set container state box open", Rule::ActSetContainerState),
            ("spinner message wind", Rule::ActSpinnerMessage),
        ];
        for (action, rule) in cases {
            assert_eq!(action_rule(action), rule, "{action}");
        }
    }

    #[test]
    fn modify_item_patch_block() {
        let tree = parse_actions(
            r#"do modify item lamp {
                name "Lit Lamp"
                description "It glows."
                portable false
                container state off
                add ability ignite
                remove ability read (book)
            }"#,
        );
        let modify = action_nodes(&tree)[0];
        assert_eq!(modify.rule, Rule::ActModifyItem);
        let patches: Vec<_> = modify.nodes().map(|n| n.rule).collect();
        assert_eq!(
            patches,
            vec![
                Rule::PatchName,
                Rule::PatchDesc,
                Rule::PatchPortable,
                Rule::PatchContainerState,
                Rule::PatchAddAbility,
                Rule::PatchRemoveAbility,
            ]
        );
    }

    #[test]
    fn scheduled_retry() {
        let tree = parse_actions(r#"do schedule in 3 if has flag ready onFalse retryAfter 2 { do show "go" }"#);
        let schedule = action_nodes(&tree)[0];
        assert_eq!(schedule.rule, Rule::ActScheduleIf);
        let anchor: Vec<_> = schedule.tokens().map(|t| t.text.as_str()).collect();
        assert_eq!(anchor, vec!["in", "3"]);
        let parts: Vec<_> = schedule.nodes().map(|n| n.rule).collect();
        assert_eq!(parts, vec![Rule::CondHasFlag, Rule::OnFalseRetryAfter, Rule::TriggerBlock]);
    }

    #[test]
    fn plain_schedule_with_note_and_nested_if() {
        let tree = parse_actions(
            r#"do schedule on 10 note "nightfall" {
                if chance 50 % { do show "An owl hoots." }
                do add flag night
            }"#,
        );
        let schedule = action_nodes(&tree)[0];
        assert_eq!(schedule.rule, Rule::ActSchedule);
        let body = schedule.find(Rule::TriggerBlock).expect("body");
        let stmts: Vec<_> = body.nodes().map(|n| n.rule).collect();
        assert_eq!(stmts, vec![Rule::CondBlock, Rule::DoStmt]);
    }

    #[test]
    fn unknown_action_lists_starters() {
        let src = "trigger \"t\" when always { do dance }";
        let (_, errors) = parse(tokenize(src).expect("lex ok"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].expected().contains(&"schedule"));
        assert!(errors[0].expected().contains(&"show"));
    }
}
