use super::{Builder, Cursor, ShapeResult, StateWords, ability, container_state, npc_state, to_u32, unexpected};
use crate::{
    ast::{Action, ContainerState, ContainerStatePatch, ItemPatch, RetryPolicy, Schedule, ScheduleAnchor, ScheduleIf, TriggerStmt},
    error::SemanticShapeError,
    parser::{Rule, SyntaxNode},
};

/// Words accepted by `container state` inside a `modify item` block.
const PATCH_CONTAINER_WORDS: &[&str] = &[
    "open",
    "closed",
    "locked",
    "transparentClosed",
    "transparentLocked",
    "off",
];

impl Builder {
    pub(super) fn action(&mut self, node: &SyntaxNode) -> ShapeResult<Action> {
        let mut cur = Cursor::new(node);
        let action = match node.rule {
            Rule::ActShow => Action::Show(cur.string("message")?),
            Rule::ActAddFlag => Action::AddFlag(cur.word("flag name")?),
            Rule::ActRemoveFlag => Action::RemoveFlag(cur.word("flag name")?),
            Rule::ActResetFlag => Action::ResetFlag(cur.word("flag name")?),
            Rule::ActAdvanceFlag => Action::AdvanceFlag(cur.word("flag name")?),
            Rule::ActAddSeqFlag => Action::AddSeqFlag {
                flag: cur.word("flag name")?,
                limit: cur
                    .node_if(|r| r == Rule::Limit)
                    .map(|n| Cursor::new(n).count("seq flag limit"))
                    .transpose()?,
            },
            Rule::ActAddWedge => {
                let text = cur.string("wedge text")?;
                let width = cur.node_if(|r| r == Rule::Width).map(wedge_width).transpose()?;
                Action::AddWedge {
                    spinner: cur.word("spinner id")?,
                    text,
                    width,
                }
            },
            Rule::ActReplaceItem => Action::ReplaceItem {
                old: cur.word("item id")?,
                new: cur.word("replacement item id")?,
            },
            Rule::ActReplaceDropItem => Action::ReplaceDropItem {
                old: cur.word("item id")?,
                new: cur.word("replacement item id")?,
            },
            Rule::ActSpawnItemRoom => Action::SpawnItemIntoRoom {
                item: cur.word("item id")?,
                room: cur.word("room id")?,
            },
            Rule::ActSpawnItemContainer => Action::SpawnItemIntoContainer {
                item: cur.word("item id")?,
                container: cur.word("container item id")?,
            },
            Rule::ActSpawnItemInventory => Action::SpawnItemInInventory(cur.word("item id")?),
            Rule::ActSpawnItemCurrentRoom => Action::SpawnItemInCurrentRoom(cur.word("item id")?),
            Rule::ActSpawnNpc => Action::SpawnNpcIntoRoom {
                npc: cur.word("npc id")?,
                room: cur.word("room id")?,
            },
            Rule::ActDespawnItem => Action::DespawnItem(cur.word("item id")?),
            Rule::ActDespawnNpc => Action::DespawnNpc(cur.word("npc id")?),
            Rule::ActAwardPoints => Action::AwardPoints {
                amount: cur.number("points")?.0,
                reason: cur
                    .node_if(|r| r == Rule::Reason)
                    .map(|n| Cursor::new(n).string("reason"))
                    .transpose()?,
            },
            Rule::ActLockItem => Action::LockItem(cur.word("item id")?),
            Rule::ActUnlockItem => Action::UnlockItem(cur.word("item id")?),
            Rule::ActLockExit => Action::LockExit {
                from: cur.word("room id")?,
                direction: cur.text("direction")?,
            },
            Rule::ActUnlockExit => Action::UnlockExit {
                from: cur.word("room id")?,
                direction: cur.text("direction")?,
            },
            Rule::ActRevealExit => Action::RevealExit {
                from: cur.word("room id")?,
                to: cur.word("room id")?,
                direction: cur.text("direction")?,
            },
            Rule::ActPushPlayer => Action::PushPlayerTo(cur.word("room id")?),
            Rule::ActSetItemDesc => Action::SetItemDescription {
                item: cur.word("item id")?,
                text: cur.string("description")?,
            },
            Rule::ActNpcSays => Action::NpcSays {
                npc: cur.word("npc id")?,
                quote: cur.string("quote")?,
            },
            Rule::ActNpcRandomDialogue => Action::NpcRandomDialogue(cur.word("npc id")?),
            Rule::ActNpcRefuseItem => Action::NpcRefuseItem {
                npc: cur.word("npc id")?,
                reason: cur.string("refusal")?,
            },
            Rule::ActSetNpcActive => Action::SetNpcActive {
                npc: cur.word("npc id")?,
                active: cur.boolean("active")?,
            },
            Rule::ActSetNpcState => Action::SetNpcState {
                npc: cur.word("npc id")?,
                state: npc_state(cur.node("npc state")?, StateWords::Lenient)?,
            },
            Rule::ActDenyRead => Action::DenyRead(cur.string("message")?),
            Rule::ActRestrictItem => Action::RestrictItem(cur.word("item id")?),
            Rule::ActGiveItemToPlayer => Action::GiveItemToPlayer {
                item: cur.word("item id")?,
                npc: cur.word("npc id")?,
            },
            Rule::ActSetBarredMessage => Action::SetBarredMessage {
                from: cur.word("room id")?,
                to: cur.word("room id")?,
                message: cur.string("barred message")?,
            },
            Rule::ActSetContainerState => Action::SetContainerState {
                item: cur.word("item id")?,
                state: container_state(cur.token("container state")?)?,
            },
            Rule::ActSpinnerMessage => Action::SpinnerMessage(cur.word("spinner id")?),
            Rule::ActModifyItem => Action::ModifyItem {
                item: cur.word("item id")?,
                patch: self.item_patch(cur)?,
            },
            Rule::ActSchedule | Rule::ActScheduleIf => self.schedule(node, cur)?,
            _ => return Err(unexpected(node, "action")),
        };
        Ok(action)
    }

    fn item_patch(&mut self, cur: Cursor<'_>) -> ShapeResult<ItemPatch> {
        let mut patch = ItemPatch::default();
        for field in cur.nodes() {
            let mut fc = Cursor::new(field);
            match field.rule {
                Rule::PatchName => {
                    let name = fc.string("name")?;
                    self.set_once(&mut patch.name, name, "patched name", field.span);
                },
                Rule::PatchDesc => {
                    let desc = fc.string("description")?;
                    self.set_once(&mut patch.desc, desc, "patched description", field.span);
                },
                Rule::PatchText => {
                    let text = fc.string("text")?;
                    self.set_once(&mut patch.text, text, "patched text", field.span);
                },
                Rule::PatchPortable => {
                    let portable = fc.boolean("portable")?;
                    self.set_once(&mut patch.portable, portable, "patched portable", field.span);
                },
                Rule::PatchRestricted => {
                    let restricted = fc.boolean("restricted")?;
                    self.set_once(&mut patch.restricted, restricted, "patched restricted", field.span);
                },
                Rule::PatchContainerState => {
                    let tok = fc.token("container state")?;
                    let state = if tok.text == "off" {
                        ContainerStatePatch::Remove
                    } else {
                        ContainerState::from_word(&tok.text)
                            .map(ContainerStatePatch::Set)
                            .ok_or_else(|| SemanticShapeError::InvalidEnumValue {
                                what: "container state",
                                value: tok.text.clone(),
                                expected: PATCH_CONTAINER_WORDS,
                                span: tok.span,
                            })?
                    };
                    self.set_once(&mut patch.container_state, state, "patched container state", field.span);
                },
                Rule::PatchAddAbility => patch.add_abilities.push(ability(fc.node("ability")?)?),
                Rule::PatchRemoveAbility => patch.remove_abilities.push(ability(fc.node("ability")?)?),
                _ => return Err(unexpected(field, "item patch")),
            }
        }
        Ok(patch)
    }

    fn schedule(&mut self, node: &SyntaxNode, mut cur: Cursor<'_>) -> ShapeResult<Action> {
        let anchor = match cur.token("schedule anchor")?.text.as_str() {
            "on" => ScheduleAnchor::On,
            _ => ScheduleAnchor::In,
        };
        let turns = cur.count("schedule turns")?;
        if node.rule == Rule::ActSchedule {
            let note = note(&mut cur)?;
            let body = self.schedule_body(cur.node("schedule body")?)?;
            return Ok(Action::Schedule(Schedule {
                anchor,
                turns,
                note,
                body,
            }));
        }
        let guard = self.condition(cur.node("schedule guard")?);
        let retry = cur
            .node_if(|r| matches!(r, Rule::OnFalseCancel | Rule::OnFalseRetryNextTurn | Rule::OnFalseRetryAfter))
            .map(retry_policy)
            .transpose()?;
        let note = note(&mut cur)?;
        let body = self.schedule_body(cur.node("schedule body")?);
        let guard = match guard {
            Ok(guard) => guard,
            Err(err) => {
                self.keep(body);
                return Err(err);
            },
        };
        let body = body?;
        Ok(Action::ScheduleIf(ScheduleIf {
            anchor,
            turns,
            guard,
            retry,
            note,
            body,
        }))
    }

    fn schedule_body(&mut self, node: &SyntaxNode) -> ShapeResult<Vec<TriggerStmt>> {
        self.nested(node, |b| b.trigger_block(node))
    }
}

fn note(cur: &mut Cursor<'_>) -> ShapeResult<Option<String>> {
    cur.node_if(|r| r == Rule::Note)
        .map(|n| Cursor::new(n).string("note"))
        .transpose()
}

fn retry_policy(node: &SyntaxNode) -> ShapeResult<RetryPolicy> {
    match node.rule {
        Rule::OnFalseCancel => Ok(RetryPolicy::Cancel),
        Rule::OnFalseRetryNextTurn => Ok(RetryPolicy::RetryNextTurn),
        _ => Cursor::new(node).count("retry turns").map(RetryPolicy::RetryAfter),
    }
}

/// `width N`; a wedge needs a positive weight.
pub(super) fn wedge_width(node: &SyntaxNode) -> ShapeResult<u32> {
    let (value, span) = Cursor::new(node).number("wedge width")?;
    match to_u32(value, "wedge width", span)? {
        0 => Err(SemanticShapeError::OutOfRange {
            what: "wedge width",
            value,
            span,
        }),
        width => Ok(width),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        ast::{
            Ability, Action, Condition, ContainerStatePatch, ItemPatch, NpcState, RetryPolicy, ScheduleAnchor,
            ScheduleIf, TriggerStmt,
        },
        builder::build,
        error::SemanticShapeError,
        lexer::tokenize,
        parser::parse,
    };

    fn build_actions(body: &str) -> (Vec<Action>, Vec<SemanticShapeError>) {
        let src = format!("trigger \"t\" when always {{ {body} }}");
        let (tree, errors) = parse(tokenize(&src).expect("lex ok"));
        assert!(errors.is_empty(), "{errors:?}");
        let (file, errors) = build(&tree);
        let actions = file
            .triggers()
            .flat_map(|t| t.block.iter())
            .filter_map(|stmt| match stmt {
                TriggerStmt::Do(d) => Some(d.action.clone()),
                TriggerStmt::If(_) => None,
            })
            .collect();
        (actions, errors)
    }

    fn single(body: &str) -> Action {
        let (actions, errors) = build_actions(&format!("do {body}"));
        assert!(errors.is_empty(), "{body}: {errors:?}");
        actions.into_iter().next().expect("one action")
    }

    #[test]
    fn scheduled_retry() {
        let Action::ScheduleIf(ScheduleIf {
            anchor,
            turns,
            guard,
            retry,
            note,
            body,
        }) = single(r#"schedule in 3 if has flag ready onFalse retryAfter 2 { do show "go" }"#)
        else {
            panic!("expected a conditional schedule");
        };
        assert_eq!(anchor, ScheduleAnchor::In);
        assert_eq!(turns, 3);
        assert_eq!(guard, Condition::HasFlag("ready".into()));
        assert_eq!(retry, Some(RetryPolicy::RetryAfter(2)));
        assert_eq!(note, None);
        let [TriggerStmt::Do(show)] = body.as_slice() else {
            panic!("expected one do statement");
        };
        assert_eq!(show.action, Action::Show("go".into()));
    }

    #[test]
    fn schedule_on_with_note() {
        let Action::Schedule(schedule) = single(r#"schedule on 12 note "dawn" { do add flag morning }"#) else {
            panic!("expected a schedule");
        };
        assert_eq!(schedule.anchor, ScheduleAnchor::On);
        assert_eq!(schedule.turns, 12);
        assert_eq!(schedule.note.as_deref(), Some("dawn"));
    }

    #[test]
    fn simple_actions() {
        assert_eq!(
            single("add wedge \"A crow calls.\" width 2 spinner birds"),
            Action::AddWedge {
                spinner: "birds".into(),
                text: "A crow calls.".into(),
                width: Some(2)
            }
        );
        assert_eq!(
            single("add seq flag lever limit 4"),
            Action::AddSeqFlag {
                flag: "lever".into(),
                limit: Some(4)
            }
        );
        assert_eq!(
            single("award points -10 reason \"broke the vase\""),
            Action::AwardPoints {
                amount: -10,
                reason: Some("broke the vase".into())
            }
        );
        assert_eq!(
            single("reveal exit from hall to attic direction \"up the ladder\""),
            Action::RevealExit {
                from: "hall".into(),
                to: "attic".into(),
                direction: "up the ladder".into()
            }
        );
        assert_eq!(
            single("set npc state bob sulking"),
            Action::SetNpcState {
                npc: "bob".into(),
                state: NpcState::Custom("sulking".into())
            }
        );
        assert_eq!(
            single("spawn item coin in current room"),
            Action::SpawnItemInCurrentRoom("coin".into())
        );
        assert_eq!(
            single("give item coin to player from npc bob"),
            Action::GiveItemToPlayer {
                item: "coin".into(),
                npc: "bob".into()
            }
        );
    }

    #[test]
    fn modify_item_patch() {
        let action = single(
            r#"modify item lamp {
                name "Lit Lamp"
                container state off
                add ability ignite
                remove ability read (book)
            }"#,
        );
        assert_eq!(
            action,
            Action::ModifyItem {
                item: "lamp".into(),
                patch: ItemPatch {
                    name: Some("Lit Lamp".into()),
                    container_state: Some(ContainerStatePatch::Remove),
                    add_abilities: vec![Ability {
                        name: "ignite".into(),
                        target: None
                    }],
                    remove_abilities: vec![Ability {
                        name: "read".into(),
                        target: Some("book".into())
                    }],
                    ..ItemPatch::default()
                },
            }
        );
    }

    #[test]
    fn bad_container_state_in_action() {
        let (actions, errors) = build_actions("do set container state box ajar");
        assert!(actions.is_empty());
        assert!(matches!(
            errors.as_slice(),
            [SemanticShapeError::InvalidEnumValue { what: "container state", .. }]
        ));
    }

    #[test]
    fn zero_width_wedge() {
        let (_, errors) = build_actions("do add wedge \"x\" width 0 spinner s");
        assert!(matches!(
            errors.as_slice(),
            [SemanticShapeError::OutOfRange { what: "wedge width", value: 0, .. }]
        ));
    }

    #[test]
    fn empty_schedule_body() {
        let (_, errors) = build_actions("do schedule in 2 { }");
        assert!(matches!(
            errors.as_slice(),
            [SemanticShapeError::EmptyBlock { what: "trigger block", .. }]
        ));
    }
}
