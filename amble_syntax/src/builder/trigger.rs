use super::{Builder, Cursor, ShapeResult, StateWords, id_list, npc_state, unexpected};
use crate::{
    ast::{CondBlock, Condition, DoAction, Event, IngestMode, TriggerDef, TriggerStmt},
    error::SemanticShapeError,
    parser::{Rule, SyntaxNode},
};

impl Builder {
    pub(super) fn trigger(&mut self, node: &SyntaxNode) -> ShapeResult<TriggerDef> {
        let mut cur = Cursor::new(node);
        let name = cur.string("trigger name")?;
        let mut only_once = false;
        let mut notes = Vec::new();
        while let Some(modifier) = cur.node_if(|r| matches!(r, Rule::OnlyOnce | Rule::Note)) {
            if modifier.rule == Rule::OnlyOnce {
                only_once = true;
            } else {
                notes.push(Cursor::new(modifier).string("note")?);
            }
        }
        let event = event(cur.node("trigger event")?)?;
        let block = self.trigger_block(cur.node("trigger block")?)?;
        Ok(TriggerDef {
            name,
            only_once,
            notes,
            event,
            block,
            span: node.span,
        })
    }

    /// Statements of a `TriggerBlock`; shared by triggers and schedules.
    ///
    /// Every statement is built even after one fails, so all of their shape
    /// errors are reported.
    pub(super) fn trigger_block(&mut self, node: &SyntaxNode) -> ShapeResult<Vec<TriggerStmt>> {
        if node.nodes().next().is_none() {
            return Err(SemanticShapeError::EmptyBlock {
                what: "trigger block",
                span: node.span,
            });
        }
        let mut stmts = Vec::new();
        for stmt in node.nodes() {
            let built = match stmt.rule {
                Rule::DoStmt => self.do_action(stmt).map(TriggerStmt::Do),
                Rule::CondBlock => self.cond_block(stmt).map(TriggerStmt::If),
                _ => Err(unexpected(stmt, "trigger statement")),
            };
            stmts.extend(self.keep(built));
        }
        Ok(stmts)
    }

    fn do_action(&mut self, node: &SyntaxNode) -> ShapeResult<DoAction> {
        let action = self.action(Cursor::new(node).node("action")?)?;
        Ok(DoAction {
            action,
            span: node.span,
        })
    }

    fn cond_block(&mut self, node: &SyntaxNode) -> ShapeResult<CondBlock> {
        let mut cur = Cursor::new(node);
        let condition = self.condition(cur.node("condition")?);
        let stmts: Vec<_> = cur.nodes().collect();
        let mut actions = Vec::new();
        for stmt in &stmts {
            let built = self.do_action(stmt);
            actions.extend(self.keep(built));
        }
        let condition = condition?;
        if stmts.is_empty() {
            return Err(SemanticShapeError::EmptyBlock {
                what: "if block",
                span: node.span,
            });
        }
        Ok(CondBlock {
            condition,
            actions,
            span: node.span,
        })
    }

    /// Trigger and schedule-guard conditions. `any`/`all` recurse, one nesting level per group.
    pub(super) fn condition(&mut self, node: &SyntaxNode) -> ShapeResult<Condition> {
        if !matches!(node.rule, Rule::CondAny | Rule::CondAll) {
            return condition_atom(node);
        }
        let mut members = Vec::new();
        for member in node.nodes() {
            members.push(self.nested(member, |b| b.condition(member))?);
        }
        if members.is_empty() {
            return Err(SemanticShapeError::EmptyBlock {
                what: "condition group",
                span: node.span,
            });
        }
        Ok(if node.rule == Rule::CondAny {
            Condition::Any(members)
        } else {
            Condition::All(members)
        })
    }
}

fn event(node: &SyntaxNode) -> ShapeResult<Event> {
    let mut cur = Cursor::new(node);
    let event = match node.rule {
        Rule::EvAlways => Event::Always,
        Rule::EvEnterRoom => Event::EnterRoom(cur.word("room id")?),
        Rule::EvLeaveRoom => Event::LeaveRoom(cur.word("room id")?),
        Rule::EvTakeItem => Event::TakeItem(cur.word("item id")?),
        Rule::EvDropItem => Event::DropItem(cur.word("item id")?),
        Rule::EvOpenItem => Event::OpenItem(cur.word("item id")?),
        Rule::EvUnlockItem => Event::UnlockItem(cur.word("item id")?),
        Rule::EvLookAtItem => Event::LookAtItem(cur.word("item id")?),
        Rule::EvTalkToNpc => Event::TalkToNpc(cur.word("npc id")?),
        Rule::EvUseItem => Event::UseItem {
            item: cur.word("item id")?,
            ability: cur.opt_token().map(|t| t.text.as_str().into()),
        },
        Rule::EvUseItemOnItem => Event::UseItemOnItem {
            tool: cur.word("item id")?,
            target: cur.word("target item id")?,
            interaction: cur.word("interaction")?,
        },
        Rule::EvActOnItem => Event::ActOnItem {
            interaction: cur.word("interaction")?,
            item: cur.word("item id")?,
        },
        Rule::EvGiveToNpc => Event::GiveToNpc {
            item: cur.word("item id")?,
            npc: cur.word("npc id")?,
        },
        Rule::EvTakeFromNpc => Event::TakeFromNpc {
            item: cur.word("item id")?,
            npc: cur.word("npc id")?,
        },
        Rule::EvInsertItem => Event::InsertItemInto {
            item: cur.word("item id")?,
            container: cur.word("container item id")?,
        },
        Rule::EvIngest => {
            let mode = cur.token("ingest mode")?;
            Event::Ingest {
                mode: IngestMode::from_word(&mode.text).ok_or_else(|| SemanticShapeError::InvalidEnumValue {
                    what: "ingest mode",
                    value: mode.text.clone(),
                    expected: &["eat", "drink", "inhale"],
                    span: mode.span,
                })?,
                item: cur.word("item id")?,
            }
        },
        _ => return Err(unexpected(node, "event")),
    };
    Ok(event)
}

/// A single, ungrouped condition.
fn condition_atom(node: &SyntaxNode) -> ShapeResult<Condition> {
    let mut cur = Cursor::new(node);
    let cond = match node.rule {
        Rule::CondHasFlag => Condition::HasFlag(cur.word("flag name")?),
        Rule::CondMissingFlag => Condition::MissingFlag(cur.word("flag name")?),
        Rule::CondHasItem => Condition::HasItem(cur.word("item id")?),
        Rule::CondMissingItem => Condition::MissingItem(cur.word("item id")?),
        Rule::CondHasVisited => Condition::HasVisited(cur.word("room id")?),
        Rule::CondFlagInProgress => Condition::FlagInProgress(cur.word("flag name")?),
        Rule::CondFlagComplete => Condition::FlagComplete(cur.word("flag name")?),
        Rule::CondWithNpc => Condition::WithNpc(cur.word("npc id")?),
        Rule::CondNpcHasItem => Condition::NpcHasItem {
            npc: cur.word("npc id")?,
            item: cur.word("item id")?,
        },
        Rule::CondNpcInState => Condition::NpcInState {
            npc: cur.word("npc id")?,
            state: npc_state(cur.node("npc state")?, StateWords::Lenient)?,
        },
        Rule::CondPlayerInRoom => Condition::PlayerInRoom(cur.word("room id")?),
        Rule::CondContainerHasItem => Condition::ContainerHasItem {
            container: cur.word("container item id")?,
            item: cur.word("item id")?,
        },
        Rule::CondChance => {
            let (value, span) = cur.number("chance percent")?;
            let percent = u8::try_from(value)
                .ok()
                .filter(|p| (1..=100).contains(p))
                .ok_or(SemanticShapeError::OutOfRange {
                    what: "chance percent",
                    value,
                    span,
                })?;
            Condition::Chance(percent)
        },
        Rule::CondAmbient => Condition::Ambient {
            spinner: cur.word("spinner id")?,
            rooms: cur
                .node_if(|r| r == Rule::IdList)
                .map(|list| id_list(list, "ambient rooms"))
                .transpose()?,
        },
        Rule::CondInRooms => Condition::InRooms(id_list(cur.node("room list")?, "room list")?),
        _ => return Err(unexpected(node, "condition")),
    };
    Ok(cond)
}
