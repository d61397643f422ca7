use super::{Builder, Cursor, ShapeResult, StateWords, id_list, npc_state, unexpected};
use crate::{
    ast::{Exit, NpcStateLine, Overlay, OverlayCond, OverlayKind, PresenceSubject, RoomDef},
    error::SemanticShapeError,
    parser::{Rule, SyntaxNode},
};

impl Builder {
    pub(super) fn room(&mut self, node: &SyntaxNode) -> ShapeResult<RoomDef> {
        let mut cur = Cursor::new(node);
        let mut room = RoomDef {
            id: cur.word("room id")?,
            name: None,
            desc: None,
            visited: None,
            exits: Vec::new(),
            overlays: Vec::new(),
            span: node.span,
        };
        for stmt in cur.nodes() {
            let built = self.room_stmt(&mut room, stmt);
            self.keep(built);
        }
        Ok(room)
    }

    fn room_stmt(&mut self, room: &mut RoomDef, stmt: &SyntaxNode) -> ShapeResult<()> {
        match stmt.rule {
            Rule::RoomName => {
                let name = Cursor::new(stmt).string("room name")?;
                self.set_once(&mut room.name, name, "room name", stmt.span);
            },
            Rule::RoomDesc => {
                let desc = Cursor::new(stmt).string("room description")?;
                self.set_once(&mut room.desc, desc, "room description", stmt.span);
            },
            Rule::RoomVisited => {
                let visited = Cursor::new(stmt).boolean("visited flag")?;
                self.set_once(&mut room.visited, visited, "visited", stmt.span);
            },
            Rule::Exit => room.exits.push(self.exit(stmt)?),
            _ => room.overlays.push(self.overlay(stmt)?),
        }
        Ok(())
    }

    fn exit(&mut self, node: &SyntaxNode) -> ShapeResult<Exit> {
        let mut cur = Cursor::new(node);
        let mut exit = Exit {
            direction: cur.text("exit direction")?,
            to: cur.word("destination room")?,
            required_items: Vec::new(),
            required_flags: Vec::new(),
            barred: None,
            hidden: false,
            locked: false,
            span: node.span,
        };
        let Some(block) = cur.node_if(|r| r == Rule::ExitBlock) else {
            return Ok(exit);
        };
        for opt in block.nodes() {
            let built = self.exit_option(&mut exit, opt);
            self.keep(built);
        }
        Ok(exit)
    }

    fn exit_option(&mut self, exit: &mut Exit, opt: &SyntaxNode) -> ShapeResult<()> {
        match opt.rule {
            Rule::ExitRequiredItems => {
                let list = Cursor::new(opt).node("required items")?;
                exit.required_items.extend(id_list(list, "required_items")?);
            },
            Rule::ExitRequiredFlags => {
                let list = Cursor::new(opt).node("required flags")?;
                exit.required_flags.extend(id_list(list, "required_flags")?);
            },
            Rule::ExitBarred => {
                let message = Cursor::new(opt).string("barred message")?;
                self.set_once(&mut exit.barred, message, "barred message", opt.span);
            },
            Rule::ExitHidden => exit.hidden = true,
            Rule::ExitLocked => exit.locked = true,
            _ => return Err(unexpected(opt, "exit option")),
        }
        Ok(())
    }

    fn overlay(&mut self, node: &SyntaxNode) -> ShapeResult<Overlay> {
        let mut cur = Cursor::new(node);
        let kind = match node.rule {
            Rule::OverlayFlagBinary => {
                let flag = cur.word("overlay flag")?;
                let (set_text, unset_text) =
                    self.text_pair(cur, node, (Rule::OverlaySetText, "set text"), (Rule::OverlayUnsetText, "unset text"))?;
                OverlayKind::FlagBinary {
                    flag,
                    set_text,
                    unset_text,
                }
            },
            Rule::OverlayItemPresence | Rule::OverlayNpcPresence => {
                let id = &cur.token("overlay subject")?.text;
                let subject = if node.rule == Rule::OverlayItemPresence {
                    PresenceSubject::Item(id.as_str().into())
                } else {
                    PresenceSubject::Npc(id.as_str().into())
                };
                let (present_text, absent_text) = self.text_pair(
                    cur,
                    node,
                    (Rule::OverlayPresentText, "present text"),
                    (Rule::OverlayAbsentText, "absent text"),
                )?;
                OverlayKind::PresencePair {
                    subject,
                    present_text,
                    absent_text,
                }
            },
            Rule::OverlayNpcStates => {
                let npc = cur.word("overlay npc")?;
                let entries: Vec<_> = cur.nodes().collect();
                let mut lines = Vec::new();
                for line in &entries {
                    let built = npc_state_line(line);
                    lines.extend(self.keep(built));
                }
                if entries.is_empty() {
                    return Err(SemanticShapeError::EmptyBlock {
                        what: "npc state overlay",
                        span: node.span,
                    });
                }
                OverlayKind::NpcStateSet { npc, lines }
            },
            Rule::OverlayConditional => {
                let mut conditions = Vec::new();
                let mut text = None;
                for child in cur.nodes() {
                    if child.rule == Rule::OverlayText {
                        let value = Cursor::new(child).string("overlay text")?;
                        self.set_once(&mut text, value, "overlay text", child.span);
                    } else {
                        let built = overlay_cond(child);
                        conditions.extend(self.keep(built));
                    }
                }
                let text = text.ok_or(SemanticShapeError::MissingField {
                    what: "overlay text",
                    span: node.span,
                })?;
                OverlayKind::Conditional { conditions, text }
            },
            _ => return Err(unexpected(node, "room statement")),
        };
        Ok(Overlay { kind, span: node.span })
    }

    /// The two required one-line texts of a flag-binary or presence overlay.
    fn text_pair(
        &mut self,
        cur: Cursor<'_>,
        node: &SyntaxNode,
        first: (Rule, &'static str),
        second: (Rule, &'static str),
    ) -> ShapeResult<(String, String)> {
        let (mut a, mut b) = (None, None);
        for line in cur.nodes() {
            let built = Cursor::new(line).string("overlay text");
            let Some(value) = self.keep(built) else {
                continue;
            };
            if line.rule == first.0 {
                self.set_once(&mut a, value, first.1, line.span);
            } else {
                self.set_once(&mut b, value, second.1, line.span);
            }
        }
        let missing = |what| SemanticShapeError::MissingField { what, span: node.span };
        Ok((a.ok_or(missing(first.1))?, b.ok_or(missing(second.1))?))
    }
}

fn npc_state_line(line: &SyntaxNode) -> ShapeResult<NpcStateLine> {
    let mut cur = Cursor::new(line);
    let state = npc_state(cur.node("npc state")?, StateWords::Strict)?;
    let text = cur.string("state text")?;
    Ok(NpcStateLine { state, text })
}

fn overlay_cond(node: &SyntaxNode) -> ShapeResult<OverlayCond> {
    let mut cur = Cursor::new(node);
    let cond = match node.rule {
        Rule::OvFlagSet => OverlayCond::FlagSet(cur.word("flag name")?),
        Rule::OvFlagUnset => OverlayCond::FlagUnset(cur.word("flag name")?),
        Rule::OvFlagComplete => OverlayCond::FlagComplete(cur.word("flag name")?),
        Rule::OvItemPresent => OverlayCond::ItemPresent(cur.word("item id")?),
        Rule::OvItemAbsent => OverlayCond::ItemAbsent(cur.word("item id")?),
        Rule::OvPlayerHasItem => OverlayCond::PlayerHasItem(cur.word("item id")?),
        Rule::OvPlayerMissingItem => OverlayCond::PlayerMissingItem(cur.word("item id")?),
        Rule::OvNpcPresent => OverlayCond::NpcPresent(cur.word("npc id")?),
        Rule::OvNpcAbsent => OverlayCond::NpcAbsent(cur.word("npc id")?),
        Rule::OvNpcInState => OverlayCond::NpcInState {
            npc: cur.word("npc id")?,
            state: npc_state(cur.node("npc state")?, StateWords::Lenient)?,
        },
        Rule::OvItemInRoom => OverlayCond::ItemInRoom {
            item: cur.word("item id")?,
            room: cur.word("room id")?,
        },
        _ => return Err(unexpected(node, "overlay condition")),
    };
    Ok(cond)
}
