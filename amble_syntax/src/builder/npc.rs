use super::{Builder, Cursor, ShapeResult, StateWords, id_list, npc_state, unexpected};
use crate::{
    ast::{DialogueBlock, Movement, MovementKind, NpcDef, NpcLocation},
    error::SemanticShapeError,
    parser::{Rule, SyntaxNode},
};

impl Builder {
    pub(super) fn npc(&mut self, node: &SyntaxNode) -> ShapeResult<NpcDef> {
        let mut cur = Cursor::new(node);
        let mut npc = NpcDef {
            id: cur.word("npc id")?,
            name: None,
            desc: None,
            location: None,
            state: None,
            movement: None,
            dialogue: Vec::new(),
            span: node.span,
        };
        let stmts: Vec<_> = cur.nodes().collect();
        if stmts.is_empty() {
            return Err(SemanticShapeError::EmptyBlock {
                what: "npc block",
                span: node.span,
            });
        }
        for stmt in stmts {
            let built = self.npc_stmt(&mut npc, stmt);
            self.keep(built);
        }
        Ok(npc)
    }

    fn npc_stmt(&mut self, npc: &mut NpcDef, stmt: &SyntaxNode) -> ShapeResult<()> {
        let mut sc = Cursor::new(stmt);
        match stmt.rule {
            Rule::NpcName => {
                let name = sc.string("npc name")?;
                self.set_once(&mut npc.name, name, "npc name", stmt.span);
            },
            Rule::NpcDesc => {
                let desc = sc.string("npc description")?;
                self.set_once(&mut npc.desc, desc, "npc description", stmt.span);
            },
            Rule::LocRoom => {
                let location = NpcLocation::Room(sc.word("room id")?);
                self.set_once(&mut npc.location, location, "npc location", stmt.span);
            },
            Rule::LocNowhere => {
                let location = NpcLocation::Nowhere(sc.string("nowhere note")?);
                self.set_once(&mut npc.location, location, "npc location", stmt.span);
            },
            Rule::NpcState => {
                let state = npc_state(sc.node("npc state")?, StateWords::Strict)?;
                self.set_once(&mut npc.state, state, "npc state", stmt.span);
            },
            Rule::NpcMovement => {
                let movement = self.movement(stmt)?;
                self.set_once(&mut npc.movement, movement, "movement", stmt.span);
            },
            Rule::Dialogue => {
                let state = npc_state(sc.node("dialogue state")?, StateWords::Strict)?;
                let lines: Vec<String> = sc
                    .tokens()
                    .filter_map(|t| t.string_value().map(str::to_string))
                    .collect();
                if lines.is_empty() {
                    return Err(SemanticShapeError::EmptyBlock {
                        what: "dialogue block",
                        span: stmt.span,
                    });
                }
                npc.dialogue.push(DialogueBlock {
                    state,
                    lines,
                    span: stmt.span,
                });
            },
            _ => return Err(unexpected(stmt, "npc statement")),
        }
        Ok(())
    }

    fn movement(&mut self, node: &SyntaxNode) -> ShapeResult<Movement> {
        let mut cur = Cursor::new(node);
        let kind = match cur.token("movement kind")?.text.as_str() {
            "route" => MovementKind::Route,
            _ => MovementKind::Random,
        };
        let mut movement = Movement {
            kind,
            rooms: id_list(cur.node("movement rooms")?, "movement rooms")?,
            timing: None,
            active: None,
            loop_route: None,
        };
        for opt in cur.nodes() {
            let mut oc = Cursor::new(opt);
            match opt.rule {
                Rule::MovementTiming => {
                    let timing = oc.word("timing")?;
                    self.set_once(&mut movement.timing, timing, "movement timing", opt.span);
                },
                Rule::MovementActive => {
                    let active = oc.boolean("active")?;
                    self.set_once(&mut movement.active, active, "movement active", opt.span);
                },
                Rule::MovementLoop => {
                    let looped = oc.boolean("loop")?;
                    self.set_once(&mut movement.loop_route, looped, "movement loop", opt.span);
                },
                _ => return Err(unexpected(opt, "movement option")),
            }
        }
        Ok(movement)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        ast::{BuiltinState, MovementKind, NpcDef, NpcLocation, NpcState},
        builder::build,
        error::SemanticShapeError,
        lexer::tokenize,
        parser::parse,
    };

    fn build_npc(src: &str) -> (Option<NpcDef>, Vec<SemanticShapeError>) {
        let (tree, errors) = parse(tokenize(src).expect("lex ok"));
        assert!(errors.is_empty(), "{errors:?}");
        let (file, errors) = build(&tree);
        (file.npcs().next().cloned(), errors)
    }

    #[test]
    fn npc_with_movement_and_dialogue() {
        let (npc, errors) = build_npc(
            r#"npc keeper {
                name "Lighthouse Keeper"
                desc "Weathered and quiet."
                location room lamp-room
                state custom wary
                movement route rooms (lamp-room, stairwell) timing every_2_turns loop true
                dialogue normal { "Mind the stairs." 'Storm is coming.' }
                dialogue custom wary { """Who let you in?""" }
            }"#,
        );
        assert!(errors.is_empty(), "{errors:?}");
        let npc = npc.expect("npc");
        assert_eq!(npc.location, Some(NpcLocation::Room("lamp-room".into())));
        assert_eq!(npc.state, Some(NpcState::Custom("wary".into())));
        let movement = npc.movement.expect("movement");
        assert_eq!(movement.kind, MovementKind::Route);
        assert_eq!(movement.rooms.len(), 2);
        assert_eq!(movement.loop_route, Some(true));
        assert_eq!(movement.active, None);
        assert_eq!(npc.dialogue.len(), 2);
        assert_eq!(npc.dialogue[0].state, NpcState::Builtin(BuiltinState::Normal));
        assert_eq!(npc.dialogue[0].lines, vec!["Mind the stairs.", "Storm is coming."]);
        assert_eq!(npc.dialogue[1].lines, vec!["Who let you in?"]);
    }

    #[test]
    fn empty_npc_block() {
        let (npc, errors) = build_npc("npc ghost { }");
        assert!(npc.is_none());
        assert!(matches!(
            errors.as_slice(),
            [SemanticShapeError::EmptyBlock { what: "npc block", .. }]
        ));
    }

    #[test]
    fn empty_dialogue_block() {
        let (_, errors) = build_npc("npc ghost { dialogue sad { } }");
        assert!(matches!(
            errors.as_slice(),
            [SemanticShapeError::EmptyBlock { what: "dialogue block", .. }]
        ));
    }

    #[test]
    fn later_statements_still_checked_after_a_failure() {
        let (npc, errors) = build_npc(r#"npc ghost { state grumpy dialogue sad { } name "A" name "B" }"#);
        assert!(npc.is_none());
        assert!(
            matches!(
                errors.as_slice(),
                [
                    SemanticShapeError::InvalidEnumValue { .. },
                    SemanticShapeError::EmptyBlock { what: "dialogue block", .. },
                    SemanticShapeError::DuplicateField { what: "npc name", .. },
                ]
            ),
            "{errors:?}"
        );
    }

    #[test]
    fn bare_unknown_state_is_rejected_on_npc() {
        let (_, errors) = build_npc("npc ghost { state grumpy }");
        assert!(matches!(
            &errors[0],
            SemanticShapeError::InvalidEnumValue { what: "npc state", value, .. } if value == "grumpy"
        ));
    }
}
