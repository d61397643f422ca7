use amble_syntax::{
    AstError, LexError, SourceFile,
    ast::{
        Action, CondBlock, Condition, DoAction, Event, IngestMode, RetryPolicy, RoomDef, ScheduleAnchor, ScheduleIf, TriggerStmt,
    },
    parse_source,
};
use pretty_assertions::assert_eq;

fn parse_ok(src: &str) -> SourceFile {
    let outcome = parse_source(src);
    assert!(outcome.errors.is_empty(), "{src}\n{:#?}", outcome.errors);
    outcome.file.expect("file")
}

fn first_if(file: &SourceFile) -> &CondBlock {
    let trigger = file.triggers().next().expect("trigger");
    match &trigger.block[0] {
        TriggerStmt::If(block) => block,
        other => panic!("expected if block, got {other:?}"),
    }
}

fn actions_of(stmts: &[TriggerStmt]) -> Vec<&Action> {
    stmts
        .iter()
        .map(|stmt| match stmt {
            TriggerStmt::Do(DoAction { action, .. }) => action,
            other => panic!("expected do, got {other:?}"),
        })
        .collect()
}

#[test]
fn minimal_room() {
    let file = parse_ok(r#"room kitchen { name "Kitchen" desc "A cozy room." }"#);
    let room: &RoomDef = file.rooms().next().expect("room");
    assert_eq!(room.id, "kitchen");
    assert_eq!(room.name.as_deref(), Some("Kitchen"));
    assert_eq!(room.desc.as_deref(), Some("A cozy room."));
    assert!(room.exits.is_empty());
}

#[test]
fn trigger_with_nested_conditional() {
    let file = parse_ok(
        r#"trigger "open chest" when open item chest { if has item key { do add flag chest_opened } }"#,
    );
    let trigger = file.triggers().next().expect("trigger");
    assert_eq!(trigger.name, "open chest");
    assert_eq!(trigger.event, Event::OpenItem("chest".into()));
    let block = first_if(&file);
    assert_eq!(block.condition, Condition::HasItem("key".into()));
    assert_eq!(block.actions.len(), 1);
    assert_eq!(block.actions[0].action, Action::AddFlag("chest_opened".into()));
}

#[test]
fn scheduled_retry() {
    let file = parse_ok(
        r#"trigger "t" when always { do schedule in 3 if has flag ready onFalse retryAfter 2 { do show "go" } }"#,
    );
    let trigger = file.triggers().next().expect("trigger");
    let actions = actions_of(&trigger.block);
    let Action::ScheduleIf(schedule) = actions[0] else {
        panic!("expected conditional schedule, got {:?}", actions[0]);
    };
    let ScheduleIf {
        anchor,
        turns,
        guard,
        retry,
        note,
        body,
    } = schedule;
    assert_eq!(*anchor, ScheduleAnchor::In);
    assert_eq!(*turns, 3);
    assert_eq!(*guard, Condition::HasFlag("ready".into()));
    assert_eq!(*retry, Some(RetryPolicy::RetryAfter(2)));
    assert!(note.is_none());
    assert_eq!(actions_of(body), vec![&Action::Show("go".into())]);
}

#[test]
fn unterminated_string_is_a_single_lex_error() {
    let outcome = parse_source(r#"room x { name "oops }"#);
    assert!(outcome.file.is_none());
    assert_eq!(outcome.errors.len(), 1);
    let AstError::Lex(LexError::UnterminatedString { span }) = &outcome.errors[0] else {
        panic!("expected unterminated string, got {:?}", outcome.errors[0]);
    };
    assert_eq!((span.start, span.line, span.column), (14, 1, 15));
}

#[test]
fn keyword_spelled_ids_stay_ids() {
    let file = parse_ok(
        r#"
item has { name "Has" }
trigger "t" when take item has {
    if has item has { do show "got it" }
}
"#,
    );
    assert_eq!(file.items().next().map(|i| i.id.as_str()), Some("has"));
    assert_eq!(
        file.triggers().next().map(|t| &t.event),
        Some(&Event::TakeItem("has".into()))
    );
    assert_eq!(first_if(&file).condition, Condition::HasItem("has".into()));
}

#[test]
fn grouped_room_list_yields_to_next_condition() {
    let file = parse_ok(r#"trigger "t" when always { if any(ambient s1 in rooms r1, r2, has flag f) { do show "x" } }"#);
    assert_eq!(
        first_if(&file).condition,
        Condition::Any(vec![
            Condition::Ambient {
                spinner: "s1".into(),
                rooms: Some(vec!["r1".into(), "r2".into()]),
            },
            Condition::HasFlag("f".into()),
        ])
    );
}

#[test]
fn standalone_room_list_takes_every_comma() {
    let file = parse_ok(r#"trigger "t" when always { if in rooms a, b, c { do show "x" } }"#);
    assert_eq!(
        first_if(&file).condition,
        Condition::InRooms(vec!["a".into(), "b".into(), "c".into()])
    );
}

#[test]
fn groups_nest() {
    let file = parse_ok(
        r#"trigger "t" when always { if all(any(has flag a, missing item b), chance 50%) { do show "x" } }"#,
    );
    assert_eq!(
        first_if(&file).condition,
        Condition::All(vec![
            Condition::Any(vec![Condition::HasFlag("a".into()), Condition::MissingItem("b".into())]),
            Condition::Chance(50),
        ])
    );
}

#[test]
fn every_string_form_decodes_alike() {
    let file = parse_ok(
        r####"trigger "t" when always {
    do show "a\"b"
    do show 'a"b'
    do show '''a"b'''
    do show """a"b"""
    do show r#"a"b"#
}"####,
    );
    let trigger = file.triggers().next().expect("trigger");
    let shown: Vec<_> = actions_of(&trigger.block)
        .into_iter()
        .map(|action| match action {
            Action::Show(text) => text.as_str(),
            other => panic!("expected show, got {other:?}"),
        })
        .collect();
    assert_eq!(shown, vec![r#"a"b"#; 5]);
}

#[test]
fn events_cover_every_form() {
    let cases = [
        ("always", Event::Always),
        ("enter room hall", Event::EnterRoom("hall".into())),
        ("leave room hall", Event::LeaveRoom("hall".into())),
        ("take item cup", Event::TakeItem("cup".into())),
        (
            "take item cup from npc bob",
            Event::TakeFromNpc {
                item: "cup".into(),
                npc: "bob".into(),
            },
        ),
        ("drop item cup", Event::DropItem("cup".into())),
        ("unlock item safe", Event::UnlockItem("safe".into())),
        ("look at item map", Event::LookAtItem("map".into())),
        ("talk to npc bob", Event::TalkToNpc("bob".into())),
        (
            "use item torch ability ignite",
            Event::UseItem {
                item: "torch".into(),
                ability: Some("ignite".into()),
            },
        ),
        (
            "use item crowbar on item crate interaction pry",
            Event::UseItemOnItem {
                tool: "crowbar".into(),
                target: "crate".into(),
                interaction: "pry".into(),
            },
        ),
        (
            "act burn on item note",
            Event::ActOnItem {
                interaction: "burn".into(),
                item: "note".into(),
            },
        ),
        (
            "give item cup to npc bob",
            Event::GiveToNpc {
                item: "cup".into(),
                npc: "bob".into(),
            },
        ),
        (
            "insert item coin into item jar",
            Event::InsertItemInto {
                item: "coin".into(),
                container: "jar".into(),
            },
        ),
        (
            "drink item tea",
            Event::Ingest {
                mode: IngestMode::Drink,
                item: "tea".into(),
            },
        ),
    ];
    for (event, expected) in cases {
        let file = parse_ok(&format!("trigger \"t\" when {event} {{ do show \"x\" }}"));
        assert_eq!(file.triggers().next().map(|t| &t.event), Some(&expected), "{event}");
    }
}

#[test]
fn numeric_words_serve_as_ids() {
    let file = parse_ok(
        r#"
room 101 { name "Room 101" exit 2 -> b }
trigger "t" when enter room 101 { if has flag 1 { do show "x" } }
"#,
    );
    let room = file.rooms().next().expect("room");
    assert_eq!(room.id, "101");
    assert_eq!(room.exits[0].direction, "2");
    assert_eq!(first_if(&file).condition, Condition::HasFlag("1".into()));
}

#[test]
fn only_once_may_span_lines() {
    let file = parse_ok("trigger \"t\" only\n    once when always { do show \"x\" }");
    assert!(file.triggers().next().expect("trigger").only_once);
}

#[test]
fn dangling_references_are_legal() {
    let file = parse_ok(
        r#"
room a { exit east -> nowhere-at-all }
trigger "t" when enter room ghost-room { do push player to void }
"#,
    );
    assert_eq!(file.definitions.len(), 2);
}
