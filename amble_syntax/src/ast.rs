//! Typed document model produced by the AST builder.
//!
//! Cross-references (rooms, items, npcs, flags, goals, spinners, sets) are kept
//! as opaque newtype-wrapped strings. Nothing here checks that a referenced
//! entity exists; that belongs to a later semantic pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::span::Span;

macro_rules! id_newtype {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub String);

            impl $name {
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self {
                    Self(s.to_string())
                }
            }

            impl From<String> for $name {
                fn from(s: String) -> Self {
                    Self(s)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl PartialEq<str> for $name {
                fn eq(&self, other: &str) -> bool {
                    self.0 == other
                }
            }

            impl PartialEq<&str> for $name {
                fn eq(&self, other: &&str) -> bool {
                    self.0 == *other
                }
            }
        )+
    };
}

id_newtype!(
    /// Reference to a room definition.
    RoomId,
    /// Reference to an item definition.
    ItemId,
    /// Reference to an npc definition.
    NpcId,
    /// Name of a game flag (may carry a `#step` suffix for sequence flags).
    FlagName,
    GoalId,
    SpinnerId,
    /// Name introduced by `let set`.
    SetName,
    /// Capability an item exposes (e.g. `cut`, `ignite`).
    AbilityName,
    /// Action applied to an item (e.g. `open`, `burn`).
    InteractionName,
    /// An npc state outside the builtin set.
    CustomState,
    /// Free-form movement timing tag.
    TimingTag,
);

/// A parsed document: top-level definitions in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceFile {
    pub definitions: Vec<Definition>,
    /// Spans of `#` comments, kept for tooling.
    pub comments: Vec<Span>,
}

impl SourceFile {
    pub fn sets(&self) -> impl Iterator<Item = &SetDecl> {
        self.definitions.iter().filter_map(Definition::set_ref)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &RoomDef> {
        self.definitions.iter().filter_map(Definition::room_ref)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemDef> {
        self.definitions.iter().filter_map(Definition::item_ref)
    }

    pub fn npcs(&self) -> impl Iterator<Item = &NpcDef> {
        self.definitions.iter().filter_map(Definition::npc_ref)
    }

    pub fn triggers(&self) -> impl Iterator<Item = &TriggerDef> {
        self.definitions.iter().filter_map(Definition::trigger_ref)
    }

    pub fn spinners(&self) -> impl Iterator<Item = &SpinnerDef> {
        self.definitions.iter().filter_map(Definition::spinner_ref)
    }

    pub fn goals(&self) -> impl Iterator<Item = &GoalDef> {
        self.definitions.iter().filter_map(Definition::goal_ref)
    }
}

/// One top-level definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, variantly::Variantly)]
pub enum Definition {
    Set(SetDecl),
    Room(RoomDef),
    Item(ItemDef),
    Npc(NpcDef),
    Trigger(TriggerDef),
    Spinner(SpinnerDef),
    Goal(GoalDef),
}

impl Definition {
    pub fn span(&self) -> Span {
        match self {
            Definition::Set(d) => d.span,
            Definition::Room(d) => d.span,
            Definition::Item(d) => d.span,
            Definition::Npc(d) => d.span,
            Definition::Trigger(d) => d.span,
            Definition::Spinner(d) => d.span,
            Definition::Goal(d) => d.span,
        }
    }
}

/// `let set NAME = (room, ...)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDecl {
    pub name: SetName,
    pub rooms: Vec<RoomId>,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDef {
    pub id: RoomId,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub visited: Option<bool>,
    pub exits: Vec<Exit>,
    pub overlays: Vec<Overlay>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    /// Direction label; either a bare word (`north`) or a quoted phrase.
    pub direction: String,
    pub to: RoomId,
    pub required_items: Vec<ItemId>,
    pub required_flags: Vec<FlagName>,
    pub barred: Option<String>,
    pub hidden: bool,
    pub locked: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, variantly::Variantly)]
pub enum OverlayKind {
    /// `overlay if flag F { set "..." unset "..." }`
    FlagBinary {
        flag: FlagName,
        set_text: String,
        unset_text: String,
    },
    /// `overlay if item|npc X { present "..." absent "..." }`
    PresencePair {
        subject: PresenceSubject,
        present_text: String,
        absent_text: String,
    },
    /// `overlay if npc N here { happy "..." custom(x) "..." }`
    NpcStateSet { npc: NpcId, lines: Vec<NpcStateLine> },
    /// All conditions must hold for `text` to show.
    Conditional { conditions: Vec<OverlayCond>, text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresenceSubject {
    Item(ItemId),
    Npc(NpcId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcStateLine {
    pub state: NpcState,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlayCond {
    FlagSet(FlagName),
    FlagUnset(FlagName),
    FlagComplete(FlagName),
    ItemPresent(ItemId),
    ItemAbsent(ItemId),
    PlayerHasItem(ItemId),
    PlayerMissingItem(ItemId),
    NpcPresent(NpcId),
    NpcAbsent(NpcId),
    NpcInState { npc: NpcId, state: NpcState },
    ItemInRoom { item: ItemId, room: RoomId },
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub location: Option<ItemLocation>,
    pub portable: Option<bool>,
    pub restricted: Option<bool>,
    pub abilities: Vec<Ability>,
    /// Readable text blocks (`text "..."`), in source order.
    pub text: Vec<String>,
    pub container_state: Option<ContainerState>,
    pub requires: Vec<AbilityRequirement>,
    pub consumable: Option<Consumable>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemLocation {
    Inventory,
    Room(RoomId),
    Chest(ItemId),
    Npc(NpcId),
    /// Not placed in the world yet; the note says why.
    Nowhere(String),
}

/// An ability, optionally aimed at another item: `ability unlock (vault-door)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub name: AbilityName,
    pub target: Option<ItemId>,
}

/// `requires <ability> to <interaction>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityRequirement {
    pub ability: AbilityName,
    pub interaction: InteractionName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerState {
    Open,
    Closed,
    Locked,
    TransparentClosed,
    TransparentLocked,
}

impl ContainerState {
    pub const WORDS: &'static [&'static str] =
        &["open", "closed", "locked", "transparentClosed", "transparentLocked"];

    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "locked" => Some(Self::Locked),
            "transparentClosed" => Some(Self::TransparentClosed),
            "transparentLocked" => Some(Self::TransparentLocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumable {
    pub uses_left: u32,
    /// Abilities whose use spends a charge. Empty means any use.
    pub consume_on: Vec<Ability>,
    pub when_consumed: WhenConsumed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WhenConsumed {
    Despawn,
    ReplaceInventory(ItemId),
    ReplaceCurrentRoom(ItemId),
}

// ---------------------------------------------------------------------------
// NPCs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDef {
    pub id: NpcId,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub location: Option<NpcLocation>,
    pub state: Option<NpcState>,
    pub movement: Option<Movement>,
    pub dialogue: Vec<DialogueBlock>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NpcLocation {
    Room(RoomId),
    Nowhere(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinState {
    Normal,
    Happy,
    Bored,
    Tired,
    Sad,
    Mad,
}

impl BuiltinState {
    pub const WORDS: &'static [&'static str] = &["normal", "happy", "bored", "tired", "sad", "mad"];

    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "normal" => Some(Self::Normal),
            "happy" => Some(Self::Happy),
            "bored" => Some(Self::Bored),
            "tired" => Some(Self::Tired),
            "sad" => Some(Self::Sad),
            "mad" => Some(Self::Mad),
            _ => None,
        }
    }
}

impl fmt::Display for BuiltinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            BuiltinState::Normal => "normal",
            BuiltinState::Happy => "happy",
            BuiltinState::Bored => "bored",
            BuiltinState::Tired => "tired",
            BuiltinState::Sad => "sad",
            BuiltinState::Mad => "mad",
        };
        f.write_str(word)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, variantly::Variantly)]
pub enum NpcState {
    Builtin(BuiltinState),
    Custom(CustomState),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub kind: MovementKind,
    pub rooms: Vec<RoomId>,
    pub timing: Option<TimingTag>,
    pub active: Option<bool>,
    pub loop_route: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    Route,
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueBlock {
    pub state: NpcState,
    pub lines: Vec<String>,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
    pub name: String,
    pub only_once: bool,
    pub notes: Vec<String>,
    pub event: Event,
    pub block: Vec<TriggerStmt>,
    pub span: Span,
}

/// What the player does to set a trigger off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, variantly::Variantly)]
pub enum Event {
    /// Checked every turn.
    Always,
    EnterRoom(RoomId),
    LeaveRoom(RoomId),
    TakeItem(ItemId),
    DropItem(ItemId),
    OpenItem(ItemId),
    UnlockItem(ItemId),
    LookAtItem(ItemId),
    TalkToNpc(NpcId),
    UseItem {
        item: ItemId,
        ability: Option<AbilityName>,
    },
    UseItemOnItem {
        tool: ItemId,
        target: ItemId,
        interaction: InteractionName,
    },
    ActOnItem {
        interaction: InteractionName,
        item: ItemId,
    },
    GiveToNpc {
        item: ItemId,
        npc: NpcId,
    },
    TakeFromNpc {
        item: ItemId,
        npc: NpcId,
    },
    InsertItemInto {
        item: ItemId,
        container: ItemId,
    },
    Ingest {
        mode: IngestMode,
        item: ItemId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestMode {
    Eat,
    Drink,
    Inhale,
}

impl IngestMode {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "eat" => Some(Self::Eat),
            "drink" => Some(Self::Drink),
            "inhale" => Some(Self::Inhale),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerStmt {
    Do(DoAction),
    If(CondBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoAction {
    pub action: Action,
    pub span: Span,
}

/// `if COND { do ... }`. The body never contains another `if`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondBlock {
    pub condition: Condition,
    pub actions: Vec<DoAction>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// True if any member holds.
    Any(Vec<Condition>),
    /// True if every member holds.
    All(Vec<Condition>),
    HasFlag(FlagName),
    MissingFlag(FlagName),
    HasItem(ItemId),
    MissingItem(ItemId),
    HasVisited(RoomId),
    FlagInProgress(FlagName),
    FlagComplete(FlagName),
    WithNpc(NpcId),
    NpcHasItem {
        npc: NpcId,
        item: ItemId,
    },
    NpcInState {
        npc: NpcId,
        state: NpcState,
    },
    PlayerInRoom(RoomId),
    ContainerHasItem {
        container: ItemId,
        item: ItemId,
    },
    /// Percent chance, 1..=100.
    Chance(u8),
    Ambient {
        spinner: SpinnerId,
        rooms: Option<Vec<RoomId>>,
    },
    InRooms(Vec<RoomId>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    ModifyItem {
        item: ItemId,
        patch: ItemPatch,
    },
    Show(String),
    AddFlag(FlagName),
    RemoveFlag(FlagName),
    ResetFlag(FlagName),
    AdvanceFlag(FlagName),
    AddWedge {
        spinner: SpinnerId,
        text: String,
        width: Option<u32>,
    },
    AddSeqFlag {
        flag: FlagName,
        limit: Option<u32>,
    },
    ReplaceItem {
        old: ItemId,
        new: ItemId,
    },
    /// Swap the item for another when the player drops it.
    ReplaceDropItem {
        old: ItemId,
        new: ItemId,
    },
    SpawnItemIntoRoom {
        item: ItemId,
        room: RoomId,
    },
    SpawnItemIntoContainer {
        item: ItemId,
        container: ItemId,
    },
    SpawnItemInInventory(ItemId),
    SpawnItemInCurrentRoom(ItemId),
    SpawnNpcIntoRoom {
        npc: NpcId,
        room: RoomId,
    },
    DespawnNpc(NpcId),
    DespawnItem(ItemId),
    AwardPoints {
        amount: i64,
        reason: Option<String>,
    },
    LockItem(ItemId),
    UnlockItem(ItemId),
    LockExit {
        from: RoomId,
        direction: String,
    },
    UnlockExit {
        from: RoomId,
        direction: String,
    },
    RevealExit {
        from: RoomId,
        to: RoomId,
        direction: String,
    },
    PushPlayerTo(RoomId),
    SetItemDescription {
        item: ItemId,
        text: String,
    },
    NpcSays {
        npc: NpcId,
        quote: String,
    },
    NpcRandomDialogue(NpcId),
    NpcRefuseItem {
        npc: NpcId,
        reason: String,
    },
    SetNpcActive {
        npc: NpcId,
        active: bool,
    },
    SetNpcState {
        npc: NpcId,
        state: NpcState,
    },
    DenyRead(String),
    RestrictItem(ItemId),
    GiveItemToPlayer {
        item: ItemId,
        npc: NpcId,
    },
    SetBarredMessage {
        from: RoomId,
        to: RoomId,
        message: String,
    },
    SetContainerState {
        item: ItemId,
        state: ContainerState,
    },
    SpinnerMessage(SpinnerId),
    Schedule(Schedule),
    ScheduleIf(ScheduleIf),
}

/// Field changes applied by `modify item X { ... }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub text: Option<String>,
    pub portable: Option<bool>,
    pub restricted: Option<bool>,
    pub container_state: Option<ContainerStatePatch>,
    pub add_abilities: Vec<Ability>,
    pub remove_abilities: Vec<Ability>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerStatePatch {
    Set(ContainerState),
    /// `container state off`: the item stops being a container.
    Remove,
}

/// Whether `N` counts from now (`in`) or names an absolute turn (`on`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleAnchor {
    In,
    On,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub anchor: ScheduleAnchor,
    pub turns: u32,
    pub note: Option<String>,
    pub body: Vec<TriggerStmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleIf {
    pub anchor: ScheduleAnchor,
    pub turns: u32,
    pub guard: Condition,
    /// What to do when `guard` is false at fire time; `None` leaves it to the runtime.
    pub retry: Option<RetryPolicy>,
    pub note: Option<String>,
    pub body: Vec<TriggerStmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryPolicy {
    Cancel,
    RetryNextTurn,
    RetryAfter(u32),
}

// ---------------------------------------------------------------------------
// Spinners and goals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinnerDef {
    pub id: SpinnerId,
    pub wedges: Vec<Wedge>,
    pub span: Span,
}

/// One outcome of a spinner. `width` is a relative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wedge {
    pub text: String,
    pub width: Option<u32>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDef {
    pub id: GoalId,
    pub name: String,
    pub desc: String,
    pub group: GoalGroup,
    pub start: GoalCondition,
    pub done: GoalCondition,
    pub fail: Option<GoalCondition>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalGroup {
    Required,
    Optional,
    StatusEffect,
}

impl GoalGroup {
    pub const WORDS: &'static [&'static str] = &["required", "optional", "status-effect"];

    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "required" => Some(Self::Required),
            "optional" => Some(Self::Optional),
            "status-effect" => Some(Self::StatusEffect),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GoalCondition {
    HasFlag(FlagName),
    MissingFlag(FlagName),
    HasItem(ItemId),
    ReachedRoom(RoomId),
    GoalComplete(GoalId),
    FlagInProgress(FlagName),
    FlagComplete(FlagName),
}
