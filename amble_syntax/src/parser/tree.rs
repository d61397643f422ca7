//! Generic syntax tree emitted by the parser.
//!
//! Nodes are tagged with the grammar [`Rule`] that produced them and keep only
//! significant children: identifiers, literals, nested nodes, and the few
//! keywords whose spelling carries a choice (`in`/`on`, `route`/`random`, ...).

use serde::Serialize;

use crate::{lexer::Token, span::Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rule {
    SourceFile,
    SetDecl,
    RoomDef,
    ItemDef,
    NpcDef,
    TriggerDef,
    SpinnerDef,
    GoalDef,

    // shared pieces
    IdList,
    StateWord,
    StateCustom,
    Ability,
    Note,
    Width,
    Limit,
    Reason,

    // room statements
    RoomName,
    RoomDesc,
    RoomVisited,
    Exit,
    ExitBlock,
    ExitRequiredItems,
    ExitRequiredFlags,
    ExitBarred,
    ExitHidden,
    ExitLocked,
    OverlayFlagBinary,
    OverlayItemPresence,
    OverlayNpcPresence,
    OverlayNpcStates,
    OverlayConditional,
    OverlaySetText,
    OverlayUnsetText,
    OverlayPresentText,
    OverlayAbsentText,
    OverlayStateLine,
    OverlayText,
    OvFlagSet,
    OvFlagUnset,
    OvFlagComplete,
    OvItemPresent,
    OvItemAbsent,
    OvPlayerHasItem,
    OvPlayerMissingItem,
    OvNpcPresent,
    OvNpcAbsent,
    OvNpcInState,
    OvItemInRoom,

    // item statements
    ItemName,
    ItemDesc,
    ItemPortable,
    ItemRestricted,
    ItemText,
    ItemContainerState,
    ItemRequires,
    LocInventory,
    LocRoom,
    LocChest,
    LocNpc,
    LocNowhere,
    Consumable,
    ConsumableUses,
    ConsumeOn,
    WhenConsumedDespawn,
    WhenConsumedReplaceInventory,
    WhenConsumedReplaceRoom,

    // npc statements
    NpcName,
    NpcDesc,
    NpcState,
    NpcMovement,
    MovementTiming,
    MovementActive,
    MovementLoop,
    Dialogue,

    // triggers
    OnlyOnce,
    TriggerBlock,
    DoStmt,
    CondBlock,

    // events
    EvAlways,
    EvEnterRoom,
    EvLeaveRoom,
    EvTakeItem,
    EvTakeFromNpc,
    EvDropItem,
    EvOpenItem,
    EvUnlockItem,
    EvLookAtItem,
    EvTalkToNpc,
    EvUseItem,
    EvUseItemOnItem,
    EvActOnItem,
    EvGiveToNpc,
    EvInsertItem,
    EvIngest,

    // conditions
    CondAny,
    CondAll,
    CondHasFlag,
    CondMissingFlag,
    CondHasItem,
    CondMissingItem,
    CondHasVisited,
    CondFlagInProgress,
    CondFlagComplete,
    CondWithNpc,
    CondNpcHasItem,
    CondNpcInState,
    CondPlayerInRoom,
    CondContainerHasItem,
    CondChance,
    CondAmbient,
    CondInRooms,

    // actions
    ActModifyItem,
    PatchName,
    PatchDesc,
    PatchText,
    PatchPortable,
    PatchRestricted,
    PatchContainerState,
    PatchAddAbility,
    PatchRemoveAbility,
    ActShow,
    ActAddFlag,
    ActRemoveFlag,
    ActResetFlag,
    ActAdvanceFlag,
    ActAddWedge,
    ActAddSeqFlag,
    ActReplaceItem,
    ActReplaceDropItem,
    ActSpawnItemRoom,
    ActSpawnItemContainer,
    ActSpawnItemInventory,
    ActSpawnItemCurrentRoom,
    ActSpawnNpc,
    ActDespawnNpc,
    ActDespawnItem,
    ActAwardPoints,
    ActLockItem,
    ActUnlockItem,
    ActLockExit,
    ActUnlockExit,
    ActRevealExit,
    ActPushPlayer,
    ActSetItemDesc,
    ActNpcSays,
    ActNpcRandomDialogue,
    ActNpcRefuseItem,
    ActSetNpcActive,
    ActSetNpcState,
    ActDenyRead,
    ActRestrictItem,
    ActGiveItemToPlayer,
    ActSetBarredMessage,
    ActSetContainerState,
    ActSpinnerMessage,
    ActSchedule,
    ActScheduleIf,
    OnFalseCancel,
    OnFalseRetryNextTurn,
    OnFalseRetryAfter,

    // spinners
    Wedge,

    // goals
    GoalName,
    GoalDesc,
    GoalGroup,
    GoalStart,
    GoalDone,
    GoalFail,
    GcHasFlag,
    GcMissingFlag,
    GcHasItem,
    GcReachedRoom,
    GcGoalComplete,
    GcFlagInProgress,
    GcFlagComplete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(Token),
}

impl SyntaxElement {
    pub fn span(&self) -> Span {
        match self {
            SyntaxElement::Node(n) => n.span,
            SyntaxElement::Token(t) => t.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxNode {
    pub rule: Rule,
    pub span: Span,
    pub children: Vec<SyntaxElement>,
}

impl SyntaxNode {
    pub fn nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter_map(|c| match c {
            SyntaxElement::Node(n) => Some(n),
            SyntaxElement::Token(_) => None,
        })
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(|c| match c {
            SyntaxElement::Token(t) => Some(t),
            SyntaxElement::Node(_) => None,
        })
    }

    /// First direct child node with the given rule.
    pub fn find(&self, rule: Rule) -> Option<&SyntaxNode> {
        self.nodes().find(|n| n.rule == rule)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.nodes().map(SyntaxNode::node_count).sum::<usize>()
    }
}

/// Parser output: the root `SourceFile` node plus comment trivia spans.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxTree {
    pub root: SyntaxNode,
    pub comments: Vec<Span>,
}

/// Accumulates children for a node under construction.
#[derive(Debug)]
pub(crate) struct NodeBuilder {
    pub(crate) rule: Rule,
    pub(crate) start: Span,
    pub(crate) children: Vec<SyntaxElement>,
}

impl NodeBuilder {
    pub(crate) fn token(&mut self, tok: Token) {
        self.children.push(SyntaxElement::Token(tok));
    }

    pub(crate) fn node(&mut self, node: SyntaxNode) {
        self.children.push(SyntaxElement::Node(node));
    }
}
