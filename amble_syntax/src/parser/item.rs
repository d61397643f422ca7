use super::{PResult, Parser, Rule, SyntaxNode};

const ITEM_STMTS: &[&str] = &[
    "name",
    "desc",
    "description",
    "portable",
    "restricted",
    "location",
    "ability",
    "text",
    "container",
    "requires",
    "consumable",
];
const LOCATIONS: &[&str] = &["inventory", "room", "chest", "container", "npc", "nowhere"];
const CONSUMABLE_STMTS: &[&str] = &["uses_left", "consume_on", "when_consumed"];

impl Parser {
    /// `item ID { item_stmt* }`
    pub(super) fn item_def(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::ItemDef);
        self.expect_kw("item")?;
        b.token(self.expect_word("item id")?);
        self.block(&mut b, ITEM_STMTS, Self::item_stmt)?;
        Ok(self.finish(b))
    }

    fn item_stmt(&mut self) -> PResult<SyntaxNode> {
        if self.at_kw("name") {
            self.keyword_then_string(Rule::ItemName, "name")
        } else if self.at_any_kw(&["desc", "description"]) {
            self.description(Rule::ItemDesc)
        } else if self.at_kw("portable") {
            self.keyword_then_bool(Rule::ItemPortable, "portable")
        } else if self.at_kw("restricted") {
            self.keyword_then_bool(Rule::ItemRestricted, "restricted")
        } else if self.at_kw("location") {
            self.item_location()
        } else if self.at_kw("ability") {
            self.ability()
        } else if self.at_kw("text") {
            self.keyword_then_string(Rule::ItemText, "text")
        } else if self.at_kw("container") {
            self.leaf(Rule::ItemContainerState, |p, b| {
                p.expect_kw("container")?;
                p.expect_kw("state")?;
                b.token(p.expect_word("container state")?);
                Ok(())
            })
        } else if self.at_kw("requires") {
            self.leaf(Rule::ItemRequires, |p, b| {
                p.expect_kw("requires")?;
                b.token(p.expect_word("ability name")?);
                p.expect_kw("to")?;
                b.token(p.expect_word("interaction name")?);
                Ok(())
            })
        } else if self.at_kw("consumable") {
            let mut b = self.start(Rule::Consumable);
            self.expect_kw("consumable")?;
            self.block(&mut b, CONSUMABLE_STMTS, Self::consumable_stmt)?;
            Ok(self.finish(b))
        } else {
            Err(self.unexpected(ITEM_STMTS))
        }
    }

    fn item_location(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::LocInventory);
        self.expect_kw("location")?;
        let kind = self.expect_one_of(LOCATIONS)?;
        match kind.text.as_str() {
            "inventory" => {
                self.expect_kw("player")?;
            },
            "room" => {
                b.rule = Rule::LocRoom;
                b.token(self.expect_word("room id")?);
            },
            "chest" | "container" => {
                b.rule = Rule::LocChest;
                b.token(self.expect_word("container item id")?);
            },
            "npc" => {
                b.rule = Rule::LocNpc;
                b.token(self.expect_word("npc id")?);
            },
            _ => {
                b.rule = Rule::LocNowhere;
                b.token(self.expect_string()?);
            },
        }
        Ok(self.finish(b))
    }

    fn consumable_stmt(&mut self) -> PResult<SyntaxNode> {
        if self.at_kw("uses_left") {
            self.keyword_then_number(Rule::ConsumableUses, "uses_left")
        } else if self.at_kw("consume_on") {
            self.leaf(Rule::ConsumeOn, |p, b| {
                p.expect_kw("consume_on")?;
                b.node(p.ability()?);
                Ok(())
            })
        } else if self.at_kw("when_consumed") {
            let mut b = self.start(Rule::WhenConsumedDespawn);
            self.expect_kw("when_consumed")?;
            if !self.eat_kw("despawn") {
                self.expect_kw("replace")?;
                if self.eat_kw("inventory") {
                    b.rule = Rule::WhenConsumedReplaceInventory;
                } else if self.eat_kw("current") {
                    self.expect_kw("room")?;
                    b.rule = Rule::WhenConsumedReplaceRoom;
                } else {
                    return Err(self.unexpected(&["inventory", "current"]));
                }
                b.token(self.expect_word("replacement item id")?);
            }
            Ok(self.finish(b))
        } else {
            Err(self.unexpected(CONSUMABLE_STMTS))
        }
    }
}
