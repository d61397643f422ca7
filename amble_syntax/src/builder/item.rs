use super::{Builder, Cursor, ShapeResult, ability, container_state, unexpected};
use crate::{
    ast::{AbilityRequirement, Consumable, ItemDef, ItemLocation, WhenConsumed},
    error::SemanticShapeError,
    parser::{Rule, SyntaxNode},
};

impl Builder {
    pub(super) fn item(&mut self, node: &SyntaxNode) -> ShapeResult<ItemDef> {
        let mut cur = Cursor::new(node);
        let mut item = ItemDef {
            id: cur.word("item id")?,
            name: None,
            desc: None,
            location: None,
            portable: None,
            restricted: None,
            abilities: Vec::new(),
            text: Vec::new(),
            container_state: None,
            requires: Vec::new(),
            consumable: None,
            span: node.span,
        };
        for stmt in cur.nodes() {
            let built = self.item_stmt(&mut item, stmt);
            self.keep(built);
        }
        Ok(item)
    }

    fn item_stmt(&mut self, item: &mut ItemDef, stmt: &SyntaxNode) -> ShapeResult<()> {
        let mut sc = Cursor::new(stmt);
        match stmt.rule {
            Rule::ItemName => {
                let name = sc.string("item name")?;
                self.set_once(&mut item.name, name, "item name", stmt.span);
            },
            Rule::ItemDesc => {
                let desc = sc.string("item description")?;
                self.set_once(&mut item.desc, desc, "item description", stmt.span);
            },
            Rule::ItemPortable => {
                let portable = sc.boolean("portable")?;
                self.set_once(&mut item.portable, portable, "portable", stmt.span);
            },
            Rule::ItemRestricted => {
                let restricted = sc.boolean("restricted")?;
                self.set_once(&mut item.restricted, restricted, "restricted", stmt.span);
            },
            Rule::LocInventory | Rule::LocRoom | Rule::LocChest | Rule::LocNpc | Rule::LocNowhere => {
                let location = item_location(stmt)?;
                self.set_once(&mut item.location, location, "item location", stmt.span);
            },
            Rule::Ability => item.abilities.push(ability(stmt)?),
            Rule::ItemText => item.text.push(sc.string("item text")?),
            Rule::ItemContainerState => {
                let state = container_state(sc.token("container state")?)?;
                self.set_once(&mut item.container_state, state, "container state", stmt.span);
            },
            Rule::ItemRequires => item.requires.push(AbilityRequirement {
                ability: sc.word("required ability")?,
                interaction: sc.word("interaction")?,
            }),
            Rule::Consumable => {
                let consumable = self.consumable(stmt)?;
                self.set_once(&mut item.consumable, consumable, "consumable", stmt.span);
            },
            _ => return Err(unexpected(stmt, "item statement")),
        }
        Ok(())
    }

    fn consumable(&mut self, node: &SyntaxNode) -> ShapeResult<Consumable> {
        let mut uses_left = None;
        let mut consume_on = Vec::new();
        let mut when_consumed = None;
        for stmt in node.nodes() {
            let mut sc = Cursor::new(stmt);
            let built = match stmt.rule {
                Rule::ConsumableUses => sc.number("uses_left").map(|(value, span)| {
                    let uses = u32::try_from(value).ok().filter(|&n| n > 0);
                    if uses.is_none() {
                        self.errors.push(SemanticShapeError::OutOfRange {
                            what: "uses_left",
                            value,
                            span,
                        });
                    }
                    self.set_once(&mut uses_left, uses.unwrap_or_default(), "uses_left", stmt.span);
                }),
                Rule::ConsumeOn => sc
                    .node("consume_on ability")
                    .and_then(ability)
                    .map(|a| consume_on.push(a)),
                Rule::WhenConsumedDespawn => {
                    self.set_once(&mut when_consumed, WhenConsumed::Despawn, "when_consumed", stmt.span);
                    Ok(())
                },
                Rule::WhenConsumedReplaceInventory | Rule::WhenConsumedReplaceRoom => {
                    sc.word("replacement item").map(|replacement| {
                        let policy = if stmt.rule == Rule::WhenConsumedReplaceInventory {
                            WhenConsumed::ReplaceInventory(replacement)
                        } else {
                            WhenConsumed::ReplaceCurrentRoom(replacement)
                        };
                        self.set_once(&mut when_consumed, policy, "when_consumed", stmt.span);
                    })
                },
                _ => Err(unexpected(stmt, "consumable statement")),
            };
            self.keep(built);
        }
        let missing = |what| SemanticShapeError::MissingField { what, span: node.span };
        Ok(Consumable {
            uses_left: uses_left.ok_or(missing("uses_left"))?,
            consume_on,
            when_consumed: when_consumed.ok_or(missing("when_consumed"))?,
        })
    }
}

fn item_location(node: &SyntaxNode) -> ShapeResult<ItemLocation> {
    let mut cur = Cursor::new(node);
    let location = match node.rule {
        Rule::LocInventory => ItemLocation::Inventory,
        Rule::LocRoom => ItemLocation::Room(cur.word("room id")?),
        Rule::LocChest => ItemLocation::Chest(cur.word("container item id")?),
        Rule::LocNpc => ItemLocation::Npc(cur.word("npc id")?),
        _ => ItemLocation::Nowhere(cur.string("nowhere note")?),
    };
    Ok(location)
}
