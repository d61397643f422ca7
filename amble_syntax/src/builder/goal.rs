use super::{Builder, Cursor, ShapeResult, unexpected};
use crate::{
    ast::{GoalCondition, GoalDef, GoalGroup},
    error::SemanticShapeError,
    parser::{Rule, SyntaxNode},
};

impl Builder {
    pub(super) fn goal(&mut self, node: &SyntaxNode) -> ShapeResult<GoalDef> {
        let mut cur = Cursor::new(node);
        let id = cur.word("goal id")?;
        let mut name = None;
        let mut desc = None;
        let mut group = None;
        let mut start = None;
        let mut done = None;
        let mut fail = None;
        let mut empty = true;
        for stmt in cur.nodes() {
            empty = false;
            let mut sc = Cursor::new(stmt);
            match stmt.rule {
                Rule::GoalName => {
                    let value = sc.string("goal name")?;
                    self.set_once(&mut name, value, "goal name", stmt.span);
                },
                Rule::GoalDesc => {
                    let value = sc.string("goal description")?;
                    self.set_once(&mut desc, value, "goal description", stmt.span);
                },
                Rule::GoalGroup => {
                    let tok = sc.token("goal group")?;
                    let value = GoalGroup::from_word(&tok.text).ok_or_else(|| SemanticShapeError::InvalidEnumValue {
                        what: "goal group",
                        value: tok.text.clone(),
                        expected: GoalGroup::WORDS,
                        span: tok.span,
                    })?;
                    self.set_once(&mut group, value, "goal group", stmt.span);
                },
                Rule::GoalStart => {
                    let cond = goal_condition(sc.node("start condition")?)?;
                    self.set_once(&mut start, cond, "goal start", stmt.span);
                },
                Rule::GoalDone => {
                    let cond = goal_condition(sc.node("done condition")?)?;
                    self.set_once(&mut done, cond, "goal done", stmt.span);
                },
                Rule::GoalFail => {
                    let cond = goal_condition(sc.node("fail condition")?)?;
                    self.set_once(&mut fail, cond, "goal fail", stmt.span);
                },
                _ => return Err(unexpected(stmt, "goal statement")),
            }
        }
        if empty {
            return Err(SemanticShapeError::EmptyBlock {
                what: "goal block",
                span: node.span,
            });
        }
        let missing = |what| SemanticShapeError::MissingField { what, span: node.span };
        Ok(GoalDef {
            id,
            name: name.ok_or(missing("goal name"))?,
            desc: desc.ok_or(missing("goal description"))?,
            group: group.ok_or(missing("goal group"))?,
            start: start.ok_or(missing("goal start"))?,
            done: done.ok_or(missing("goal done"))?,
            fail,
            span: node.span,
        })
    }
}

fn goal_condition(node: &SyntaxNode) -> ShapeResult<GoalCondition> {
    let mut cur = Cursor::new(node);
    let cond = match node.rule {
        Rule::GcHasFlag => GoalCondition::HasFlag(cur.word("flag name")?),
        Rule::GcMissingFlag => GoalCondition::MissingFlag(cur.word("flag name")?),
        Rule::GcHasItem => GoalCondition::HasItem(cur.word("item id")?),
        Rule::GcReachedRoom => GoalCondition::ReachedRoom(cur.word("room id")?),
        Rule::GcGoalComplete => GoalCondition::GoalComplete(cur.word("goal id")?),
        Rule::GcFlagInProgress => GoalCondition::FlagInProgress(cur.word("flag name")?),
        Rule::GcFlagComplete => GoalCondition::FlagComplete(cur.word("flag name")?),
        _ => return Err(unexpected(node, "goal condition")),
    };
    Ok(cond)
}
