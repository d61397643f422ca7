use super::{PResult, Parser, Rule, SyntaxNode};

const GOAL_STMTS: &[&str] = &["name", "desc", "description", "group", "start", "done", "fail"];
const GOAL_CONDITIONS: &[&str] = &["has", "missing", "reached", "goal", "flag"];

impl Parser {
    /// `goal ID { name .. desc .. group .. start when .. done when .. [fail when ..] }`
    pub(super) fn goal_def(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::GoalDef);
        self.expect_kw("goal")?;
        b.token(self.expect_word("goal id")?);
        self.block(&mut b, GOAL_STMTS, Self::goal_stmt)?;
        Ok(self.finish(b))
    }

    fn goal_stmt(&mut self) -> PResult<SyntaxNode> {
        if self.at_kw("name") {
            self.keyword_then_string(Rule::GoalName, "name")
        } else if self.at_any_kw(&["desc", "description"]) {
            self.description(Rule::GoalDesc)
        } else if self.at_kw("group") {
            self.leaf(Rule::GoalGroup, |p, b| {
                p.expect_kw("group")?;
                b.token(p.expect_word("goal group")?);
                Ok(())
            })
        } else {
            let mut b = self.start(Rule::GoalStart);
            let phase = self.expect_one_of(&["start", "done", "fail"])?;
            b.rule = match phase.text.as_str() {
                "start" => Rule::GoalStart,
                "done" => Rule::GoalDone,
                _ => Rule::GoalFail,
            };
            self.expect_kw("when")?;
            b.node(self.goal_condition()?);
            Ok(self.finish(b))
        }
    }

    fn goal_condition(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::GcHasFlag);
        let head = self.expect_one_of(GOAL_CONDITIONS)?;
        b.rule = match head.text.as_str() {
            "has" => {
                let what = self.expect_one_of(&["flag", "item"])?;
                if what.text == "flag" {
                    Rule::GcHasFlag
                } else {
                    Rule::GcHasItem
                }
            },
            "missing" => {
                self.expect_kw("flag")?;
                Rule::GcMissingFlag
            },
            "reached" => {
                self.expect_kw("room")?;
                Rule::GcReachedRoom
            },
            "goal" => {
                self.expect_kw("complete")?;
                Rule::GcGoalComplete
            },
            _ => {
                if self.eat_kw("in") {
                    self.expect_kw("progress")?;
                    Rule::GcFlagInProgress
                } else {
                    self.expect_one_of(&["in", "complete"])?;
                    Rule::GcFlagComplete
                }
            },
        };
        b.token(self.expect_word("id")?);
        Ok(self.finish(b))
    }
}
