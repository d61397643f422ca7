//! Recursive-descent parser for the Amble DSL.
//!
//! The parser consumes lexer tokens (trivia is set aside up front) and emits a
//! generic [`SyntaxTree`]. Each definition kind lives in its own submodule as an
//! `impl Parser` block; cardinality and closed-set checks are left to the
//! AST builder.
//!
//! On a syntax error the parser either stops (`Recovery::Abort`) or records the
//! error and skips ahead to the next statement keyword or closing brace at the
//! same nesting depth (`Recovery::Resync`). Definitions that needed recovery are
//! left out of the tree so the builder never sees half-parsed input.

mod actions;
mod conditions;
mod goal;
mod item;
mod npc;
mod room;
mod spinner;
mod tree;
mod trigger;

pub use tree::{Rule, SyntaxElement, SyntaxNode, SyntaxTree};

use log::{debug, trace};

use crate::{
    config::ParseOptions,
    error::{SyntaxError, SyntaxErrorKind},
    lexer::{Punct, Token, TokenKind},
    span::Span,
};
use tree::NodeBuilder;

pub(crate) type PResult<T> = Result<T, SyntaxError>;

const DEFINITION_KEYWORDS: &[&str] = &["let", "room", "item", "npc", "trigger", "spinner", "goal"];

/// Parse a token stream with default options.
pub fn parse(tokens: impl IntoIterator<Item = Token>) -> (SyntaxTree, Vec<SyntaxError>) {
    parse_with(tokens, &ParseOptions::default())
}

/// Parse a token stream. Trivia tokens are accepted and set aside; comment
/// spans end up in [`SyntaxTree::comments`].
///
/// With [`Recovery::Resync`](crate::Recovery::Resync) every syntax error up to
/// `options.max_errors` is returned and only definitions that parsed cleanly
/// are kept in the tree. With `Abort` the first error ends the parse.
pub fn parse_with(tokens: impl IntoIterator<Item = Token>, options: &ParseOptions) -> (SyntaxTree, Vec<SyntaxError>) {
    let mut parser = Parser::new(tokens, options.clone());
    let root = parser.source_file();
    let tree = SyntaxTree {
        root,
        comments: parser.comments,
    };
    (tree, parser.errors)
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Current `{` nesting depth.
    depth: usize,
    /// Open condition groups and schedule bodies, bounded by `max_nesting`.
    nesting: usize,
    eof: Span,
    comments: Vec<Span>,
    errors: Vec<SyntaxError>,
    options: ParseOptions,
}

/// Span just past the end of `tok`.
fn end_of(tok: &Token) -> Span {
    let newlines = tok.text.matches('\n').count() as u32;
    let column = match tok.text.rfind('\n') {
        Some(idx) => tok.text[idx + 1..].chars().count() as u32 + 1,
        None => tok.span.column + tok.text.chars().count() as u32,
    };
    Span::new(tok.span.end, tok.span.end, tok.span.line + newlines, column)
}

impl Parser {
    fn new(tokens: impl IntoIterator<Item = Token>, options: ParseOptions) -> Self {
        let mut significant = Vec::new();
        let mut comments = Vec::new();
        let mut eof = Span::at_start();
        for tok in tokens {
            eof = end_of(&tok);
            match tok.kind {
                TokenKind::Whitespace => {},
                TokenKind::Comment => comments.push(tok.span),
                _ => significant.push(tok),
            }
        }
        Self {
            tokens: significant,
            pos: 0,
            depth: 0,
            nesting: 0,
            eof,
            comments,
            errors: Vec::new(),
            options,
        }
    }

    // --- cursor -------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_kw(&self, kw: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(kw))
    }

    fn nth_is_kw(&self, n: usize, kw: &str) -> bool {
        self.nth(n).is_some_and(|t| t.is_keyword(kw))
    }

    fn at_any_kw(&self, kws: &[&str]) -> bool {
        self.peek().is_some_and(|t| kws.iter().any(|kw| t.is_keyword(kw)))
    }

    fn at_punct(&self, p: Punct) -> bool {
        self.peek().is_some_and(|t| t.is_punct(p))
    }

    fn nth_is_punct(&self, n: usize, p: Punct) -> bool {
        self.nth(n).is_some_and(|t| t.is_punct(p))
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        match tok.kind {
            TokenKind::Punct(Punct::LBrace) => self.depth += 1,
            TokenKind::Punct(Punct::RBrace) => self.depth = self.depth.saturating_sub(1),
            _ => {},
        }
        Some(tok)
    }

    fn current_span(&self) -> Span {
        self.peek().map_or(self.eof, |t| t.span)
    }

    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Span::at_start(), |t| t.span)
    }

    fn start(&self, rule: Rule) -> NodeBuilder {
        NodeBuilder {
            rule,
            start: self.current_span(),
            children: Vec::new(),
        }
    }

    fn finish(&self, b: NodeBuilder) -> SyntaxNode {
        SyntaxNode {
            rule: b.rule,
            span: b.start.to(self.prev_span()),
            children: b.children,
        }
    }

    /// A node holding exactly the tokens consumed by `f`.
    fn leaf(&mut self, rule: Rule, f: impl FnOnce(&mut Self, &mut NodeBuilder) -> PResult<()>) -> PResult<SyntaxNode> {
        let mut b = self.start(rule);
        f(self, &mut b)?;
        Ok(self.finish(b))
    }

    /// Run `f` one level deeper, failing once `max_nesting` levels are open.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let limit = self.options.max_nesting;
        if self.nesting >= limit {
            return Err(SyntaxError::new(
                SyntaxErrorKind::NestingTooDeep { limit },
                self.current_span(),
            ));
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    // --- expectations -------------------------------------------------------

    fn unexpected(&self, expected: &[&'static str]) -> SyntaxError {
        match self.peek() {
            Some(tok) => SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken {
                    expected: expected.to_vec(),
                    found: tok.to_string(),
                },
                tok.span,
            ),
            None => SyntaxError::new(
                SyntaxErrorKind::UnexpectedEof {
                    expected: expected.to_vec(),
                },
                self.eof,
            ),
        }
    }

    fn expect_where(&mut self, expected: &[&'static str], accept: impl Fn(&Token) -> bool) -> PResult<Token> {
        if !self.peek().is_some_and(accept) {
            return Err(self.unexpected(expected));
        }
        self.bump().ok_or_else(|| self.unexpected(expected))
    }

    fn expect_kw(&mut self, kw: &'static str) -> PResult<Token> {
        self.expect_where(&[kw], |t| t.is_keyword(kw))
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.at_kw(kw) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume one of `kws` and return the token, so its spelling can be kept in the tree.
    fn expect_one_of(&mut self, kws: &[&'static str]) -> PResult<Token> {
        self.expect_where(kws, |t| kws.iter().any(|kw| t.is_keyword(kw)))
    }

    fn expect_punct(&mut self, p: Punct) -> PResult<Token> {
        let expected = [p.as_str()];
        self.expect_where(&expected, |t| t.is_punct(p))
    }

    fn eat_punct(&mut self, p: Punct) -> bool {
        if self.at_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// An identifier in an id position. Keywords are accepted here too.
    fn expect_word(&mut self, what: &'static str) -> PResult<Token> {
        self.expect_where(&[what], Token::is_word)
    }

    fn expect_string(&mut self) -> PResult<Token> {
        self.expect_where(&["string"], |t| matches!(t.kind, TokenKind::String(_)))
    }

    fn expect_word_or_string(&mut self, what: &'static str) -> PResult<Token> {
        self.expect_where(&[what, "string"], |t| {
            t.is_word() || matches!(t.kind, TokenKind::String(_))
        })
    }

    fn expect_number(&mut self) -> PResult<Token> {
        let tok = self.expect_where(&["number"], |t| t.kind == TokenKind::Number)?;
        if tok.text.parse::<i64>().is_err() {
            return Err(SyntaxError::new(
                SyntaxErrorKind::MalformedNumber { text: tok.text.clone() },
                tok.span,
            ));
        }
        Ok(tok)
    }

    fn expect_bool(&mut self) -> PResult<Token> {
        self.expect_where(&["true", "false"], |t| matches!(t.kind, TokenKind::Boolean(_)))
    }

    // --- recovery -----------------------------------------------------------

    /// Record `err` and skip to a resync point, or hand the error back when
    /// recovery is off or the error budget is spent.
    fn recover(&mut self, err: SyntaxError, depth: usize, starters: &[&str], stmt_start: usize) -> PResult<()> {
        if !self.options.resync() || self.errors.len() + 1 >= self.options.max_errors.max(1) {
            return Err(err);
        }
        self.errors.push(err);
        if self.pos == stmt_start {
            self.bump();
        }
        while let Some(tok) = self.peek() {
            if self.depth < depth {
                break;
            }
            if self.depth == depth && (tok.is_punct(Punct::RBrace) || starters.iter().any(|kw| tok.is_keyword(kw))) {
                break;
            }
            trace!("resync: skipping {tok} at {}", tok.span);
            self.bump();
        }
        Ok(())
    }

    /// Parse `{ stmt* }` where each statement is chosen by its leading keyword.
    fn block(
        &mut self,
        b: &mut NodeBuilder,
        starters: &'static [&'static str],
        stmt: fn(&mut Self) -> PResult<SyntaxNode>,
    ) -> PResult<()> {
        self.expect_punct(Punct::LBrace)?;
        let depth = self.depth;
        loop {
            if self.depth < depth {
                return Ok(());
            }
            if self.eat_punct(Punct::RBrace) {
                return Ok(());
            }
            if self.at_end() {
                return Err(self.unexpected(&["}"]));
            }
            let stmt_start = self.pos;
            let result = if self.at_any_kw(starters) {
                stmt(self)
            } else {
                let mut expected = starters.to_vec();
                expected.push("}");
                Err(self.unexpected(&expected))
            };
            match result {
                Ok(node) => b.node(node),
                Err(err) => self.recover(err, depth, starters, stmt_start)?,
            }
        }
    }

    // --- top level ----------------------------------------------------------

    fn source_file(&mut self) -> SyntaxNode {
        let mut root = self.start(Rule::SourceFile);
        let mut defined = 0usize;
        while !self.at_end() {
            let before = self.errors.len();
            let start = self.pos;
            let result = if self.at_any_kw(DEFINITION_KEYWORDS) {
                self.definition()
            } else {
                Err(self.unexpected(DEFINITION_KEYWORDS))
            };
            match result {
                Ok(node) if self.errors.len() == before => {
                    root.node(node);
                    defined += 1;
                },
                Ok(node) => debug!("dropping {:?} at {} after syntax errors", node.rule, node.span),
                Err(err) => {
                    self.errors.push(err);
                    if !self.options.resync() || self.errors.len() >= self.options.max_errors.max(1) {
                        break;
                    }
                    self.skip_to_definition(start);
                },
            }
        }
        if defined == 0 && self.errors.is_empty() {
            self.errors
                .push(SyntaxError::new(SyntaxErrorKind::EmptyDocument, self.eof));
        }
        debug!(
            "parsed {defined} definitions from {} tokens with {} syntax errors",
            self.tokens.len(),
            self.errors.len()
        );
        self.finish(root)
    }

    fn skip_to_definition(&mut self, def_start: usize) {
        if self.pos == def_start {
            self.bump();
        }
        while let Some(tok) = self.peek() {
            if self.depth == 0 && DEFINITION_KEYWORDS.iter().any(|kw| tok.is_keyword(kw)) {
                break;
            }
            trace!("resync: skipping {tok} at {}", tok.span);
            self.bump();
        }
    }

    fn definition(&mut self) -> PResult<SyntaxNode> {
        if self.at_kw("let") {
            self.set_decl()
        } else if self.at_kw("room") {
            self.room_def()
        } else if self.at_kw("item") {
            self.item_def()
        } else if self.at_kw("npc") {
            self.npc_def()
        } else if self.at_kw("trigger") {
            self.trigger_def()
        } else if self.at_kw("spinner") {
            self.spinner_def()
        } else if self.at_kw("goal") {
            self.goal_def()
        } else {
            Err(self.unexpected(DEFINITION_KEYWORDS))
        }
    }

    /// `let set NAME = (room, ...)`
    fn set_decl(&mut self) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::SetDecl);
        self.expect_kw("let")?;
        self.expect_kw("set")?;
        b.token(self.expect_word("set name")?);
        self.expect_punct(Punct::Eq)?;
        b.node(self.paren_id_list("room id")?);
        Ok(self.finish(b))
    }

    // --- shared pieces ------------------------------------------------------

    /// `( id, id, ... )`; an empty list is accepted here and rejected by the builder.
    fn paren_id_list(&mut self, what: &'static str) -> PResult<SyntaxNode> {
        let mut b = self.start(Rule::IdList);
        self.expect_punct(Punct::LParen)?;
        if !self.at_punct(Punct::RParen) {
            loop {
                b.token(self.expect_word(what)?);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RParen)?;
        Ok(self.finish(b))
    }

    /// An npc state: a bare word, `custom NAME`, or `custom(NAME)`.
    fn state_ref(&mut self) -> PResult<SyntaxNode> {
        let custom_follows = self.nth(1).is_some_and(|t| t.is_word() || t.is_punct(Punct::LParen));
        if self.at_kw("custom") && custom_follows {
            return self.leaf(Rule::StateCustom, |p, b| {
                p.expect_kw("custom")?;
                if p.eat_punct(Punct::LParen) {
                    b.token(p.expect_word("state name")?);
                    p.expect_punct(Punct::RParen)?;
                } else {
                    b.token(p.expect_word("state name")?);
                }
                Ok(())
            });
        }
        self.leaf(Rule::StateWord, |p, b| {
            b.token(p.expect_word("npc state")?);
            Ok(())
        })
    }

    /// `ability NAME [( TARGET )]`
    fn ability(&mut self) -> PResult<SyntaxNode> {
        self.leaf(Rule::Ability, |p, b| {
            p.expect_kw("ability")?;
            b.token(p.expect_word("ability name")?);
            if p.eat_punct(Punct::LParen) {
                b.token(p.expect_word("target item id")?);
                p.expect_punct(Punct::RParen)?;
            }
            Ok(())
        })
    }

    fn keyword_then_string(&mut self, rule: Rule, kw: &'static str) -> PResult<SyntaxNode> {
        self.leaf(rule, |p, b| {
            p.expect_kw(kw)?;
            b.token(p.expect_string()?);
            Ok(())
        })
    }

    fn keyword_then_number(&mut self, rule: Rule, kw: &'static str) -> PResult<SyntaxNode> {
        self.leaf(rule, |p, b| {
            p.expect_kw(kw)?;
            b.token(p.expect_number()?);
            Ok(())
        })
    }

    fn keyword_then_bool(&mut self, rule: Rule, kw: &'static str) -> PResult<SyntaxNode> {
        self.leaf(rule, |p, b| {
            p.expect_kw(kw)?;
            b.token(p.expect_bool()?);
            Ok(())
        })
    }

    /// `desc STR` or `description STR`.
    fn description(&mut self, rule: Rule) -> PResult<SyntaxNode> {
        self.leaf(rule, |p, b| {
            p.expect_one_of(&["desc", "description"])?;
            b.token(p.expect_string()?);
            Ok(())
        })
    }
}
