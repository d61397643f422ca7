//! AST builder: folds the parser's [`SyntaxTree`] into the typed model in [`crate::ast`].
//!
//! The parser is deliberately lenient about cardinality and closed word sets.
//! This stage enforces them: empty one-or-more blocks, repeated singular
//! statements, unknown enumeration words and out-of-range numbers all become
//! [`SemanticShapeError`]s. A definition that produced any shape error is left
//! out of the resulting [`SourceFile`].

mod actions;
mod goal;
mod item;
mod npc;
mod room;
mod spinner;
mod trigger;

use log::debug;

use crate::{
    ast::{Ability, BuiltinState, ContainerState, CustomState, Definition, NpcState, SetDecl, SourceFile},
    config::ParseOptions,
    error::SemanticShapeError,
    lexer::{Token, TokenKind},
    parser::{Rule, SyntaxElement, SyntaxNode, SyntaxTree},
    span::Span,
};

pub(crate) type ShapeResult<T> = Result<T, SemanticShapeError>;

/// Build typed definitions from a syntax tree, collecting shape errors.
pub fn build(tree: &SyntaxTree) -> (SourceFile, Vec<SemanticShapeError>) {
    build_with(tree, &ParseOptions::default())
}

/// Like [`build`], with `options.max_nesting` bounding condition groups and schedule bodies.
pub fn build_with(tree: &SyntaxTree, options: &ParseOptions) -> (SourceFile, Vec<SemanticShapeError>) {
    let mut builder = Builder::new(options.max_nesting);
    let mut definitions = Vec::new();
    for node in tree.root.nodes() {
        let before = builder.errors.len();
        match builder.definition(node) {
            Ok(def) if builder.errors.len() == before => definitions.push(def),
            Ok(def) => debug!("dropping definition at {} after shape errors", def.span()),
            Err(err) => builder.errors.push(err),
        }
    }
    debug!(
        "built {} definitions with {} shape errors",
        definitions.len(),
        builder.errors.len()
    );
    let file = SourceFile {
        definitions,
        comments: tree.comments.clone(),
    };
    (file, builder.errors)
}

/// Collects shape errors while definitions are built.
///
/// A failing statement returns its error through [`ShapeResult`]; the block
/// that owns it pushes the error here and moves on to the next statement, so
/// one pass reports every problem in a definition.
#[derive(Debug)]
pub(crate) struct Builder {
    errors: Vec<SemanticShapeError>,
    max_nesting: usize,
    nesting: usize,
}

impl Builder {
    fn new(max_nesting: usize) -> Self {
        Self {
            errors: Vec::new(),
            max_nesting,
            nesting: 0,
        }
    }

    fn definition(&mut self, node: &SyntaxNode) -> ShapeResult<Definition> {
        match node.rule {
            Rule::SetDecl => set_decl(node).map(Definition::Set),
            Rule::RoomDef => self.room(node).map(Definition::Room),
            Rule::ItemDef => self.item(node).map(Definition::Item),
            Rule::NpcDef => self.npc(node).map(Definition::Npc),
            Rule::TriggerDef => self.trigger(node).map(Definition::Trigger),
            Rule::SpinnerDef => self.spinner(node).map(Definition::Spinner),
            Rule::GoalDef => self.goal(node).map(Definition::Goal),
            _ => Err(unexpected(node, "definition")),
        }
    }

    /// Record a failed statement and carry on with its siblings.
    fn keep<T>(&mut self, result: ShapeResult<T>) -> Option<T> {
        result.map_err(|err| self.errors.push(err)).ok()
    }

    /// Build one level deeper, refusing trees nested past `max_nesting`.
    fn nested<T>(&mut self, node: &SyntaxNode, f: impl FnOnce(&mut Self) -> ShapeResult<T>) -> ShapeResult<T> {
        if self.nesting >= self.max_nesting {
            return Err(SemanticShapeError::OutOfRange {
                what: "nesting depth",
                value: i64::try_from(self.nesting + 1).unwrap_or(i64::MAX),
                span: node.span,
            });
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    /// Store `value` in an empty slot, or report the repeat and keep the first.
    fn set_once<T>(&mut self, slot: &mut Option<T>, value: T, what: &'static str, span: Span) {
        if slot.is_some() {
            self.errors.push(SemanticShapeError::DuplicateField { what, span });
        } else {
            *slot = Some(value);
        }
    }
}

fn set_decl(node: &SyntaxNode) -> ShapeResult<SetDecl> {
    let mut cur = Cursor::new(node);
    let name = cur.word("set name")?;
    let rooms = id_list(cur.node("room list")?, "room set")?;
    Ok(SetDecl {
        name,
        rooms,
        span: node.span,
    })
}

/// Sequential reader over a node's children.
pub(crate) struct Cursor<'a> {
    span: Span,
    children: &'a [SyntaxElement],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(node: &'a SyntaxNode) -> Self {
        Self {
            span: node.span,
            children: &node.children,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a SyntaxElement> {
        self.children.get(self.pos)
    }

    pub(crate) fn token(&mut self, what: &'static str) -> ShapeResult<&'a Token> {
        match self.peek() {
            Some(SyntaxElement::Token(tok)) => {
                self.pos += 1;
                Ok(tok)
            },
            _ => Err(self.missing(what)),
        }
    }

    pub(crate) fn opt_token(&mut self) -> Option<&'a Token> {
        match self.peek() {
            Some(SyntaxElement::Token(tok)) => {
                self.pos += 1;
                Some(tok)
            },
            _ => None,
        }
    }

    pub(crate) fn node(&mut self, what: &'static str) -> ShapeResult<&'a SyntaxNode> {
        match self.peek() {
            Some(SyntaxElement::Node(node)) => {
                self.pos += 1;
                Ok(node)
            },
            _ => Err(self.missing(what)),
        }
    }

    /// Consume the next child if it is a node accepted by `pred`.
    pub(crate) fn node_if(&mut self, pred: impl Fn(Rule) -> bool) -> Option<&'a SyntaxNode> {
        match self.peek() {
            Some(SyntaxElement::Node(node)) if pred(node.rule) => {
                self.pos += 1;
                Some(node)
            },
            _ => None,
        }
    }

    /// Remaining child nodes; tokens are skipped.
    pub(crate) fn nodes(self) -> impl Iterator<Item = &'a SyntaxNode> {
        self.children[self.pos..].iter().filter_map(|c| match c {
            SyntaxElement::Node(n) => Some(n),
            SyntaxElement::Token(_) => None,
        })
    }

    /// Remaining child tokens; nodes are skipped.
    pub(crate) fn tokens(self) -> impl Iterator<Item = &'a Token> {
        self.children[self.pos..].iter().filter_map(|c| match c {
            SyntaxElement::Token(t) => Some(t),
            SyntaxElement::Node(_) => None,
        })
    }

    pub(crate) fn word<T: From<String>>(&mut self, what: &'static str) -> ShapeResult<T> {
        Ok(T::from(self.token(what)?.text.clone()))
    }

    pub(crate) fn string(&mut self, what: &'static str) -> ShapeResult<String> {
        let tok = self.token(what)?;
        string_value(tok, what)
    }

    /// A token that may be either a bare word or a string literal.
    pub(crate) fn text(&mut self, what: &'static str) -> ShapeResult<String> {
        let tok = self.token(what)?;
        Ok(tok.string_value().unwrap_or(&tok.text).to_string())
    }

    pub(crate) fn boolean(&mut self, what: &'static str) -> ShapeResult<bool> {
        let tok = self.token(what)?;
        match tok.kind {
            TokenKind::Boolean(value) => Ok(value),
            _ => Err(SemanticShapeError::MissingField { what, span: tok.span }),
        }
    }

    pub(crate) fn number(&mut self, what: &'static str) -> ShapeResult<(i64, Span)> {
        let tok = self.token(what)?;
        tok.text
            .parse::<i64>()
            .map(|n| (n, tok.span))
            .map_err(|_| SemanticShapeError::MissingField { what, span: tok.span })
    }

    /// A non-negative number that fits in `u32`.
    pub(crate) fn count(&mut self, what: &'static str) -> ShapeResult<u32> {
        let (value, span) = self.number(what)?;
        to_u32(value, what, span)
    }

    fn missing(&self, what: &'static str) -> SemanticShapeError {
        let span = self.peek().map_or(self.span, SyntaxElement::span);
        SemanticShapeError::MissingField { what, span }
    }
}

fn string_value(tok: &Token, what: &'static str) -> ShapeResult<String> {
    tok.string_value()
        .map(str::to_string)
        .ok_or(SemanticShapeError::MissingField { what, span: tok.span })
}

fn to_u32(value: i64, what: &'static str, span: Span) -> ShapeResult<u32> {
    u32::try_from(value).map_err(|_| SemanticShapeError::OutOfRange { what, value, span })
}

fn unexpected(node: &SyntaxNode, what: &'static str) -> SemanticShapeError {
    SemanticShapeError::MissingField { what, span: node.span }
}

/// Identifiers from an `IdList` node. The list must not be empty.
fn id_list<T: From<String>>(node: &SyntaxNode, what: &'static str) -> ShapeResult<Vec<T>> {
    let ids: Vec<T> = node.tokens().map(|t| T::from(t.text.clone())).collect();
    if ids.is_empty() {
        return Err(SemanticShapeError::EmptyBlock { what, span: node.span });
    }
    Ok(ids)
}

/// Whether a bare word outside the builtin set may stand for a custom state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateWords {
    /// Builtin words only; custom states must be spelled `custom X`.
    Strict,
    /// Any other word is read as a custom state.
    Lenient,
}

fn npc_state(node: &SyntaxNode, words: StateWords) -> ShapeResult<NpcState> {
    let mut cur = Cursor::new(node);
    let tok = cur.token("npc state")?;
    if node.rule == Rule::StateCustom {
        return Ok(NpcState::Custom(CustomState::from(tok.text.as_str())));
    }
    match (BuiltinState::from_word(&tok.text), words) {
        (Some(state), _) => Ok(NpcState::Builtin(state)),
        (None, StateWords::Lenient) => Ok(NpcState::Custom(CustomState::from(tok.text.as_str()))),
        (None, StateWords::Strict) => Err(SemanticShapeError::InvalidEnumValue {
            what: "npc state",
            value: tok.text.clone(),
            expected: BuiltinState::WORDS,
            span: tok.span,
        }),
    }
}

fn container_state(tok: &Token) -> ShapeResult<ContainerState> {
    ContainerState::from_word(&tok.text).ok_or_else(|| SemanticShapeError::InvalidEnumValue {
        what: "container state",
        value: tok.text.clone(),
        expected: ContainerState::WORDS,
        span: tok.span,
    })
}

/// An `Ability` node: name plus optional target item.
fn ability(node: &SyntaxNode) -> ShapeResult<Ability> {
    let mut cur = Cursor::new(node);
    Ok(Ability {
        name: cur.word("ability name")?,
        target: cur.opt_token().map(|t| t.text.as_str().into()),
    })
}
