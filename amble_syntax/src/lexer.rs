//! Tokenizer for Amble DSL source.
//!
//! `Lexer` walks a source buffer lazily and yields classified tokens,
//! including trivia (whitespace and `#` comments). It holds no state beyond
//! its cursor, so cloning or calling [`Lexer::reset`] restarts the stream.
//!
//! Words matching `[A-Za-z0-9_:#-]+` are classified after the whole word is
//! scanned: `-?\d+` is a number, `true`/`false` a boolean, an exact entry of
//! the keyword table a keyword, and anything else an identifier.

use std::{collections::HashSet, fmt, iter::FusedIterator};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::{error::LexError, span::Span};

lazy_static! {
    /// Reserved words of the DSL. Built once and only ever read.
    static ref KEYWORDS: HashSet<&'static str> = [
        // definitions
        "let", "set", "room", "item", "npc", "trigger", "spinner", "goal",
        // room
        "name", "desc", "description", "visited", "exit", "required_items", "required_flags", "barred",
        "hidden", "locked", "overlay", "if", "flag", "unset", "complete", "present", "absent", "here",
        "text", "player", "has", "missing", "in", "state", "custom",
        // item
        "portable", "restricted", "location", "inventory", "chest", "container", "nowhere", "ability",
        "requires", "to", "consumable", "uses_left", "consume_on", "when_consumed", "despawn", "replace",
        "current", "open", "closed", "transparentClosed", "transparentLocked", "off",
        // npc
        "movement", "route", "random", "rooms", "timing", "active", "loop", "dialogue", "normal", "happy",
        "bored", "tired", "sad", "mad",
        // trigger and events
        "only once", "note", "when", "always", "enter", "leave", "take", "drop", "unlock", "look", "at",
        "talk", "use", "on", "interaction", "act", "give", "from", "insert", "into", "eat", "drink",
        "inhale", "do",
        // conditions
        "any", "all", "progress", "with", "chance", "ambient",
        // actions
        "show", "add", "remove", "reset", "advance", "seq", "limit", "wedge", "width", "spawn", "award",
        "points", "reason", "lock", "reveal", "direction", "push", "says", "refuse", "deny", "read",
        "restrict", "message", "modify", "schedule", "onFalse", "cancel", "retryNextTurn", "retryAfter",
        // goals
        "group", "required", "optional", "status-effect", "start", "done", "fail", "reached",
    ]
    .into_iter()
    .collect();
}

/// Word pairs collapsed into a single keyword token: (first, second, keyword).
const PHRASES: &[(&str, &str, &str)] = &[("only", "once", "only once")];

/// Returns the interned keyword if `word` is reserved.
pub fn keyword(word: &str) -> Option<&'static str> {
    KEYWORDS.get(word).copied()
}

/// Whether `word` is reserved. Reserved words still serve as ids wherever the grammar expects one.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Punct {
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Arrow,
    Eq,
    Percent,
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::Comma => ",",
            Punct::Arrow => "->",
            Punct::Eq => "=",
            Punct::Percent => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Keyword(&'static str),
    Identifier,
    Number,
    Boolean(bool),
    /// A string literal in any of its five forms, carrying the decoded value.
    String(String),
    Punct(Punct),
    Comment,
    Whitespace,
    /// A character that cannot start any token. Reported by the parser.
    Unknown(char),
}

/// A classified slice of source text. `text` is the raw lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::Whitespace)
    }

    /// True for tokens usable where the grammar expects a bare identifier.
    /// Keywords and all-digit words both qualify there.
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword(_) | TokenKind::Number)
    }

    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(self.kind, TokenKind::Keyword(k) if k == kw)
    }

    pub fn is_punct(&self, p: Punct) -> bool {
        self.kind == TokenKind::Punct(p)
    }

    /// Decoded string value, if this is a string literal.
    pub fn string_value(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Keyword(k) => write!(f, "keyword '{k}'"),
            TokenKind::Identifier => write!(f, "identifier '{}'", self.text),
            TokenKind::Number => write!(f, "number {}", self.text),
            TokenKind::Boolean(b) => write!(f, "boolean {b}"),
            TokenKind::String(_) => f.write_str("string literal"),
            TokenKind::Punct(p) => write!(f, "'{}'", p.as_str()),
            TokenKind::Comment => f.write_str("comment"),
            TokenKind::Whitespace => f.write_str("whitespace"),
            TokenKind::Unknown(c) => write!(f, "unexpected character '{c}'"),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '#' | '-')
}

fn is_number(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_disallowed_control(c: char) -> bool {
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{7f}'
}

/// Lazy tokenizer over a borrowed source buffer.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            done: false,
        }
    }

    /// Validate raw bytes as UTF-8 before lexing.
    ///
    /// # Errors
    /// Returns [`LexError::InvalidByte`] at the first byte that is not valid UTF-8.
    pub fn from_bytes(bytes: &'src [u8]) -> Result<Self, LexError> {
        match std::str::from_utf8(bytes) {
            Ok(src) => Ok(Self::new(src)),
            Err(e) => {
                let at = e.valid_up_to();
                let prefix = String::from_utf8_lossy(&bytes[..at]);
                let line = prefix.matches('\n').count() as u32 + 1;
                let column = prefix.rsplit('\n').next().map_or(0, |l| l.chars().count()) as u32 + 1;
                Err(LexError::InvalidByte {
                    byte: bytes[at],
                    span: Span::new(at, at + 1, line, column),
                })
            },
        }
    }

    pub fn source(&self) -> &'src str {
        self.src
    }

    /// Rewind to the start of the buffer.
    pub fn reset(&mut self) {
        *self = Self::new(self.src);
    }

    fn rest(&self) -> &'src str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn here(&self) -> (usize, u32, u32) {
        (self.pos, self.line, self.column)
    }

    fn token(&self, kind: TokenKind, (start, line, column): (usize, u32, u32)) -> Token {
        Token {
            kind,
            span: Span::new(start, self.pos, line, column),
            text: self.src[start..self.pos].to_string(),
        }
    }

    fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        let start = self.here();
        let c = self.peek()?;

        if c.is_whitespace() || c == '\u{feff}' {
            while self.peek().is_some_and(|c| c.is_whitespace() || c == '\u{feff}') {
                self.bump();
            }
            return Some(Ok(self.token(TokenKind::Whitespace, start)));
        }
        if c == '#' {
            while self.peek().is_some_and(|c| c != '\n') {
                self.bump();
            }
            return Some(Ok(self.token(TokenKind::Comment, start)));
        }
        if c == 'r' && self.at_raw_string() {
            return Some(self.raw_string(start));
        }
        if c == '"' || c == '\'' {
            let triple: String = [c; 3].iter().collect();
            if self.rest().starts_with(&triple) {
                return Some(self.triple_string(c, start));
            }
            return Some(self.quoted_string(c, start));
        }
        if c == '-' && self.peek_nth(1) == Some('>') {
            self.bump_n(2);
            return Some(Ok(self.token(TokenKind::Punct(Punct::Arrow), start)));
        }
        if is_word_char(c) {
            return Some(Ok(self.word(start)));
        }
        if is_disallowed_control(c) {
            let byte = c.encode_utf8(&mut [0; 4]).as_bytes()[0];
            self.bump();
            return Some(Err(LexError::InvalidByte {
                byte,
                span: Span::new(start.0, self.pos, start.1, start.2),
            }));
        }

        let punct = match c {
            '{' => Some(Punct::LBrace),
            '}' => Some(Punct::RBrace),
            '(' => Some(Punct::LParen),
            ')' => Some(Punct::RParen),
            ',' => Some(Punct::Comma),
            '=' => Some(Punct::Eq),
            '%' => Some(Punct::Percent),
            _ => None,
        };
        self.bump();
        let kind = punct.map_or(TokenKind::Unknown(c), TokenKind::Punct);
        Some(Ok(self.token(kind, start)))
    }

    fn word(&mut self, start: (usize, u32, u32)) -> Token {
        while let Some(c) = self.peek() {
            if !is_word_char(c) || (c == '-' && self.peek_nth(1) == Some('>')) {
                break;
            }
            self.bump();
        }
        let src = self.src;
        let text = &src[start.0..self.pos];
        if let Some(tok) = self.phrase(text, start) {
            return tok;
        }
        let kind = if is_number(text) {
            TokenKind::Number
        } else if text == "true" || text == "false" {
            TokenKind::Boolean(text == "true")
        } else if let Some(kw) = keyword(text) {
            TokenKind::Keyword(kw)
        } else {
            TokenKind::Identifier
        };
        self.token(kind, start)
    }

    /// Try to extend `first` into a multi-word keyword, leaving the cursor untouched on failure.
    fn phrase(&mut self, first: &str, start: (usize, u32, u32)) -> Option<Token> {
        let &(_, second, kw) = PHRASES.iter().find(|(a, _, _)| *a == first)?;
        let saved = self.clone();
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let after = self.rest();
        let next_is_boundary = after
            .strip_prefix(second)
            .is_some_and(|tail| !tail.starts_with(is_word_char));
        if next_is_boundary {
            self.bump_n(second.len());
            return Some(self.token(TokenKind::Keyword(kw), start));
        }
        *self = saved;
        None
    }

    fn at_raw_string(&self) -> bool {
        let after_r = &self.rest()[1..];
        let hashes = after_r.len() - after_r.trim_start_matches('#').len();
        hashes > 0 && after_r[hashes..].starts_with('"')
    }

    fn unterminated(start: (usize, u32, u32)) -> LexError {
        LexError::UnterminatedString {
            span: Span::new(start.0, start.0 + 1, start.1, start.2),
        }
    }

    fn raw_string(&mut self, start: (usize, u32, u32)) -> Result<Token, LexError> {
        self.bump();
        let mut hashes = 0usize;
        while self.peek() == Some('#') {
            self.bump();
            hashes += 1;
        }
        self.bump();
        let close = format!("\"{}", "#".repeat(hashes));
        let body = self.rest();
        let Some(end) = body.find(&close) else {
            return Err(Self::unterminated(start));
        };
        let value = body[..end].to_string();
        self.bump_n(body[..end].chars().count() + close.len());
        Ok(self.token(TokenKind::String(value), start))
    }

    fn triple_string(&mut self, quote: char, start: (usize, u32, u32)) -> Result<Token, LexError> {
        let delim: String = [quote; 3].iter().collect();
        let escaped = format!("\\{delim}");
        self.bump_n(3);
        let mut value = String::new();
        loop {
            let rest = self.rest();
            if rest.starts_with(&escaped) {
                value.push_str(&delim);
                self.bump_n(4);
            } else if rest.starts_with(&delim) {
                self.bump_n(3);
                return Ok(self.token(TokenKind::String(value), start));
            } else if let Some(c) = self.bump() {
                value.push(c);
            } else {
                return Err(Self::unterminated(start));
            }
        }
    }

    fn quoted_string(&mut self, quote: char, start: (usize, u32, u32)) -> Result<Token, LexError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(Self::unterminated(start)),
                Some('\\') => match self.bump() {
                    None | Some('\n') => return Err(Self::unterminated(start)),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some(c @ ('"' | '\'' | '\\')) => value.push(c),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    },
                },
                Some(c) if c == quote => return Ok(self.token(TokenKind::String(value), start)),
                Some(c) => value.push(c),
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.next_token();
        if matches!(next, None | Some(Err(_))) {
            self.done = true;
        }
        next
    }
}

impl FusedIterator for Lexer<'_> {}

/// Tokenize a whole buffer, trivia included.
///
/// # Errors
/// Returns the first [`LexError`]: an unterminated string literal or a
/// control character outside a string.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(src).collect::<Result<Vec<_>, _>>()?;
    log::debug!("lexed {} tokens from {} bytes", tokens.len(), src.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(src: &str) -> Vec<Token> {
        tokenize(src)
            .expect("lex ok")
            .into_iter()
            .filter(|t| !t.is_trivia())
            .collect()
    }

    fn strings(src: &str) -> Vec<String> {
        significant(src)
            .into_iter()
            .filter_map(|t| t.string_value().map(str::to_string))
            .collect()
    }

    #[test]
    fn classifies_words() {
        let toks = significant("room kitchen-2 42 -7 true false has_key 3rd");
        let kinds: Vec<_> = toks.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword("room"),
                TokenKind::Identifier,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Identifier,
                TokenKind::Identifier,
            ]
        );
        assert_eq!(toks[1].text, "kitchen-2");
    }

    #[test]
    fn identifiers_may_contain_hash_and_colon() {
        let toks = significant("quest#2 ns:thing");
        assert_eq!(toks.len(), 2);
        assert!(toks.iter().all(|t| t.kind == TokenKind::Identifier));
        assert_eq!(toks[0].text, "quest#2");
    }

    #[test]
    fn comments_are_trivia_with_spans() {
        let toks = tokenize("# heading\nroom a {} # trailing").expect("lex ok");
        let comments: Vec<_> = toks.iter().filter(|t| t.kind == TokenKind::Comment).collect();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "# heading");
        assert_eq!(comments[1].span.line, 2);
        assert_eq!(comments[1].span.column, 11);
    }

    #[test]
    fn arrow_splits_from_words() {
        let toks = significant("exit north->hall");
        assert_eq!(toks[1].text, "north");
        assert!(toks[2].is_punct(Punct::Arrow));
        assert_eq!(toks[3].text, "hall");
    }

    #[test]
    fn only_once_collapses() {
        let toks = significant("trigger \"t\" only   once when always");
        assert!(toks[2].is_keyword("only once"));
        assert_eq!(toks[2].text, "only   once");
        assert!(toks[3].is_keyword("when"));

        let toks = significant("only\n  # spacing\n once");
        assert_eq!(toks[0].kind, TokenKind::Identifier);
        assert_eq!(toks[1].text, "once");

        let toks = significant("trigger \"t\" only\n    once when always");
        assert!(toks[2].is_keyword("only once"));
        assert_eq!((toks[3].span.line, toks[3].span.column), (2, 10));

        let toks = significant("only onceler");
        assert_eq!(toks[0].kind, TokenKind::Identifier);
        assert_eq!(toks[1].text, "onceler");
    }

    #[test]
    fn decodes_all_string_forms() {
        let src = r####""a\"b" 'a"b' '''a"b''' """a"b""" r#"a"b"#"####;
        assert_eq!(strings(src), vec!["a\"b"; 5]);
    }

    #[test]
    fn escapes_and_unknown_escapes() {
        assert_eq!(strings(r#""tab\there\nnew \q""#), vec!["tab\there\nnew \\q"]);
        assert_eq!(strings(r"'it\'s'"), vec!["it's"]);
    }

    #[test]
    fn triple_quoted_is_raw_and_multiline() {
        let src = "\"\"\"line one\n  \\n stays \\\"\"\" done\"\"\"";
        assert_eq!(strings(src), vec!["line one\n  \\n stays \"\"\" done"]);
    }

    #[test]
    fn raw_strings_with_more_hashes() {
        assert_eq!(strings(r###"r##"say "#hi"#"##"###), vec![r##"say "#hi"#"##]);
    }

    #[test]
    fn unterminated_string_points_at_opening_quote() {
        let err = tokenize("room x { name \"oops }").expect_err("should fail");
        assert_eq!(
            err,
            LexError::UnterminatedString {
                span: Span::new(14, 15, 1, 15)
            }
        );
    }

    #[test]
    fn newline_ends_single_line_string() {
        let err = tokenize("name 'broken\n'").expect_err("should fail");
        assert!(matches!(err, LexError::UnterminatedString { span } if span.start == 5));
    }

    #[test]
    fn control_bytes_and_bad_utf8() {
        let err = tokenize("room \u{1} a").expect_err("should fail");
        assert!(matches!(err, LexError::InvalidByte { byte: 1, .. }));

        let err = tokenize("room \u{9b} a").expect_err("C1 control");
        assert!(matches!(err, LexError::InvalidByte { byte: 0xc2, .. }));

        let err = Lexer::from_bytes(b"room \xff").expect_err("invalid utf-8");
        assert_eq!(
            err,
            LexError::InvalidByte {
                byte: 0xff,
                span: Span::new(5, 6, 1, 6)
            }
        );
    }

    #[test]
    fn unknown_characters_become_tokens() {
        let toks = significant("room @");
        assert_eq!(toks[1].kind, TokenKind::Unknown('@'));
    }

    #[test]
    fn lexer_is_restartable_and_fused() {
        let mut lexer = Lexer::new("room a { }");
        let first: Vec<_> = lexer.by_ref().collect();
        assert!(lexer.next().is_none());
        lexer.reset();
        let second: Vec<_> = lexer.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn error_stops_iteration() {
        let mut lexer = Lexer::new("\"open");
        assert!(matches!(lexer.next(), Some(Err(LexError::UnterminatedString { .. }))));
        assert!(lexer.next().is_none());
    }
}
