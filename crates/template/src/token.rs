//! Splits template source into text runs and `{{..}}` tags.

use std::fmt;

/// Byte range into the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    Each,
}

impl BlockKind {
    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::Each => "each",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    /// `{{path}}`
    Var(String),
    /// `{{#if path}}` or `{{#each path}}`
    Open(BlockKind, String),
    /// `{{/if}}` or `{{/each}}`
    Close(BlockKind),
    /// A tag that is neither a variable nor a known block tag.
    Literal,
}

/// Token with the span of its full source text, braces included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn tokenize(input: &str) -> Vec<Token> {
        Tokenizer::new(input).collect()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let start = self.pos;
        if start >= self.input.len() {
            return None;
        }

        let rest = self.rest();
        let Some(open) = rest.find("{{") else {
            self.pos = self.input.len();
            return Some(Token::new(TokenKind::Text, Span::new(start, self.pos)));
        };
        if open > 0 {
            self.pos += open;
            return Some(Token::new(TokenKind::Text, Span::new(start, self.pos)));
        }

        // At a `{{`; an unterminated tag is plain text to the end.
        let Some(close) = rest[2..].find("}}") else {
            self.pos = self.input.len();
            return Some(Token::new(TokenKind::Text, Span::new(start, self.pos)));
        };
        let inner = &rest[2..2 + close];
        self.pos += close + 4;
        Some(Token::new(classify(inner), Span::new(start, self.pos)))
    }
}

fn classify(inner: &str) -> TokenKind {
    if let Some(rest) = inner.strip_prefix('#') {
        return open_tag(rest).unwrap_or(TokenKind::Literal);
    }
    match inner {
        "/if" => return TokenKind::Close(BlockKind::If),
        "/each" => return TokenKind::Close(BlockKind::Each),
        _ => {}
    }
    if inner.is_empty() || inner.contains(['#', '/']) {
        return TokenKind::Literal;
    }
    TokenKind::Var(inner.trim().to_string())
}

fn open_tag(rest: &str) -> Option<TokenKind> {
    for kind in [BlockKind::If, BlockKind::Each] {
        let Some(after) = rest.strip_prefix(kind.keyword()) else {
            continue;
        };
        if !after.starts_with(char::is_whitespace) {
            continue;
        }
        let path = after.trim();
        if path.is_empty() || path.contains('}') {
            return None;
        }
        return Some(TokenKind::Open(kind, path.to_string()));
    }
    None
}
