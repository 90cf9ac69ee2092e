//! Token kinds and the `Token` produced by the scanner.

use strum::IntoStaticStr;

use crate::source::SourcePosition;

/// The closed set of lexical categories the scanner ever emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum TokenKind {
    Nat,
    Float,
    Character,
    String,
    Symbol,
    Identifier,
    Keyword,
    Operator,
    Dot,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftCurly,
    RightCurly,
    Semicolon,
    Assign,
    Arrow,
    Bar,
    Colon,
    Error,
    EndOfSource,
}

/// A scanned token: its kind, its span, and — for `Error` tokens — the message
/// explaining why the scanner could not classify the span any other way.
#[derive(Debug, Clone)]
pub struct Token {
    pub position: SourcePosition,
    pub kind: TokenKind,
    pub error_message: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, position: SourcePosition) -> Self {
        Self { position, kind, error_message: None }
    }

    pub fn error(position: SourcePosition, message: impl Into<String>) -> Self {
        Self { position, kind: TokenKind::Error, error_message: Some(message.into()) }
    }

    /// The raw source text this token spans.
    pub fn value(&self) -> &str {
        self.position.value()
    }
}
