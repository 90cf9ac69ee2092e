//! Character stream to token stream.
//!
//! Single pass, O(n) in the length of the buffer. Never fails: unrecognized
//! input is reified as an `Error` token covering exactly the offending span and
//! scanning continues, per the parser/evaluator contract that lexical failures
//! accumulate rather than abort.

use std::rc::Rc;

use crate::{
    source::{SourceBuffer, SourcePosition},
    token::{Token, TokenKind},
};

const OPERATOR_CHARS: &str = "+-*/\\~<>=@%|&?!^";

struct Scanner<'a> {
    buffer: Rc<SourceBuffer>,
    text: &'a [u8],
    index: usize,
    line: usize,
    column: usize,
    previous_was_cr: bool,
}

impl<'a> Scanner<'a> {
    fn new(buffer: Rc<SourceBuffer>, text: &'a str) -> Self {
        Self { buffer, text: text.as_bytes(), index: 0, line: 1, column: 1, previous_was_cr: false }
    }

    fn at_end(&self) -> bool {
        self.index >= self.text.len()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.text.get(self.index + offset).copied()
    }

    fn here(&self) -> SourcePosition {
        SourcePosition {
            buffer: self.buffer.clone(),
            start_index: self.index,
            end_index: self.index,
            start_line: self.line,
            start_column: self.column,
            end_line: self.line,
            end_column: self.column,
        }
    }

    /// Advances one byte, updating line/column. A tab rounds the column up to the
    /// next multiple of 4; CRLF is counted as a single line break via
    /// `previous_was_cr`; every other byte advances the column by one.
    fn advance(&mut self) {
        let c = self.text[self.index];
        self.index += 1;
        match c {
            b'\n' => {
                if self.previous_was_cr {
                    self.previous_was_cr = false;
                } else {
                    self.line += 1;
                    self.column = 1;
                }
            }
            b'\r' => {
                self.line += 1;
                self.column = 1;
                self.previous_was_cr = true;
            }
            b'\t' => {
                self.previous_was_cr = false;
                self.column = ((self.column - 1) / 4 + 1) * 4 + 1;
            }
            _ => {
                self.previous_was_cr = false;
                self.column += 1;
            }
        }
    }

    fn position_from(&self, start: SourcePosition) -> SourcePosition {
        start.to(&self.here())
    }

    fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
        loop {
            match self.peek(0) {
                Some(c) if c.is_ascii_whitespace() => {
                    self.advance();
                }
                Some(b'#') if self.peek(1) == Some(b'#') => {
                    while !self.at_end() && self.peek(0) != Some(b'\n') && self.peek(0) != Some(b'\r') {
                        self.advance();
                    }
                }
                Some(b'#') if self.peek(1) == Some(b'*') => {
                    let start = self.here();
                    self.advance();
                    self.advance();
                    loop {
                        if self.at_end() {
                            return Some(Token::error(self.position_from(start), "Unterminated block comment"));
                        }
                        if self.peek(0) == Some(b'*') && self.peek(1) == Some(b'#') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return None,
            }
        }
    }

    fn scan_one(&mut self) -> Token {
        if let Some(error) = self.skip_whitespace_and_comments() {
            return error;
        }
        if self.at_end() {
            let pos = self.here();
            return Token::new(TokenKind::EndOfSource, pos);
        }

        let start = self.here();
        let c = self.peek(0).unwrap();

        if c.is_ascii_digit() {
            return self.scan_number(start);
        }
        if c == b'"' {
            return self.scan_delimited(start, b'"', TokenKind::String, "Unterminated string literal");
        }
        if c == b'\'' {
            return self.scan_delimited(start, b'\'', TokenKind::Character, "Unterminated character literal");
        }
        if c == b'#' {
            return self.scan_symbol(start);
        }
        if c == b'_' || c.is_ascii_alphabetic() {
            return self.scan_identifier_or_keyword(start);
        }
        if c == b':' && self.peek(1) == Some(b'=') {
            self.advance();
            self.advance();
            return Token::new(TokenKind::Assign, self.position_from(start));
        }
        if c == b'-' && self.peek(1) == Some(b'>') {
            self.advance();
            self.advance();
            return Token::new(TokenKind::Arrow, self.position_from(start));
        }
        // A lone `|` is the block-argument/bind-pattern delimiter (`Bar`), distinct
        // from the operator character set it would otherwise merge into; it only
        // joins a merged Operator token when adjacent to another operator char
        // (e.g. `||`, `|=`).
        if c == b'|' && !self.peek(1).is_some_and(|next| OPERATOR_CHARS.as_bytes().contains(&next)) {
            self.advance();
            return Token::new(TokenKind::Bar, self.position_from(start));
        }
        if OPERATOR_CHARS.as_bytes().contains(&c) {
            while self.peek(0).is_some_and(|c| OPERATOR_CHARS.as_bytes().contains(&c)) {
                self.advance();
            }
            return Token::new(TokenKind::Operator, self.position_from(start));
        }

        let kind = match c {
            b'.' => Some(TokenKind::Dot),
            b'(' => Some(TokenKind::LeftParen),
            b')' => Some(TokenKind::RightParen),
            b'[' => Some(TokenKind::LeftBracket),
            b']' => Some(TokenKind::RightBracket),
            b'{' => Some(TokenKind::LeftCurly),
            b'}' => Some(TokenKind::RightCurly),
            b';' => Some(TokenKind::Semicolon),
            b':' => Some(TokenKind::Colon),
            _ => None,
        };
        if let Some(kind) = kind {
            self.advance();
            return Token::new(kind, self.position_from(start));
        }

        self.advance();
        Token::error(self.position_from(start), format!("Unexpected character '{}'", c as char))
    }

    fn scan_number(&mut self, start: SourcePosition) -> Token {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        // Radix prefix NNNrDDDD... (case-insensitive digits A-Z).
        if matches!(self.peek(0), Some(b'r') | Some(b'R')) && self.peek(1).is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.advance();
            while self.peek(0).is_some_and(|c| c.is_ascii_alphanumeric()) {
                self.advance();
            }
            return Token::new(TokenKind::Nat, self.position_from(start));
        }

        let mut is_float = false;
        if self.peek(0) == Some(b'.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(0), Some(b'e') | Some(b'E')) {
            let mut offset = 1;
            if matches!(self.peek(offset), Some(b'+') | Some(b'-')) {
                offset += 1;
            }
            if self.peek(offset).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..offset {
                    self.advance();
                }
                while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        Token::new(if is_float { TokenKind::Float } else { TokenKind::Nat }, self.position_from(start))
    }

    fn scan_delimited(&mut self, start: SourcePosition, delimiter: u8, kind: TokenKind, unterminated_message: &str) -> Token {
        self.advance();
        loop {
            if self.at_end() {
                return Token::error(self.position_from(start), unterminated_message);
            }
            let c = self.peek(0).unwrap();
            if c == b'\\' && self.peek(1).is_some() {
                self.advance();
                self.advance();
                continue;
            }
            self.advance();
            if c == delimiter {
                return Token::new(kind, self.position_from(start));
            }
        }
    }

    fn scan_symbol(&mut self, start: SourcePosition) -> Token {
        self.advance();
        // `#(` / `#[` open an array / byte-array literal; the parser recognizes
        // these two-character `Symbol` tokens by their exact text.
        if matches!(self.peek(0), Some(b'(') | Some(b'[')) {
            self.advance();
            return Token::new(TokenKind::Symbol, self.position_from(start));
        }
        if self.peek(0) == Some(b'"') {
            let body = self.scan_delimited(self.here(), b'"', TokenKind::String, "Unterminated symbol literal");
            if body.kind == TokenKind::Error {
                return Token::error(self.position_from(start), body.error_message.unwrap());
            }
            return Token::new(TokenKind::Symbol, self.position_from(start));
        }
        if !self.peek(0).is_some_and(|c| c == b'_' || c.is_ascii_alphanumeric() || OPERATOR_CHARS.as_bytes().contains(&c) || c == b':') {
            return Token::error(self.position_from(start), "Expected a symbol name after '#'");
        }
        if self.peek(0).is_some_and(|c| OPERATOR_CHARS.as_bytes().contains(&c)) {
            while self.peek(0).is_some_and(|c| OPERATOR_CHARS.as_bytes().contains(&c)) {
                self.advance();
            }
        } else {
            while self.peek(0).is_some_and(|c| c == b'_' || c.is_ascii_alphanumeric()) {
                self.advance();
            }
            while self.peek(0) == Some(b':') {
                self.advance();
                while self.peek(0).is_some_and(|c| c == b'_' || c.is_ascii_alphanumeric()) {
                    self.advance();
                }
            }
        }
        Token::new(TokenKind::Symbol, self.position_from(start))
    }

    fn scan_identifier_or_keyword(&mut self, start: SourcePosition) -> Token {
        while self.peek(0).is_some_and(|c| c == b'_' || c.is_ascii_alphanumeric()) {
            self.advance();
        }
        if self.peek(0) == Some(b':') && self.peek(1) != Some(b'=') {
            self.advance();
            return Token::new(TokenKind::Keyword, self.position_from(start));
        }
        Token::new(TokenKind::Identifier, self.position_from(start))
    }
}

/// Scans `buffer` in full, returning a token stream terminated by exactly one
/// `EndOfSource` token. Every byte of input is consumed by exactly one token.
pub fn scan(buffer: Rc<SourceBuffer>) -> Vec<Token> {
    let text = buffer.text.clone();
    let mut scanner = Scanner::new(buffer, &text);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.scan_one();
        let is_end = token.kind == TokenKind::EndOfSource;
        tokens.push(token);
        if is_end {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_str(text: &str) -> Vec<Token> {
        scan(SourceBuffer::new("", "t", "sysmel", text))
    }

    #[test]
    fn always_ends_with_end_of_source() {
        for text in ["", "42", "## comment only", "   \t\t"] {
            let tokens = scan_str(text);
            assert_eq!(tokens.last().unwrap().kind, TokenKind::EndOfSource, "input {text:?}");
        }
    }

    #[test]
    fn integers_and_radix_literals() {
        let tokens = scan_str("42 16rFF");
        assert_eq!(tokens[0].kind, TokenKind::Nat);
        assert_eq!(tokens[0].value(), "42");
        assert_eq!(tokens[1].kind, TokenKind::Nat);
        assert_eq!(tokens[1].value(), "16rFF");
    }

    #[test]
    fn line_comment_runs_to_eol() {
        let tokens = scan_str("1 ## trailing comment\n2");
        assert_eq!(tokens[0].value(), "1");
        assert_eq!(tokens[1].value(), "2");
    }

    #[test]
    fn unterminated_block_comment_spans_to_eof() {
        let tokens = scan_str("#* never closes");
        let error = &tokens[0];
        assert_eq!(error.kind, TokenKind::Error);
        assert_eq!(error.position.start_index, 0);
        assert_eq!(error.position.end_index, "#* never closes".len());
    }

    #[test]
    fn tab_rounds_column_up_to_next_multiple_of_four() {
        let tokens = scan_str("\tx");
        // identifier "x" starts after one tab: column 1 -> 5.
        assert_eq!(tokens[0].position.start_column, 5);
    }

    #[test]
    fn operator_runs_are_merged_into_one_token() {
        let tokens = scan_str("<=");
        assert_eq!(tokens[0].kind, TokenKind::Operator);
        assert_eq!(tokens[0].value(), "<=");
    }

    #[test]
    fn array_and_byte_array_openers_scan_as_two_character_symbols() {
        for text in ["#(1 2)", "#[1 2]"] {
            let tokens = scan_str(text);
            assert_eq!(tokens[0].kind, TokenKind::Symbol);
            assert_eq!(tokens[0].value(), &text[..2]);
        }
    }

    #[test]
    fn lone_bar_is_its_own_token_but_merges_when_adjacent_to_an_operator_char() {
        let tokens = scan_str("|");
        assert_eq!(tokens[0].kind, TokenKind::Bar);
        let tokens = scan_str("||");
        assert_eq!(tokens[0].kind, TokenKind::Operator);
        assert_eq!(tokens[0].value(), "||");
    }

    #[test]
    fn unknown_character_yields_single_code_unit_error() {
        let tokens = scan_str("`");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].position.end_index - tokens[0].position.start_index, 1);
    }
}
