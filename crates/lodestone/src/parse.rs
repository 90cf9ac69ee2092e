//! Tokens to CST: recursive descent with explicit `TokenKind` lookahead.
//!
//! Spec.md §4.2's essential productions collapse two genuinely different
//! grammar questions into one token shape: a single, receiver-less keyword
//! segment (`name: Type`) is ambiguous between "a unary keyword send to an
//! implicit target" and "a bindable name with a type annotation." This
//! parser resolves it the way the analyzer's own assignment table (§4.3)
//! implies it must already be resolved before analysis ever sees it: a
//! receiver-less send with *exactly one* keyword segment parses as
//! [`crate::cst::CstKind::BindableName`] directly; two or more segments (e.g.
//! `if:then:else:`) remain an ordinary [`crate::cst::CstKind::MessageSend`].
//! See DESIGN.md for the full rationale and the parenthesized-argument-list
//! consequence this has for function signatures.
//!
//! The parser never raises: every failure is reified as a `SyntaxError` CST
//! node and parsing resumes at the next token, per spec.md §4.2's error
//! policy.

use crate::{
    cst::{CascadeMessage, Cst, CstKind},
    intern::Symbol,
    numeric::Integer,
    source::SourcePosition,
    token::{Token, TokenKind},
};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parses a full token stream (as produced by `scanner::scan`) into one CST,
/// collapsing an empty or single-expression program the way `TopLevel`'s
/// grammar describes.
pub fn parse(tokens: Vec<Token>) -> Cst {
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_top_level()
}

impl Parser {
    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn position(&self) -> SourcePosition {
        self.current().position.clone()
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_closer(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightCurly | TokenKind::EndOfSource
        )
    }

    fn skip_dots(&mut self) {
        while self.kind() == TokenKind::Dot {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, Cst> {
        if self.kind() == kind {
            Ok(self.advance())
        } else {
            let position = self.position();
            Err(Cst::error(position, format!("Expected {what}")))
        }
    }

    // -- TopLevel: ε | Expression (Dot+ Expression)* Dot* --------------------

    fn parse_top_level(&mut self) -> Cst {
        let start = self.position();
        self.skip_dots();
        if self.at_closer() {
            return Cst { position: start, kind: CstKind::ValueSequence(Vec::new()) };
        }
        let mut expressions = vec![self.parse_expression()];
        loop {
            if self.kind() != TokenKind::Dot {
                break;
            }
            self.skip_dots();
            if self.at_closer() {
                break;
            }
            expressions.push(self.parse_expression());
        }
        if expressions.len() == 1 {
            expressions.into_iter().next().unwrap()
        } else {
            let end = expressions.last().unwrap().position.clone();
            Cst { position: start.to(&end), kind: CstKind::ValueSequence(expressions) }
        }
    }

    fn parse_expression(&mut self) -> Cst {
        self.parse_assignment()
    }

    // -- Assignment := BinarySeq ("->" BinarySeq?)? (":=" Assignment)? ------
    //
    // The Arrow tier is not named separately in spec.md's essential grammar,
    // but `FunctionalDependentType` must be constructible somewhere for the
    // analyzer's assignment-rewrite table to ever fire; this is the only
    // position where its precedence (tighter than `:=`, looser than a bare
    // binary sequence) is unambiguous.
    fn parse_assignment(&mut self) -> Cst {
        let mut lhs = self.parse_binary_seq();
        if self.kind() == TokenKind::Arrow {
            self.advance();
            let result_type = if self.kind() == TokenKind::Assign || self.kind() == TokenKind::Dot || self.at_closer() {
                None
            } else {
                Some(Box::new(self.parse_binary_seq()))
            };
            let position = lhs.position.clone();
            let end = result_type.as_ref().map(|r| r.position.clone()).unwrap_or_else(|| position.clone());
            lhs = Cst {
                position: position.to(&end),
                kind: CstKind::FunctionalDependentType { argument: Box::new(lhs), result_type },
            };
        }
        if self.kind() == TokenKind::Assign {
            self.advance();
            let value = self.parse_assignment();
            let position = lhs.position.to(&value.position);
            lhs = Cst { position, kind: CstKind::Assignment { store: Box::new(lhs), value: Box::new(value) } };
        }
        lhs
    }

    // -- BinarySeq := Send (Operator Send)*, left-associative ---------------
    // Parser emits the flat form; the analyzer performs the left-associative
    // fold into nested message sends (spec.md §4.3).
    fn parse_binary_seq(&mut self) -> Cst {
        let first = self.parse_send();
        let mut rest = Vec::new();
        while self.kind() == TokenKind::Operator {
            let op = self.advance();
            let selector = Symbol::intern(op.value());
            let operand = self.parse_send();
            rest.push((selector, operand));
        }
        if rest.is_empty() {
            first
        } else {
            let end = rest.last().unwrap().1.position.clone();
            let position = first.position.to(&end);
            Cst { position, kind: CstKind::BinaryExpressionSequence { first: Box::new(first), rest } }
        }
    }

    /// `Send := KeywordSend | Cascade | Primary`, flattened: a no-receiver
    /// keyword send (or bindable name, see module docs), or a primary
    /// optionally followed by a unary-message chain, an attached keyword
    /// send, and/or a cascade.
    fn parse_send(&mut self) -> Cst {
        if self.kind() == TokenKind::Keyword {
            return self.parse_keyword_send(None);
        }
        let mut receiver = self.parse_unary_chain();
        if self.kind() == TokenKind::Keyword {
            receiver = self.parse_keyword_send(Some(receiver));
        }
        if self.kind() == TokenKind::Semicolon {
            receiver = self.parse_cascade(receiver);
        }
        receiver
    }

    fn parse_unary_chain(&mut self) -> Cst {
        let mut acc = self.parse_primary();
        while self.kind() == TokenKind::Identifier {
            let selector = self.advance();
            let position = acc.position.to(&selector.position);
            acc = Cst {
                position,
                kind: CstKind::MessageSend {
                    receiver: Some(Box::new(acc)),
                    selector: Symbol::intern(selector.value()),
                    arguments: Vec::new(),
                },
            };
        }
        acc
    }

    /// A single keyword segment with no receiver is a bindable name with a
    /// type annotation (`n: Integer`); two or more segments are an ordinary
    /// message send (`if: c then: t else: f`). See module docs.
    fn parse_keyword_send(&mut self, receiver: Option<Cst>) -> Cst {
        let start = self.position();
        let mut selector = String::new();
        let mut arguments = Vec::new();
        while self.kind() == TokenKind::Keyword {
            let part = self.advance();
            selector.push_str(part.value());
            arguments.push(self.parse_binary_for_argument());
        }
        let end = arguments.last().map(|a: &Cst| a.position.clone()).unwrap_or_else(|| start.clone());
        let position = start.to(&end);
        if receiver.is_none() && arguments.len() == 1 {
            let keyword = selector.trim_end_matches(':');
            return Cst {
                position,
                kind: CstKind::BindableName {
                    name: Symbol::intern(keyword),
                    type_expression: Some(Box::new(arguments.into_iter().next().unwrap())),
                    is_mutable: false,
                    is_implicit: false,
                },
            };
        }
        Cst {
            position,
            kind: CstKind::MessageSend { receiver: receiver.map(Box::new), selector: Symbol::intern(&selector), arguments },
        }
    }

    /// A keyword-message argument: binary-expression level (may use
    /// operators, may not itself start a new keyword send unless
    /// parenthesized).
    fn parse_binary_for_argument(&mut self) -> Cst {
        let first = self.parse_unary_chain();
        let mut rest = Vec::new();
        while self.kind() == TokenKind::Operator {
            let op = self.advance();
            let selector = Symbol::intern(op.value());
            rest.push((selector, self.parse_unary_chain()));
        }
        if rest.is_empty() {
            first
        } else {
            let end = rest.last().unwrap().1.position.clone();
            let position = first.position.to(&end);
            Cst { position, kind: CstKind::BinaryExpressionSequence { first: Box::new(first), rest } }
        }
    }

    fn parse_cascade(&mut self, first_send: Cst) -> Cst {
        let (receiver, mut messages) = match first_send.kind {
            CstKind::MessageSend { receiver: Some(receiver), selector, arguments } => {
                (*receiver, vec![CascadeMessage { selector, arguments, position: first_send.position.clone() }])
            }
            _ => {
                return Cst::error_wrapping(first_send.position.clone(), "cascade requires a preceding message send", first_send);
            }
        };
        while self.kind() == TokenKind::Semicolon {
            self.advance();
            messages.push(self.parse_cascade_message());
        }
        let end = messages.last().unwrap().position.clone();
        let position = receiver.position.to(&end);
        Cst { position, kind: CstKind::MessageCascade { receiver: Box::new(receiver), messages } }
    }

    fn parse_cascade_message(&mut self) -> CascadeMessage {
        let start = self.position();
        match self.kind() {
            TokenKind::Keyword => {
                let mut selector = String::new();
                let mut arguments = Vec::new();
                while self.kind() == TokenKind::Keyword {
                    let part = self.advance();
                    selector.push_str(part.value());
                    arguments.push(self.parse_binary_for_argument());
                }
                let end = arguments.last().map(|a: &Cst| a.position.clone()).unwrap_or_else(|| start.clone());
                CascadeMessage { selector: Symbol::intern(&selector), arguments, position: start.to(&end) }
            }
            TokenKind::Operator => {
                let op = self.advance();
                let argument = self.parse_unary_chain();
                let position = start.to(&argument.position);
                CascadeMessage { selector: Symbol::intern(op.value()), arguments: vec![argument], position }
            }
            TokenKind::Identifier => {
                let ident = self.advance();
                CascadeMessage { selector: Symbol::intern(ident.value()), arguments: Vec::new(), position: start }
            }
            _ => CascadeMessage { selector: Symbol::intern("error"), arguments: Vec::new(), position: start },
        }
    }

    // -- Primary --------------------------------------------------------

    fn parse_primary(&mut self) -> Cst {
        let start = self.position();
        match self.kind() {
            TokenKind::Nat => self.parse_literal_integer(),
            TokenKind::Float => {
                let token = self.advance();
                match token.value().parse::<f64>() {
                    Ok(value) => Cst { position: start, kind: CstKind::LiteralFloat(value) },
                    Err(_) => Cst::error(start, "Malformed float literal"),
                }
            }
            TokenKind::Character => {
                let token = self.advance();
                match unescape_delimited(token.value()).chars().next() {
                    Some(c) => Cst { position: start, kind: CstKind::LiteralCharacter(c) },
                    None => Cst::error(start, "Empty character literal"),
                }
            }
            TokenKind::String => {
                let token = self.advance();
                Cst { position: start, kind: CstKind::LiteralString(unescape_delimited(token.value())) }
            }
            TokenKind::Symbol => self.parse_symbol_or_container(),
            TokenKind::Identifier => {
                let token = self.advance();
                Cst { position: start, kind: CstKind::Identifier(Symbol::intern(token.value())) }
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_top_level();
                let close = self.expect(TokenKind::RightParen, "')'");
                match close {
                    Ok(token) => Cst { position: start.to(&token.position), ..inner },
                    Err(error) => error,
                }
            }
            TokenKind::LeftBracket => self.parse_block(start),
            TokenKind::LeftCurly => self.parse_lexical_block(start),
            TokenKind::Error => {
                let token = self.advance();
                Cst::error(token.position.clone(), token.error_message.unwrap_or_else(|| "Lexical error".to_owned()))
            }
            _ => {
                let token = self.advance();
                Cst::error(token.position, format!("Unexpected token in expression position: {:?}", token.kind))
            }
        }
    }

    fn parse_literal_integer(&mut self) -> Cst {
        let token = self.advance();
        let text = token.value();
        match Integer::parse_literal(text) {
            Some(big) => match i64::try_from(&big.0) {
                Ok(small) => Cst { position: token.position, kind: CstKind::LiteralInteger(small, None) },
                Err(_) => Cst { position: token.position, kind: CstKind::LiteralInteger(0, Some(big.0)) },
            },
            None => Cst::error(token.position, format!("Malformed integer literal {text:?}")),
        }
    }

    /// A `Symbol` token is either a literal symbol (`#name`, `#"quoted"`, or
    /// an operator symbol like `#+`), or — when its text is exactly `#(` /
    /// `#[` — the opener of an array / byte-array literal.
    fn parse_symbol_or_container(&mut self) -> Cst {
        let token = self.advance();
        let text = token.value();
        match text {
            "#(" => self.parse_array_body(token.position),
            "#[" => self.parse_byte_array_body(token.position),
            _ => {
                let name = &text[1..];
                let name = if name.starts_with('"') { unescape_delimited(name) } else { name.to_owned() };
                Cst { position: token.position, kind: CstKind::LiteralSymbol(Symbol::intern(&name)) }
            }
        }
    }

    fn parse_array_body(&mut self, open_position: SourcePosition) -> Cst {
        let mut elements = Vec::new();
        while self.kind() != TokenKind::RightParen && self.kind() != TokenKind::EndOfSource {
            elements.push(self.parse_send());
        }
        let close = self.expect(TokenKind::RightParen, "')'");
        match close {
            Ok(token) => Cst { position: open_position.to(&token.position), kind: CstKind::Array(elements) },
            Err(error) => Cst::error_wrapping(open_position, "unterminated array literal", error),
        }
    }

    fn parse_byte_array_body(&mut self, open_position: SourcePosition) -> Cst {
        let mut elements = Vec::new();
        while self.kind() != TokenKind::RightBracket && self.kind() != TokenKind::EndOfSource {
            elements.push(self.parse_literal_integer());
        }
        let close = self.expect(TokenKind::RightBracket, "']'");
        match close {
            Ok(token) => Cst { position: open_position.to(&token.position), kind: CstKind::ByteArray(elements) },
            Err(error) => Cst::error_wrapping(open_position, "unterminated byte array literal", error),
        }
    }

    fn parse_block(&mut self, open_position: SourcePosition) -> Cst {
        self.advance();
        let mut arguments = Vec::new();
        while self.kind() == TokenKind::Colon {
            arguments.push(self.parse_block_argument());
        }
        if !arguments.is_empty() {
            if let Err(error) = self.expect(TokenKind::Bar, "'|' after block arguments") {
                return error;
            }
        }
        let body = self.parse_top_level();
        let close = self.expect(TokenKind::RightBracket, "']'");
        match close {
            Ok(token) => Cst { position: open_position.to(&token.position), kind: CstKind::Block { arguments, body: Box::new(body) } },
            Err(error) => Cst::error_wrapping(open_position, "unterminated block", error),
        }
    }

    fn parse_block_argument(&mut self) -> Cst {
        let colon = self.advance();
        let is_mutable = if self.kind() == TokenKind::Identifier && self.current().value() == "mutable" {
            self.advance();
            true
        } else {
            false
        };
        match self.expect(TokenKind::Identifier, "a block argument name") {
            Ok(name) => Cst {
                position: colon.position.to(&name.position),
                kind: CstKind::BindableName {
                    name: Symbol::intern(name.value()),
                    type_expression: None,
                    is_mutable,
                    is_implicit: false,
                },
            },
            Err(error) => error,
        }
    }

    /// `{ body }`: a lexical (nested-scope) block, distinct from `[...]`
    /// which additionally carries its own argument list and is a closure.
    fn parse_lexical_block(&mut self, open_position: SourcePosition) -> Cst {
        self.advance();
        let body = self.parse_top_level();
        let close = self.expect(TokenKind::RightCurly, "'}'");
        match close {
            Ok(token) => Cst { position: open_position.to(&token.position), kind: CstKind::LexicalBlock(Box::new(body)) },
            Err(error) => Cst::error_wrapping(open_position, "unterminated lexical block", error),
        }
    }
}

/// Strips the outer delimiter and resolves `\n \r \t`; any other escaped
/// character is taken literally (spec.md §4.2).
fn unescape_delimited(raw: &str) -> String {
    let inner = &raw[1..raw.len().saturating_sub(1).max(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{scanner::scan, source::SourceBuffer};

    fn parse_str(text: &str) -> Cst {
        parse(scan(SourceBuffer::new("", "t", "sysmel", text)))
    }

    #[test]
    fn integer_literal() {
        assert!(matches!(parse_str("42").kind, CstKind::LiteralInteger(42, None)));
    }

    #[test]
    fn radix_integer_literal() {
        assert!(matches!(parse_str("16rFF").kind, CstKind::LiteralInteger(255, None)));
    }

    #[test]
    fn binary_sequence_is_left_flat_not_folded_by_the_parser() {
        let cst = parse_str("2 + 3 * 4");
        match cst.kind {
            CstKind::BinaryExpressionSequence { rest, .. } => assert_eq!(rest.len(), 2),
            other => panic!("expected BinaryExpressionSequence, got {other:?}"),
        }
    }

    #[test]
    fn no_receiver_keyword_send_with_two_parts_stays_a_message_send() {
        let cst = parse_str("if: 1 = 1 then: 10 else: 20");
        match cst.kind {
            CstKind::MessageSend { receiver: None, selector, arguments } => {
                assert_eq!(selector.to_string(), "if:then:else:");
                assert_eq!(arguments.len(), 3);
            }
            other => panic!("expected MessageSend, got {other:?}"),
        }
    }

    #[test]
    fn single_keyword_segment_with_no_receiver_is_a_bindable_name() {
        let cst = parse_str("n: Integer");
        assert!(matches!(cst.kind, CstKind::BindableName { .. }));
    }

    #[test]
    fn string_literal_preserves_escapes_in_the_decoded_value() {
        let cst = parse_str("\"ab\\nc\"");
        match cst.kind {
            CstKind::LiteralString(s) => assert_eq!(s, "ab\nc"),
            other => panic!("expected LiteralString, got {other:?}"),
        }
    }

    #[test]
    fn cascade_shares_one_receiver_across_messages() {
        let cst = parse_str("x foo; bar");
        match cst.kind {
            CstKind::MessageCascade { messages, .. } => assert_eq!(messages.len(), 2),
            other => panic!("expected MessageCascade, got {other:?}"),
        }
    }

    #[test]
    fn function_signature_with_typed_argument_forms_functional_dependent_type() {
        let cst = parse_str("(n: Integer) -> Integer");
        match cst.kind {
            CstKind::FunctionalDependentType { argument, result_type } => {
                assert!(matches!(argument.kind, CstKind::BindableName { .. }));
                assert!(result_type.is_some());
            }
            other => panic!("expected FunctionalDependentType, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_array_literal_is_a_syntax_error_node() {
        let cst = parse_str("#(1 2");
        let mut errors = Vec::new();
        cst.collect_syntax_errors(&mut errors);
        assert!(!errors.is_empty());
    }
}
