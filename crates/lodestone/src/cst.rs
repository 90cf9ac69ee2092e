//! Concrete syntax tree.
//!
//! Every node is a [`Cst`]: a tagged [`CstKind`] plus the [`SourcePosition`] it
//! spans. The tree is produced by the parser and consumed by the analyzer; it
//! never fails to exist — syntactic failures are reified as `SyntaxError` nodes
//! embedded at the point of failure rather than raised.

use crate::{intern::Symbol, source::SourcePosition};

#[derive(Debug, Clone)]
pub struct Cst {
    pub position: SourcePosition,
    pub kind: CstKind,
}

#[derive(Debug, Clone)]
pub enum CstKind {
    LiteralInteger(i64, Option<num_bigint::BigInt>),
    LiteralFloat(f64),
    LiteralCharacter(char),
    LiteralString(String),
    LiteralSymbol(Symbol),

    Identifier(Symbol),

    ValueSequence(Vec<Cst>),
    Tuple(Vec<Cst>),
    Array(Vec<Cst>),
    Dictionary(Vec<(Cst, Cst)>),
    Association(Box<Cst>, Box<Cst>),

    /// A `name` or `name: Type` appearing as a binding position: function
    /// parameters, `|x|` pattern binds, and the left side of `:=`.
    BindableName {
        name: Symbol,
        type_expression: Option<Box<Cst>>,
        is_mutable: bool,
        is_implicit: bool,
    },

    /// `(args) -> Result` or `arg -> Result`, the syntax for a Π-type / function
    /// signature, also used as the left-hand side of a function-definition
    /// assignment.
    FunctionalDependentType {
        argument: Box<Cst>,
        result_type: Option<Box<Cst>>,
    },

    Block {
        arguments: Vec<Cst>,
        body: Box<Cst>,
    },
    LexicalBlock(Box<Cst>),

    Assignment {
        store: Box<Cst>,
        value: Box<Cst>,
    },

    /// `|x|` or `|x. y|` declared as a sequence of pattern-binding statements.
    BindPattern {
        pattern: Box<Cst>,
        type_expression: Option<Box<Cst>>,
    },

    Application {
        functional: Box<Cst>,
        arguments: Vec<Cst>,
    },

    MessageSend {
        receiver: Option<Box<Cst>>,
        selector: Symbol,
        arguments: Vec<Cst>,
    },

    /// A full cascade: the first message carries the receiver, the rest reuse it.
    MessageCascade {
        receiver: Box<Cst>,
        messages: Vec<CascadeMessage>,
    },

    BinaryExpressionSequence {
        first: Box<Cst>,
        rest: Vec<(Symbol, Cst)>,
    },

    Quote(Box<Cst>),
    QuasiQuote(Box<Cst>),
    QuasiUnquote(Box<Cst>),
    Splice(Box<Cst>),

    ByteArray(Vec<Cst>),

    SyntaxError {
        message: String,
        inner_node: Option<Box<Cst>>,
    },
}

#[derive(Debug, Clone)]
pub struct CascadeMessage {
    pub selector: Symbol,
    pub arguments: Vec<Cst>,
    pub position: SourcePosition,
}

impl Cst {
    pub fn error(position: SourcePosition, message: impl Into<String>) -> Self {
        Cst { position, kind: CstKind::SyntaxError { message: message.into(), inner_node: None } }
    }

    pub fn error_wrapping(position: SourcePosition, message: impl Into<String>, inner: Cst) -> Self {
        Cst {
            position,
            kind: CstKind::SyntaxError { message: message.into(), inner_node: Some(Box::new(inner)) },
        }
    }

    /// Direct children, in evaluation order, used for syntax-error collection.
    pub fn children(&self) -> Vec<&Cst> {
        match &self.kind {
            CstKind::LiteralInteger(..)
            | CstKind::LiteralFloat(_)
            | CstKind::LiteralCharacter(_)
            | CstKind::LiteralString(_)
            | CstKind::LiteralSymbol(_)
            | CstKind::Identifier(_) => vec![],
            CstKind::ValueSequence(xs) | CstKind::Tuple(xs) | CstKind::Array(xs) | CstKind::ByteArray(xs) => {
                xs.iter().collect()
            }
            CstKind::Dictionary(pairs) => pairs.iter().flat_map(|(k, v)| [k, v]).collect(),
            CstKind::Association(k, v) => vec![k, v],
            CstKind::BindableName { type_expression, .. } => type_expression.iter().map(|b| b.as_ref()).collect(),
            CstKind::FunctionalDependentType { argument, result_type } => {
                let mut v = vec![argument.as_ref()];
                v.extend(result_type.iter().map(|b| b.as_ref()));
                v
            }
            CstKind::Block { arguments, body } => arguments.iter().chain(std::iter::once(body.as_ref())).collect(),
            CstKind::LexicalBlock(body) => vec![body],
            CstKind::Assignment { store, value } => vec![store, value],
            CstKind::BindPattern { pattern, type_expression } => {
                let mut v = vec![pattern.as_ref()];
                v.extend(type_expression.iter().map(|b| b.as_ref()));
                v
            }
            CstKind::Application { functional, arguments } => {
                std::iter::once(functional.as_ref()).chain(arguments.iter()).collect()
            }
            CstKind::MessageSend { receiver, arguments, .. } => {
                receiver.iter().map(|b| b.as_ref()).chain(arguments.iter()).collect()
            }
            CstKind::MessageCascade { receiver, messages } => std::iter::once(receiver.as_ref())
                .chain(messages.iter().flat_map(|m| m.arguments.iter()))
                .collect(),
            CstKind::BinaryExpressionSequence { first, rest } => {
                std::iter::once(first.as_ref()).chain(rest.iter().map(|(_, e)| e)).collect()
            }
            CstKind::Quote(inner) | CstKind::QuasiQuote(inner) | CstKind::QuasiUnquote(inner) | CstKind::Splice(inner) => {
                vec![inner]
            }
            CstKind::SyntaxError { inner_node, .. } => inner_node.iter().map(|b| b.as_ref()).collect(),
        }
    }

    /// Walks the whole tree, collecting every `SyntaxError` node (self included).
    pub fn collect_syntax_errors<'a>(&'a self, out: &mut Vec<&'a Cst>) {
        if matches!(self.kind, CstKind::SyntaxError { .. }) {
            out.push(self);
        }
        for child in self.children() {
            child.collect_syntax_errors(out);
        }
    }

    /// A structural pretty-printer; used by tests and by `Value`-side `printString`
    /// for CST-carrying literals (quoted code).
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        self.pretty_print_into(&mut out);
        out
    }

    fn pretty_print_into(&self, out: &mut String) {
        use std::fmt::Write;
        match &self.kind {
            CstKind::LiteralInteger(small, big) => {
                if let Some(big) = big {
                    write!(out, "{big}").unwrap();
                } else {
                    write!(out, "{small}").unwrap();
                }
            }
            CstKind::LiteralFloat(f) => write!(out, "{f}").unwrap(),
            CstKind::LiteralCharacter(c) => write!(out, "'{c}'").unwrap(),
            CstKind::LiteralString(s) => write!(out, "{s:?}").unwrap(),
            CstKind::LiteralSymbol(s) => write!(out, "#{}", s.as_str()).unwrap(),
            CstKind::Identifier(s) => out.push_str(s.as_str()),
            CstKind::ValueSequence(xs) => pretty_list(out, xs, ". "),
            CstKind::Tuple(xs) => {
                out.push('(');
                pretty_list(out, xs, ", ");
                out.push(')');
            }
            CstKind::Array(xs) => {
                out.push_str("#(");
                pretty_list(out, xs, " ");
                out.push(')');
            }
            CstKind::ByteArray(xs) => {
                out.push_str("#[");
                pretty_list(out, xs, " ");
                out.push(']');
            }
            CstKind::Dictionary(pairs) => {
                out.push('{');
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.pretty_print_into(out);
                    out.push_str(" -> ");
                    v.pretty_print_into(out);
                }
                out.push('}');
            }
            CstKind::Association(k, v) => {
                k.pretty_print_into(out);
                out.push_str(" -> ");
                v.pretty_print_into(out);
            }
            CstKind::BindableName { name, type_expression, is_mutable, .. } => {
                if *is_mutable {
                    out.push_str("mutable ");
                }
                out.push_str(name.as_str());
                if let Some(t) = type_expression {
                    out.push_str(": ");
                    t.pretty_print_into(out);
                }
            }
            CstKind::FunctionalDependentType { argument, result_type } => {
                argument.pretty_print_into(out);
                out.push_str(" -> ");
                if let Some(r) = result_type {
                    r.pretty_print_into(out);
                } else {
                    out.push('?');
                }
            }
            CstKind::Block { arguments, body } => {
                out.push('[');
                for a in arguments {
                    out.push(':');
                    a.pretty_print_into(out);
                }
                if !arguments.is_empty() {
                    out.push('|');
                }
                body.pretty_print_into(out);
                out.push(']');
            }
            CstKind::LexicalBlock(body) => {
                out.push('{');
                body.pretty_print_into(out);
                out.push('}');
            }
            CstKind::Assignment { store, value } => {
                store.pretty_print_into(out);
                out.push_str(" := ");
                value.pretty_print_into(out);
            }
            CstKind::BindPattern { pattern, .. } => {
                out.push('|');
                pattern.pretty_print_into(out);
                out.push('|');
            }
            CstKind::Application { functional, arguments } => {
                functional.pretty_print_into(out);
                out.push('(');
                pretty_list(out, arguments, ", ");
                out.push(')');
            }
            CstKind::MessageSend { receiver, selector, arguments } => {
                if let Some(r) = receiver {
                    r.pretty_print_into(out);
                    out.push(' ');
                }
                if arguments.is_empty() {
                    out.push_str(selector.as_str());
                } else {
                    for (part, arg) in selector.as_str().split(':').zip(arguments) {
                        out.push_str(part);
                        out.push_str(": ");
                        arg.pretty_print_into(out);
                        out.push(' ');
                    }
                }
            }
            CstKind::MessageCascade { receiver, messages } => {
                receiver.pretty_print_into(out);
                for m in messages {
                    out.push_str("; ");
                    out.push_str(m.selector.as_str());
                }
            }
            CstKind::BinaryExpressionSequence { first, rest } => {
                first.pretty_print_into(out);
                for (op, e) in rest {
                    out.push(' ');
                    out.push_str(op.as_str());
                    out.push(' ');
                    e.pretty_print_into(out);
                }
            }
            CstKind::Quote(inner) => {
                out.push('`');
                inner.pretty_print_into(out);
            }
            CstKind::QuasiQuote(inner) => {
                out.push_str("``");
                inner.pretty_print_into(out);
            }
            CstKind::QuasiUnquote(inner) => {
                out.push(',');
                inner.pretty_print_into(out);
            }
            CstKind::Splice(inner) => {
                out.push_str(",@");
                inner.pretty_print_into(out);
            }
            CstKind::SyntaxError { message, .. } => {
                write!(out, "<error: {message}>").unwrap();
            }
        }
    }
}

fn pretty_list(out: &mut String, xs: &[Cst], sep: &str) {
    for (i, x) in xs.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        x.pretty_print_into(out);
    }
}
