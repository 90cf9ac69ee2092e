//! Positioned failures and their one-line diagnostic formatting.
//!
//! Lexical and syntactic errors never abort — they're reified as CST nodes
//! (see `cst::CstKind::SyntaxError`) and collected by the driver. Everything
//! else (`SemanticError`, `TypeError`, `DispatchError`, `ArithmeticError`)
//! surfaces as a [`Fault`]: a positioned failure that unwinds the current
//! top-level evaluation. `AssertionError` (broken intrinsics, broken class
//! lattice) is not representable here — those are internal invariant
//! violations and `panic!` via [`bug`].

use std::fmt;

use crate::source::SourcePosition;

/// The kind of positioned failure, matching the non-syntactic rows of
/// spec.md §7's error taxonomy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Semantic,
    Type,
    Dispatch,
    Arithmetic,
    /// Not named in spec.md §7's taxonomy table; an ambient addition (see
    /// SPEC_FULL.md §5) guarding against runaway recursive definitions.
    Resource,
}

/// A positioned runtime/analysis failure. Carries the `SourcePosition` of the
/// responsible node, per spec.md §7: "all other errors surface as a
/// positioned failure carrying the source position of the responsible node".
#[derive(Debug, Clone)]
pub struct Fault {
    pub kind: FaultKind,
    pub position: SourcePosition,
    pub message: String,
}

impl Fault {
    pub fn new(kind: FaultKind, position: SourcePosition, message: impl Into<String>) -> Self {
        Self { kind, position, message: message.into() }
    }

    pub fn semantic(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::new(FaultKind::Semantic, position, message)
    }

    pub fn type_error(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::new(FaultKind::Type, position, message)
    }

    pub fn dispatch(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::new(FaultKind::Dispatch, position, message)
    }

    pub fn arithmetic(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::new(FaultKind::Arithmetic, position, message)
    }

    pub fn resource(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::new(FaultKind::Resource, position, message)
    }

    /// The single line of diagnostic output spec.md §6 contracts:
    /// `"<dir><name>:<line>.<col>-<line>.<col>: <message>"`.
    pub fn format(&self) -> String {
        format!("{}: {}", self.position.format(), self.message)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl std::error::Error for Fault {}

/// Internal invariant violation: a malformed intrinsics table or a broken
/// class lattice. Always fatal, per spec.md §7's `AssertionError` row —
/// these indicate the interpreter itself is wrong, never the input program,
/// so they panic rather than returning a `Result` the caller could swallow.
#[macro_export]
macro_rules! bug {
    ($($arg:tt)*) => {
        panic!("internal invariant violated: {}", format!($($arg)*))
    };
}
