//! Process-wide symbol interning.
//!
//! `Symbol` identity equals string content: interning the same text twice
//! always yields the same `Symbol`. The table is append-only once initialized
//! and is never mutated concurrently — the interpreter is single-threaded —
//! so a thread-local table with an index handle is enough; no `Arc`/locking
//! is needed the way a multi-threaded host would require.

use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;

thread_local! {
    static TABLE: RefCell<SymbolTable> = RefCell::new(SymbolTable::new());
}

struct SymbolTable {
    strings: Vec<Rc<str>>,
    statics: Vec<&'static str>,
    by_text: AHashMap<Rc<str>, u32>,
}

impl SymbolTable {
    fn new() -> Self {
        Self { strings: Vec::new(), statics: Vec::new(), by_text: AHashMap::new() }
    }

    fn intern(&mut self, text: &str) -> u32 {
        if let Some(&id) = self.by_text.get(text) {
            return id;
        }
        let id = u32::try_from(self.strings.len()).expect("symbol table overflow");
        let rc: Rc<str> = Rc::from(text);
        // Leaked once, at intern time, not per `as_str` call: the table is
        // append-only for the process lifetime, so the static reference stays
        // valid. Leaking here (rather than per-lookup) bounds the leak to one
        // allocation per distinct interned string.
        self.statics.push(Box::leak(text.to_owned().into_boxed_str()));
        self.strings.push(rc.clone());
        self.by_text.insert(rc, id);
        id
    }
}

/// An interned identifier. Cheap to copy and compare; `Eq`/`Hash` are by the
/// interned index, which is sound because `intern` guarantees a single index
/// per distinct string content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn intern(text: &str) -> Self {
        TABLE.with(|table| Self(table.borrow_mut().intern(text)))
    }

    /// A fresh, process-unique identifier under `tag`, used for compiler-
    /// introduced temporaries with no surface-syntax name: a cascade's
    /// shared receiver slot, an unnamed block argument. Never collides with
    /// a user identifier because `$` cannot start one (see `scanner.rs`'s
    /// identifier start-character set).
    pub fn gensym(tag: &str) -> Self {
        thread_local! {
            static COUNTER: RefCell<u32> = const { RefCell::new(0) };
        }
        let n = COUNTER.with(|c| {
            let mut c = c.borrow_mut();
            *c += 1;
            *c
        });
        Self::intern(&format!("${tag}{n}"))
    }

    /// The interned text. Leaks no allocation beyond the table's own storage;
    /// the returned `Rc<str>` keeps the table entry alive independent of the
    /// caller's borrow of the thread-local.
    pub fn as_rc_str(self) -> Rc<str> {
        TABLE.with(|table| table.borrow().strings[self.0 as usize].clone())
    }

    pub fn as_str(self) -> &'static str {
        TABLE.with(|table| table.borrow().statics[self.0 as usize])
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_rc_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_interns_to_the_same_symbol() {
        assert_eq!(Symbol::intern("foo"), Symbol::intern("foo"));
    }

    #[test]
    fn distinct_text_interns_to_distinct_symbols() {
        assert_ne!(Symbol::intern("foo"), Symbol::intern("bar"));
    }

    #[test]
    fn round_trips_text() {
        let s = Symbol::intern("withSelector:addMethod:");
        assert_eq!(&*s.as_rc_str(), "withSelector:addMethod:");
    }
}
