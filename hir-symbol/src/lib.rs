//! Global, interned identifiers used throughout the IR.
//!
//! Every name in the system — circuit, module, port, wire, register,
//! instance, struct field, attribute — is represented as a [`Symbol`], a
//! small `Copy` handle into a process-wide string interner. This keeps the
//! IR's name-heavy data structures (the `Database`'s ordered name lists,
//! `Struct` field lists, etc.) cheap to clone and compare.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use lazy_static::lazy_static;

/// An interned identifier.
///
/// Two `Symbol`s are equal if and only if they were interned from the same
/// string. Interning is append-only for the lifetime of the process, so a
/// `Symbol` never becomes invalid once created.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Interns `name`, returning the `Symbol` that represents it.
    pub fn intern(name: impl Into<Cow<'static, str>>) -> Self {
        INTERNER.lock().unwrap().intern(name.into())
    }

    /// Returns the underlying string.
    ///
    /// The returned reference is valid for the lifetime of the process: the
    /// interner never frees or mutates an entry once interned.
    pub fn as_str(&self) -> &'static str {
        INTERNER.lock().unwrap().resolve(*self)
    }
}

impl Default for Symbol {
    /// The empty string, interned once. Lets `Symbol`-keyed structures
    /// derive `Default` without needing a sentinel placeholder name.
    fn default() -> Self {
        Symbol::intern("")
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::intern(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::intern(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

struct Interner {
    strings: Vec<&'static str>,
    names: HashMap<&'static str, Symbol>,
}

impl Interner {
    fn new() -> Self {
        Self {
            strings: Vec::new(),
            names: HashMap::new(),
        }
    }

    fn intern(&mut self, name: Cow<'static, str>) -> Symbol {
        if let Some(sym) = self.names.get(name.as_ref()) {
            return *sym;
        }
        let leaked: &'static str = match name {
            Cow::Borrowed(s) => s,
            Cow::Owned(s) => Box::leak(s.into_boxed_str()),
        };
        let id = self.strings.len() as u32;
        self.strings.push(leaked);
        let sym = Symbol(id);
        self.names.insert(leaked, sym);
        sym
    }

    fn resolve(&self, sym: Symbol) -> &'static str {
        self.strings[sym.0 as usize]
    }
}

lazy_static! {
    static ref INTERNER: Mutex<Interner> = Mutex::new(Interner::new());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let a = Symbol::intern("clk");
        let b = Symbol::intern("clk".to_string());
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "clk");
    }

    #[test]
    fn distinct_names_are_distinct() {
        let a = Symbol::intern("a");
        let b = Symbol::intern("b");
        assert_ne!(a, b);
    }

    #[test]
    fn display_roundtrips() {
        let sym = Symbol::intern("reset_n");
        assert_eq!(format!("{sym}"), "reset_n");
    }
}
