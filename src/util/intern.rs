use std::{collections::HashMap, fmt, num::NonZeroU32, rc::Rc};

/// A handle to an interned identifier. To retrieve the text, use
/// [`Interner::get`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(NonZeroU32);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Identifier interner. Every distinct string is stored once; equal strings
/// map to equal [`Name`]s, so names compare and hash in constant time.
#[derive(Default)]
pub struct Interner {
    map: HashMap<Rc<str>, Name>,
    names: Vec<Rc<str>>,
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (i, name) in self.names.iter().enumerate() {
            map.entry(&(i + 1), name);
        }
        map.finish()
    }
}

impl Interner {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            map: HashMap::with_capacity(capacity),
            names: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Interns the provided string, returning its handle.
    pub fn intern(&mut self, text: &str) -> Name {
        if let Some(name) = self.map.get(text) {
            return *name;
        }
        let handle = u32::try_from(self.names.len() + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .expect("interner out of capacity");
        let name = Name(handle);
        let text: Rc<str> = Rc::from(text);
        self.names.push(Rc::clone(&text));
        self.map.insert(text, name);
        name
    }

    /// Returns the handle of an already interned string, without interning.
    pub fn find(&self, text: &str) -> Option<Name> {
        self.map.get(text).copied()
    }

    /// Returns the text of the provided handle. Panics if the handle was
    /// created by another interner.
    pub fn get(&self, name: Name) -> &str {
        &self.names[name.0.get() as usize - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner() {
        let mut i = Interner::with_capacity(3);

        let x1 = i.intern("x");
        let add1 = i.intern("add");
        let x2 = i.intern("x");
        let add2 = i.intern("add");

        assert_eq!(x1, x2);
        assert_eq!(add1, add2);
        assert_ne!(x1, add1);
        assert_eq!(i.get(x1), "x");
        assert_eq!(i.get(add2), "add");
        assert_eq!(i.len(), 2);
    }

    #[test]
    fn find_does_not_intern() {
        let mut i = Interner::default();
        assert!(i.is_empty());
        assert_eq!(i.find("ret"), None);
        let ret = i.intern("ret");
        assert_eq!(i.find("ret"), Some(ret));
        assert_eq!(i.len(), 1);
    }
}
