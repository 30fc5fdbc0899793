//! Key bindings attached to view nodes, and cursor-based binding resolution.
//!
//! A node may carry a [`Bindings`] map from key names (e.g. `"<CR>"`, `"dd"`) to zero-argument
//! handlers. When the host reports a key press, [`resolve`] walks the mounted tree and picks the
//! map of the deepest node whose range contains the cursor.

use crate::mounted::MountedNode;
use crate::position::Position;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A zero-argument key handler.
pub type Handler = Rc<dyn Fn()>;

/// Key name to handler map.
///
/// Cloning is cheap: handlers are reference counted.
#[derive(Clone, Default)]
pub struct Bindings {
    handlers: BTreeMap<String, Handler>,
}

impl Bindings {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, handler: impl Fn() + 'static) -> Self {
        self.insert(key, handler);
        self
    }

    /// Bind `key`, replacing any previous handler for it.
    pub fn insert(&mut self, key: impl Into<String>, handler: impl Fn() + 'static) {
        self.handlers.insert(key.into(), Rc::new(handler));
    }

    /// Handler bound to `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Handler> {
        self.handlers.get(key)
    }

    /// Returns `true` if `key` is bound.
    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Bound key names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke the handler bound to `key`. Returns `false` if the key is unbound.
    pub fn invoke(&self, key: &str) -> bool {
        match self.handlers.get(key) {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("keys", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Find the bindings that should handle a key press at `cursor`.
///
/// Returns `None` when the cursor is outside `tree`'s range. Otherwise the first child (in
/// document order) that resolves to some bindings wins; if no child claims the cursor, the
/// node's own bindings are returned (which may also be `None`).
///
/// Zero-width nodes never contain a cursor and so never match.
pub fn resolve(tree: &MountedNode, cursor: Position) -> Option<&Bindings> {
    if !tree.range().contains(cursor) {
        return None;
    }

    tree.children()
        .iter()
        .find_map(|child| resolve(child, cursor))
        .or_else(|| tree.bindings())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_insert_replaces_existing_handler() {
        let hits = Rc::new(Cell::new(0));
        let first = Rc::clone(&hits);
        let second = Rc::clone(&hits);

        let mut bindings = Bindings::new().with("<CR>", move || first.set(first.get() + 1));
        bindings.insert("<CR>", move || second.set(second.get() + 10));

        assert_eq!(bindings.len(), 1);
        assert!(bindings.invoke("<CR>"));
        assert_eq!(hits.get(), 10);
        assert!(!bindings.invoke("t"));
    }

    #[test]
    fn test_keys_are_sorted_and_debuggable() {
        let bindings = Bindings::new().with("t", || {}).with("<CR>", || {});
        assert_eq!(bindings.keys().collect::<Vec<_>>(), vec!["<CR>", "t"]);
        assert_eq!(
            format!("{bindings:?}"),
            r#"Bindings { keys: ["<CR>", "t"] }"#
        );
    }
}
