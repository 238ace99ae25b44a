use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::window::WindowId;

/// Identifies a GPU context: the display it lives on plus the context id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ContextKey {
    pub display: u64,
    pub context: u64,
}

struct Entry<C> {
    context: C,
    /// Live windows using the context; the primary (creator) comes first.
    members: Vec<WindowId>,
}

/// Tracks which windows share which context, and which window is current.
///
/// The registry owns each context. A context leaves the registry only when
/// its last member deregisters; the caller then releases it.
pub struct ContextRegistry<C> {
    entries: HashMap<ContextKey, Entry<C>>,
    current: Option<WindowId>,
}

impl<C> ContextRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            current: None,
        }
    }

    /// Registers a freshly created context with `window` as its primary.
    pub fn register_primary(&mut self, key: ContextKey, context: C, window: WindowId) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(Error::context_creation(format!(
                "context {}:{} is already registered",
                key.display, key.context
            )));
        }
        self.entries.insert(
            key,
            Entry {
                context,
                members: vec![window],
            },
        );
        Ok(())
    }

    /// Adds `window` as a secondary member of an existing context.
    pub fn register_secondary(&mut self, key: ContextKey, window: WindowId) -> Result<()> {
        let entry = self.entries.get_mut(&key).ok_or_else(|| {
            Error::context_creation(format!(
                "shared context {}:{} no longer exists",
                key.display, key.context
            ))
        })?;
        if !entry.members.contains(&window) {
            entry.members.push(window);
        }
        Ok(())
    }

    /// Removes `window` from its context.
    ///
    /// Returns the context when `window` was its last member. If the primary
    /// leaves while others remain, the oldest remaining member becomes
    /// primary.
    pub fn deregister(&mut self, key: ContextKey, window: WindowId) -> Option<C> {
        let entry = self.entries.get_mut(&key)?;
        entry.members.retain(|w| *w != window);
        if entry.members.is_empty() {
            return self.entries.remove(&key).map(|e| e.context);
        }
        None
    }

    pub fn context(&self, key: ContextKey) -> Option<&C> {
        self.entries.get(&key).map(|e| &e.context)
    }

    pub fn members(&self, key: ContextKey) -> &[WindowId] {
        self.entries.get(&key).map_or(&[], |e| e.members.as_slice())
    }

    pub fn is_primary(&self, key: ContextKey, window: WindowId) -> bool {
        self.members(key).first() == Some(&window)
    }

    /// Number of live contexts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<WindowId> {
        self.current
    }

    /// Marks `window` current. Returns `false` if it already was.
    pub fn set_current(&mut self, window: WindowId) -> bool {
        self.current.replace(window) != Some(window)
    }

    /// Clears the current marker if it points at `window`.
    pub fn clear_current(&mut self, window: WindowId) {
        if self.current == Some(window) {
            self.current = None;
        }
    }
}

impl<C> Default for ContextRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: ContextKey = ContextKey { display: 1, context: 7 };

    fn ids() -> (WindowId, WindowId, WindowId) {
        (WindowId::next(), WindowId::next(), WindowId::next())
    }

    // ── membership ────────────────────────────────────────────────────────

    #[test]
    fn context_survives_until_last_member_leaves() {
        let (a, b, c) = ids();
        let mut reg = ContextRegistry::new();
        reg.register_primary(KEY, "ctx", a).unwrap();
        reg.register_secondary(KEY, b).unwrap();
        reg.register_secondary(KEY, c).unwrap();

        assert_eq!(reg.deregister(KEY, a), None);
        assert!(reg.is_primary(KEY, b));
        assert_eq!(reg.deregister(KEY, c), None);
        assert_eq!(reg.deregister(KEY, b), Some("ctx"));
        assert!(reg.is_empty());
        assert!(reg.members(KEY).is_empty());
    }

    #[test]
    fn secondary_needs_existing_context() {
        let (a, _, _) = ids();
        let mut reg: ContextRegistry<()> = ContextRegistry::new();
        assert!(matches!(
            reg.register_secondary(KEY, a),
            Err(Error::ContextCreation(_))
        ));
    }

    #[test]
    fn duplicate_primary_is_rejected() {
        let (a, b, _) = ids();
        let mut reg = ContextRegistry::new();
        reg.register_primary(KEY, 1, a).unwrap();
        assert!(reg.register_primary(KEY, 2, b).is_err());
        assert_eq!(reg.context(KEY), Some(&1));
    }

    // ── current marker ────────────────────────────────────────────────────

    #[test]
    fn at_most_one_current() {
        let (a, b, _) = ids();
        let mut reg: ContextRegistry<()> = ContextRegistry::new();
        assert!(reg.set_current(a));
        assert!(!reg.set_current(a));
        assert!(reg.set_current(b));
        assert_eq!(reg.current(), Some(b));

        reg.clear_current(a);
        assert_eq!(reg.current(), Some(b));
        reg.clear_current(b);
        assert_eq!(reg.current(), None);
    }
}
