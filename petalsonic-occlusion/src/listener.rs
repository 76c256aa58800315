//! Lazily resolved listener position.
//!
//! The engine tracks a single listener. It asks a [`ListenerResolver`] for an
//! [`Anchor`] the first time it needs a position and again whenever the held
//! anchor stops producing one (the listener object was destroyed or swapped).

use crate::math::Vec2;
use std::cell::Cell;
use std::rc::Weak;

/// A live handle to the listener's position.
pub trait Anchor {
    /// Current position, or `None` once the underlying object is gone
    fn position(&self) -> Option<Vec2>;
}

impl<F> Anchor for F
where
    F: Fn() -> Option<Vec2>,
{
    fn position(&self) -> Option<Vec2> {
        self()
    }
}

impl Anchor for Weak<Cell<Vec2>> {
    fn position(&self) -> Option<Vec2> {
        self.upgrade().map(|position| position.get())
    }
}

/// Finds the current listener anchor, if any.
pub trait ListenerResolver {
    fn resolve_listener(&mut self) -> Option<Box<dyn Anchor>>;
}

impl<F> ListenerResolver for F
where
    F: FnMut() -> Option<Box<dyn Anchor>>,
{
    fn resolve_listener(&mut self) -> Option<Box<dyn Anchor>> {
        self()
    }
}

/// Listener pinned at a fixed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedListener(pub Vec2);

impl ListenerResolver for FixedListener {
    fn resolve_listener(&mut self) -> Option<Box<dyn Anchor>> {
        let position = self.0;
        Some(Box::new(move || Some(position)))
    }
}

/// Resolver for scenes without a listener; every source reads as unoccluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoListener;

impl ListenerResolver for NoListener {
    fn resolve_listener(&mut self) -> Option<Box<dyn Anchor>> {
        None
    }
}

/// Holds the current anchor and re-resolves it on demand.
pub struct ListenerSlot {
    resolver: Box<dyn ListenerResolver>,
    anchor: Option<Box<dyn Anchor>>,
}

impl ListenerSlot {
    pub fn new(resolver: Box<dyn ListenerResolver>) -> Self {
        Self {
            resolver,
            anchor: None,
        }
    }

    /// Returns the listener position, resolving a new anchor if the held one
    /// is missing or no longer valid.
    pub fn position(&mut self) -> Option<Vec2> {
        if let Some(position) = self.anchor.as_ref().and_then(|anchor| anchor.position()) {
            return Some(position);
        }

        self.anchor = self.resolver.resolve_listener();
        let position = self.anchor.as_ref().and_then(|anchor| anchor.position());
        if position.is_none() {
            self.anchor = None;
        }
        position
    }

    pub fn is_resolved(&self) -> bool {
        self.anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_fixed_listener() {
        let mut slot = ListenerSlot::new(Box::new(FixedListener(Vec2::new(2.0, 3.0))));
        assert!(!slot.is_resolved());
        assert_eq!(slot.position(), Some(Vec2::new(2.0, 3.0)));
        assert!(slot.is_resolved());
    }

    #[test]
    fn test_no_listener() {
        let mut slot = ListenerSlot::new(Box::new(NoListener));
        assert_eq!(slot.position(), None);
        assert!(!slot.is_resolved());
    }

    #[test]
    fn test_reresolves_after_anchor_dropped() {
        let first = Rc::new(Cell::new(Vec2::new(1.0, 0.0)));
        let second = Rc::new(Cell::new(Vec2::new(5.0, 0.0)));
        let candidates = vec![Rc::downgrade(&second), Rc::downgrade(&first)];
        let resolves = Rc::new(Cell::new(0));

        let counter = resolves.clone();
        let mut remaining = candidates;
        let resolver = move || -> Option<Box<dyn Anchor>> {
            counter.set(counter.get() + 1);
            remaining
                .pop()
                .map(|anchor| Box::new(anchor) as Box<dyn Anchor>)
        };
        let mut slot = ListenerSlot::new(Box::new(resolver));

        assert_eq!(slot.position(), Some(Vec2::new(1.0, 0.0)));
        first.set(Vec2::new(1.5, 0.0));
        assert_eq!(slot.position(), Some(Vec2::new(1.5, 0.0)));
        assert_eq!(resolves.get(), 1);

        drop(first);
        assert_eq!(slot.position(), Some(Vec2::new(5.0, 0.0)));
        assert_eq!(resolves.get(), 2);

        drop(second);
        assert_eq!(slot.position(), None);
        assert!(!slot.is_resolved());
    }
}
