//! Weak back-references that null themselves when their target dies.
//!
//! A [`WeakTarget`] owns a value and keeps a registry of every
//! [`WeakLink`] currently pointing at it. Dropping the target invalidates
//! all registered links at once: from then on they read as null.
//!
//! ```
//! use mola_links::weak::{WeakLink, WeakTarget};
//!
//! let target = WeakTarget::new(7);
//! let l1 = WeakLink::new(Some(&target));
//! let l2 = l1.clone();
//! assert_eq!(target.link_count(), 2);
//! assert_eq!(l1.get().map(|v| *v), Some(7));
//!
//! drop(target);
//! assert!(l1.get().is_none());
//! assert!(l2.is_null());
//! ```

use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;
use core::ops::Deref;

use hashbrown::HashSet;

/// Identity of one link registration with one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct LinkId(u64);

struct Anchor<T> {
    alive: Cell<bool>,
    next_id: Cell<u64>,
    links: RefCell<HashSet<LinkId>>,
    value: T,
}

impl<T> Anchor<T> {
    fn register(&self) -> LinkId {
        let id = LinkId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.links.borrow_mut().insert(id);
        id
    }

    fn unregister(&self, id: LinkId) {
        let removed = self.links.borrow_mut().remove(&id);
        debug_assert!(removed, "unregistering a link that was never registered");
    }
}

/// Owner of a value that [`WeakLink`]s may point at.
///
/// The target is the value's only owner; links never extend its lifetime
/// past the target's drop.
pub struct WeakTarget<T> {
    anchor: Rc<Anchor<T>>,
}

impl<T> WeakTarget<T> {
    /// Wraps `value` so it can be weakly referenced.
    pub fn new(value: T) -> Self {
        Self {
            anchor: Rc::new(Anchor {
                alive: Cell::new(true),
                next_id: Cell::new(0),
                links: RefCell::new(HashSet::new()),
                value,
            }),
        }
    }

    /// Creates a new link to this target.
    pub fn link(&self) -> WeakLink<T> {
        WeakLink::new(Some(self))
    }

    /// Number of links currently registered with this target.
    pub fn link_count(&self) -> usize {
        self.anchor.links.borrow().len()
    }

    pub(crate) fn register(&self) -> LinkId {
        self.anchor.register()
    }
}

impl<T> Deref for WeakTarget<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.anchor.value
    }
}

impl<T> Drop for WeakTarget<T> {
    fn drop(&mut self) {
        // Links check `alive` before touching the registry, so none of them
        // will call back into `unregister` from here on.
        self.anchor.alive.set(false);
        let invalidated = self.anchor.links.borrow_mut().drain().count();
        tracing::trace!(invalidated, "weak target dropped");
    }
}

impl<T: fmt::Debug> fmt::Debug for WeakTarget<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakTarget")
            .field("value", &self.anchor.value)
            .field("links", &self.link_count())
            .finish()
    }
}

/// Borrow of a live target, handed out by [`WeakLink::get`].
///
/// The value's storage stays valid while this guard exists. Links still
/// read as null as soon as the owning [`WeakTarget`] is dropped.
pub struct TargetRef<T> {
    anchor: Rc<Anchor<T>>,
}

impl<T> Deref for TargetRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.anchor.value
    }
}

impl<T: fmt::Debug> fmt::Debug for TargetRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.anchor.value, f)
    }
}

/// A nullable reference to a [`WeakTarget`].
///
/// Cloning a link creates an independent registration with the same target.
pub struct WeakLink<T> {
    target: Option<(Weak<Anchor<T>>, LinkId)>,
}

impl<T> WeakLink<T> {
    /// Creates a link to `target`, or a null link.
    pub fn new(target: Option<&WeakTarget<T>>) -> Self {
        Self {
            target: target.map(|t| (Rc::downgrade(&t.anchor), t.register())),
        }
    }

    /// Creates a null link.
    pub const fn null() -> Self {
        Self { target: None }
    }

    /// Points this link at `target`, dropping the previous registration.
    pub fn reset(&mut self, target: Option<&WeakTarget<T>>) {
        self.release();
        self.target = target.map(|t| (Rc::downgrade(&t.anchor), t.register()));
    }

    /// The current target, or `None` if the link is null or the target died.
    pub fn get(&self) -> Option<TargetRef<T>> {
        self.live_anchor().map(|anchor| TargetRef { anchor })
    }

    /// Whether the link currently reads as null.
    pub fn is_null(&self) -> bool {
        self.live_anchor().is_none()
    }

    /// Whether this link points at `target`.
    pub fn points_to(&self, target: &WeakTarget<T>) -> bool {
        self.live_anchor()
            .is_some_and(|anchor| Rc::ptr_eq(&anchor, &target.anchor))
    }

    fn live_anchor(&self) -> Option<Rc<Anchor<T>>> {
        let (weak, _) = self.target.as_ref()?;
        weak.upgrade().filter(|anchor| anchor.alive.get())
    }

    fn release(&mut self) {
        if let Some((weak, id)) = self.target.take() {
            if let Some(anchor) = weak.upgrade().filter(|a| a.alive.get()) {
                anchor.unregister(id);
            }
        }
    }
}

impl<T> Clone for WeakLink<T> {
    fn clone(&self) -> Self {
        Self {
            target: self
                .live_anchor()
                .map(|anchor| (Rc::downgrade(&anchor), anchor.register())),
        }
    }
}

impl<T> Default for WeakLink<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> Drop for WeakLink<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> PartialEq for WeakLink<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self.live_anchor(), other.live_anchor()) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a, &b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Eq for WeakLink<T> {}

impl<T> fmt::Debug for WeakLink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakLink")
            .field("null", &self.is_null())
            .finish()
    }
}
