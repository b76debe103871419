//! An owning list with any number of mutation-tolerant cursors.
//!
//! [`MultiIterList`] owns its elements and releases them through a deleter
//! chosen at construction. [`Cursor`]s are registered with the list, so
//! every erase and insert can repair all of them before returning:
//!
//! - erasing a cursor's element leaves the cursor invalid but still
//!   tracking the element that followed;
//! - inserting ahead of a cursor makes the cursor visit the new element;
//! - no cursor ever refers to freed storage.
//!
//! ```
//! use mola_links::linked_list::multi_iter::MultiIterList;
//!
//! let list = MultiIterList::new();
//! for v in [1, 2, 3] {
//!     list.push_back_new(v).unwrap();
//! }
//!
//! let mut it = list.begin();
//! it.advance();
//! assert_eq!(list.get(&it).map(|v| *v), Some(2));
//!
//! list.erase(&it);
//! assert!(list.get(&it).is_none());
//! it.advance();
//! assert_eq!(list.get(&it).map(|v| *v), Some(3));
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Ref, RefMut};
use core::fmt;

mod cursor;
mod shared;
mod sort;

#[cfg(test)]
mod tests;

pub use cursor::Cursor;

use crate::arena::Handle;
use crate::error::{Error, Result};
use shared::{Position, Shared};

/// Releases one element. Defaults to [`drop`].
pub type Deleter<T> = fn(T);

/// An owning linked list whose cursors survive insertion and removal.
///
/// `size()` walks the list; there is no cached length.
pub struct MultiIterList<T> {
    shared: Rc<Shared<T>>,
}

impl<T> MultiIterList<T> {
    /// Creates an empty list that drops its elements normally.
    pub fn new() -> Self {
        Self::with_capacity_and_deleter(0, drop)
    }

    /// Creates an empty list that releases elements through `deleter`.
    pub fn with_deleter(deleter: Deleter<T>) -> Self {
        Self::with_capacity_and_deleter(0, deleter)
    }

    /// Creates an empty list with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_deleter(capacity, drop)
    }

    /// Creates an empty list with room for `capacity` elements that releases
    /// them through `deleter`.
    pub fn with_capacity_and_deleter(capacity: usize, deleter: Deleter<T>) -> Self {
        Self {
            shared: Rc::new(Shared::new(capacity, deleter)),
        }
    }

    /// The deleter this list releases elements with.
    pub fn deleter(&self) -> Deleter<T> {
        self.shared.list.borrow().deleter
    }

    /// Appends `value`.
    ///
    /// Cursors sitting on the previous last element will visit it.
    /// If node storage cannot grow, `value` is passed to the deleter and
    /// [`Error::AllocFailed`] is returned.
    pub fn push_back_new(&self, value: T) -> Result<()> {
        self.link(None, value, None)
    }

    /// Prepends `value`.
    pub fn push_front_new(&self, value: T) -> Result<()> {
        let head = self.shared.list.borrow().head;
        self.link(head, value, None)
    }

    /// Inserts `value` immediately before the position `pos` denotes.
    ///
    /// - `pos` at the end: the value is appended.
    /// - `pos` on an erased element: the value goes before the element `pos`
    ///   will advance to.
    /// - `pos` on a live element: the value goes before that element.
    ///
    /// Every other cursor that was about to advance onto the insertion point
    /// is redirected to the new element. `pos` itself is left alone, so it
    /// does not see its own insertion.
    ///
    /// # Panics
    ///
    /// Panics if `pos` belongs to another list.
    pub fn insert_new(&self, pos: &Cursor<T>, value: T) -> Result<()> {
        self.check(pos);
        let Position { current, next } = pos.position();
        self.link(current.or(next), value, Some(pos.id()))
    }

    /// Erases the element `pos` denotes, releasing it through the deleter.
    ///
    /// Returns `false` if `pos` does not denote a live element.
    pub fn erase(&self, pos: &Cursor<T>) -> bool {
        match self.extract_element(pos) {
            Some(value) => {
                (self.deleter())(value);
                true
            }
            None => false,
        }
    }

    /// Removes the element `pos` denotes and returns it without running the
    /// deleter.
    ///
    /// # Panics
    ///
    /// Panics if `pos` belongs to another list.
    pub fn extract_element(&self, pos: &Cursor<T>) -> Option<T> {
        self.check(pos);
        let node = pos.position().current?;
        self.shared.unlink(node)
    }

    /// Removes the first element and returns it without running the deleter.
    pub fn extract_front(&self) -> Option<T> {
        let head = self.shared.list.borrow().head?;
        self.shared.unlink(head)
    }

    /// Releases every element through the deleter.
    ///
    /// Every cursor becomes an end cursor.
    pub fn clear(&self) {
        let values = self.shared.unlink_all();
        let deleter = self.deleter();
        tracing::trace!(elements = values.len(), "multi-iter list cleared");
        for value in values {
            deleter(value);
        }
    }

    /// Swaps the elements two cursors denote. Cursors stay with their nodes.
    ///
    /// # Panics
    ///
    /// Panics unless both cursors belong to this list and denote live
    /// elements.
    pub fn swap_elements(&self, a: &Cursor<T>, b: &Cursor<T>) {
        self.check(a);
        self.check(b);
        let (Some(x), Some(y)) = (a.position().current, b.position().current) else {
            panic!("swap_elements requires two cursors on live elements");
        };
        if x == y {
            return;
        }
        let mut list = self.shared.list.borrow_mut();
        let (x, y) = list
            .nodes
            .get_pair_mut(x, y)
            .expect("cursor refers to a missing node");
        core::mem::swap(&mut x.value, &mut y.value);
    }

    /// Number of elements, counted by walking the list.
    pub fn size(&self) -> usize {
        self.shared.list.borrow().len()
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.shared.list.borrow().head.is_none()
    }

    /// A cursor on the first element, or an end cursor if the list is empty.
    pub fn begin(&self) -> Cursor<T> {
        let pos = {
            let list = self.shared.list.borrow();
            Position {
                current: list.head,
                next: list.head.and_then(|h| list.next_of(h)),
            }
        };
        Cursor::register(&self.shared, pos)
    }

    /// An end cursor.
    pub fn end(&self) -> Cursor<T> {
        Cursor::register(&self.shared, Position::default())
    }

    /// The first element.
    pub fn front(&self) -> Option<Ref<'_, T>> {
        let head = self.shared.list.borrow().head?;
        self.value_ref(head)
    }

    /// The last element.
    pub fn back(&self) -> Option<Ref<'_, T>> {
        let tail = self.shared.list.borrow().tail?;
        self.value_ref(tail)
    }

    /// The element `pos` denotes.
    ///
    /// Cursors can be created, cloned and advanced while the guard is held.
    /// The list itself cannot be modified until it is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `pos` belongs to another list, or if the list is being
    /// modified through a [`get_mut`](Self::get_mut) guard.
    pub fn get(&self, pos: &Cursor<T>) -> Option<Ref<'_, T>> {
        self.check(pos);
        self.value_ref(pos.position().current?)
    }

    /// Mutable access to the element `pos` denotes.
    ///
    /// # Panics
    ///
    /// Panics if `pos` belongs to another list.
    pub fn get_mut(&self, pos: &Cursor<T>) -> Option<RefMut<'_, T>> {
        self.check(pos);
        let node = pos.position().current?;
        RefMut::filter_map(self.shared.list.borrow_mut(), |list| {
            list.nodes.get_mut(node).map(|n| &mut n.value)
        })
        .ok()
    }

    /// Number of cursors currently registered with this list.
    pub fn cursor_count(&self) -> usize {
        self.shared.live_cursors()
    }

    /// Clones every element into a `Vec`, front to back.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let list = self.shared.list.borrow();
        let mut out = Vec::new();
        let mut cursor = list.head;
        while let Some(node) = cursor {
            if let Some(value) = list.value(node) {
                out.push(value.clone());
            }
            cursor = list.next_of(node);
        }
        out
    }

    fn value_ref(&self, node: Handle) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.shared.list.borrow(), |list| list.value(node)).ok()
    }

    fn link(&self, target: Option<Handle>, value: T, exclude: Option<Handle>) -> Result<()> {
        let linked = self.shared.insert_before(target, value, exclude);
        match linked {
            Ok(_) => Ok(()),
            Err((source, value)) => {
                tracing::warn!(%source, "failed to allocate list node");
                (self.deleter())(value);
                Err(Error::AllocFailed {
                    what: "list node",
                    source,
                })
            }
        }
    }

    fn check(&self, pos: &Cursor<T>) {
        assert!(
            pos.belongs_to(&self.shared),
            "cursor used with a list it does not belong to"
        );
    }
}

impl<T> Default for MultiIterList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for MultiIterList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = self.shared.list.borrow();
        let mut entries = f.debug_list();
        let mut cursor = list.head;
        while let Some(node) = cursor {
            if let Some(value) = list.value(node) {
                entries.entry(value);
            }
            cursor = list.next_of(node);
        }
        entries.finish()
    }
}
