use alloc::rc::{Rc, Weak};
use core::fmt;

use super::shared::{Position, Shared};
use crate::arena::Handle;

/// An external position in a [`MultiIterList`](super::MultiIterList).
///
/// Any number of cursors may be alive at once and the list may be mutated
/// freely while they are: a cursor whose element is erased reads as
/// invalid but still knows where to go next, and elements inserted ahead of
/// it are visited when it advances.
///
/// A cursor whose list has been dropped behaves like an end cursor.
pub struct Cursor<T> {
    list: Weak<Shared<T>>,
    id: Handle,
}

impl<T> Cursor<T> {
    pub(crate) fn register(list: &Rc<Shared<T>>, pos: Position) -> Self {
        let id = list.register(pos);
        Self {
            list: Rc::downgrade(list),
            id,
        }
    }

    pub(crate) fn id(&self) -> Handle {
        self.id
    }

    pub(crate) fn belongs_to(&self, list: &Rc<Shared<T>>) -> bool {
        core::ptr::eq(self.list.as_ptr(), Rc::as_ptr(list))
    }

    pub(crate) fn position(&self) -> Position {
        self.list
            .upgrade()
            .map(|list| list.position(self.id))
            .unwrap_or_default()
    }

    /// Whether the cursor denotes a live element.
    pub fn valid(&self) -> bool {
        self.position().current.is_some()
    }

    /// Whether the cursor is past the last element.
    pub fn is_end(&self) -> bool {
        self.position() == Position::default()
    }

    /// Moves to the element that follows the cursor's position.
    ///
    /// For an erased position that is the element which followed the erased
    /// one, or whatever has been inserted in front of it since. Guards from
    /// [`MultiIterList::get`](super::MultiIterList::get) may be held while
    /// advancing.
    pub fn advance(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.advance(self.id);
        }
    }
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        match self.list.upgrade() {
            Some(list) => {
                let pos = list.position(self.id);
                Self::register(&list, pos)
            }
            None => Self {
                list: Weak::clone(&self.list),
                id: self.id,
            },
        }
    }
}

impl<T> Drop for Cursor<T> {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.deregister(self.id);
        }
    }
}

impl<T> PartialEq for Cursor<T> {
    /// Two cursors are equal when they denote the same element of the same
    /// list and will move to the same element next. All end cursors are
    /// equal.
    fn eq(&self, other: &Self) -> bool {
        let pos = self.position();
        pos == other.position()
            && (pos == Position::default() || Weak::ptr_eq(&self.list, &other.list))
    }
}

impl<T> Eq for Cursor<T> {}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.position();
        f.debug_struct("Cursor")
            .field("current", &pos.current)
            .field("next", &pos.next)
            .finish()
    }
}
