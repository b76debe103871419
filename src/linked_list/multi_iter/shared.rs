use alloc::alloc::{Layout, handle_alloc_error};
use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::arena::{Arena, Handle};

/// A cursor's place in the list.
///
/// `current` is the node the cursor denotes, or `None` once that node is
/// gone. `next` is the node the cursor will move to, kept up to date by
/// every insertion and removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Position {
    pub(crate) current: Option<Handle>,
    pub(crate) next: Option<Handle>,
}

pub(crate) struct Node<T> {
    pub(crate) value: T,
    next: Option<Handle>,
    prev: Option<Handle>,
}

/// Positions of every registered cursor.
pub(crate) type Cursors = Arena<Position>;

/// Node storage and links of a [`MultiIterList`](super::MultiIterList).
pub(crate) struct ListCore<T> {
    pub(crate) nodes: Arena<Node<T>>,
    pub(crate) head: Option<Handle>,
    pub(crate) tail: Option<Handle>,
    pub(crate) deleter: fn(T),
}

impl<T> ListCore<T> {
    fn new(capacity: usize, deleter: fn(T)) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            head: None,
            tail: None,
            deleter,
        }
    }

    pub(crate) fn next_of(&self, node: Handle) -> Option<Handle> {
        self.nodes.get(node).and_then(|n| n.next)
    }

    pub(crate) fn value(&self, node: Handle) -> Option<&T> {
        self.nodes.get(node).map(|n| &n.value)
    }

    /// Links `value` in before `target`, or at the back when `target` is
    /// `None`.
    ///
    /// Every cursor except `exclude` that was about to move to `target` is
    /// redirected to the new node, so it will not skip it.
    fn insert_before(
        &mut self,
        cursors: &mut Cursors,
        target: Option<Handle>,
        value: T,
        exclude: Option<Handle>,
    ) -> Result<Handle, (TryReserveError, T)> {
        let prev = match target {
            Some(t) => self.nodes.get(t).expect("insertion point is not in the list").prev,
            None => self.tail,
        };
        let node = self
            .nodes
            .try_insert(Node {
                value,
                next: target,
                prev,
            })
            .map_err(|(err, node)| (err, node.value))?;

        match prev {
            Some(p) => self.node_mut(p).next = Some(node),
            None => self.head = Some(node),
        }
        match target {
            Some(t) => self.node_mut(t).prev = Some(node),
            None => self.tail = Some(node),
        }

        for (id, pos) in cursors.iter_mut() {
            if Some(id) == exclude {
                continue;
            }
            let redirect = match target {
                Some(_) => pos.next == target,
                // Only cursors sitting on the old tail; end cursors stay put.
                None => pos.next.is_none() && pos.current.is_some(),
            };
            if redirect {
                pos.next = Some(node);
            }
        }
        Ok(node)
    }

    /// Unlinks `node` and hands back its payload.
    ///
    /// Cursors on the node become erased positions that still track its
    /// successor; cursors about to move onto it skip ahead.
    fn unlink(&mut self, cursors: &mut Cursors, node: Handle) -> Option<T> {
        let removed = self.nodes.remove(node)?;
        match removed.prev {
            Some(p) => self.node_mut(p).next = removed.next,
            None => self.head = removed.next,
        }
        match removed.next {
            Some(n) => self.node_mut(n).prev = removed.prev,
            None => self.tail = removed.prev,
        }

        for (_, pos) in cursors.iter_mut() {
            if pos.current == Some(node) {
                pos.current = None;
            }
            if pos.next == Some(node) {
                pos.next = removed.next;
            }
        }
        Some(removed.value)
    }

    /// Unlinks every node, in list order.
    fn unlink_all(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while let Some(node) = cursor {
            cursor = self.next_of(node);
            if let Some(removed) = self.nodes.remove(node) {
                values.push(removed.value);
            }
        }
        self.head = None;
        self.tail = None;
        values
    }

    pub(crate) fn len(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.head;
        while let Some(node) = cursor {
            count += 1;
            cursor = self.next_of(node);
        }
        count
    }

    fn node_mut(&mut self, node: Handle) -> &mut Node<T> {
        self.nodes
            .get_mut(node)
            .expect("list links refer to a missing node")
    }
}

impl<T> Drop for ListCore<T> {
    fn drop(&mut self) {
        let values = self.unlink_all();
        if !values.is_empty() {
            tracing::trace!(elements = values.len(), "multi-iter list dropped");
        }
        for value in values {
            (self.deleter)(value);
        }
    }
}

/// State shared between a list and its cursors.
///
/// Nodes and cursor positions sit behind separate cells: moving a cursor
/// only reads the nodes, so it works while element guards are held.
pub(crate) struct Shared<T> {
    pub(crate) list: RefCell<ListCore<T>>,
    cursors: RefCell<Cursors>,
}

impl<T> Shared<T> {
    pub(crate) fn new(capacity: usize, deleter: fn(T)) -> Self {
        Self {
            list: RefCell::new(ListCore::new(capacity, deleter)),
            cursors: RefCell::new(Arena::new()),
        }
    }

    pub(crate) fn insert_before(
        &self,
        target: Option<Handle>,
        value: T,
        exclude: Option<Handle>,
    ) -> Result<Handle, (TryReserveError, T)> {
        let mut list = self.list.borrow_mut();
        let mut cursors = self.cursors.borrow_mut();
        list.insert_before(&mut cursors, target, value, exclude)
    }

    pub(crate) fn unlink(&self, node: Handle) -> Option<T> {
        let mut list = self.list.borrow_mut();
        let mut cursors = self.cursors.borrow_mut();
        list.unlink(&mut cursors, node)
    }

    /// Unlinks every node and turns every cursor into an end cursor.
    pub(crate) fn unlink_all(&self) -> Vec<T> {
        let values = self.list.borrow_mut().unlink_all();
        for (_, pos) in self.cursors.borrow_mut().iter_mut() {
            *pos = Position::default();
        }
        values
    }

    pub(crate) fn register(&self, pos: Position) -> Handle {
        match self.cursors.borrow_mut().try_insert(pos) {
            Ok(id) => id,
            Err(_) => handle_alloc_error(Layout::new::<Position>()),
        }
    }

    pub(crate) fn deregister(&self, cursor: Handle) {
        // A cursor dropped while positions are being repaired keeps its
        // slot until the list goes away.
        if let Ok(mut cursors) = self.cursors.try_borrow_mut() {
            cursors.remove(cursor);
        }
    }

    pub(crate) fn position(&self, cursor: Handle) -> Position {
        self.cursors.borrow().get(cursor).copied().unwrap_or_default()
    }

    pub(crate) fn advance(&self, cursor: Handle) {
        let Some(next) = self.cursors.borrow().get(cursor).map(|pos| pos.next) else {
            return;
        };
        let after = next.and_then(|n| self.list.borrow().next_of(n));
        if let Some(pos) = self.cursors.borrow_mut().get_mut(cursor) {
            *pos = Position {
                current: next,
                next: after,
            };
        }
    }

    pub(crate) fn live_cursors(&self) -> usize {
        self.cursors.borrow().len()
    }
}
