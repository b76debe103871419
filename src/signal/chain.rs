//! The subscriber chain behind one [`Signal`](super::Signal).
//!
//! Handlers live in an [`Arena`] and are threaded newest-first through
//! `prev`/`next` handles. `prev == None` means "the chain head points at
//! me", which is all O(1) unlinking needs.

use alloc::collections::TryReserveError;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::arena::{Arena, Handle};

pub(crate) type SharedClosure<A, R> = Rc<dyn super::Closure<A, R>>;

pub(crate) struct Entry<A, R> {
    closure: SharedClosure<A, R>,
    next: Option<Handle>,
    prev: Option<Handle>,
    backlinked: bool,
}

pub(crate) struct Chain<A, R> {
    entries: Arena<Entry<A, R>>,
    head: Option<Handle>,
}

impl<A, R> Chain<A, R> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arena::with_capacity(capacity),
            head: None,
        }
    }

    pub(crate) fn head(&self) -> Option<Handle> {
        self.head
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Splices a new handler in as the chain head.
    ///
    /// On allocation failure the closure is handed back so the caller can
    /// release it outside of any borrow.
    pub(crate) fn link_front(
        &mut self,
        closure: SharedClosure<A, R>,
    ) -> Result<Handle, (TryReserveError, SharedClosure<A, R>)> {
        let old_head = self.head;
        let handle = self
            .entries
            .try_insert(Entry {
                closure,
                next: old_head,
                prev: None,
                backlinked: false,
            })
            .map_err(|(err, entry)| (err, entry.closure))?;
        if let Some(old) = old_head {
            let old = self
                .entries
                .get_mut(old)
                .expect("chain head refers to a dead handler");
            old.prev = Some(handle);
        }
        self.head = Some(handle);
        Ok(handle)
    }

    /// Removes `handler` from the chain, returning its closure.
    ///
    /// Returns `None` if the handler is already gone. The closure is returned
    /// rather than dropped so that its destructor runs outside the borrow.
    pub(crate) fn unlink(&mut self, handler: Handle) -> Option<SharedClosure<A, R>> {
        let entry = self.entries.remove(handler)?;
        match entry.prev {
            Some(prev) => {
                let prev = self
                    .entries
                    .get_mut(prev)
                    .expect("handler's predecessor is not in the chain");
                assert_eq!(prev.next, Some(handler), "inconsistent chain links");
                prev.next = entry.next;
            }
            None => {
                assert_eq!(self.head, Some(handler), "inconsistent chain head");
                self.head = entry.next;
            }
        }
        if let Some(next) = entry.next {
            let next = self
                .entries
                .get_mut(next)
                .expect("handler's successor is not in the chain");
            next.prev = entry.prev;
        }
        Some(entry.closure)
    }

    pub(crate) fn is_linked(&self, handler: Handle) -> bool {
        self.entries.contains(handler)
    }

    pub(crate) fn next_of(&self, handler: Handle) -> Option<Handle> {
        self.entries.get(handler).and_then(|e| e.next)
    }

    /// The closure to invoke for `handler` together with its current successor.
    pub(crate) fn step(&self, handler: Handle) -> Option<(SharedClosure<A, R>, Option<Handle>)> {
        self.entries
            .get(handler)
            .map(|e| (Rc::clone(&e.closure), e.next))
    }

    /// Records that an external holder now owns `handler`.
    ///
    /// # Panics
    ///
    /// Panics if the handler is already backlinked.
    pub(crate) fn backlink(&mut self, handler: Handle) {
        if let Some(entry) = self.entries.get_mut(handler) {
            assert!(!entry.backlinked, "signal handler {handler} backlinked twice");
            entry.backlinked = true;
        }
    }

    pub(crate) fn clear_backlink(&mut self, handler: Handle) {
        if let Some(entry) = self.entries.get_mut(handler) {
            entry.backlinked = false;
        }
    }

    /// Removes every handler, returning their closures.
    pub(crate) fn take_all(&mut self) -> Vec<SharedClosure<A, R>> {
        self.head = None;
        self.entries
            .take_all()
            .into_iter()
            .map(|entry| entry.closure)
            .collect()
    }
}

/// Signature-independent view of a chain, used by handler tokens.
pub(crate) trait ChainControl {
    fn unlink(&self, handler: Handle) -> bool;

    fn is_linked(&self, handler: Handle) -> bool;

    fn backlink(&self, handler: Handle);

    fn clear_backlink(&self, handler: Handle);
}

impl<A, R> ChainControl for RefCell<Chain<A, R>> {
    fn unlink(&self, handler: Handle) -> bool {
        let removed = self.borrow_mut().unlink(handler);
        if removed.is_some() {
            tracing::trace!(%handler, "signal handler unlinked");
        }
        removed.is_some()
    }

    fn is_linked(&self, handler: Handle) -> bool {
        self.borrow().is_linked(handler)
    }

    fn backlink(&self, handler: Handle) {
        self.borrow_mut().backlink(handler);
    }

    fn clear_backlink(&self, handler: Handle) {
        self.borrow_mut().clear_backlink(handler);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    use super::{Chain, SharedClosure};
    use crate::arena::Handle;
    use crate::signal::closure;

    fn closure(v: i32) -> SharedClosure<(), i32> {
        Rc::from(closure::from_fn(move |()| v))
    }

    fn order(chain: &Chain<(), i32>) -> Vec<i32> {
        let mut out = vec![];
        let mut cursor = chain.head();
        while let Some(h) = cursor {
            let (c, next) = chain.step(h).unwrap();
            out.push(c.call(()));
            cursor = next;
        }
        out
    }

    fn linked(values: &[i32]) -> (Chain<(), i32>, Vec<Handle>) {
        let mut chain = Chain::with_capacity(values.len());
        let handles = values
            .iter()
            .map(|v| chain.link_front(closure(*v)).ok().unwrap())
            .collect();
        (chain, handles)
    }

    #[test]
    fn test_newest_first() {
        let (chain, _) = linked(&[1, 2, 3]);
        assert_eq!(order(&chain), vec![3, 2, 1]);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_unlink_head_middle_tail() {
        let (mut chain, h) = linked(&[1, 2, 3, 4]);
        assert!(chain.unlink(h[2]).is_some());
        assert_eq!(order(&chain), vec![4, 2, 1]);
        assert!(chain.unlink(h[3]).is_some());
        assert_eq!(order(&chain), vec![2, 1]);
        assert!(chain.unlink(h[0]).is_some());
        assert_eq!(order(&chain), vec![2]);
        assert!(chain.unlink(h[0]).is_none());
        assert_eq!(chain.next_of(h[1]), None);
    }

    #[test]
    #[should_panic(expected = "backlinked twice")]
    fn test_double_backlink_panics() {
        let (mut chain, h) = linked(&[1]);
        chain.backlink(h[0]);
        chain.backlink(h[0]);
    }

    #[test]
    fn test_take_all_empties_chain() {
        let (mut chain, h) = linked(&[1, 2]);
        assert_eq!(chain.take_all().len(), 2);
        assert!(chain.head().is_none());
        assert!(!chain.is_linked(h[0]));
    }
}
