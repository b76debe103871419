use alloc::rc::Rc;
use core::cmp::Ordering;

use super::MultiIterList;
use crate::error::{Error, Result};

impl<T> MultiIterList<T> {
    /// Moves every element of `other` into `self`, keeping `cmp` order.
    ///
    /// Both lists must already be sorted by `cmp`. Elements of `self` come
    /// before equal elements of `other`. `other` is left empty. Merging a
    /// list into itself does nothing.
    ///
    /// `cmp` runs while both lists are borrowed for reading; it must not
    /// modify either of them.
    pub fn merge<F>(&self, other: &Self, mut cmp: F) -> Result<()>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if Rc::ptr_eq(&self.shared, &other.shared) {
            return Ok(());
        }

        let mut at = self.shared.list.borrow().head;
        loop {
            let Some(front) = other.shared.list.borrow().head else {
                break;
            };
            {
                let ours = self.shared.list.borrow();
                let theirs = other.shared.list.borrow();
                let incoming = theirs.value(front).expect("list head is not a live node");
                while let Some(node) = at {
                    let here = ours.value(node).expect("list links refer to a missing node");
                    if cmp(incoming, here) == Ordering::Less {
                        break;
                    }
                    at = ours.next_of(node);
                }
            }

            let Some(value) = other.shared.unlink(front) else {
                break;
            };
            if let Err((source, value)) = self.shared.insert_before(at, value, None) {
                tracing::warn!(%source, "failed to allocate list node during merge");
                (other.deleter())(value);
                return Err(Error::AllocFailed {
                    what: "list node",
                    source,
                });
            }
        }
        Ok(())
    }

    /// Sorts the list by `cmp`.
    ///
    /// The list is split into two halves by alternately moving elements out,
    /// each half is sorted recursively, and the halves are merged back. The
    /// sort is not stable. Existing cursors never dangle, but their elements
    /// are moved to fresh nodes, so they end up as erased positions.
    pub fn sort<F>(&self, mut cmp: F) -> Result<()>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.sort_by(&mut cmp)
    }

    fn sort_by<F>(&self, cmp: &mut F) -> Result<()>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let deleter = self.deleter();
        let left = Self::with_deleter(deleter);
        let right = Self::with_deleter(deleter);

        let mut to_left = true;
        while let Some(value) = self.extract_front() {
            if to_left {
                left.push_back_new(value)?;
            } else {
                right.push_back_new(value)?;
            }
            to_left = !to_left;
        }

        if right.is_empty() {
            // Zero or one element: nothing to order.
            while let Some(value) = left.extract_front() {
                self.push_back_new(value)?;
            }
            return Ok(());
        }

        left.sort_by(cmp)?;
        right.sort_by(cmp)?;
        left.merge(&right, &mut *cmp)?;
        while let Some(value) = left.extract_front() {
            self.push_back_new(value)?;
        }
        Ok(())
    }
}
