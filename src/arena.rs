//! Generation-stamped slot arena.
//!
//! An [`Arena`] stores values in a dense `Vec` and hands out [`Handle`]s.
//! Each slot carries a generation counter that is bumped whenever its value
//! is removed, so a handle that outlived its value fails to resolve even
//! after the slot has been reused. This replaces "address of the slot that
//! points at me" bookkeeping: a back-reference is just a `Handle`, and
//! invalidation is an O(1) generation comparison.

use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::fmt;

/// Reference to a value stored in an [`Arena`].
///
/// Handles are plain data. They do not keep the value alive and never
/// dangle: a stale handle simply resolves to `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index within the arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at the time the value was inserted.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(idx={}, gen={})", self.index, self.generation)
    }
}

enum Entry<T> {
    Occupied(T),
    Vacant { next_free: Option<u32> },
}

struct Slot<T> {
    generation: u32,
    entry: Entry<T>,
}

/// A slot arena with generation-checked handles.
///
/// Vacant slots form an intrusive free list threaded through the slot
/// array, so removal never allocates.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    /// Stores `value` and returns its handle.
    ///
    /// If the slot array has to grow and the allocation fails, the value is
    /// handed back untouched together with the allocator's error.
    pub fn try_insert(&mut self, value: T) -> Result<Handle, (TryReserveError, T)> {
        #[cfg(test)]
        if let Some(err) = failpoint::take() {
            return Err((err, value));
        }

        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            let Entry::Vacant { next_free } = slot.entry else {
                unreachable!("free list points at an occupied slot");
            };
            slot.entry = Entry::Occupied(value);
            self.free_head = next_free;
            self.len += 1;
            return Ok(Handle {
                index,
                generation: slot.generation,
            });
        }

        assert!(
            self.slots.len() < u32::MAX as usize,
            "arena index space exhausted"
        );
        if let Err(err) = self.slots.try_reserve(1) {
            return Err((err, value));
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Entry::Occupied(value),
        });
        self.len += 1;
        Ok(Handle {
            index,
            generation: 0,
        })
    }

    /// Removes the value behind `handle`, invalidating every copy of it.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || !matches!(slot.entry, Entry::Occupied(_)) {
            return None;
        }
        let entry = core::mem::replace(
            &mut slot.entry,
            Entry::Vacant {
                next_free: self.free_head,
            },
        );
        slot.generation = slot.generation.wrapping_add(1);
        self.free_head = Some(handle.index);
        self.len -= 1;
        match entry {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant { .. } => unreachable!(),
        }
    }

    /// Removes every value, invalidating all outstanding handles.
    ///
    /// Values are returned in slot order.
    pub fn take_all(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        for index in 0..self.slots.len() {
            let handle = Handle {
                index: index as u32,
                generation: self.slots[index].generation,
            };
            if let Some(value) = self.remove(handle) {
                values.push(value);
            }
        }
        values
    }

    /// Whether `handle` still refers to a stored value.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Shared access to the value behind `handle`.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        match self.slots.get(handle.index as usize) {
            Some(Slot {
                generation,
                entry: Entry::Occupied(value),
            }) if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Exclusive access to the value behind `handle`.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.slots.get_mut(handle.index as usize) {
            Some(Slot {
                generation,
                entry: Entry::Occupied(value),
            }) if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Exclusive access to two distinct values at once.
    ///
    /// Returns `None` if either handle is stale or both name the same slot.
    pub fn get_pair_mut(&mut self, a: Handle, b: Handle) -> Option<(&mut T, &mut T)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (lo, hi) = if a.index < b.index { (a, b) } else { (b, a) };
        let (left, right) = self.slots.split_at_mut(hi.index as usize);
        let (Entry::Occupied(lo_value), Entry::Occupied(hi_value)) =
            (&mut left[lo.index as usize].entry, &mut right[0].entry)
        else {
            unreachable!("occupancy checked above");
        };
        if a.index < b.index {
            Some((lo_value, hi_value))
        } else {
            Some((hi_value, lo_value))
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over stored values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match &slot.entry {
                Entry::Occupied(value) => Some((
                    Handle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )),
                Entry::Vacant { .. } => None,
            })
    }

    /// Iterates mutably over stored values in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| match &mut slot.entry {
                Entry::Occupied(value) => Some((
                    Handle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )),
                Entry::Vacant { .. } => None,
            })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// Test-only switch that makes the next `try_insert` on this thread fail.
#[cfg(test)]
pub(crate) mod failpoint {
    use std::cell::Cell;
    use std::collections::TryReserveError;
    use std::vec::Vec;

    std::thread_local! {
        static FAIL_NEXT: Cell<bool> = const { Cell::new(false) };
    }

    pub(crate) fn fail_next_insert() {
        FAIL_NEXT.with(|f| f.set(true));
    }

    pub(crate) fn take() -> Option<TryReserveError> {
        if !FAIL_NEXT.with(|f| f.replace(false)) {
            return None;
        }
        Vec::<u8>::new().try_reserve(usize::MAX).err()
    }
}
