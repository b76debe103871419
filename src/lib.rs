//! Safe back-references, observer signals and cursor-stable lists.
//!
//! Three small building blocks for object graphs that must never dangle:
//!
//! - [`weak`]: [`WeakTarget`] / [`WeakLink`], references that read as `None`
//!   once their target is dropped.
//! - [`signal`]: [`Signal`] broadcasts to subscribers whose
//!   [`SignalConnection`]s disconnect when either side goes away.
//! - [`linked_list::multi_iter`]: [`MultiIterList`], an owning list whose
//!   [`Cursor`]s stay meaningful while the list is mutated under them.
//!
//! Every structure that needs a back-pointer stores a generation-stamped
//! [`arena::Handle`] instead, so a stale reference is detected by comparing
//! generations rather than by chasing a freed pointer.
//!
//! None of these types are `Send` or `Sync`.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod arena;
pub mod error;
pub mod linked_list;
pub mod signal;
pub mod weak;

pub use error::{Error, Result};
pub use linked_list::multi_iter::{Cursor, MultiIterList};
pub use signal::{Closure, Signal, SignalConnection, SignalHandler};
pub use weak::{TargetRef, WeakLink, WeakTarget};
