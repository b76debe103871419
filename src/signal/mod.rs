//! Observer signals with self-cleaning subscriptions.
//!
//! A [`Signal<A, R>`] holds an ordered chain of subscribers. Each `add*`
//! call returns a [`SignalHandler`], which is usually wrapped in a
//! [`SignalConnection`] so the subscription ends when the connection is
//! dropped. Dropping the signal ends every subscription; connections then
//! read as disconnected.
//!
//! # Broadcast order
//!
//! [`Signal::raise`] calls handlers from the most recently added to the
//! earliest added, and returns the result of the last one it calls, i.e. the
//! oldest handler still connected. With no handlers it returns
//! `R::default()`.
//!
//! ```
//! use mola_links::signal::{Signal, SignalConnection};
//!
//! let signal = Signal::<(), i32>::new();
//! let five = SignalConnection::new(signal.add_nullary(|| 5).unwrap());
//! let _nine = SignalConnection::new(signal.add_nullary(|| 9).unwrap());
//! assert_eq!(signal.raise(()), 5);
//! drop(five);
//! assert_eq!(signal.raise(()), 9);
//! ```
//!
//! # Re-entrancy
//!
//! A handler may add handlers, raise the signal again, or disconnect itself
//! while it runs. If it disconnects a handler that has not been reached yet,
//! the walk continues along the repaired chain and the removed handler is not
//! called.
//!
//! # Safety
//!
//! Signals are single-threaded; none of these types are `Send`.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;
use core::ops::Deref;

pub mod closure;

mod chain;
mod handler;

#[cfg(test)]
mod tests;

pub use closure::Closure;
pub use handler::{SignalConnection, SignalHandler};

use crate::error::{Error, Result};
use chain::{Chain, ChainControl};

/// A broadcast point that subscribers attach [`Closure`]s to.
///
/// `A` is the argument value passed to every handler (use a tuple for
/// several arguments and `()` for none); `R` is the handler result.
///
/// Subscribing requires `A: 'static` and `R: 'static`, because handler
/// tokens refer to the chain without naming its signature. Pass owned
/// arguments (`String`, `Rc<str>`, ...) rather than borrowed ones.
pub struct Signal<A, R = ()> {
    chain: Rc<RefCell<Chain<A, R>>>,
}

impl<A, R> Signal<A, R> {
    /// Creates a signal with no handlers.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a signal with room for `capacity` handlers.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chain: Rc::new(RefCell::new(Chain::with_capacity(capacity))),
        }
    }

    /// Broadcasts `args` to every handler, newest first.
    ///
    /// Returns the result of the last handler called (the oldest one still
    /// connected), or `R::default()` if there are none.
    pub fn raise(&self, args: A) -> R
    where
        A: Clone,
        R: Default,
    {
        let mut result = None;
        let mut cursor = self.chain.borrow().head();
        while let Some(handler) = cursor {
            let Some((closure, next)) = self.chain.borrow().step(handler) else {
                break;
            };
            result = Some(closure.call(args.clone()));

            let chain = self.chain.borrow();
            cursor = if chain.is_linked(handler) {
                chain.next_of(handler)
            } else {
                // The handler disconnected itself; resume from the successor
                // it had when it was called.
                next.filter(|n| chain.is_linked(*n))
            };
        }
        result.unwrap_or_default()
    }

    /// Number of handlers currently subscribed.
    pub fn handler_count(&self) -> usize {
        self.chain.borrow().len()
    }

    /// Whether no handler is subscribed.
    pub fn is_empty(&self) -> bool {
        self.handler_count() == 0
    }

    /// Unsubscribes every handler. Outstanding connections read as
    /// disconnected afterwards.
    pub fn disconnect_all(&self) {
        let closures = self.chain.borrow_mut().take_all();
        tracing::trace!(handlers = closures.len(), "signal handlers cleared");
        drop(closures);
    }
}

impl<A, R> Signal<A, R>
where
    A: 'static,
    R: 'static,
{
    /// Subscribes a function pointer.
    pub fn add(&self, f: fn(A) -> R) -> Result<SignalHandler> {
        self.add_new_closure(closure::make_static(f))
    }

    /// Subscribes a zero-argument function pointer.
    pub fn add_nullary(&self, f: fn() -> R) -> Result<SignalHandler> {
        self.add_new_closure(closure::make_static_nullary(f))
    }

    /// Subscribes a native Rust closure.
    pub fn add_fn<F>(&self, f: F) -> Result<SignalHandler>
    where
        F: Fn(A) -> R + 'static,
    {
        self.add_new_closure(closure::from_fn(f))
    }

    /// Subscribes `method`, called on whatever `target` dereferences to.
    ///
    /// The signal does not manage the target object: its lifetime is
    /// whatever the pointer type `P` gives it (`&'static O`, `Rc<O>`, ...).
    pub fn add_bound<P, O>(&self, target: P, method: fn(&O, A) -> R) -> Result<SignalHandler>
    where
        P: Deref<Target = O> + 'static,
        O: ?Sized + 'static,
    {
        self.add_new_closure(closure::make_bound(target, method))
    }

    /// Subscribes a zero-argument `method` called through `target`.
    pub fn add_bound_nullary<P, O>(&self, target: P, method: fn(&O) -> R) -> Result<SignalHandler>
    where
        P: Deref<Target = O> + 'static,
        O: ?Sized + 'static,
    {
        self.add_new_closure(closure::make_bound_nullary(target, method))
    }

    /// Subscribes `method` on `object`, which the signal takes ownership of.
    ///
    /// The object is dropped together with its handler.
    pub fn add_new<O>(&self, object: O, method: fn(&O, A) -> R) -> Result<SignalHandler>
    where
        O: 'static,
    {
        self.add_bound(Box::new(object), method)
    }

    /// Subscribes an already boxed closure.
    ///
    /// If handler storage cannot grow, the closure is dropped and
    /// [`Error::AllocFailed`] is returned.
    pub fn add_new_closure(&self, closure: Box<dyn Closure<A, R>>) -> Result<SignalHandler> {
        let linked = self.chain.borrow_mut().link_front(Rc::from(closure));
        match linked {
            Ok(id) => {
                let chain: Weak<RefCell<Chain<A, R>>> = Rc::downgrade(&self.chain);
                let chain: Weak<dyn ChainControl> = chain;
                Ok(SignalHandler::new(chain, id))
            }
            Err((source, closure)) => {
                drop(closure);
                tracing::warn!(%source, "failed to subscribe signal handler");
                Err(Error::AllocFailed {
                    what: "signal handler",
                    source,
                })
            }
        }
    }
}

impl<A, R> Default for Signal<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> Drop for Signal<A, R> {
    fn drop(&mut self) {
        let closures = self.chain.borrow_mut().take_all();
        if !closures.is_empty() {
            tracing::trace!(handlers = closures.len(), "signal dropped with live handlers");
        }
        drop(closures);
    }
}

impl<A, R> fmt::Debug for Signal<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.chain.borrow().len())
            .finish()
    }
}
