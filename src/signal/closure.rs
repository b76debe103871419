//! Type-erased invocable values.
//!
//! A [`Closure<A, R>`] is anything that can be called with an argument
//! value `A` and produce an `R`. Several arguments travel as a tuple and
//! "no arguments" is `()`, so one trait covers every arity.
//!
//! The concrete shapes mirror what a subscriber usually has at hand:
//!
//! - [`Static`]: a plain function pointer.
//! - [`Bound`]: a pointer-like value plus a method to call on its target.
//! - [`StaticNullary`] / [`BoundNullary`]: zero-argument callables that
//!   accept and discard whatever argument the signal passes.
//! - [`Null`]: does nothing and returns `R::default()`.
//! - [`FromFn`]: any native Rust closure.

use alloc::boxed::Box;
use core::fmt;
use core::ops::Deref;

/// Something that can be invoked with `A` to produce `R`.
pub trait Closure<A, R> {
    /// Invokes the closure.
    fn call(&self, args: A) -> R;
}

/// Wraps a function pointer of matching signature.
pub struct Static<A, R> {
    f: fn(A) -> R,
}

impl<A, R> Closure<A, R> for Static<A, R> {
    fn call(&self, args: A) -> R {
        (self.f)(args)
    }
}

/// Calls `method` on whatever `target` dereferences to.
///
/// `P` is any pointer-like value: `&'static O`, `Box<O>`, `Rc<O>`, ...
/// The closure owns `P`, so the caller picks how the target's lifetime
/// is managed by picking the pointer type.
pub struct Bound<P, O: ?Sized, A, R> {
    target: P,
    method: fn(&O, A) -> R,
}

impl<P, O, A, R> Closure<A, R> for Bound<P, O, A, R>
where
    P: Deref<Target = O>,
    O: ?Sized,
{
    fn call(&self, args: A) -> R {
        (self.method)(&*self.target, args)
    }
}

/// A zero-argument function that ignores the signal's arguments.
pub struct StaticNullary<R> {
    f: fn() -> R,
}

impl<A, R> Closure<A, R> for StaticNullary<R> {
    fn call(&self, _args: A) -> R {
        (self.f)()
    }
}

/// A zero-argument method that ignores the signal's arguments.
pub struct BoundNullary<P, O: ?Sized, R> {
    target: P,
    method: fn(&O) -> R,
}

impl<P, O, A, R> Closure<A, R> for BoundNullary<P, O, R>
where
    P: Deref<Target = O>,
    O: ?Sized,
{
    fn call(&self, _args: A) -> R {
        (self.method)(&*self.target)
    }
}

/// Does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Null;

impl<A, R: Default> Closure<A, R> for Null {
    fn call(&self, _args: A) -> R {
        R::default()
    }
}

/// Adapts a native Rust closure.
pub struct FromFn<F>(F);

impl<A, R, F> Closure<A, R> for FromFn<F>
where
    F: Fn(A) -> R,
{
    fn call(&self, args: A) -> R {
        (self.0)(args)
    }
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FromFn(..)")
    }
}

/// A closure that does nothing and returns `R::default()`.
pub fn make_null<A, R>() -> Box<dyn Closure<A, R>>
where
    R: Default,
{
    Box::new(Null)
}

/// Boxes a function pointer.
pub fn make_static<A: 'static, R: 'static>(f: fn(A) -> R) -> Box<dyn Closure<A, R>> {
    Box::new(Static { f })
}

/// Boxes a zero-argument function pointer for use with any argument type.
pub fn make_static_nullary<A, R: 'static>(f: fn() -> R) -> Box<dyn Closure<A, R>> {
    Box::new(StaticNullary { f })
}

/// Boxes a pointer-like value and a method to call through it.
pub fn make_bound<P, O, A, R>(target: P, method: fn(&O, A) -> R) -> Box<dyn Closure<A, R>>
where
    P: Deref<Target = O> + 'static,
    O: ?Sized + 'static,
    A: 'static,
    R: 'static,
{
    Box::new(Bound { target, method })
}

/// Boxes a pointer-like value and a zero-argument method.
pub fn make_bound_nullary<P, O, A, R>(target: P, method: fn(&O) -> R) -> Box<dyn Closure<A, R>>
where
    P: Deref<Target = O> + 'static,
    O: ?Sized + 'static,
    R: 'static,
{
    Box::new(BoundNullary { target, method })
}

/// Boxes a native Rust closure.
pub fn from_fn<A, R, F>(f: F) -> Box<dyn Closure<A, R>>
where
    F: Fn(A) -> R + 'static,
{
    Box::new(FromFn(f))
}
