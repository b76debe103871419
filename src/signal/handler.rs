use alloc::rc::Weak;
use core::fmt;

use super::chain::ChainControl;
use crate::arena::Handle;

/// One subscription in one [`Signal`](super::Signal)'s chain.
///
/// A `SignalHandler` is a move-only token; it does not unsubscribe when
/// dropped. Wrap it in a [`SignalConnection`] to tie the subscription to a
/// scope, or call [`destroy`](Self::destroy) explicitly.
#[must_use = "a handler stays subscribed until destroyed; wrap it in a SignalConnection"]
pub struct SignalHandler {
    chain: Weak<dyn ChainControl>,
    id: Handle,
}

impl SignalHandler {
    pub(crate) fn new(chain: Weak<dyn ChainControl>, id: Handle) -> Self {
        Self { chain, id }
    }

    /// Whether the handler is still part of a live signal's chain.
    pub fn is_linked(&self) -> bool {
        self.chain
            .upgrade()
            .is_some_and(|chain| chain.is_linked(self.id))
    }

    /// Unsubscribes the handler. Does nothing if it is already gone.
    pub fn destroy(self) {
        if let Some(chain) = self.chain.upgrade() {
            chain.unlink(self.id);
        }
    }

    fn backlink(&self) {
        if let Some(chain) = self.chain.upgrade() {
            chain.backlink(self.id);
        }
    }

    fn clear_backlink(&self) {
        if let Some(chain) = self.chain.upgrade() {
            chain.clear_backlink(self.id);
        }
    }
}

impl PartialEq for SignalHandler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.chain, &other.chain)
    }
}

impl Eq for SignalHandler {}

impl fmt::Debug for SignalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalHandler")
            .field("id", &self.id)
            .field("linked", &self.is_linked())
            .finish()
    }
}

/// Scoped ownership of at most one [`SignalHandler`].
///
/// Dropping the connection unsubscribes its handler. If the signal dies
/// first, the connection quietly reads as disconnected.
///
/// ```
/// use mola_links::signal::{Signal, SignalConnection};
///
/// let signal = Signal::<(), i32>::new();
/// let mut conn = SignalConnection::new(signal.add_nullary(|| 1).unwrap());
/// assert_eq!(signal.raise(()), 1);
///
/// conn.disconnect();
/// conn.disconnect();
/// assert!(!conn.is_connected());
/// assert_eq!(signal.raise(()), 0);
/// ```
#[derive(Default)]
pub struct SignalConnection {
    handler: Option<SignalHandler>,
}

impl SignalConnection {
    /// Takes ownership of `handler`.
    pub fn new(handler: SignalHandler) -> Self {
        handler.backlink();
        Self {
            handler: Some(handler),
        }
    }

    /// A connection that holds nothing.
    pub const fn empty() -> Self {
        Self { handler: None }
    }

    /// Replaces the held handler.
    ///
    /// The previous handler is destroyed before the new one is adopted.
    /// Passing the handler that is already held changes nothing.
    pub fn set(&mut self, handler: Option<SignalHandler>) {
        if self.handler == handler {
            return;
        }
        self.disconnect();
        if let Some(handler) = &handler {
            handler.backlink();
        }
        self.handler = handler;
    }

    /// Unsubscribes the held handler, if any.
    ///
    /// Calling this on an empty connection, twice, or after the signal has
    /// been dropped is a no-op.
    pub fn disconnect(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.destroy();
        }
    }

    /// Releases the handler without unsubscribing it.
    pub fn take(&mut self) -> Option<SignalHandler> {
        let handler = self.handler.take()?;
        handler.clear_backlink();
        Some(handler)
    }

    /// Whether the connection holds a handler that is still subscribed.
    pub fn is_connected(&self) -> bool {
        self.handler.as_ref().is_some_and(SignalHandler::is_linked)
    }
}

impl From<SignalHandler> for SignalConnection {
    fn from(handler: SignalHandler) -> Self {
        Self::new(handler)
    }
}

impl Drop for SignalConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for SignalConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalConnection")
            .field("connected", &self.is_connected())
            .finish()
    }
}
