//! Crate-wide error type.

use alloc::collections::TryReserveError;

/// Errors surfaced by fallible operations.
///
/// Only resource exhaustion is reported this way. Broken invariants
/// (a handler backlinked twice, a cursor used with the wrong list) panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Backing storage for a node or handler could not grow.
    ///
    /// Any payload handed over with the failing call has already been
    /// released when this is returned.
    #[error("failed to allocate storage for {what}")]
    AllocFailed {
        /// What was being stored.
        what: &'static str,
        /// The allocator's report.
        #[source]
        source: TryReserveError,
    },
}

/// Shorthand used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
