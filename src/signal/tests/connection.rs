extern crate std;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::arena::failpoint;
use crate::error::Error;
use crate::signal::{Signal, SignalConnection};

#[test]
fn test_disconnect_is_idempotent() {
    let signal = Signal::<(), i32>::new();
    let mut conn = SignalConnection::new(signal.add_nullary(|| 1).unwrap());
    assert!(conn.is_connected());
    conn.disconnect();
    assert!(!conn.is_connected());
    conn.disconnect();
    assert!(!conn.is_connected());
    assert!(signal.is_empty());
}

#[test]
fn test_disconnect_after_signal_dropped() {
    let signal = Signal::<(), i32>::new();
    let mut conn = SignalConnection::new(signal.add_nullary(|| 1).unwrap());
    drop(signal);
    assert!(!conn.is_connected());
    conn.disconnect();
    conn.disconnect();
    assert!(!conn.is_connected());
}

#[test]
fn test_empty_connection() {
    let mut conn = SignalConnection::default();
    assert!(!conn.is_connected());
    conn.disconnect();
    assert!(conn.take().is_none());
}

#[test]
fn test_dropping_connection_unsubscribes() {
    let signal = Signal::<(), i32>::new();
    {
        let _conn = SignalConnection::new(signal.add_nullary(|| 1).unwrap());
        assert_eq!(signal.handler_count(), 1);
    }
    assert_eq!(signal.handler_count(), 0);
}

#[test]
fn test_set_replaces_old_handler() {
    let signal = Signal::<(), i32>::new();
    let mut conn = SignalConnection::new(signal.add_nullary(|| 1).unwrap());
    conn.set(Some(signal.add_nullary(|| 2).unwrap()));
    assert!(conn.is_connected());
    assert_eq!(signal.handler_count(), 1);
    assert_eq!(signal.raise(()), 2);

    conn.set(None);
    assert!(!conn.is_connected());
    assert!(signal.is_empty());
}

#[test]
fn test_set_moves_between_signals() {
    let a = Signal::<(), i32>::new();
    let b = Signal::<(), i32>::new();
    let mut conn = SignalConnection::new(a.add_nullary(|| 1).unwrap());
    conn.set(Some(b.add_nullary(|| 2).unwrap()));
    assert!(a.is_empty());
    assert_eq!(b.raise(()), 2);
}

#[test]
fn test_take_releases_without_unsubscribing() {
    let signal = Signal::<(), i32>::new();
    let mut conn = SignalConnection::new(signal.add_nullary(|| 4).unwrap());
    let handler = conn.take().unwrap();
    assert!(!conn.is_connected());
    assert!(handler.is_linked());
    assert_eq!(signal.raise(()), 4);

    // The released handler can be adopted by another connection.
    let other = SignalConnection::new(handler);
    assert!(other.is_connected());
    drop(other);
    assert!(signal.is_empty());
}

#[test]
fn test_handler_destroy_without_connection() {
    let signal = Signal::<(), i32>::new();
    let handler = signal.add_nullary(|| 1).unwrap();
    assert!(handler.is_linked());
    handler.destroy();
    assert!(signal.is_empty());

    let late = signal.add_nullary(|| 1).unwrap();
    drop(signal);
    assert!(!late.is_linked());
    late.destroy();
}

#[test]
fn test_owned_object_released_on_disconnect() {
    struct Probe(Rc<Cell<bool>>);

    impl Drop for Probe {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    impl Probe {
        fn noop(&self, _: ()) {}
    }

    let dropped = Rc::new(Cell::new(false));
    let signal = Signal::<()>::new();
    let mut conn = SignalConnection::new(
        signal
            .add_new(Probe(Rc::clone(&dropped)), Probe::noop)
            .unwrap(),
    );
    signal.raise(());
    assert!(!dropped.get());
    conn.disconnect();
    assert!(dropped.get());
}

#[test]
fn test_owned_object_may_hold_a_connection_to_the_same_signal() {
    // Dropping the signal drops the object, whose connection then
    // disconnects from a chain that is already being torn down.
    struct Holder {
        _conn: Rc<RefCell<SignalConnection>>,
    }

    impl Holder {
        fn noop(&self, _: ()) {}
    }

    let signal = Signal::<()>::new();
    let slot = Rc::new(RefCell::new(SignalConnection::empty()));
    let _outer = SignalConnection::new(
        signal
            .add_new(Holder { _conn: Rc::clone(&slot) }, Holder::noop)
            .unwrap(),
    );
    slot.borrow_mut().set(Some(signal.add(|()| ()).unwrap()));
    drop(slot);
    assert_eq!(signal.handler_count(), 2);
    drop(signal);
}

#[test]
fn test_failed_subscription_drops_the_owned_object() {
    struct Probe(Rc<Cell<bool>>);

    impl Drop for Probe {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    impl Probe {
        fn noop(&self, _: u8) {}
    }

    let dropped = Rc::new(Cell::new(false));
    let signal = Signal::<u8>::new();
    failpoint::fail_next_insert();
    let err = signal
        .add_new(Probe(Rc::clone(&dropped)), Probe::noop)
        .unwrap_err();
    assert!(matches!(err, Error::AllocFailed { what: "signal handler", .. }));
    assert!(dropped.get());
    assert!(signal.is_empty());

    let conn = SignalConnection::new(signal.add(|_| ()).unwrap());
    assert!(conn.is_connected());
}
