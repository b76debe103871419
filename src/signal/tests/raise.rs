extern crate std;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec;
use std::vec::Vec;

use crate::signal::{Signal, SignalConnection, closure};

fn recorder(log: &Rc<RefCell<Vec<i32>>>, tag: i32) -> impl Fn(()) -> i32 + 'static {
    let log = Rc::clone(log);
    move |()| {
        log.borrow_mut().push(tag);
        tag
    }
}

#[test]
fn test_empty_signal_returns_default() {
    let signal = Signal::<(), i32>::new();
    assert!(signal.is_empty());
    assert_eq!(signal.raise(()), 0);

    let unit = Signal::<u8>::default();
    unit.raise(3);
}

#[test]
fn test_handlers_run_newest_first_and_oldest_result_wins() {
    let log = Rc::new(RefCell::new(vec![]));
    let signal = Signal::<(), i32>::new();
    let _c: Vec<SignalConnection> = (1..=4)
        .map(|tag| SignalConnection::new(signal.add_fn(recorder(&log, tag)).unwrap()))
        .collect();

    assert_eq!(signal.handler_count(), 4);
    assert_eq!(signal.raise(()), 1);
    assert_eq!(*log.borrow(), vec![4, 3, 2, 1]);
}

#[test]
fn test_scenario_five_nine_three() {
    let signal = Signal::<(), i32>::new();
    let mut five = SignalConnection::new(signal.add_nullary(|| 5).unwrap());
    let mut nine = SignalConnection::new(signal.add_nullary(|| 9).unwrap());
    let mut three = SignalConnection::new(signal.add_nullary(|| 3).unwrap());

    assert_eq!(signal.raise(()), 5);
    five.disconnect();
    assert_eq!(signal.raise(()), 9);
    three.disconnect();
    assert_eq!(signal.raise(()), 9);
    nine.disconnect();
    assert_eq!(signal.raise(()), 0);
    assert!(signal.is_empty());
}

#[test]
fn test_disconnecting_newer_handlers_keeps_result() {
    let signal = Signal::<(), i32>::new();
    let _first = SignalConnection::new(signal.add_nullary(|| 1).unwrap());
    let mut later: Vec<SignalConnection> = (2..6)
        .map(|v| SignalConnection::new(signal.add_fn(move |()| v).unwrap()))
        .collect();
    while let Some(mut conn) = later.pop() {
        conn.disconnect();
        assert_eq!(signal.raise(()), 1);
    }
}

#[test]
fn test_arguments_reach_every_handler() {
    fn add((a, b): (i32, i32)) -> i32 {
        a + b
    }

    let seen = Rc::new(Cell::new(0));
    let signal = Signal::<(i32, i32), i32>::new();
    let _sum = SignalConnection::new(signal.add(add).unwrap());
    let seen2 = Rc::clone(&seen);
    let _spy = SignalConnection::new(
        signal
            .add_fn(move |(a, b)| {
                seen2.set(a * b);
                -1
            })
            .unwrap(),
    );

    assert_eq!(signal.raise((3, 4)), 7);
    assert_eq!(seen.get(), 12);
}

struct Greeter {
    calls: Cell<u32>,
}

impl Greeter {
    fn greet(&self, n: u32) -> u32 {
        self.calls.set(self.calls.get() + n);
        self.calls.get()
    }

    fn ping(&self) -> u32 {
        self.calls.get()
    }
}

#[test]
fn test_bound_and_owned_objects() {
    let shared = Rc::new(Greeter { calls: Cell::new(0) });
    let signal = Signal::<u32, u32>::new();

    let owned = SignalConnection::new(
        signal
            .add_new(Greeter { calls: Cell::new(100) }, Greeter::greet)
            .unwrap(),
    );
    let _bound = SignalConnection::new(signal.add_bound(Rc::clone(&shared), Greeter::greet).unwrap());
    let _ping =
        SignalConnection::new(signal.add_bound_nullary(Rc::clone(&shared), Greeter::ping).unwrap());

    // ping, shared.greet, owned.greet; the owned greeter is the oldest.
    assert_eq!(signal.raise(2), 102);
    assert_eq!(shared.calls.get(), 2);

    drop(owned);
    assert_eq!(signal.raise(1), 3);
    assert_eq!(Rc::strong_count(&shared), 3);
    drop(signal);
    assert_eq!(Rc::strong_count(&shared), 1);
}

#[test]
fn test_boxed_closures() {
    let signal = Signal::<(), i32>::new();
    let _null = SignalConnection::new(signal.add_new_closure(closure::make_null()).unwrap());
    let _seven =
        SignalConnection::new(signal.add_new_closure(closure::from_fn(|()| 7)).unwrap());
    assert_eq!(signal.raise(()), 0);
}

#[test]
fn test_handler_may_disconnect_itself() {
    let log = Rc::new(RefCell::new(vec![]));
    let signal = Signal::<(), i32>::new();
    let _oldest = SignalConnection::new(signal.add_fn(recorder(&log, 1)).unwrap());

    let slot = Rc::new(RefCell::new(SignalConnection::empty()));
    let own = Rc::clone(&slot);
    let log2 = Rc::clone(&log);
    let handler = signal
        .add_fn(move |()| {
            log2.borrow_mut().push(2);
            own.borrow_mut().disconnect();
            2
        })
        .unwrap();
    slot.borrow_mut().set(Some(handler));
    let _newest = SignalConnection::new(signal.add_fn(recorder(&log, 3)).unwrap());

    assert_eq!(signal.raise(()), 1);
    assert_eq!(*log.borrow(), vec![3, 2, 1]);
    assert!(!slot.borrow().is_connected());

    log.borrow_mut().clear();
    assert_eq!(signal.raise(()), 1);
    assert_eq!(*log.borrow(), vec![3, 1]);
}

#[test]
fn test_oldest_handler_disconnecting_itself_still_returns_its_result() {
    let signal = Signal::<(), i32>::new();
    let slot = Rc::new(RefCell::new(SignalConnection::empty()));
    let own = Rc::clone(&slot);
    let handler = signal
        .add_fn(move |()| {
            own.borrow_mut().disconnect();
            42
        })
        .unwrap();
    slot.borrow_mut().set(Some(handler));
    let _newer = SignalConnection::new(signal.add_nullary(|| 1).unwrap());

    assert_eq!(signal.raise(()), 42);
    assert_eq!(signal.raise(()), 1);
}

#[test]
fn test_disconnecting_an_unvisited_handler_skips_it() {
    let log = Rc::new(RefCell::new(vec![]));
    let signal = Signal::<(), i32>::new();
    let _first = SignalConnection::new(signal.add_fn(recorder(&log, 1)).unwrap());
    let second = Rc::new(RefCell::new(SignalConnection::new(
        signal.add_fn(recorder(&log, 2)).unwrap(),
    )));
    let victim = Rc::clone(&second);
    let log3 = Rc::clone(&log);
    let _third = SignalConnection::new(
        signal
            .add_fn(move |()| {
                log3.borrow_mut().push(3);
                victim.borrow_mut().disconnect();
                3
            })
            .unwrap(),
    );

    assert_eq!(signal.raise(()), 1);
    assert_eq!(*log.borrow(), vec![3, 1]);
}

#[test]
fn test_handler_may_subscribe_during_raise() {
    let signal = Rc::new(Signal::<(), i32>::new());
    let added = Rc::new(RefCell::new(Vec::<SignalConnection>::new()));
    let weak = Rc::downgrade(&signal);
    let sink = Rc::clone(&added);
    let _spawner = SignalConnection::new(
        signal
            .add_fn(move |()| {
                if let Some(signal) = weak.upgrade() {
                    let handler = signal.add_nullary(|| 10).unwrap();
                    sink.borrow_mut().push(handler.into());
                }
                1
            })
            .unwrap(),
    );

    // The new handler lands at the head, behind the walk.
    assert_eq!(signal.raise(()), 1);
    assert_eq!(signal.handler_count(), 2);
    assert_eq!(signal.raise(()), 1);
    assert_eq!(signal.handler_count(), 3);
}

#[test]
fn test_disconnect_all_empties_the_chain() {
    let signal = Signal::<(), i32>::new();
    let a = SignalConnection::new(signal.add_nullary(|| 1).unwrap());
    let b = SignalConnection::new(signal.add_nullary(|| 2).unwrap());
    signal.disconnect_all();
    assert!(!a.is_connected());
    assert!(!b.is_connected());
    assert_eq!(signal.raise(()), 0);
}

#[test]
fn test_signal_over_borrowed_arguments_can_be_raised() {
    let text = std::string::String::from("borrowed");
    let signal = Signal::<&str, usize>::new();
    assert!(signal.is_empty());
    assert_eq!(signal.raise(&text), 0);
    signal.disconnect_all();
}
