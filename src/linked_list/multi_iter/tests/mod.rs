extern crate std;

use std::cell::Cell;
use std::rc::Rc;

use super::{Cursor, MultiIterList};


fn list_of(values: &[i32]) -> MultiIterList<i32> {
    let list = MultiIterList::new();
    for v in values {
        list.push_back_new(*v).unwrap();
    }
    list
}

fn cursor_at<T>(list: &MultiIterList<T>, index: usize) -> Cursor<T> {
    let mut cursor = list.begin();
    for _ in 0..index {
        cursor.advance();
    }
    cursor
}

fn value<T: Copy>(list: &MultiIterList<T>, cursor: &Cursor<T>) -> Option<T> {
    list.get(cursor).map(|v| *v)
}

/// Payload that counts how often the list's deleter released it.
struct Tracked {
    released: Rc<Cell<u32>>,
}

fn release(t: Tracked) {
    t.released.set(t.released.get() + 1);
}
