//! Linked lists built on [`crate::arena`] handles.
//!
//! Nodes live in an arena and link to each other by generation-stamped
//! handles, so unlinking a node is O(1) and anything still holding its handle
//! sees it as gone instead of reading freed memory.
//!
//! # Examples
//!
//! ```
//! use mola_links::linked_list::multi_iter::MultiIterList;
//!
//! let list = MultiIterList::new();
//! list.push_back_new(1).unwrap();
//! list.push_back_new(2).unwrap();
//! list.push_front_new(0).unwrap();
//!
//! let mut values = vec![];
//! let mut it = list.begin();
//! while it.valid() {
//!     values.push(*list.get(&it).unwrap());
//!     it.advance();
//! }
//! assert_eq!(values, vec![0, 1, 2]);
//! assert_eq!(list.size(), 3);
//! ```
pub mod multi_iter;
