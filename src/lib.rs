pub mod bucket;
pub mod config;
pub mod error;
pub mod fheap;

use std::fmt;

pub use config::Config;
pub use error::{ErrorKind, HeapError};
pub use fheap::{Detached, FibHeap, NodeId};



/// Ordered collection holding the trees of one order in a `FibHeap` forest.
/// Every operation must be O(1), and a handle returned by `push_back` must keep naming its item
/// until that item is removed, no matter what else is pushed or removed in the meantime.
pub trait Bucket<T>: Default {
	type Handle: Copy + Eq + fmt::Debug;
	fn len(&self) -> usize;
	fn is_empty(&self) -> bool {
		self.len() == 0
	}
	fn push_back(&mut self, item: T) -> Self::Handle;
	fn pop_front(&mut self) -> Option<T>;
	fn pop_back(&mut self) -> Option<T>;
	/// Remove the item named by `handle`, or return None if it is already gone
	fn remove(&mut self, handle: Self::Handle) -> Option<T>;
	fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T> + 'a where T: 'a;
}
