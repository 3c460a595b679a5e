use slotmap::{new_key_type, SlotMap};

use crate::Bucket;

new_key_type! {
	/// Position of an item inside a `SlotList`, valid until that item is removed
	pub struct EntryHandle;
}

#[derive(Debug)]
struct Entry<T> {
	item: T,
	prev: Option<EntryHandle>,
	next: Option<EntryHandle>
}

/// Doubly linked list whose entries live in a generational arena.
/// Appending and removing (from either end or by handle) are all O(1), and removing through a handle
/// whose item is already gone returns `None` instead of touching some other entry.
#[derive(Debug)]
pub struct SlotList<T> {
	entries: SlotMap<EntryHandle, Entry<T>>,
	head: Option<EntryHandle>,
	tail: Option<EntryHandle>
}

impl<T> Default for SlotList<T> {
	fn default() -> Self {
		Self{entries: SlotMap::with_key(), head: None, tail: None}
	}
}

pub struct Iter<'a, T> {
	list: &'a SlotList<T>,
	cur: Option<EntryHandle>
}

impl<'a, T> Iterator for Iter<'a, T> {
	type Item = &'a T;
	fn next(&mut self) -> Option<Self::Item> {
		let entry = self.list.entries.get(self.cur?)?;
		self.cur = entry.next;
		Some(&entry.item)
	}
}

impl<T> SlotList<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn front(&self) -> Option<&T> {
		self.head.map(|h|&self.entries[h].item)
	}

	pub fn back(&self) -> Option<&T> {
		self.tail.map(|h|&self.entries[h].item)
	}
}

impl<T> Bucket<T> for SlotList<T> {
	type Handle = EntryHandle;

	fn len(&self) -> usize {
		self.entries.len()
	}

	fn push_back(&mut self, item: T) -> EntryHandle {
		let handle = self.entries.insert(Entry{item, prev: self.tail, next: None});
		match self.tail {
			Some(tail) => self.entries[tail].next = Some(handle),
			None => self.head = Some(handle)
		}
		self.tail = Some(handle);
		handle
	}

	fn pop_front(&mut self) -> Option<T> {
		let head = self.head?;
		self.remove(head)
	}

	fn pop_back(&mut self) -> Option<T> {
		let tail = self.tail?;
		self.remove(tail)
	}

	fn remove(&mut self, handle: EntryHandle) -> Option<T> {
		let Entry{item, prev, next} = self.entries.remove(handle)?;
		match prev {
			Some(p) => self.entries[p].next = next,
			None => self.head = next
		}
		match next {
			Some(n) => self.entries[n].prev = prev,
			None => self.tail = prev
		}
		Some(item)
	}

	fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T> + 'a where T: 'a {
		Iter{list: self, cur: self.head}
	}
}

#[cfg(test)]
mod tests {
	use super::SlotList;
	use crate::Bucket;

	fn contents(list: &SlotList<u32>) -> Vec<u32> {
		list.iter().copied().collect()
	}

	#[test]
	fn append_and_pop_both_ends() {
		let mut list = SlotList::new();
		assert!(list.is_empty());
		for i in 0..5 {
			list.push_back(i);
		}
		assert_eq!(list.len(), 5);
		assert_eq!(list.front(), Some(&0));
		assert_eq!(list.back(), Some(&4));
		assert_eq!(list.pop_front(), Some(0));
		assert_eq!(list.pop_back(), Some(4));
		assert_eq!(contents(&list), vec![1, 2, 3]);
		while list.pop_back().is_some() {}
		assert!(list.is_empty());
		assert_eq!(list.pop_front(), None);
		assert_eq!(list.front(), None);
	}

	#[test]
	fn remove_by_handle_anywhere() {
		let mut list = SlotList::new();
		let handles: Vec<_> = (0..6).map(|i|list.push_back(i)).collect();
		assert_eq!(list.remove(handles[3]), Some(3));
		assert_eq!(list.remove(handles[0]), Some(0));
		assert_eq!(list.remove(handles[5]), Some(5));
		assert_eq!(contents(&list), vec![1, 2, 4]);
		assert_eq!(list.front(), Some(&1));
		assert_eq!(list.back(), Some(&4));
		// the item is gone, so the handle no longer resolves
		assert_eq!(list.remove(handles[3]), None);
		assert_eq!(list.len(), 3);
	}

	#[test]
	fn handles_survive_other_removals() {
		let mut list = SlotList::new();
		let a = list.push_back(10);
		let b = list.push_back(20);
		list.pop_front();
		let c = list.push_back(30);
		assert_ne!(a, c);
		assert_eq!(list.remove(b), Some(20));
		assert_eq!(contents(&list), vec![30]);
		assert_eq!(list.remove(c), Some(30));
		assert!(list.is_empty());
	}
}
