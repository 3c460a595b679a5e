use std::fmt;

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, trace};

use crate::{bucket::SlotList, config::Config, error::HeapError, Bucket};

new_key_type! {
	/// Handle to a node in a `FibHeap`.
	/// It stays valid (and keeps naming the same node, even across `increase_key`) until the node leaves
	/// the heap through `delete_min` or `delete`.  After that every operation given it fails with
	/// `HeapError::InvalidHandle`.
	pub struct NodeId;
}

#[derive(Debug)]
struct Node<T, H> {
	key: u64,
	payload: T,
	parent: Option<NodeId>,
	first_child: Option<NodeId>,
	// siblings form a ring; both are None while the node is a root
	next: Option<NodeId>,
	prev: Option<NodeId>,
	child_count: usize,
	marked: bool,
	// position in forest[child_count], only while the node is a root
	slot: Option<H>
}

impl<T, H> Node<T, H> {
	fn new(key: u64, payload: T) -> Self {
		Self{key, payload, parent: None, first_child: None, next: None, prev: None, child_count: 0, marked: false, slot: None}
	}
}

/// A tree of the forest, as held by the bucket for its order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tree {
	root: NodeId
}

impl Tree {
	pub fn root(&self) -> NodeId {
		self.root
	}
}

/// A node that has been taken out of a heap.
/// Dropping it frees the payload; `into_payload` hands the payload back instead.
#[derive(Debug, PartialEq, Eq)]
pub struct Detached<T> {
	pub key: u64,
	pub payload: T
}

impl<T> Detached<T> {
	pub fn into_payload(self) -> T {
		self.payload
	}
}

#[derive(Clone, Copy, Debug)]
enum MinUpdate {
	/// Only this root can have dropped below the cached minimum.  Replaces it on a strict decrease only,
	/// so it can never raise the minimum and is wrong whenever more than one root changed.
	Candidate(NodeId),
	/// Scan every root in every bucket
	Rescan
}

/// The largest order a tree can reach in a heap of `count` nodes.
/// A root of order d always holds at least F(d+2) nodes, so this is the largest d with F(d+2) <= count.
pub fn degree_bound(count: usize) -> usize {
	let (mut lo, mut hi) = (1usize, 2usize);
	let mut degree = 0;
	while hi <= count {
		degree += 1;
		let Some(next) = lo.checked_add(hi) else { break };
		(lo, hi) = (hi, next);
	}
	degree
}

/// Fibonacci heap keyed by `u64`, min first.
/// - Insert, find min, decrease key: O(1) amortized
/// - Delete min, delete, increase key: O(log(n)) amortized
///
/// Roots are kept in a forest of buckets, one per tree order (the root's child count), rather than
/// in a single root list.  Delete min merges equal order trees bucket by bucket until every order
/// holds at most one tree, then rescans the surviving roots for the new minimum.
/// Nodes live in an arena and are addressed by `NodeId`; equal keys are allowed, and operations that
/// target one specific node take its id so duplicates are never confused with each other.
pub struct FibHeap<T, B: Bucket<Tree> = SlotList<Tree>> {
	nodes: SlotMap<NodeId, Node<T, B::Handle>>,
	forest: Vec<B>,
	min_root: Option<NodeId>,
	count: usize,
	node_limit: usize
}

impl<T> FibHeap<T> {
	/// Create an empty heap with `initial_max_order` buckets (must be at least 1)
	pub fn new(initial_max_order: usize) -> Result<Self, HeapError> {
		Self::with_config(Config::default().with_initial_max_order(initial_max_order))
	}

	pub fn with_config(config: Config) -> Result<Self, HeapError> {
		Self::with_buckets(config)
	}
}

impl<T, B: Bucket<Tree>> FibHeap<T, B> {
	/// Create an empty heap whose forest uses `B` as the bucket collection
	pub fn with_buckets(config: Config) -> Result<Self, HeapError> {
		let Config{initial_max_order, node_limit} = config;
		if initial_max_order == 0 {
			return Err(HeapError::ZeroOrder)
		}
		let mut forest = Vec::new();
		forest.try_reserve_exact(initial_max_order)
			.map_err(|_|HeapError::AllocationFailed{orders: initial_max_order})?;
		forest.resize_with(initial_max_order, B::default);
		debug!(initial_max_order, node_limit, "created fibonacci heap");
		Ok(Self{nodes: SlotMap::with_key(), forest, min_root: None, count: 0, node_limit})
	}

	/// True iff every bucket of the forest is empty
	pub fn is_empty(&self) -> bool {
		self.forest.iter().all(|b|b.is_empty())
	}

	pub fn len(&self) -> usize {
		self.count
	}

	/// Current number of buckets, ie one more than the largest order the forest can hold without growing
	pub fn max_order(&self) -> usize {
		self.forest.len()
	}

	/// Payload of the node with the smallest key
	pub fn find_min(&self) -> Option<&T> {
		self.min_root.map(|id|&self.nodes[id].payload)
	}

	pub fn peek_min(&self) -> Option<(u64, &T)> {
		self.min_root.map(|id|{
			let node = &self.nodes[id];
			(node.key, &node.payload)
		})
	}

	pub fn min_node(&self) -> Option<NodeId> {
		self.min_root
	}

	pub fn contains(&self, id: NodeId) -> bool {
		self.nodes.contains_key(id)
	}

	pub fn key(&self, id: NodeId) -> Option<u64> {
		self.nodes.get(id).map(|n|n.key)
	}

	pub fn get(&self, id: NodeId) -> Option<&T> {
		self.nodes.get(id).map(|n|&n.payload)
	}

	/// Mutable access to a payload.  Keys can only be changed through the key operations.
	pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
		self.nodes.get_mut(id).map(|n|&mut n.payload)
	}

	/// Add `payload` under `key` as a new single node tree.
	/// Among equal keys the node that got there first stays the minimum.
	pub fn insert(&mut self, payload: T, key: u64) -> Result<NodeId, HeapError> {
		if self.count >= self.node_limit {
			return Err(HeapError::CapacityExceeded{limit: self.node_limit})
		}
		let id = self.nodes.insert(Node::new(key, payload));
		self.plant(id);
		self.update_min(MinUpdate::Candidate(id));
		self.count += 1;
		#[cfg(test)]{
			self.assert_valid()
		}
		Ok(id)
	}

	/// Lower the key of `id` by `delta`, cutting it (and possibly a chain of marked ancestors) loose
	/// if it is now smaller than its parent
	pub fn decrease_key(&mut self, id: NodeId, delta: u64) -> Result<NodeId, HeapError> {
		let node = self.nodes.get_mut(id).ok_or(HeapError::InvalidHandle)?;
		node.key = node.key.checked_sub(delta).ok_or(HeapError::KeyUnderflow{key: node.key, delta})?;
		let (key, parent) = (node.key, node.parent);
		if parent.is_some_and(|p|key < self.nodes[p].key) {
			self.cut(id);
		}
		if self.nodes[id].parent.is_none() {
			self.update_min(MinUpdate::Candidate(id));
		}
		#[cfg(test)]{
			self.assert_valid()
		}
		Ok(id)
	}

	/// Raise the key of `id` by `delta`.
	/// The node is pulled out of its tree and planted again as a single node tree; its id stays valid.
	pub fn increase_key(&mut self, id: NodeId, delta: u64) -> Result<NodeId, HeapError> {
		let key = self.nodes.get(id).ok_or(HeapError::InvalidHandle)?.key;
		let new_key = key.checked_add(delta).ok_or(HeapError::KeyOverflow{key, delta})?;
		self.pull_out(id)?;
		self.nodes[id].key = new_key;
		self.plant(id);
		self.update_min(MinUpdate::Candidate(id));
		self.count += 1;
		#[cfg(test)]{
			self.assert_valid()
		}
		Ok(id)
	}

	/// Move the key of `id` to exactly `key`, in whichever direction that is
	pub fn set_key(&mut self, id: NodeId, key: u64) -> Result<NodeId, HeapError> {
		let old = self.key(id).ok_or(HeapError::InvalidHandle)?;
		if key < old {
			self.decrease_key(id, old - key)
		} else if key > old {
			self.increase_key(id, key - old)
		} else { Ok(id) }
	}

	/// Remove the node with the smallest key and return it
	pub fn delete_min(&mut self) -> Option<Detached<T>> {
		let id = self.min_root?;
		self.extract_root(id);
		let Node{key, payload, ..} = self.nodes.remove(id)?;
		trace!(key, remaining = self.count, "deleted minimum");
		#[cfg(test)]{
			self.assert_valid()
		}
		Some(Detached{key, payload})
	}

	/// Remove an arbitrary node.
	/// This extracts exactly `id` even when other nodes share its key (or its key is 0).
	pub fn delete(&mut self, id: NodeId) -> Result<Detached<T>, HeapError> {
		self.pull_out(id)?;
		let Node{key, payload, ..} = self.nodes.remove(id).ok_or(HeapError::InvalidHandle)?;
		#[cfg(test)]{
			self.assert_valid()
		}
		Ok(Detached{key, payload})
	}

	/// Drop every node (and payload), keeping the forest's buckets
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.forest.iter_mut().for_each(|b|*b = B::default());
		self.min_root = None;
		self.count = 0;
	}

	/// Tear the heap down tree by tree and hand every payload back instead of dropping it
	pub fn into_payloads(mut self) -> Vec<T> {
		let mut payloads = Vec::with_capacity(self.count);
		let mut stack = Vec::new();
		for bucket in self.forest.iter_mut() {
			while let Some(tree) = bucket.pop_front() {
				stack.push(tree.root);
				while let Some(id) = stack.pop() {
					let Some(node) = self.nodes.remove(id) else { continue };
					let mut child = node.first_child;
					while let Some(c) = child {
						stack.push(c);
						child = self.nodes.get(c).and_then(|n|n.next).filter(|&n|Some(n) != node.first_child);
					}
					payloads.push(node.payload);
				}
			}
		}
		payloads
	}

	fn update_min(&mut self, how: MinUpdate) {
		match how {
			MinUpdate::Candidate(id) => {
				let key = self.nodes[id].key;
				if self.min_root.map_or(true, |m|key < self.nodes[m].key) {
					self.min_root = Some(id);
				}
			},
			MinUpdate::Rescan => {
				let mut best: Option<(u64, NodeId)> = None;
				for tree in self.forest.iter().flat_map(|b|b.iter()) {
					let key = self.nodes[tree.root].key;
					if best.map_or(true, |(k, _)|key < k) {
						best = Some((key, tree.root));
					}
				}
				self.min_root = best.map(|(_, id)|id);
			}
		}
	}

	fn bucket_mut(&mut self, order: usize) -> &mut B {
		if order >= self.forest.len() {
			debug!(from = self.forest.len(), to = order + 1, "growing forest");
			self.forest.resize_with(order + 1, B::default);
		}
		&mut self.forest[order]
	}

	/// Register a parentless node as a tree in the bucket for its current child count
	fn plant(&mut self, id: NodeId) {
		let order = self.nodes[id].child_count;
		let slot = self.bucket_mut(order).push_back(Tree{root: id});
		let node = &mut self.nodes[id];
		node.slot = Some(slot);
		node.marked = false;
	}

	/// Take a root's tree out of its bucket
	fn uproot(&mut self, id: NodeId) {
		let node = &mut self.nodes[id];
		if let Some(slot) = node.slot.take() {
			let order = node.child_count;
			self.forest[order].remove(slot);
		}
	}

	/// Unlink `id` from its parent's child ring.  Returns the former parent, if there was one.
	fn detach_from_parent(&mut self, id: NodeId) -> Option<NodeId> {
		let node = &mut self.nodes[id];
		let parent = node.parent.take()?;
		let (prev, next) = (node.prev.take(), node.next.take());
		node.marked = false;
		let p = &mut self.nodes[parent];
		p.child_count -= 1;
		match (prev, next) {
			(Some(prev), Some(next)) if next != id => {
				if p.first_child == Some(id) {
					p.first_child = Some(next);
				}
				self.nodes[prev].next = Some(next);
				self.nodes[next].prev = Some(prev);
			},
			_ => p.first_child = None
		}
		Some(parent)
	}

	/// Make `id` a root, then keep cutting marked ancestors until reaching an unmarked one (which
	/// gets marked) or a root (which moves down one bucket since it lost a child)
	fn cut(&mut self, mut id: NodeId) {
		while let Some(parent) = self.detach_from_parent(id) {
			trace!(?id, ?parent, "cut");
			self.plant(id);
			let p = &mut self.nodes[parent];
			if p.parent.is_none() {
				let old_order = p.child_count + 1;
				self.rebucket(parent, old_order);
				break
			}
			if !p.marked {
				p.marked = true;
				break
			}
			id = parent;
		}
	}

	fn rebucket(&mut self, id: NodeId, old_order: usize) {
		if let Some(slot) = self.nodes[id].slot.take() {
			self.forest[old_order].remove(slot);
		}
		trace!(?id, old_order, "rebucketed root");
		self.plant(id);
	}

	/// Make the root with the larger key (ties go to `b`) the first child of the other, returning the new root
	fn link(&mut self, a: NodeId, b: NodeId) -> NodeId {
		let (winner, loser) = if self.nodes[a].key <= self.nodes[b].key { (a, b) } else { (b, a) };
		let first = self.nodes[winner].first_child;
		let (next, prev) = match first {
			Some(first) => {
				let last = self.nodes[first].prev.unwrap_or(first);
				self.nodes[last].next = Some(loser);
				self.nodes[first].prev = Some(loser);
				(first, last)
			},
			None => (loser, loser)
		};
		let l = &mut self.nodes[loser];
		l.parent = Some(winner);
		l.next = Some(next);
		l.prev = Some(prev);
		l.marked = false;
		l.slot = None;
		let w = &mut self.nodes[winner];
		w.first_child = Some(loser);
		w.child_count += 1;
		winner
	}

	/// Merge equal order trees, smallest order first, until each bucket holds at most one tree
	fn consolidate(&mut self) {
		let mut merges = 0usize;
		let mut order = 0;
		while order < self.forest.len() {
			while self.forest[order].len() > 1 {
				let (Some(a), Some(b)) = (self.forest[order].pop_front(), self.forest[order].pop_back()) else { break };
				self.nodes[a.root].slot = None;
				self.nodes[b.root].slot = None;
				let root = self.link(a.root, b.root);
				self.plant(root);
				merges += 1;
			}
			order += 1;
		}
		trace!(merges, max_order = self.forest.len(), "consolidated forest");
	}

	/// Take root `id` out of the forest, spill its children into the forest as roots, consolidate and
	/// find the new minimum.  The node stays in the arena with all of its links cleared.
	fn extract_root(&mut self, id: NodeId) {
		// reserve every order consolidation can reach before any tree moves
		let needed = degree_bound(self.count) + 1;
		if needed > self.forest.len() {
			self.forest.reserve(needed - self.forest.len());
		}
		self.uproot(id);
		let node = &mut self.nodes[id];
		let first = node.first_child.take();
		node.child_count = 0;
		node.marked = false;
		let mut child = first;
		while let Some(c) = child {
			let n = &mut self.nodes[c];
			child = n.next.take().filter(|&next|Some(next) != first);
			n.prev = None;
			n.parent = None;
			self.plant(c);
		}
		self.consolidate();
		self.update_min(MinUpdate::Rescan);
		self.count -= 1;
	}

	/// Cut `id` loose (if it isn't a root already) and extract it from the forest.
	/// It is picked by identity rather than by being the minimum.
	fn pull_out(&mut self, id: NodeId) -> Result<(), HeapError> {
		if !self.nodes.contains_key(id) {
			return Err(HeapError::InvalidHandle)
		}
		self.cut(id);
		self.extract_root(id);
		Ok(())
	}
}

impl<T, B: Bucket<Tree>> fmt::Debug for FibHeap<T, B> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FibHeap")
			.field("len", &self.count)
			.field("max_order", &self.forest.len())
			.field("min_key", &self.peek_min().map(|(k, _)|k))
			.finish()
	}
}

#[cfg(test)]
#[derive(Debug, PartialEq)]
enum Violation {
	BrokenSiblingLink(NodeId),
	LessThanParent(NodeId),
	BrokenParentLink(NodeId),
	WrongDegree(NodeId),
	TooSmall(NodeId),
	WrongBucket(NodeId),
	MarkedRoot(NodeId),
	WrongMin,
	WrongCount
}

#[cfg(test)]
impl<T, B: Bucket<Tree>> FibHeap<T, B> {
	fn check_node(&self, id: NodeId) -> Result<usize, Violation> {
		use Violation::*;
		let node = &self.nodes[id];
		let mut degree = 0;
		let mut size = 1;
		let (mut fib_d1, mut fib_d2) = (1, 1);
		if let Some(first) = node.first_child {
			let mut child = first;
			loop {
				let c = self.nodes.get(child).ok_or(BrokenSiblingLink(id))?;
				degree += 1;
				(fib_d1, fib_d2) = (fib_d2, fib_d1 + fib_d2);
				if c.parent != Some(id) {
					return Err(BrokenParentLink(child))
				} else if c.key < node.key {
					return Err(LessThanParent(child))
				} else if c.slot.is_some() {
					return Err(WrongBucket(child))
				} else if degree > self.nodes.len() {
					return Err(BrokenSiblingLink(id))
				}
				let next = c.next.ok_or(BrokenSiblingLink(child))?;
				if self.nodes.get(next).and_then(|n|n.prev) != Some(child) {
					return Err(BrokenSiblingLink(next))
				}
				size += self.check_node(child)?;
				if next == first { break }
				child = next;
			}
		}
		if degree != node.child_count {
			Err(WrongDegree(id))
		} else if size < fib_d2 {
			Err(TooSmall(id))
		} else { Ok(size) }
	}

	fn check(&self) -> Result<(), Violation> {
		use Violation::*;
		let mut total = 0;
		let mut min_key = None;
		for (order, bucket) in self.forest.iter().enumerate() {
			for tree in bucket.iter() {
				let root = self.nodes.get(tree.root).ok_or(WrongCount)?;
				if root.parent.is_some() || root.next.is_some() || root.prev.is_some() {
					return Err(BrokenParentLink(tree.root))
				} else if root.child_count != order || root.slot.is_none() {
					return Err(WrongBucket(tree.root))
				} else if root.marked {
					return Err(MarkedRoot(tree.root))
				}
				if min_key.map_or(true, |k|root.key < k) {
					min_key = Some(root.key);
				}
				total += self.check_node(tree.root)?;
			}
		}
		if total != self.count || total != self.nodes.len() {
			return Err(WrongCount)
		}
		match (self.min_root, min_key) {
			(None, None) => Ok(()),
			(Some(m), Some(k)) if self.nodes.get(m).is_some_and(|n|n.key == k && n.parent.is_none()) => Ok(()),
			_ => Err(WrongMin)
		}
	}

	fn assert_valid(&self) {
		#[cfg(not(feature = "stress_tests"))]{
			assert_eq!(self.check(), Ok(()))
		}
	}
}
