/// Construction parameters for a `FibHeap`.
///
/// `initial_max_order` is the number of forest buckets allocated up front (a heap of n nodes
/// never needs more than about 1.44*log2(n) + 2 of them, and the forest grows on its own during
/// consolidation, so this only avoids early regrowth).
/// `node_limit` is the point at which the node counter saturates and inserts start failing
/// with `HeapError::CapacityExceeded`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
	pub initial_max_order: usize,
	pub node_limit: usize
}

impl Default for Config {
	fn default() -> Self {
		Self{initial_max_order: 8, node_limit: usize::MAX}
	}
}

impl Config {
	pub fn with_initial_max_order(mut self, initial_max_order: usize) -> Self {
		self.initial_max_order = initial_max_order;
		self
	}

	pub fn with_node_limit(mut self, node_limit: usize) -> Self {
		self.node_limit = node_limit;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::Config;

	#[test]
	fn setters_chain() {
		let cfg = Config::default().with_initial_max_order(3).with_node_limit(10);
		assert_eq!(cfg, Config{initial_max_order: 3, node_limit: 10});
		assert_eq!(Config::default().node_limit, usize::MAX);
	}
}
