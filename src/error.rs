use thiserror::Error;

/// Coarse classification of a `HeapError`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
	/// The caller passed something the heap cannot act on (a zero order bound, a stale handle)
	InvalidArgument,
	/// The heap could not grow (allocation refused, node limit reached)
	ResourceExhaustion,
	/// The requested key change does not fit in a `u64`
	PreconditionViolation
}

/// Everything a heap operation can fail with.
/// Failing operations never leave the heap half-modified: all checks run before any link is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HeapError {
	#[error("initial forest order must be at least 1")]
	ZeroOrder,
	#[error("node handle is stale or was never part of this heap")]
	InvalidHandle,
	#[error("could not allocate a forest of {orders} buckets")]
	AllocationFailed { orders: usize },
	#[error("heap already holds its limit of {limit} nodes")]
	CapacityExceeded { limit: usize },
	#[error("decreasing key {key} by {delta} would underflow")]
	KeyUnderflow { key: u64, delta: u64 },
	#[error("increasing key {key} by {delta} would overflow")]
	KeyOverflow { key: u64, delta: u64 }
}

impl HeapError {
	pub fn kind(&self) -> ErrorKind {
		use HeapError::*;
		match self {
			ZeroOrder | InvalidHandle => ErrorKind::InvalidArgument,
			AllocationFailed{..} | CapacityExceeded{..} => ErrorKind::ResourceExhaustion,
			KeyUnderflow{..} | KeyOverflow{..} => ErrorKind::PreconditionViolation
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{ErrorKind, HeapError};

	#[test]
	fn kinds_follow_taxonomy() {
		assert_eq!(HeapError::ZeroOrder.kind(), ErrorKind::InvalidArgument);
		assert_eq!(HeapError::InvalidHandle.kind(), ErrorKind::InvalidArgument);
		assert_eq!(HeapError::AllocationFailed{orders: 3}.kind(), ErrorKind::ResourceExhaustion);
		assert_eq!(HeapError::CapacityExceeded{limit: 1}.kind(), ErrorKind::ResourceExhaustion);
		assert_eq!(HeapError::KeyUnderflow{key: 1, delta: 2}.kind(), ErrorKind::PreconditionViolation);
		assert_eq!(HeapError::KeyOverflow{key: u64::MAX, delta: 1}.kind(), ErrorKind::PreconditionViolation);
	}

	#[test]
	fn messages_carry_operands() {
		let msg = HeapError::KeyUnderflow{key: 3, delta: 7}.to_string();
		assert_eq!(msg, "decreasing key 3 by 7 would underflow");
		assert_eq!(HeapError::CapacityExceeded{limit: 4}.to_string(), "heap already holds its limit of 4 nodes");
	}
}
