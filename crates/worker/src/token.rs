use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic generation clock shared between cooperating owners.
///
/// Cloning shares the counter. Generation `0` means nothing was issued yet.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a new clock whose first issued generation is 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Issues and returns the next generation.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}

	/// Returns the last issued generation.
	pub fn current(&self) -> u64 {
		self.next.load(Ordering::Acquire)
	}
}
