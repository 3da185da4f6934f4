use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Debounce windows for the three kinds of analysis trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceIntervals {
	/// Delay after an edit before the file is re-analyzed.
	pub live_ms: u64,
	/// Delay after a significant change before dependents are looked up.
	pub link_ms: u64,
	/// Delay before a background re-analysis of an idle file.
	pub background_ms: u64,
}

impl DebounceIntervals {
	pub const fn live(&self) -> Duration {
		Duration::from_millis(self.live_ms)
	}

	pub const fn link(&self) -> Duration {
		Duration::from_millis(self.link_ms)
	}

	pub const fn background(&self) -> Duration {
		Duration::from_millis(self.background_ms)
	}
}

impl Default for DebounceIntervals {
	fn default() -> Self {
		Self {
			live_ms: 300,
			link_ms: 1500,
			background_ms: 1000,
		}
	}
}
