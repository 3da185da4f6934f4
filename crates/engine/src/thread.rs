use std::thread::{self, ThreadId};

use crate::{Error, Result};

/// Remembers which thread is the UI thread so blocking engine work can refuse
/// to run there.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadGuard {
	ui: Option<ThreadId>,
}

impl ThreadGuard {
	/// A guard with no UI thread; every thread passes.
	pub const fn unrestricted() -> Self {
		Self { ui: None }
	}

	/// Marks the calling thread as the UI thread.
	pub fn for_current_thread() -> Self {
		Self::for_thread(thread::current().id())
	}

	pub const fn for_thread(ui: ThreadId) -> Self {
		Self { ui: Some(ui) }
	}

	pub fn is_ui_thread(&self) -> bool {
		self.ui == Some(thread::current().id())
	}

	pub fn ensure_not_ui_thread(&self) -> Result<()> {
		if self.is_ui_thread() {
			return Err(Error::OnUiThread);
		}
		Ok(())
	}
}
