//! Per-key single-flight cancellation.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Case-insensitive key, compared the way Windows compares file paths.
#[derive(Clone)]
pub struct PathKey {
	display: String,
	folded: String,
}

impl PathKey {
	pub fn new(raw: impl Into<String>) -> Self {
		let display = raw.into();
		let folded = display.to_lowercase();
		Self { display, folded }
	}

	/// The key as originally supplied.
	pub fn as_str(&self) -> &str {
		&self.display
	}
}

impl PartialEq for PathKey {
	fn eq(&self, other: &Self) -> bool {
		self.folded == other.folded
	}
}

impl Eq for PathKey {}

impl Hash for PathKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.folded.hash(state);
	}
}

impl fmt::Debug for PathKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("PathKey").field(&self.display).finish()
	}
}

impl fmt::Display for PathKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.display)
	}
}

impl From<&str> for PathKey {
	fn from(raw: &str) -> Self {
		Self::new(raw)
	}
}

impl From<String> for PathKey {
	fn from(raw: String) -> Self {
		Self::new(raw)
	}
}

impl From<&Path> for PathKey {
	fn from(path: &Path) -> Self {
		Self::new(path.to_string_lossy().into_owned())
	}
}

/// Single-flight scheduler: a new request for a key cancels the previous one.
///
/// Only the token map is shared; actions run synchronously on the caller.
#[derive(Default)]
pub struct Scheduler {
	current: Mutex<HashMap<PathKey, CancellationToken>>,
}

impl Scheduler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Cancels the in-flight token for `key`, installs a fresh one and runs
	/// `action` with it.
	pub fn schedule<R>(&self, key: impl Into<PathKey>, action: impl FnOnce(CancellationToken) -> R) -> R {
		let key = key.into();
		let token = CancellationToken::new();
		let previous = self.current.lock().insert(key.clone(), token.clone());
		if let Some(previous) = previous {
			tracing::trace!(key = %key, "worker.scheduler.supersede");
			previous.cancel();
		}
		action(token)
	}

	/// Cancels and forgets the token for `key`.
	pub fn cancel(&self, key: impl Into<PathKey>) {
		let key = key.into();
		if let Some(token) = self.current.lock().remove(&key) {
			token.cancel();
		}
	}

	/// Cancels every tracked token.
	pub fn cancel_all(&self) {
		let drained: Vec<_> = self.current.lock().drain().map(|(_, token)| token).collect();
		for token in drained {
			token.cancel();
		}
	}

	/// Number of keys with a tracked token.
	pub fn len(&self) -> usize {
		self.current.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
