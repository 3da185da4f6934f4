//! Restartable single-fire timer.
//!
//! Every [`ResettableOneShotTimer::reset`] issues a new arming generation. Only
//! the most recent arming may fire; superseded sleeps are aborted and, if they
//! race past the abort, are rejected by the generation check.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::{TaskClass, spawn};

type ElapsedFn = Arc<dyn Fn(u64) + Send + Sync>;

struct TimerState {
	generation: u64,
	pending: bool,
	disposed: bool,
	sleeper: Option<JoinHandle<()>>,
	on_elapsed: Option<ElapsedFn>,
}

/// One-shot timer that can be re-armed before it fires.
///
/// The elapsed callback receives the generation returned by the `reset` call
/// that armed it and runs on a runtime worker thread.
pub struct ResettableOneShotTimer {
	class: TaskClass,
	state: Arc<Mutex<TimerState>>,
}

impl ResettableOneShotTimer {
	/// Creates a disarmed timer.
	pub fn new(class: TaskClass, on_elapsed: impl Fn(u64) + Send + Sync + 'static) -> Self {
		Self {
			class,
			state: Arc::new(Mutex::new(TimerState {
				generation: 0,
				pending: false,
				disposed: false,
				sleeper: None,
				on_elapsed: Some(Arc::new(on_elapsed)),
			})),
		}
	}

	/// Arms the timer to fire after `interval`, superseding any pending arming.
	///
	/// Returns the arming generation, or `None` once disposed.
	pub fn reset(&self, interval: Duration) -> Option<u64> {
		let mut state = self.state.lock();
		if state.disposed {
			tracing::trace!("worker.timer.reset_after_dispose");
			return None;
		}
		if let Some(sleeper) = state.sleeper.take() {
			sleeper.abort();
		}
		state.generation = state.generation.wrapping_add(1);
		state.pending = true;

		let generation = state.generation;
		let weak = Arc::downgrade(&self.state);
		state.sleeper = Some(spawn(self.class, async move {
			tokio::time::sleep(interval).await;
			fire(&weak, generation);
		}));
		Some(generation)
	}

	/// Disarms the timer without firing.
	pub fn cancel(&self) {
		let mut state = self.state.lock();
		state.pending = false;
		if let Some(sleeper) = state.sleeper.take() {
			sleeper.abort();
		}
	}

	/// Returns true while an arming is outstanding.
	pub fn is_pending(&self) -> bool {
		self.state.lock().pending
	}

	/// Disarms the timer and detaches the callback. Idempotent.
	pub fn dispose(&self) {
		let mut state = self.state.lock();
		if state.disposed {
			return;
		}
		state.disposed = true;
		state.pending = false;
		state.on_elapsed = None;
		if let Some(sleeper) = state.sleeper.take() {
			sleeper.abort();
		}
	}
}

impl Drop for ResettableOneShotTimer {
	fn drop(&mut self) {
		self.dispose();
	}
}

fn fire(state: &Weak<Mutex<TimerState>>, generation: u64) {
	let Some(state) = state.upgrade() else {
		return;
	};
	let callback = {
		let mut guard = state.lock();
		if guard.disposed || !guard.pending || guard.generation != generation {
			return;
		}
		guard.pending = false;
		guard.sleeper = None;
		guard.on_elapsed.clone()
	};
	if let Some(callback) = callback {
		callback(generation);
	}
}
