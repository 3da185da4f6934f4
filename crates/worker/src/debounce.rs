//! Single-slot debounced task execution.
//!
//! [`TaskExecutorWithDebounce`] keeps at most one registered action. Each
//! [`Debouncer::debounce`] call replaces it and re-arms the timer, so a burst
//! of triggers collapses into one execution of the last action once the quiet
//! period elapses. The action runs on the blocking pool with a fresh
//! [`CancellationToken`]; starting it cancels the token of the previous run.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::timer::ResettableOneShotTimer;
use crate::{TaskClass, spawn_blocking};

/// Work registered with a debouncer.
pub type DebouncedAction = Box<dyn FnOnce(CancellationToken) + Send + 'static>;

/// Debounced executor seam.
pub trait Debouncer: Send + Sync {
	/// Registers `action` to run once `interval` passes without another call.
	fn debounce(&self, action: DebouncedAction, interval: Duration);

	/// Returns true while a registered action is waiting for its timer.
	fn is_scheduled(&self) -> bool;

	/// Stops the timer and drops pending work. Idempotent.
	fn dispose(&self);
}

/// Creates debouncers for new owners.
pub trait DebouncerFactory: Send + Sync {
	fn create(&self, class: TaskClass) -> Box<dyn Debouncer>;
}

/// Factory for [`TaskExecutorWithDebounce`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskExecutorWithDebounceFactory;

impl DebouncerFactory for TaskExecutorWithDebounceFactory {
	fn create(&self, class: TaskClass) -> Box<dyn Debouncer> {
		Box::new(TaskExecutorWithDebounce::new(class))
	}
}

struct DebounceSlot {
	pending: Option<(u64, DebouncedAction)>,
	running: Option<CancellationToken>,
	disposed: bool,
}

/// Timer-backed [`Debouncer`].
pub struct TaskExecutorWithDebounce {
	slot: Arc<Mutex<DebounceSlot>>,
	timer: ResettableOneShotTimer,
}

impl TaskExecutorWithDebounce {
	pub fn new(class: TaskClass) -> Self {
		let slot = Arc::new(Mutex::new(DebounceSlot {
			pending: None,
			running: None,
			disposed: false,
		}));
		let weak = Arc::downgrade(&slot);
		let timer = ResettableOneShotTimer::new(class, move |generation| {
			if let Some(slot) = weak.upgrade() {
				run_pending(&slot, generation, class);
			}
		});
		Self { slot, timer }
	}
}

impl Debouncer for TaskExecutorWithDebounce {
	fn debounce(&self, action: DebouncedAction, interval: Duration) {
		let mut slot = self.slot.lock();
		if slot.disposed {
			tracing::trace!("worker.debounce.after_dispose");
			return;
		}
		// Re-arm while holding the slot so the pairing of generation and
		// action is observed atomically by the elapsed callback.
		let Some(generation) = self.timer.reset(interval) else {
			return;
		};
		slot.pending = Some((generation, action));
	}

	fn is_scheduled(&self) -> bool {
		self.timer.is_pending()
	}

	fn dispose(&self) {
		{
			let mut slot = self.slot.lock();
			if slot.disposed {
				return;
			}
			slot.disposed = true;
			slot.pending = None;
			if let Some(running) = slot.running.take() {
				running.cancel();
			}
		}
		self.timer.dispose();
	}
}

impl Drop for TaskExecutorWithDebounce {
	fn drop(&mut self) {
		self.dispose();
	}
}

fn run_pending(slot: &Mutex<DebounceSlot>, generation: u64, class: TaskClass) {
	let (action, token) = {
		let mut slot = slot.lock();
		if slot.disposed {
			return;
		}
		match slot.pending.take() {
			Some((registered, action)) if registered == generation => {
				if let Some(previous) = slot.running.take() {
					previous.cancel();
				}
				let token = CancellationToken::new();
				slot.running = Some(token.clone());
				(action, token)
			}
			other => {
				slot.pending = other;
				return;
			}
		}
	};
	tracing::trace!(generation, "worker.debounce.fire");
	spawn_blocking(class, move || action(token));
}
