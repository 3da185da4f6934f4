//! Engine restart loop with a bounded restart budget.
//!
//! The loop keeps an engine running by starting a new instance whenever the
//! previous one ends. Once `max_starts_before_user_notification` launch
//! attempts have happened since the last manual restart, it stops and hands
//! a [`RestartAction`] to the [`RestartNotifier`]. Invoking the action resets
//! the baseline and resumes the loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use sloop_worker::TaskClass;
use tokio::task::JoinHandle;

use crate::handler::SlCoreInstanceHandler;
use crate::{Error, Result};

/// Surfaces "restart the engine manually" to the user.
pub trait RestartNotifier: Send + Sync {
	fn notify_restart_required(&self, action: RestartAction);
}

/// Resumes the restart loop when invoked. A no-op once the handler is gone
/// or disposed.
#[derive(Clone)]
pub struct RestartAction {
	shared: Weak<SupervisorShared>,
}

impl RestartAction {
	pub fn restart(&self) {
		if let Some(shared) = self.shared.upgrade() {
			SupervisorShared::manual_restart(&shared);
		}
	}
}

impl std::fmt::Debug for RestartAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RestartAction").finish_non_exhaustive()
	}
}

/// Logs the restart request and leaves the action unused.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRestartNotifier;

impl RestartNotifier for LoggingRestartNotifier {
	fn notify_restart_required(&self, _action: RestartAction) {
		tracing::warn!("engine.supervisor.manual_restart_required");
	}
}

struct SupervisorShared {
	instances: Arc<SlCoreInstanceHandler>,
	notifier: Arc<dyn RestartNotifier>,
	max_starts: u64,
	/// Start number at the last manual restart.
	baseline: AtomicU64,
	looping: AtomicBool,
	disposed: AtomicBool,
	this: Weak<SupervisorShared>,
}

impl SupervisorShared {
	fn start_loop(self: &Arc<Self>) -> Option<JoinHandle<Result<()>>> {
		if self.disposed.load(Ordering::Acquire) || self.looping.swap(true, Ordering::AcqRel) {
			return None;
		}
		tracing::debug!("engine.supervisor.loop_start");
		Some(sloop_worker::spawn(TaskClass::Supervisor, Arc::clone(self).run_loop()))
	}

	fn manual_restart(self: &Arc<Self>) {
		if self.disposed.load(Ordering::Acquire) {
			return;
		}
		let starts = self.instances.current_start_number();
		self.baseline.store(starts, Ordering::Release);
		tracing::info!(starts, "engine.supervisor.manual_restart");
		self.start_loop();
	}

	async fn run_loop(self: Arc<Self>) -> Result<()> {
		loop {
			if self.disposed.load(Ordering::Acquire) {
				break;
			}

			let starts = self.instances.current_start_number();
			let since_restart = starts.saturating_sub(self.baseline.load(Ordering::Acquire));
			if since_restart >= self.max_starts {
				tracing::warn!(starts, since_restart, "engine.supervisor.restart_budget_exhausted");
				self.looping.store(false, Ordering::Release);
				self.notifier.notify_restart_required(RestartAction {
					shared: self.this.clone(),
				});
				return Ok(());
			}

			match self.instances.start_instance().await {
				Ok(()) => {}
				Err(Error::Disposed) => break,
				Err(err) => {
					tracing::error!(error = %err, "engine.supervisor.contract_violation");
					self.looping.store(false, Ordering::Release);
					return Err(err);
				}
			}
		}
		self.looping.store(false, Ordering::Release);
		tracing::debug!("engine.supervisor.loop_end");
		Ok(())
	}
}

/// Top-level engine supervisor.
pub struct SlCoreHandler {
	shared: Arc<SupervisorShared>,
}

impl SlCoreHandler {
	pub fn new(instances: Arc<SlCoreInstanceHandler>, notifier: Arc<dyn RestartNotifier>, max_starts_before_user_notification: u64) -> Self {
		let shared = Arc::new_cyclic(|this| SupervisorShared {
			instances,
			notifier,
			max_starts: max_starts_before_user_notification,
			baseline: AtomicU64::new(0),
			looping: AtomicBool::new(false),
			disposed: AtomicBool::new(false),
			this: this.clone(),
		});
		Self { shared }
	}

	/// Starts the restart loop in the background.
	///
	/// Returns `None` when the loop is already running or the handler is
	/// disposed. The task ends with an error only on a contract violation.
	pub fn enable_sloop(&self) -> Option<JoinHandle<Result<()>>> {
		self.shared.start_loop()
	}

	pub fn is_looping(&self) -> bool {
		self.shared.looping.load(Ordering::Acquire)
	}

	pub fn is_disposed(&self) -> bool {
		self.shared.disposed.load(Ordering::Acquire)
	}

	/// Stops the loop and the live instance. Idempotent.
	pub fn dispose(&self) {
		if self.shared.disposed.swap(true, Ordering::AcqRel) {
			return;
		}
		self.shared.instances.dispose();
		tracing::info!("engine.supervisor.disposed");
	}
}

impl Drop for SlCoreHandler {
	fn drop(&mut self) {
		self.dispose();
	}
}
