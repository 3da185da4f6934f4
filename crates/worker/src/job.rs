//! Cancellable multi-step job execution.
//!
//! A [`CancellableJobRunner`] runs an ordered list of operations on one
//! blocking-pool thread. Cancellation is cooperative and observed at step
//! boundaries; the first failing step faults the job. Terminal states are
//! final: nothing runs after `Cancelled`, `Faulted` or `Finished`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;

use crate::panic::panic_message;
use crate::{TaskClass, spawn_blocking};

/// One step of a job. The token is the job's cancellation token.
pub type JobOperation = Box<dyn FnOnce(&CancellationToken) -> anyhow::Result<()> + Send + 'static>;

/// Receives progress notifications from the job thread.
pub type ProgressSink = Box<dyn Fn(JobProgress) + Send + Sync + 'static>;

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
	Running,
	Cancelled,
	Faulted,
	Finished,
}

impl JobState {
	pub const fn is_terminal(self) -> bool {
		!matches!(self, Self::Running)
	}
}

/// Progress snapshot reported to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobProgress {
	pub state: JobState,
	pub completed: usize,
	pub total: usize,
}

impl JobProgress {
	pub const fn new(state: JobState, completed: usize, total: usize) -> Self {
		Self { state, completed, total }
	}
}

struct JobStatus {
	state: JobState,
	fault: Option<String>,
}

struct JobShared {
	status: Mutex<JobStatus>,
	done: Condvar,
}

/// Handle to a running job.
pub struct CancellableJobRunner {
	name: String,
	cancel: CancellationToken,
	shared: Arc<JobShared>,
}

impl CancellableJobRunner {
	/// Starts `operations` immediately on a background thread, logging to
	/// the caller's tracing dispatcher.
	pub fn start(name: impl Into<String>, operations: Vec<JobOperation>, progress: Option<ProgressSink>) -> Self {
		let name = name.into();
		let cancel = CancellationToken::new();
		let shared = Arc::new(JobShared {
			status: Mutex::new(JobStatus {
				state: JobState::Running,
				fault: None,
			}),
			done: Condvar::new(),
		});

		let job = JobRun {
			name: name.clone(),
			cancel: cancel.clone(),
			shared: Arc::clone(&shared),
			progress,
		};
		spawn_blocking(TaskClass::Background, move || job.run(operations));

		Self { name, cancel, shared }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Requests cancellation before the next step boundary.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Token that cancels this job when triggered.
	pub fn cancellation_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	pub fn state(&self) -> JobState {
		self.shared.status.lock().state
	}

	/// Message of the error that faulted the job, if any.
	pub fn fault_message(&self) -> Option<String> {
		self.shared.status.lock().fault.clone()
	}

	/// Blocks until the job reaches a terminal state or `timeout` passes.
	/// Returns true if the job is terminal.
	pub fn wait_for_completion(&self, timeout: Duration) -> bool {
		let mut status = self.shared.status.lock();
		if !status.state.is_terminal() {
			let _ = self.shared.done.wait_while_for(&mut status, |s| !s.state.is_terminal(), timeout);
		}
		status.state.is_terminal()
	}
}

struct JobRun {
	name: String,
	cancel: CancellationToken,
	shared: Arc<JobShared>,
	progress: Option<ProgressSink>,
}

impl JobRun {
	fn run(self, operations: Vec<JobOperation>) {
		let total = operations.len();
		let mut completed = 0usize;
		self.report(JobState::Running, completed, total);

		let outcome = 'steps: {
			for operation in operations {
				if self.cancel.is_cancelled() {
					break 'steps JobState::Cancelled;
				}

				let result = catch_unwind(AssertUnwindSafe(|| operation(&self.cancel)));
				let failure = match result {
					Ok(Ok(())) => None,
					Ok(Err(err)) => Some(format!("{err:#}")),
					Err(payload) => Some(panic_message(payload.as_ref())),
				};
				if let Some(message) = failure {
					tracing::error!(job = %self.name, step = completed, error = %message, "worker.job.fault");
					self.shared.status.lock().fault = Some(message);
					break 'steps JobState::Faulted;
				}

				if self.cancel.is_cancelled() {
					break 'steps JobState::Cancelled;
				}
				completed += 1;
				self.report(JobState::Running, completed, total);
			}
			JobState::Finished
		};

		tracing::debug!(job = %self.name, state = ?outcome, completed, total, "worker.job.end");
		self.report(outcome, completed, total);

		let mut status = self.shared.status.lock();
		status.state = outcome;
		drop(status);
		self.shared.done.notify_all();
	}

	fn report(&self, state: JobState, completed: usize, total: usize) {
		if let Some(progress) = &self.progress {
			progress(JobProgress::new(state, completed, total));
		}
	}
}

#[cfg(test)]
mod tests;
