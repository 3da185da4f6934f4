//! Single-flight analysis requests per file.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexSet;
use sloop_worker::{CancellationToken, Scheduler};

use crate::error::{AnalysisError, Result};
use crate::file_state::FileSnapshot;
use crate::language::AnalysisLanguage;

/// The analysis engine entry point.
pub trait AnalysisService: Send + Sync {
	/// Analyzes `snapshot` for `languages`. Implementations should return
	/// [`AnalysisError::Cancelled`] once `token` fires.
	fn analyze(&self, snapshot: &FileSnapshot, languages: &IndexSet<AnalysisLanguage>, token: &CancellationToken) -> Result<()>;
}

/// Issues analysis requests, cancelling any in-flight request for the same
/// file first.
pub struct AnalysisScheduler {
	in_flight: Scheduler,
	service: Arc<dyn AnalysisService>,
}

impl AnalysisScheduler {
	pub fn new(service: Arc<dyn AnalysisService>) -> Self {
		Self {
			in_flight: Scheduler::new(),
			service,
		}
	}

	/// Runs analysis for `snapshot` on the calling thread.
	pub fn schedule_analysis(&self, snapshot: &FileSnapshot, languages: &IndexSet<AnalysisLanguage>) {
		let service = &self.service;
		self.in_flight.schedule(snapshot.path.as_path(), |token| {
			match service.analyze(snapshot, languages, &token) {
				Ok(()) => tracing::debug!(path = %snapshot.path.display(), "analysis.request.done"),
				Err(AnalysisError::Cancelled) => tracing::trace!(path = %snapshot.path.display(), "analysis.request.cancelled"),
				Err(err) => tracing::warn!(path = %snapshot.path.display(), error = %err, "analysis.request.failed"),
			}
		});
	}

	/// Cancels the in-flight request for `path`, if any.
	pub fn cancel(&self, path: &Path) {
		self.in_flight.cancel(path);
	}

	/// Cancels every in-flight request.
	pub fn cancel_all(&self) {
		self.in_flight.cancel_all();
	}

	/// Number of files with a tracked request token.
	pub fn tracked_files(&self) -> usize {
		self.in_flight.len()
	}
}
