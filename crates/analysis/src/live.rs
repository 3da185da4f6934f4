//! Debounced analysis triggers for one open file.
//!
//! Each [`LiveAnalysisState`] owns two debouncers. The analysis debouncer is
//! shared by edit-driven and background triggers, so a burst of either kind
//! results in one analysis. The link debouncer runs the dependent-file lookup
//! after significant changes and has a longer window.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sloop_worker::{CancellationToken, Debouncer, DebouncerFactory, PathKey, TaskClass};

use crate::file_state::FileState;
use crate::scheduler::AnalysisScheduler;
use crate::settings::DebounceIntervals;

/// Receives the latest text of files about to be analyzed.
pub trait FileTracker: Send + Sync {
	fn update(&self, path: &std::path::Path, content: &str);
}

/// Looks up open files affected by a change to `file` and re-analyzes them.
pub trait LinkedFileScheduler: Send + Sync {
	fn schedule_linked_analysis(&self, file: &FileState, token: &CancellationToken);
}

/// Collaborators shared by every live state.
pub struct LiveAnalysisContext {
	pub tracker: Arc<dyn FileTracker>,
	pub scheduler: Arc<AnalysisScheduler>,
	pub linked: Arc<dyn LinkedFileScheduler>,
	pub intervals: DebounceIntervals,
}

impl LiveAnalysisContext {
	fn run_analysis(&self, file: &FileState, token: &CancellationToken) {
		if token.is_cancelled() {
			return;
		}
		match file.refresh_snapshot() {
			Ok(snapshot) => {
				self.tracker.update(&snapshot.path, &snapshot.content);
				self.scheduler.schedule_analysis(&snapshot, file.languages());
			}
			Err(err) => tracing::warn!(path = %file.path().display(), error = %err, "analysis.live.snapshot_failed"),
		}
	}
}

/// Live analysis state of one open file.
pub struct LiveAnalysisState {
	file: Arc<FileState>,
	context: Arc<LiveAnalysisContext>,
	analysis: Box<dyn Debouncer>,
	links: Box<dyn Debouncer>,
	disposed: AtomicBool,
}

impl LiveAnalysisState {
	pub fn new(file: Arc<FileState>, context: Arc<LiveAnalysisContext>, debouncers: &dyn DebouncerFactory) -> Self {
		Self {
			file,
			context,
			analysis: debouncers.create(TaskClass::Interactive),
			links: debouncers.create(TaskClass::Background),
			disposed: AtomicBool::new(false),
		}
	}

	pub fn file(&self) -> &Arc<FileState> {
		&self.file
	}

	pub fn key(&self) -> &PathKey {
		self.file.key()
	}

	/// Schedules re-analysis after the live interval. A significant change
	/// also schedules the dependent-file lookup after the link interval.
	pub fn handle_live_analysis_event(&self, significant: bool) {
		if self.is_disposed() {
			tracing::trace!(path = %self.file.path().display(), "analysis.live.ignored_disposed");
			return;
		}

		let file = Arc::clone(&self.file);
		let context = Arc::clone(&self.context);
		self.analysis.debounce(
			Box::new(move |token| context.run_analysis(&file, &token)),
			self.context.intervals.live(),
		);

		if significant {
			let file = Arc::clone(&self.file);
			let context = Arc::clone(&self.context);
			self.links.debounce(
				Box::new(move |token| {
					if !token.is_cancelled() {
						context.linked.schedule_linked_analysis(&file, &token);
					}
				}),
				self.context.intervals.link(),
			);
		}
	}

	/// Schedules a background re-analysis unless one is already pending.
	pub fn handle_background_analysis_event(&self) {
		if !self.is_waiting() {
			return;
		}
		let file = Arc::clone(&self.file);
		let context = Arc::clone(&self.context);
		self.analysis.debounce(
			Box::new(move |token| context.run_analysis(&file, &token)),
			self.context.intervals.background(),
		);
	}

	/// True when no analysis is pending for this file.
	pub fn is_waiting(&self) -> bool {
		!self.is_disposed() && !self.analysis.is_scheduled()
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed.load(Ordering::Acquire)
	}

	/// Stops both debouncers and cancels the file's in-flight request.
	/// Later triggers are ignored.
	pub fn dispose(&self) {
		if self.disposed.swap(true, Ordering::AcqRel) {
			return;
		}
		self.analysis.dispose();
		self.links.dispose();
		self.context.scheduler.cancel(self.file.path());
		tracing::trace!(path = %self.file.path().display(), "analysis.live.disposed");
	}
}

/// Creates [`LiveAnalysisState`]s for newly opened files.
pub trait LiveAnalysisStateFactory: Send + Sync {
	fn create(&self, file: Arc<FileState>) -> Arc<LiveAnalysisState>;
}

/// Factory wiring every state to the same context and debouncer source.
pub struct DefaultLiveAnalysisStateFactory {
	context: Arc<LiveAnalysisContext>,
	debouncers: Arc<dyn DebouncerFactory>,
}

impl DefaultLiveAnalysisStateFactory {
	pub fn new(context: Arc<LiveAnalysisContext>, debouncers: Arc<dyn DebouncerFactory>) -> Self {
		Self { context, debouncers }
	}
}

impl LiveAnalysisStateFactory for DefaultLiveAnalysisStateFactory {
	fn create(&self, file: Arc<FileState>) -> Arc<LiveAnalysisState> {
		Arc::new(LiveAnalysisState::new(file, Arc::clone(&self.context), self.debouncers.as_ref()))
	}
}
