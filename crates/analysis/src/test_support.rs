//! Hand-driven collaborators for unit tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use parking_lot::Mutex;
use sloop_worker::{CancellationToken, DebouncedAction, Debouncer, DebouncerFactory, TaskClass};

use crate::error::Result;
use crate::file_state::{BufferContentSource, FileSnapshot, FileState};
use crate::language::AnalysisLanguage;
use crate::live::{DefaultLiveAnalysisStateFactory, FileTracker, LinkedFileScheduler, LiveAnalysisContext};
use crate::scheduler::{AnalysisScheduler, AnalysisService};
use crate::settings::DebounceIntervals;

/// One call to [`Debouncer::debounce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceCall {
	pub class: TaskClass,
	pub interval: Duration,
}

#[derive(Default)]
struct ManualSlot {
	pending: Option<DebouncedAction>,
	disposed: bool,
	disposals: usize,
}

/// Debouncer that never fires on its own; tests call [`ManualDebouncers::fire`].
struct ManualDebouncer {
	class: TaskClass,
	slot: Arc<Mutex<ManualSlot>>,
	calls: Arc<Mutex<Vec<DebounceCall>>>,
}

impl Debouncer for ManualDebouncer {
	fn debounce(&self, action: DebouncedAction, interval: Duration) {
		let mut slot = self.slot.lock();
		if slot.disposed {
			return;
		}
		slot.pending = Some(action);
		self.calls.lock().push(DebounceCall {
			class: self.class,
			interval,
		});
	}

	fn is_scheduled(&self) -> bool {
		self.slot.lock().pending.is_some()
	}

	fn dispose(&self) {
		let mut slot = self.slot.lock();
		slot.disposed = true;
		slot.disposals += 1;
		slot.pending = None;
	}
}

/// Factory handing out [`ManualDebouncer`]s and remembering them in creation order.
#[derive(Default, Clone)]
pub struct ManualDebouncers {
	slots: Arc<Mutex<Vec<(TaskClass, Arc<Mutex<ManualSlot>>)>>>,
	calls: Arc<Mutex<Vec<DebounceCall>>>,
}

impl ManualDebouncers {
	pub fn calls(&self) -> Vec<DebounceCall> {
		self.calls.lock().clone()
	}

	fn slot(&self, index: usize) -> Arc<Mutex<ManualSlot>> {
		Arc::clone(&self.slots.lock()[index].1)
	}

	/// Runs the pending action of the `index`-th debouncer with a fresh token.
	/// Returns false when nothing was pending.
	pub fn fire(&self, index: usize) -> bool {
		let action = self.slot(index).lock().pending.take();
		match action {
			Some(action) => {
				action(CancellationToken::new());
				true
			}
			None => false,
		}
	}

	pub fn is_pending(&self, index: usize) -> bool {
		self.slot(index).lock().pending.is_some()
	}

	pub fn disposals(&self, index: usize) -> usize {
		self.slot(index).lock().disposals
	}

	pub fn created(&self) -> usize {
		self.slots.lock().len()
	}
}

impl DebouncerFactory for ManualDebouncers {
	fn create(&self, class: TaskClass) -> Box<dyn Debouncer> {
		let slot = Arc::new(Mutex::new(ManualSlot::default()));
		self.slots.lock().push((class, Arc::clone(&slot)));
		Box::new(ManualDebouncer {
			class,
			slot,
			calls: Arc::clone(&self.calls),
		})
	}
}

#[derive(Default)]
pub struct RecordingTracker {
	pub updates: Mutex<Vec<(PathBuf, String)>>,
}

impl FileTracker for RecordingTracker {
	fn update(&self, path: &Path, content: &str) {
		self.updates.lock().push((path.to_path_buf(), content.to_owned()));
	}
}

#[derive(Default)]
pub struct RecordingService {
	pub requests: Mutex<Vec<(PathBuf, Vec<AnalysisLanguage>)>>,
}

impl AnalysisService for RecordingService {
	fn analyze(&self, snapshot: &FileSnapshot, languages: &IndexSet<AnalysisLanguage>, _: &CancellationToken) -> Result<()> {
		self.requests.lock().push((snapshot.path.clone(), languages.iter().copied().collect()));
		Ok(())
	}
}

#[derive(Default)]
pub struct RecordingLinked {
	pub requests: Mutex<Vec<PathBuf>>,
}

impl LinkedFileScheduler for RecordingLinked {
	fn schedule_linked_analysis(&self, file: &FileState, _: &CancellationToken) {
		self.requests.lock().push(file.path().to_path_buf());
	}
}

/// A live-state factory over manual debouncers and recording collaborators.
pub struct Harness {
	pub debouncers: ManualDebouncers,
	pub tracker: Arc<RecordingTracker>,
	pub service: Arc<RecordingService>,
	pub linked: Arc<RecordingLinked>,
	pub buffers: Arc<BufferContentSource>,
	pub intervals: DebounceIntervals,
	pub factory: Arc<DefaultLiveAnalysisStateFactory>,
}

impl Harness {
	pub fn new() -> Self {
		let debouncers = ManualDebouncers::default();
		let tracker = Arc::new(RecordingTracker::default());
		let service = Arc::new(RecordingService::default());
		let linked = Arc::new(RecordingLinked::default());
		let intervals = DebounceIntervals::default();
		let context = Arc::new(LiveAnalysisContext {
			tracker: tracker.clone(),
			scheduler: Arc::new(AnalysisScheduler::new(service.clone())),
			linked: linked.clone(),
			intervals,
		});
		let factory = Arc::new(DefaultLiveAnalysisStateFactory::new(context, Arc::new(debouncers.clone())));
		Self {
			debouncers,
			tracker,
			service,
			linked,
			buffers: Arc::new(BufferContentSource::new()),
			intervals,
			factory,
		}
	}

	/// An open file backed by an in-memory buffer.
	pub fn file(&self, path: &str, text: &str) -> Arc<FileState> {
		self.buffers.set(Path::new(path), text);
		Arc::new(FileState::detect(path, self.buffers.clone()))
	}
}
