use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexSet;
use parking_lot::Mutex;
use sloop_analysis::{
	AnalysisLanguage, AnalysisPipeline, AnalysisService, BufferContentSource, DebounceIntervals, DocumentHandle, FileSnapshot, FileState,
	FileTracker, PipelineServices, ProjectInfo, ReferenceFinder, Result, Solution, Workspace,
};
use sloop_worker::{CancellationToken, TaskExecutorWithDebounceFactory};

#[derive(Default)]
struct Recorder {
	analyzed: Mutex<Vec<PathBuf>>,
	tracked: Mutex<Vec<(PathBuf, String)>>,
}

impl Recorder {
	fn analyzed(&self, path: &str) -> usize {
		self.analyzed.lock().iter().filter(|p| p.as_path() == Path::new(path)).count()
	}
}

impl AnalysisService for Recorder {
	fn analyze(&self, snapshot: &FileSnapshot, _: &IndexSet<AnalysisLanguage>, _: &CancellationToken) -> Result<()> {
		self.analyzed.lock().push(snapshot.path.clone());
		Ok(())
	}
}

impl FileTracker for Recorder {
	fn update(&self, path: &Path, content: &str) {
		self.tracked.lock().push((path.to_path_buf(), content.to_owned()));
	}
}

struct OneProject;

impl Solution for OneProject {
	fn projects(&self) -> Vec<ProjectInfo> {
		vec![ProjectInfo {
			name: "App".into(),
			documents: vec!["/app/Base.cs".into(), "/app/Derived.cs".into()],
		}]
	}
}

impl Workspace for OneProject {
	fn current_solution(&self) -> Result<Arc<dyn Solution>> {
		Ok(Arc::new(OneProject))
	}
}

/// Every candidate references the source.
struct EverythingLinked;

impl ReferenceFinder for EverythingLinked {
	fn find_linked_documents(&self, _: &DocumentHandle, candidates: &[DocumentHandle], _: &dyn Solution, _: &CancellationToken) -> Result<Vec<DocumentHandle>> {
		Ok(candidates.to_vec())
	}
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
	let deadline = Instant::now() + Duration::from_secs(5);
	while Instant::now() < deadline {
		if condition() {
			return true;
		}
		std::thread::sleep(Duration::from_millis(5));
	}
	condition()
}

#[test]
fn save_reanalyzes_the_file_and_its_dependents() {
	let recorder = Arc::new(Recorder::default());
	let buffers = Arc::new(BufferContentSource::new());
	let pipeline = AnalysisPipeline::new(PipelineServices {
		tracker: recorder.clone(),
		analysis: recorder.clone(),
		workspace: Arc::new(OneProject),
		reference_finder: Arc::new(EverythingLinked),
		debouncers: Arc::new(TaskExecutorWithDebounceFactory),
		intervals: DebounceIntervals {
			live_ms: 10,
			link_ms: 40,
			background_ms: 10,
		},
	});

	for (path, text) in [("/app/Base.cs", "class Base {}"), ("/app/Derived.cs", "class Derived : Base {}")] {
		buffers.set(Path::new(path), text);
		pipeline.manager().opened(Arc::new(FileState::detect(path, buffers.clone())));
	}
	assert!(wait_until(|| recorder.analyzed("/app/Base.cs") == 1 && recorder.analyzed("/app/Derived.cs") == 1));

	buffers.set(Path::new("/app/Base.cs"), "class Base { void M() {} }");
	pipeline.manager().content_saved(Path::new("/app/Base.cs"));

	assert!(wait_until(|| recorder.analyzed("/app/Base.cs") == 2 && recorder.analyzed("/app/Derived.cs") == 2));
	assert!(
		recorder
			.tracked
			.lock()
			.contains(&(PathBuf::from("/app/Base.cs"), "class Base { void M() {} }".to_owned()))
	);
}

#[test]
fn closed_files_are_not_analyzed() {
	let recorder = Arc::new(Recorder::default());
	let buffers = Arc::new(BufferContentSource::new());
	let pipeline = AnalysisPipeline::new(PipelineServices {
		tracker: recorder.clone(),
		analysis: recorder.clone(),
		workspace: Arc::new(OneProject),
		reference_finder: Arc::new(EverythingLinked),
		debouncers: Arc::new(TaskExecutorWithDebounceFactory),
		intervals: DebounceIntervals {
			live_ms: 50,
			link_ms: 50,
			background_ms: 50,
		},
	});

	buffers.set(Path::new("/app/Base.cs"), "class Base {}");
	pipeline.manager().opened(Arc::new(FileState::detect("/app/Base.cs", buffers.clone())));
	pipeline.manager().closed(Path::new("/app/Base.cs"));

	std::thread::sleep(Duration::from_millis(200));
	assert_eq!(recorder.analyzed("/app/Base.cs"), 0);
	assert!(pipeline.manager().is_empty());
}

/// Holds each analysis open until its token is cancelled.
#[derive(Default)]
struct Stalling {
	started: Mutex<Vec<PathBuf>>,
	cancelled: Mutex<Vec<PathBuf>>,
}

impl AnalysisService for Stalling {
	fn analyze(&self, snapshot: &FileSnapshot, _: &IndexSet<AnalysisLanguage>, token: &CancellationToken) -> Result<()> {
		self.started.lock().push(snapshot.path.clone());
		if wait_until(|| token.is_cancelled()) {
			self.cancelled.lock().push(snapshot.path.clone());
			return Err(sloop_analysis::AnalysisError::Cancelled);
		}
		Ok(())
	}
}

#[test]
fn closing_a_file_cancels_its_running_analysis() {
	let recorder = Arc::new(Recorder::default());
	let service = Arc::new(Stalling::default());
	let buffers = Arc::new(BufferContentSource::new());
	let pipeline = AnalysisPipeline::new(PipelineServices {
		tracker: recorder.clone(),
		analysis: service.clone(),
		workspace: Arc::new(OneProject),
		reference_finder: Arc::new(EverythingLinked),
		debouncers: Arc::new(TaskExecutorWithDebounceFactory),
		intervals: DebounceIntervals {
			live_ms: 10,
			link_ms: 10,
			background_ms: 10,
		},
	});

	buffers.set(Path::new("/app/Base.cs"), "class Base {}");
	pipeline.manager().opened(Arc::new(FileState::detect("/app/Base.cs", buffers.clone())));
	assert!(wait_until(|| !service.started.lock().is_empty()));
	assert_eq!(pipeline.scheduler().tracked_files(), 1);

	pipeline.manager().closed(Path::new("/app/Base.cs"));

	assert!(wait_until(|| *service.cancelled.lock() == vec![PathBuf::from("/app/Base.cs")]));
	assert_eq!(pipeline.scheduler().tracked_files(), 0);
}
