use std::sync::{Arc, Weak};

use sloop_worker::DebouncerFactory;

use crate::linked::{LinkedFileAnalyzer, ReferenceFinder, Workspace};
use crate::live::{DefaultLiveAnalysisStateFactory, FileTracker, LiveAnalysisContext};
use crate::manager::{AnalysisStateRegistry, FileStateManager};
use crate::scheduler::{AnalysisScheduler, AnalysisService};
use crate::settings::DebounceIntervals;

/// External services the analysis pipeline drives.
pub struct PipelineServices {
	pub tracker: Arc<dyn FileTracker>,
	pub analysis: Arc<dyn AnalysisService>,
	pub workspace: Arc<dyn Workspace>,
	pub reference_finder: Arc<dyn ReferenceFinder>,
	pub debouncers: Arc<dyn DebouncerFactory>,
	pub intervals: DebounceIntervals,
}

/// Fully wired live analysis: the open-file registry, the per-file request
/// scheduler and the dependent-file analyzer.
///
/// The linked analyzer reads the registry through a weak reference, so
/// dropping the pipeline tears everything down.
pub struct AnalysisPipeline {
	manager: Arc<FileStateManager>,
	scheduler: Arc<AnalysisScheduler>,
}

impl AnalysisPipeline {
	pub fn new(services: PipelineServices) -> Self {
		let scheduler = Arc::new(AnalysisScheduler::new(services.analysis));
		let manager = Arc::new_cyclic(|weak: &Weak<FileStateManager>| {
			let registry: Weak<dyn AnalysisStateRegistry> = weak.clone();
			let linked = Arc::new(LinkedFileAnalyzer::new(services.workspace, services.reference_finder, registry));
			let context = Arc::new(LiveAnalysisContext {
				tracker: services.tracker,
				scheduler: Arc::clone(&scheduler),
				linked,
				intervals: services.intervals,
			});
			FileStateManager::new(Arc::new(DefaultLiveAnalysisStateFactory::new(context, services.debouncers)))
		});
		Self { manager, scheduler }
	}

	pub fn manager(&self) -> &Arc<FileStateManager> {
		&self.manager
	}

	pub fn scheduler(&self) -> &Arc<AnalysisScheduler> {
		&self.scheduler
	}

	/// Disposes every open file and cancels in-flight requests.
	pub fn shutdown(&self) {
		self.manager.dispose_all();
		self.scheduler.cancel_all();
		tracing::debug!("analysis.pipeline.shutdown");
	}
}

impl Drop for AnalysisPipeline {
	fn drop(&mut self) {
		self.shutdown();
	}
}
