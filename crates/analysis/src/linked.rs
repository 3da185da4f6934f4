//! Re-analysis of open files that depend on a changed file.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use sloop_worker::{CancellationToken, PathKey, panic_message};

use crate::error::{AnalysisError, Result};
use crate::file_state::FileState;
use crate::live::{LinkedFileScheduler, LiveAnalysisState};
use crate::manager::AnalysisStateRegistry;

/// A document inside a project of the current solution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle {
	pub project: String,
	pub path: PathBuf,
}

/// A project and the documents it compiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
	pub name: String,
	pub documents: Vec<PathBuf>,
}

/// Immutable view of the loaded projects.
pub trait Solution: Send + Sync {
	fn projects(&self) -> Vec<ProjectInfo>;

	/// First document whose path matches `path`, ignoring case.
	fn find_document(&self, path: &Path) -> Option<DocumentHandle> {
		let wanted = PathKey::from(path);
		self.projects().into_iter().find_map(|project| {
			project
				.documents
				.into_iter()
				.find(|doc| PathKey::from(doc.as_path()) == wanted)
				.map(|path| DocumentHandle {
					project: project.name.clone(),
					path,
				})
		})
	}
}

/// Source of the current solution snapshot.
pub trait Workspace: Send + Sync {
	fn current_solution(&self) -> Result<Arc<dyn Solution>>;
}

/// Finds which `candidates` reference symbols declared in `source`.
///
/// The result must be a subset of `candidates`.
pub trait ReferenceFinder: Send + Sync {
	fn find_linked_documents(
		&self,
		source: &DocumentHandle,
		candidates: &[DocumentHandle],
		solution: &dyn Solution,
		token: &CancellationToken,
	) -> Result<Vec<DocumentHandle>>;
}

/// Triggers analysis of open, idle files that reference a changed file.
pub struct LinkedFileAnalyzer {
	workspace: Arc<dyn Workspace>,
	finder: Arc<dyn ReferenceFinder>,
	registry: Weak<dyn AnalysisStateRegistry>,
}

impl LinkedFileAnalyzer {
	pub fn new(workspace: Arc<dyn Workspace>, finder: Arc<dyn ReferenceFinder>, registry: Weak<dyn AnalysisStateRegistry>) -> Self {
		Self {
			workspace,
			finder,
			registry,
		}
	}

	/// Returns the number of dependents that were re-triggered.
	fn trigger_dependents(&self, file: &FileState, token: &CancellationToken) -> Result<usize> {
		let solution = self.workspace.current_solution()?;
		let Some(source) = solution.find_document(file.path()) else {
			tracing::trace!(path = %file.path().display(), "analysis.linked.not_in_solution");
			return Ok(0);
		};
		let Some(registry) = self.registry.upgrade() else {
			return Ok(0);
		};

		let mut candidates: IndexMap<PathKey, (DocumentHandle, Arc<LiveAnalysisState>)> = IndexMap::new();
		for state in registry.all_states() {
			if state.key() == file.key() || !state.is_waiting() {
				continue;
			}
			if let Some(doc) = solution.find_document(state.file().path()) {
				candidates.insert(state.key().clone(), (doc, state));
			}
		}
		if candidates.is_empty() {
			return Ok(0);
		}
		if token.is_cancelled() {
			return Err(AnalysisError::Cancelled);
		}

		let docs: Vec<DocumentHandle> = candidates.values().map(|(doc, _)| doc.clone()).collect();
		let linked = self.finder.find_linked_documents(&source, &docs, solution.as_ref(), token)?;

		let mut triggered = 0;
		for doc in linked {
			if let Some((_, state)) = candidates.shift_remove(&PathKey::from(doc.path.as_path())) {
				state.handle_live_analysis_event(false);
				triggered += 1;
			}
		}
		Ok(triggered)
	}
}

impl LinkedFileScheduler for LinkedFileAnalyzer {
	fn schedule_linked_analysis(&self, file: &FileState, token: &CancellationToken) {
		let outcome = catch_unwind(AssertUnwindSafe(|| self.trigger_dependents(file, token)));
		let path = file.path().display();
		match outcome {
			Ok(Ok(triggered)) => tracing::debug!(path = %path, triggered, "analysis.linked.done"),
			Ok(Err(AnalysisError::Cancelled)) => tracing::trace!(path = %path, "analysis.linked.cancelled"),
			Ok(Err(err)) => tracing::warn!(path = %path, error = %err, "analysis.linked.failed"),
			Err(payload) => tracing::warn!(path = %path, panic = %panic_message(payload.as_ref()), "analysis.linked.panicked"),
		}
	}
}
