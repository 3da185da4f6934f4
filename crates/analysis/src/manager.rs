//! Registry of live analysis states for every open file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;
use sloop_worker::PathKey;

use crate::file_state::FileState;
use crate::language::AnalysisLanguage;
use crate::live::{LiveAnalysisState, LiveAnalysisStateFactory};

/// Read access to the live states of all open files.
pub trait AnalysisStateRegistry: Send + Sync {
	fn all_states(&self) -> Vec<Arc<LiveAnalysisState>>;
}

/// Path and languages of one open file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDocument {
	pub path: PathBuf,
	pub languages: IndexSet<AnalysisLanguage>,
}

/// Tracks open files and forwards document lifecycle events to their
/// live analysis state.
///
/// The map holds at most one state per case-insensitive path. Triggers run
/// outside the map lock.
pub struct FileStateManager {
	states: RwLock<HashMap<PathKey, Arc<LiveAnalysisState>>>,
	factory: Arc<dyn LiveAnalysisStateFactory>,
}

impl FileStateManager {
	pub fn new(factory: Arc<dyn LiveAnalysisStateFactory>) -> Self {
		Self {
			states: RwLock::new(HashMap::new()),
			factory,
		}
	}

	/// Registers a newly opened file and schedules its first analysis.
	///
	/// Re-opening a tracked path replaces and disposes the previous state.
	pub fn opened(&self, file: Arc<FileState>) {
		let key = file.key().clone();
		let state = self.factory.create(file);
		let previous = self.states.write().insert(key.clone(), Arc::clone(&state));
		if let Some(previous) = previous {
			tracing::debug!(path = %key, "analysis.manager.reopened");
			previous.dispose();
		}
		state.handle_live_analysis_event(false);
	}

	/// Forgets a closed file. Unknown paths are ignored.
	pub fn closed(&self, path: &Path) {
		let removed = self.states.write().remove(&PathKey::from(path));
		match removed {
			Some(state) => state.dispose(),
			None => tracing::trace!(path = %path.display(), "analysis.manager.close_unknown"),
		}
	}

	/// Moves tracking from `old_path` to `file` and schedules a significant
	/// re-analysis under the new path.
	pub fn renamed(&self, old_path: &Path, file: Arc<FileState>) {
		let key = file.key().clone();
		let state = self.factory.create(file);
		let replaced = {
			let mut states = self.states.write();
			let old = states.remove(&PathKey::from(old_path));
			let clobbered = states.insert(key, Arc::clone(&state));
			[old, clobbered]
		};
		for previous in replaced.into_iter().flatten() {
			previous.dispose();
		}
		state.handle_live_analysis_event(true);
	}

	/// A save is a significant change; unknown paths are ignored.
	pub fn content_saved(&self, path: &Path) {
		match self.state(path) {
			Some(state) => state.handle_live_analysis_event(true),
			None => tracing::trace!(path = %path.display(), "analysis.manager.save_unknown"),
		}
	}

	/// An edit to `file`, registering it first if it is not tracked yet.
	pub fn content_changed(&self, file: Arc<FileState>) {
		let state = {
			let mut states = self.states.write();
			let factory = &self.factory;
			Arc::clone(states.entry(file.key().clone()).or_insert_with(|| factory.create(file)))
		};
		state.handle_live_analysis_event(true);
	}

	/// Requests a background re-analysis of every open file.
	pub fn analyze_all_open_files(&self) {
		let states = self.all_states();
		tracing::debug!(count = states.len(), "analysis.manager.analyze_all");
		for state in states {
			state.handle_background_analysis_event();
		}
	}

	/// The live state for `path`, if the file is open.
	pub fn state(&self, path: &Path) -> Option<Arc<LiveAnalysisState>> {
		self.states.read().get(&PathKey::from(path)).cloned()
	}

	pub fn open_documents(&self) -> Vec<OpenDocument> {
		self.states
			.read()
			.values()
			.map(|state| OpenDocument {
				path: state.file().path().to_path_buf(),
				languages: state.file().languages().clone(),
			})
			.collect()
	}

	pub fn all_states(&self) -> Vec<Arc<LiveAnalysisState>> {
		self.states.read().values().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.states.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Disposes and forgets every state.
	pub fn dispose_all(&self) {
		let drained: Vec<_> = self.states.write().drain().map(|(_, state)| state).collect();
		for state in drained {
			state.dispose();
		}
	}
}

impl AnalysisStateRegistry for FileStateManager {
	fn all_states(&self) -> Vec<Arc<LiveAnalysisState>> {
		FileStateManager::all_states(self)
	}
}
