//! Open file identity, detected languages and content snapshots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;
use sloop_worker::PathKey;

use crate::error::{AnalysisError, Result};
use crate::language::AnalysisLanguage;

/// Supplies the current text of a file.
pub trait ContentSource: Send + Sync {
	fn read(&self, path: &Path) -> Result<String>;
}

/// Reads content straight from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsContentSource;

impl ContentSource for FsContentSource {
	fn read(&self, path: &Path) -> Result<String> {
		std::fs::read_to_string(path).map_err(|source| AnalysisError::Read {
			path: path.to_path_buf(),
			source,
		})
	}
}

/// Editor buffer contents keyed by path, falling back to disk for files
/// without a buffer.
#[derive(Default)]
pub struct BufferContentSource {
	buffers: RwLock<HashMap<PathKey, String>>,
}

impl BufferContentSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the buffer text for `path`.
	pub fn set(&self, path: &Path, text: impl Into<String>) {
		self.buffers.write().insert(PathKey::from(path), text.into());
	}

	/// Drops the buffer for `path`; later reads go to disk.
	pub fn remove(&self, path: &Path) {
		self.buffers.write().remove(&PathKey::from(path));
	}
}

impl ContentSource for BufferContentSource {
	fn read(&self, path: &Path) -> Result<String> {
		if let Some(text) = self.buffers.read().get(&PathKey::from(path)) {
			return Ok(text.clone());
		}
		FsContentSource.read(path)
	}
}

/// Immutable text of a file at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
	pub path: PathBuf,
	pub content: Arc<str>,
}

/// An open file: path, detected languages and latest snapshot.
pub struct FileState {
	path: PathBuf,
	key: PathKey,
	languages: IndexSet<AnalysisLanguage>,
	snapshot: RwLock<Option<FileSnapshot>>,
	source: Arc<dyn ContentSource>,
}

impl FileState {
	pub fn new(path: impl Into<PathBuf>, languages: IndexSet<AnalysisLanguage>, source: Arc<dyn ContentSource>) -> Self {
		let path = path.into();
		let key = PathKey::from(path.as_path());
		Self {
			path,
			key,
			languages,
			snapshot: RwLock::new(None),
			source,
		}
	}

	/// Creates a state with languages detected from the file extension.
	pub fn detect(path: impl Into<PathBuf>, source: Arc<dyn ContentSource>) -> Self {
		let path = path.into();
		let languages = AnalysisLanguage::detect(&path);
		Self::new(path, languages, source)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Case-insensitive identity of this file.
	pub fn key(&self) -> &PathKey {
		&self.key
	}

	pub fn languages(&self) -> &IndexSet<AnalysisLanguage> {
		&self.languages
	}

	/// Most recent snapshot, if one was taken.
	pub fn snapshot(&self) -> Option<FileSnapshot> {
		self.snapshot.read().clone()
	}

	/// Reads the current content and stores it as the latest snapshot.
	pub fn refresh_snapshot(&self) -> Result<FileSnapshot> {
		let content = self.source.read(&self.path)?;
		let snapshot = FileSnapshot {
			path: self.path.clone(),
			content: Arc::from(content),
		};
		*self.snapshot.write() = Some(snapshot.clone());
		Ok(snapshot)
	}
}

impl std::fmt::Debug for FileState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FileState")
			.field("path", &self.path)
			.field("languages", &self.languages)
			.finish_non_exhaustive()
	}
}
