//! Live analysis of open files.
//!
//! Document lifecycle events enter through [`FileStateManager`], which keeps
//! one [`LiveAnalysisState`] per open file. Edits are debounced into single
//! analysis requests, issued through [`AnalysisScheduler`] so a newer request
//! for a file cancels the older one. Significant changes (saves, renames)
//! additionally ask [`LinkedFileAnalyzer`] to re-analyze idle open files that
//! reference the changed one.
//!
//! [`AnalysisPipeline`] wires all of the above from a set of
//! [`PipelineServices`].

mod error;
mod file_state;
mod language;
pub mod linked;
pub mod live;
pub mod manager;
mod pipeline;
pub mod scheduler;
mod settings;

#[cfg(test)]
mod test_support;

pub use error::{AnalysisError, Result};
pub use file_state::{BufferContentSource, ContentSource, FileSnapshot, FileState, FsContentSource};
pub use language::AnalysisLanguage;
pub use linked::{DocumentHandle, LinkedFileAnalyzer, ProjectInfo, ReferenceFinder, Solution, Workspace};
pub use live::{DefaultLiveAnalysisStateFactory, FileTracker, LinkedFileScheduler, LiveAnalysisContext, LiveAnalysisState, LiveAnalysisStateFactory};
pub use manager::{AnalysisStateRegistry, FileStateManager, OpenDocument};
pub use pipeline::{AnalysisPipeline, PipelineServices};
pub use scheduler::{AnalysisScheduler, AnalysisService};
pub use settings::DebounceIntervals;
