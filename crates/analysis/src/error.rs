use std::io;
use std::path::PathBuf;

/// A convenient type alias for `Result` with `E` = [`AnalysisError`].
pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

/// Failures raised while preparing or running analysis for one file.
///
/// All of these are transient: they are logged at the boundary of the
/// operation that produced them and never reach other files.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AnalysisError {
	/// The file content could not be read.
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	/// The work was superseded or abandoned.
	#[error("analysis cancelled")]
	Cancelled,
	/// The workspace or solution snapshot could not be obtained.
	#[error("workspace unavailable: {0}")]
	Workspace(String),
	/// The reference finder failed.
	#[error("reference search failed: {0}")]
	ReferenceSearch(String),
	/// The analysis engine rejected or failed the request.
	#[error("analysis engine failed: {0}")]
	Engine(String),
}
