use std::io;

use crate::rpc::ResponseError;

/// A convenient type alias for `Result` with `E` = [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors from the engine lifecycle.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The engine process could not be started.
	#[error("failed to spawn engine `{command}`: {reason}")]
	Spawn { command: String, reason: String },
	/// The RPC channel stopped before a reply arrived.
	#[error("engine channel stopped")]
	ChannelStopped,
	/// The engine replied with an error.
	#[error("{0}")]
	Response(#[from] ResponseError),
	/// The engine violated the framing or message protocol.
	#[error("protocol error: {0}")]
	Protocol(String),
	/// Undecodable payload.
	#[error("deserialization failed: {0}")]
	Deserialize(#[from] serde_json::Error),
	/// Input/output errors from the process pipes.
	#[error("{0}")]
	Io(#[from] io::Error),
	/// The operation was cancelled.
	#[error("operation cancelled")]
	Cancelled,
	/// The instance or handler has been disposed.
	#[error("disposed")]
	Disposed,
	/// A second instance was started while one is still running.
	#[error("an engine instance is already running")]
	InstanceAlreadyRunning,
	/// A blocking engine operation was started on the UI thread.
	#[error("engine operations must not run on the UI thread")]
	OnUiThread,
}

impl Error {
	/// True for errors that indicate a defect in the caller rather than a
	/// failure of the engine.
	pub fn is_contract_violation(&self) -> bool {
		matches!(self, Self::InstanceAlreadyRunning | Self::OnUiThread)
	}
}
