//! Engine connection over a child process's stdio.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sloop_worker::{CancellationToken, TaskClass};
use tokio::io::AsyncBufReadExt;
use tokio::process::{Child, Command};
use tokio::sync::watch;

use super::channel::RpcChannel;
use crate::params::InitializeParams;
use crate::settings::LaunchSettings;
use crate::{Error, Result};

/// A live connection to one engine process.
#[async_trait]
pub trait SlCoreRpc: Send + Sync {
	/// Performs the `initialize` handshake.
	async fn initialize(&self, params: &InitializeParams, token: &CancellationToken) -> Result<()>;

	/// Asks the engine to shut down gracefully.
	async fn shutdown(&self) -> Result<()>;

	/// Resolves once the engine process has exited.
	async fn exited(&self);

	/// Terminates the process without waiting.
	fn kill(&self);
}

/// Launches engine processes.
#[async_trait]
pub trait SlCoreRpcFactory: Send + Sync {
	async fn launch(&self) -> Result<Arc<dyn SlCoreRpc>>;
}

/// Launches the engine described by [`LaunchSettings`].
#[derive(Debug, Clone)]
pub struct ProcessRpcFactory {
	launch: LaunchSettings,
}

impl ProcessRpcFactory {
	pub fn new(launch: LaunchSettings) -> Self {
		Self { launch }
	}

	fn command(&self) -> Command {
		let mut cmd = match &self.launch.java {
			Some(java) => {
				let mut cmd = Command::new(java);
				cmd.arg("-jar").arg(&self.launch.executable);
				cmd
			}
			None => Command::new(&self.launch.executable),
		};
		cmd.args(&self.launch.args)
			.envs(&self.launch.env)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		cmd
	}
}

#[async_trait]
impl SlCoreRpcFactory for ProcessRpcFactory {
	async fn launch(&self) -> Result<Arc<dyn SlCoreRpc>> {
		let program = self.launch.java.as_ref().unwrap_or(&self.launch.executable).display().to_string();
		let child = self.command().spawn().map_err(|err| Error::Spawn {
			command: program.clone(),
			reason: err.to_string(),
		})?;
		tracing::info!(command = %program, pid = child.id(), "engine.process.spawned");
		Ok(Arc::new(ProcessRpc::attach(program, child)?))
	}
}

/// [`SlCoreRpc`] over the stdio of a spawned engine.
pub struct ProcessRpc {
	channel: RpcChannel,
	exited: watch::Receiver<bool>,
	kill: CancellationToken,
}

impl ProcessRpc {
	/// Takes ownership of `child`'s pipes and starts monitoring it.
	pub fn attach(name: String, mut child: Child) -> Result<Self> {
		let missing = |pipe: &str| Error::Spawn {
			command: name.clone(),
			reason: format!("{pipe} was not captured"),
		};
		let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
		let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
		let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

		sloop_worker::spawn(TaskClass::Supervisor, {
			let name = name.clone();
			async move {
				let mut lines = tokio::io::BufReader::new(stderr).lines();
				while let Ok(Some(line)) = lines.next_line().await {
					tracing::warn!(engine = %name, stderr = %line, "engine.process.stderr");
				}
			}
		});

		let (exited_tx, exited) = watch::channel(false);
		let kill = CancellationToken::new();
		sloop_worker::spawn(TaskClass::Supervisor, monitor(name.clone(), child, kill.clone(), exited_tx));

		Ok(Self {
			channel: RpcChannel::spawn(name, stdout, stdin),
			exited,
			kill,
		})
	}
}

async fn monitor(name: String, mut child: Child, kill: CancellationToken, exited: watch::Sender<bool>) {
	tokio::select! {
		status = child.wait() => match status {
			Ok(status) => tracing::info!(engine = %name, ?status, "engine.process.exited"),
			Err(err) => tracing::error!(engine = %name, error = %err, "engine.process.wait_failed"),
		},
		() = kill.cancelled() => {
			if let Err(err) = child.kill().await {
				tracing::warn!(engine = %name, error = %err, "engine.process.kill_failed");
			}
			tracing::info!(engine = %name, "engine.process.killed");
		}
	}
	exited.send_replace(true);
}

#[async_trait]
impl SlCoreRpc for ProcessRpc {
	async fn initialize(&self, params: &InitializeParams, token: &CancellationToken) -> Result<()> {
		let params = serde_json::to_value(params)?;
		tokio::select! {
			biased;
			() = token.cancelled() => Err(Error::Cancelled),
			result = self.channel.request("initialize", params) => result.map(|_| ()),
		}
	}

	async fn shutdown(&self) -> Result<()> {
		self.channel.request("shutdown", JsonValue::Null).await.map(|_| ())
	}

	async fn exited(&self) {
		let mut exited = self.exited.clone();
		let _ = exited.wait_for(|exited| *exited).await;
	}

	fn kill(&self) {
		self.kill.cancel();
	}
}
