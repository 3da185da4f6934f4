//! One engine process from launch to exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sloop_worker::CancellationToken;
use tokio::sync::watch;

use crate::params::{ClientConstants, InitializeParams};
use crate::rpc::{SlCoreRpc, SlCoreRpcFactory};
use crate::settings::SloopSettings;
use crate::{Error, Result};

/// Instance lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
	/// Constructed, nothing launched yet.
	Created,
	/// Process launched, handshake in progress.
	Initializing,
	/// Handshake complete.
	Running,
	/// Exited, failed or disposed.
	Dead,
}

/// An engine instance as seen by the restart loop.
#[async_trait]
pub trait SlCoreInstance: Send + Sync {
	/// Launches the engine and performs the handshake.
	async fn initialize(&self, token: &CancellationToken) -> Result<()>;

	/// Resolves when the engine has stopped.
	async fn shutdown_completed(&self);

	/// Stops the engine. Idempotent.
	async fn dispose(&self);
}

/// Creates engine instances.
pub trait SlCoreInstanceFactory: Send + Sync {
	fn create_instance(&self) -> Result<Arc<dyn SlCoreInstance>>;
}

/// [`SlCoreInstance`] backed by an [`SlCoreRpcFactory`].
pub struct SlCoreInstanceHandle {
	rpc_factory: Arc<dyn SlCoreRpcFactory>,
	settings: Arc<SloopSettings>,
	client: ClientConstants,
	state: watch::Sender<InstanceState>,
	rpc: Mutex<Option<Arc<dyn SlCoreRpc>>>,
	disposed: AtomicBool,
}

impl SlCoreInstanceHandle {
	pub fn new(rpc_factory: Arc<dyn SlCoreRpcFactory>, settings: Arc<SloopSettings>, client: ClientConstants) -> Self {
		Self {
			rpc_factory,
			settings,
			client,
			state: watch::Sender::new(InstanceState::Created),
			rpc: Mutex::new(None),
			disposed: AtomicBool::new(false),
		}
	}

	pub fn state(&self) -> InstanceState {
		*self.state.borrow()
	}

	pub fn subscribe_state(&self) -> watch::Receiver<InstanceState> {
		self.state.subscribe()
	}

	async fn launch_and_handshake(&self, token: &CancellationToken) -> Result<()> {
		let rpc = tokio::select! {
			biased;
			() = token.cancelled() => return Err(Error::Cancelled),
			rpc = self.rpc_factory.launch() => rpc?,
		};
		{
			let mut slot = self.rpc.lock();
			if self.disposed.load(Ordering::Acquire) {
				rpc.kill();
				return Err(Error::Disposed);
			}
			*slot = Some(Arc::clone(&rpc));
		}

		let params = InitializeParams::from_settings(&self.settings, self.client.clone());
		rpc.initialize(&params, token).await
	}
}

#[async_trait]
impl SlCoreInstance for SlCoreInstanceHandle {
	async fn initialize(&self, token: &CancellationToken) -> Result<()> {
		if self.disposed.load(Ordering::Acquire) {
			return Err(Error::Disposed);
		}
		self.state.send_replace(InstanceState::Initializing);

		match self.launch_and_handshake(token).await {
			Ok(()) => {
				self.state.send_replace(InstanceState::Running);
				tracing::info!("engine.instance.initialized");
				Ok(())
			}
			Err(err) => {
				self.state.send_replace(InstanceState::Dead);
				Err(err)
			}
		}
	}

	async fn shutdown_completed(&self) {
		let rpc = self.rpc.lock().clone();
		if let Some(rpc) = rpc {
			rpc.exited().await;
		}
		self.state.send_replace(InstanceState::Dead);
	}

	async fn dispose(&self) {
		if self.disposed.swap(true, Ordering::AcqRel) {
			return;
		}
		let rpc = self.rpc.lock().take();
		if let Some(rpc) = rpc {
			match tokio::time::timeout(self.settings.shutdown_timeout(), rpc.shutdown()).await {
				Ok(Ok(())) => tracing::debug!("engine.instance.shutdown_acknowledged"),
				Ok(Err(err)) => tracing::debug!(error = %err, "engine.instance.shutdown_failed"),
				Err(_) => tracing::debug!("engine.instance.shutdown_timed_out"),
			}
			rpc.kill();
		}
		self.state.send_replace(InstanceState::Dead);
		tracing::info!("engine.instance.disposed");
	}
}

impl Drop for SlCoreInstanceHandle {
	fn drop(&mut self) {
		if let Some(rpc) = self.rpc.get_mut().take() {
			rpc.kill();
		}
	}
}

/// Builds [`SlCoreInstanceHandle`]s sharing one launcher and settings.
pub struct DefaultSlCoreInstanceFactory {
	rpc_factory: Arc<dyn SlCoreRpcFactory>,
	settings: Arc<SloopSettings>,
	client: ClientConstants,
}

impl DefaultSlCoreInstanceFactory {
	pub fn new(rpc_factory: Arc<dyn SlCoreRpcFactory>, settings: Arc<SloopSettings>, client: ClientConstants) -> Self {
		Self {
			rpc_factory,
			settings,
			client,
		}
	}
}

impl SlCoreInstanceFactory for DefaultSlCoreInstanceFactory {
	fn create_instance(&self) -> Result<Arc<dyn SlCoreInstance>> {
		Ok(Arc::new(SlCoreInstanceHandle::new(
			Arc::clone(&self.rpc_factory),
			Arc::clone(&self.settings),
			self.client.clone(),
		)))
	}
}
