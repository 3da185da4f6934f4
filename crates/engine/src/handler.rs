//! Runs one engine instance at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sloop_worker::{CancellationToken, GenerationClock, TaskClass};

use crate::instance::{SlCoreInstance, SlCoreInstanceFactory};
use crate::scope::ConfigScopeTracker;
use crate::thread::ThreadGuard;
use crate::{Error, Result};

/// Starts engine instances and holds the single live one.
pub struct SlCoreInstanceHandler {
	factory: Arc<dyn SlCoreInstanceFactory>,
	scope: Arc<dyn ConfigScopeTracker>,
	guard: ThreadGuard,
	starts: GenerationClock,
	current: Mutex<Option<Arc<dyn SlCoreInstance>>>,
	disposed: AtomicBool,
	shutdown: CancellationToken,
}

impl SlCoreInstanceHandler {
	pub fn new(factory: Arc<dyn SlCoreInstanceFactory>, scope: Arc<dyn ConfigScopeTracker>, guard: ThreadGuard) -> Self {
		Self {
			factory,
			scope,
			guard,
			starts: GenerationClock::new(),
			current: Mutex::new(None),
			disposed: AtomicBool::new(false),
			shutdown: CancellationToken::new(),
		}
	}

	/// Number of launch attempts so far, including failed ones.
	pub fn current_start_number(&self) -> u64 {
		self.starts.current()
	}

	pub fn has_running_instance(&self) -> bool {
		self.current.lock().is_some()
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed.load(Ordering::Acquire)
	}

	/// Launches an instance and waits for the whole of its lifetime.
	///
	/// A factory failure is logged and reported as success so the restart
	/// loop can try again. Starting on the UI thread or while another
	/// instance is live is an error.
	pub async fn start_instance(&self) -> Result<()> {
		self.guard.ensure_not_ui_thread()?;
		self.ensure_startable()?;

		let attempt = self.starts.next();
		let instance = match self.factory.create_instance() {
			Ok(instance) => instance,
			Err(err) => {
				tracing::warn!(attempt, error = %err, "engine.instance.create_failed");
				return Ok(());
			}
		};

		// Another start may have won the slot while the factory ran.
		let installed = {
			let mut current = self.current.lock();
			let verdict = self.startable_with(current.is_some());
			if verdict.is_ok() {
				*current = Some(Arc::clone(&instance));
			}
			verdict
		};
		if let Err(err) = installed {
			instance.dispose().await;
			return Err(err);
		}

		tracing::info!(attempt, "engine.instance.starting");
		match instance.initialize(&self.shutdown.child_token()).await {
			Ok(()) => {
				instance.shutdown_completed().await;
				tracing::info!(attempt, "engine.instance.exit");
			}
			Err(err) => tracing::warn!(attempt, error = %err, "engine.instance.initialize_failed"),
		}

		instance.dispose().await;
		{
			let mut current = self.current.lock();
			if current.as_ref().is_some_and(|live| Arc::ptr_eq(live, &instance)) {
				*current = None;
			}
		}
		self.scope.reset();
		Ok(())
	}

	fn ensure_startable(&self) -> Result<()> {
		let occupied = self.current.lock().is_some();
		self.startable_with(occupied)
	}

	fn startable_with(&self, occupied: bool) -> Result<()> {
		if self.is_disposed() {
			return Err(Error::Disposed);
		}
		if occupied {
			return Err(Error::InstanceAlreadyRunning);
		}
		Ok(())
	}

	/// Stops the live instance, if any, and refuses later starts. Idempotent.
	pub fn dispose(&self) {
		if self.disposed.swap(true, Ordering::AcqRel) {
			return;
		}
		self.shutdown.cancel();
		let live = self.current.lock().clone();
		if let Some(instance) = live {
			sloop_worker::spawn(TaskClass::Supervisor, async move { instance.dispose().await });
		}
		tracing::debug!("engine.handler.disposed");
	}
}
