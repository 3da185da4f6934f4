//! Scriptable engine instances for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sloop_worker::CancellationToken;

use crate::instance::{SlCoreInstance, SlCoreInstanceFactory};
use crate::{Error, Result};

pub const WAIT: Duration = Duration::from_secs(5);

/// Instance that stays "running" until disposed or told to exit.
#[derive(Default)]
pub struct FakeInstance {
	pub fail_initialize: bool,
	pub exit: CancellationToken,
	pub initialized: CancellationToken,
	pub disposals: AtomicUsize,
}

#[async_trait]
impl SlCoreInstance for FakeInstance {
	async fn initialize(&self, _token: &CancellationToken) -> Result<()> {
		if self.fail_initialize {
			return Err(Error::Protocol("handshake rejected".into()));
		}
		self.initialized.cancel();
		Ok(())
	}

	async fn shutdown_completed(&self) {
		self.exit.cancelled().await;
	}

	async fn dispose(&self) {
		self.disposals.fetch_add(1, Ordering::SeqCst);
		self.exit.cancel();
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryMode {
	/// Every creation fails.
	Fail,
	/// Instances run until disposed.
	LongLived,
	/// Instances exit right after initializing.
	Crashing,
}

pub struct FakeFactory {
	mode: FactoryMode,
	pub attempts: AtomicUsize,
	pub created: Mutex<Vec<Arc<FakeInstance>>>,
}

impl FakeFactory {
	pub fn new(mode: FactoryMode) -> Arc<Self> {
		Arc::new(Self {
			mode,
			attempts: AtomicUsize::new(0),
			created: Mutex::new(Vec::new()),
		})
	}

	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}

	pub fn instance(&self, index: usize) -> Arc<FakeInstance> {
		Arc::clone(&self.created.lock()[index])
	}
}

impl SlCoreInstanceFactory for FakeFactory {
	fn create_instance(&self) -> Result<Arc<dyn SlCoreInstance>> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		let instance = match self.mode {
			FactoryMode::Fail => {
				return Err(Error::Spawn {
					command: "sloop".into(),
					reason: "binary missing".into(),
				});
			}
			FactoryMode::LongLived => Arc::new(FakeInstance::default()),
			FactoryMode::Crashing => {
				let instance = FakeInstance::default();
				instance.exit.cancel();
				Arc::new(instance)
			}
		};
		self.created.lock().push(Arc::clone(&instance));
		Ok(instance as Arc<dyn SlCoreInstance>)
	}
}

/// Polls `condition` until it holds or [`WAIT`] passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
	let deadline = tokio::time::Instant::now() + WAIT;
	while tokio::time::Instant::now() < deadline {
		if condition() {
			return true;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
	condition()
}
