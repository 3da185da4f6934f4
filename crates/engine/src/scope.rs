use parking_lot::RwLock;

/// The project context the engine is currently working in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigScope {
	pub id: String,
	pub connection_id: Option<String>,
	pub project_key: Option<String>,
}

/// Holds the active configuration scope. Cleared whenever the engine restarts,
/// since a fresh process knows no scopes.
pub trait ConfigScopeTracker: Send + Sync {
	fn current(&self) -> Option<ConfigScope>;
	fn set_current(&self, scope: ConfigScope);
	fn reset(&self);
}

#[derive(Debug, Default)]
pub struct InMemoryConfigScopeTracker {
	current: RwLock<Option<ConfigScope>>,
}

impl InMemoryConfigScopeTracker {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ConfigScopeTracker for InMemoryConfigScopeTracker {
	fn current(&self) -> Option<ConfigScope> {
		self.current.read().clone()
	}

	fn set_current(&self, scope: ConfigScope) {
		tracing::debug!(scope = %scope.id, "engine.scope.set");
		*self.current.write() = Some(scope);
	}

	fn reset(&self) {
		if self.current.write().take().is_some() {
			tracing::debug!("engine.scope.reset");
		}
	}
}
