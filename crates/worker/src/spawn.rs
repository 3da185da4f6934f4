use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;

use crate::TaskClass;

/// Returns the ambient Tokio handle, or a shared fallback runtime when called
/// from a thread that is not driven by Tokio (IDE event threads, tests).
pub fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static FALLBACK: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	FALLBACK
		.get_or_init(|| {
			tokio::runtime::Builder::new_multi_thread()
				.enable_all()
				.worker_threads(2)
				.thread_name("sloop-worker")
				.build()
				.expect("failed to build sloop-worker fallback runtime")
		})
		.handle()
		.clone()
}

/// Spawns an async task tagged with a task class.
///
/// The task logs to the caller's tracing dispatcher.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut.with_current_subscriber())
}

/// Runs `f` on the blocking pool under the caller's tracing dispatcher.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	let dispatch = tracing::dispatcher::get_default(|current| current.clone());
	runtime_handle().spawn_blocking(move || tracing::dispatcher::with_default(&dispatch, f))
}
