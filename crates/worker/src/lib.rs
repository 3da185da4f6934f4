//! Runtime primitives for live analysis.
//!
//! * [`ResettableOneShotTimer`]: restartable single-fire timer.
//! * [`TaskExecutorWithDebounce`]: single-slot debounced executor built on the timer.
//! * [`Scheduler`]: per-key single-flight cancellation.
//! * [`CancellableJobRunner`]: sequential multi-step jobs with progress and cooperative cancellation.
//! * [`GenerationClock`]: shared monotonic counter.
//!
//! Work is spawned through [`spawn`] and [`spawn_blocking`], which fall back to
//! a shared runtime when called from threads Tokio does not drive.

mod class;
pub mod debounce;
pub mod job;
mod panic;
pub mod scheduler;
mod spawn;
pub mod timer;
mod token;

pub use class::TaskClass;
pub use debounce::{DebouncedAction, Debouncer, DebouncerFactory, TaskExecutorWithDebounce, TaskExecutorWithDebounceFactory};
pub use job::{CancellableJobRunner, JobOperation, JobProgress, JobState, ProgressSink};
pub use panic::panic_message;
pub use scheduler::{PathKey, Scheduler};
pub use spawn::{runtime_handle, spawn, spawn_blocking};
pub use timer::ResettableOneShotTimer;
pub use token::GenerationClock;
pub use tokio_util::sync::CancellationToken;
