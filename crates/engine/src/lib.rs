//! Supervision of the out-of-process analysis engine.
//!
//! The engine is a separate process speaking `Content-Length`-framed JSON-RPC
//! over stdio. [`SlCoreInstanceHandle`] drives one process through launch,
//! handshake and exit; [`SlCoreInstanceHandler`] keeps at most one of them
//! alive; [`SlCoreHandler`] restarts it when it dies, within a bounded budget
//! after which the user has to restart it by hand.

mod error;
mod handler;
pub mod instance;
pub mod params;
pub mod rpc;
mod scope;
mod settings;
mod supervisor;
mod thread;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use handler::SlCoreInstanceHandler;
pub use instance::{DefaultSlCoreInstanceFactory, InstanceState, SlCoreInstance, SlCoreInstanceFactory, SlCoreInstanceHandle};
pub use params::{ClientConstants, InitializeParams};
pub use rpc::{ProcessRpcFactory, SlCoreRpc, SlCoreRpcFactory};
pub use scope::{ConfigScope, ConfigScopeTracker, InMemoryConfigScopeTracker};
pub use settings::{ConnectionSettings, FeatureFlags, LaunchSettings, SloopSettings};
pub use supervisor::{LoggingRestartNotifier, RestartAction, RestartNotifier, SlCoreHandler};
pub use thread::ThreadGuard;
