//! Sloop engine host.
//!
//! Loads `sloop.toml`, launches the analysis engine and keeps it running
//! under the restart supervisor until interrupted.

mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sloop_engine::{
	ClientConstants, DefaultSlCoreInstanceFactory, InMemoryConfigScopeTracker, LoggingRestartNotifier, ProcessRpcFactory, SlCoreHandler,
	SlCoreInstanceHandler, ThreadGuard,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::settings::HostSettings;

/// Host command line arguments.
#[derive(Parser, Debug)]
#[command(name = "sloop")]
#[command(about = "Run and supervise the sloop analysis engine")]
struct Args {
	/// Settings file (defaults to `<config dir>/sloop/sloop.toml`)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Engine executable or jar, overriding the settings file
	#[arg(long, value_name = "PATH")]
	engine: Option<PathBuf>,

	/// Java runtime used to run the engine jar
	#[arg(long, value_name = "PATH")]
	java: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let fallback = if args.verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let config_path = args.config.or_else(settings::default_path);
	let mut settings = match &config_path {
		Some(path) => HostSettings::load(path)?,
		None => HostSettings::default(),
	};
	if let Some(engine) = args.engine {
		settings.engine.launch.executable = engine;
	}
	if let Some(java) = args.java {
		settings.engine.launch.java = Some(java);
	}
	if settings.engine.launch.executable.as_os_str().is_empty() {
		anyhow::bail!("no engine executable configured; set engine.launch.executable or pass --engine");
	}

	info!(
		config = ?config_path,
		engine = %settings.engine.launch.executable.display(),
		max_starts = settings.engine.max_starts_before_user_notification,
		"host.start"
	);

	let engine_settings = Arc::new(settings.engine);
	let rpc_factory = Arc::new(ProcessRpcFactory::new(engine_settings.launch.clone()));
	let instances = Arc::new(SlCoreInstanceHandler::new(
		Arc::new(DefaultSlCoreInstanceFactory::new(rpc_factory, Arc::clone(&engine_settings), ClientConstants::default())),
		Arc::new(InMemoryConfigScopeTracker::new()),
		ThreadGuard::unrestricted(),
	));
	let supervisor = SlCoreHandler::new(
		instances,
		Arc::new(LoggingRestartNotifier),
		engine_settings.max_starts_before_user_notification,
	);

	let Some(mut restart_loop) = supervisor.enable_sloop() else {
		anyhow::bail!("engine supervisor did not start");
	};

	tokio::select! {
		signal = tokio::signal::ctrl_c() => {
			signal?;
			info!("host.interrupted");
		}
		outcome = &mut restart_loop => {
			outcome??;
			info!("host.supervisor_stopped");
		}
	}

	supervisor.dispose();
	Ok(())
}
