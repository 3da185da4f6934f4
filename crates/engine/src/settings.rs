use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the engine process is launched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
	/// Engine executable, or the engine jar when `java` is set.
	pub executable: PathBuf,
	/// Java runtime used to run `executable` as a jar.
	pub java: Option<PathBuf>,
	pub args: Vec<String>,
	pub env: BTreeMap<String, String>,
}

/// Capabilities advertised to the engine during initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
	pub manage_smart_notifications: bool,
	pub security_hotspots: bool,
	pub manage_server_sent_events: bool,
	pub data_flow_bug_detection: bool,
	pub full_synchronization: bool,
	pub telemetry: bool,
}

impl Default for FeatureFlags {
	fn default() -> Self {
		Self {
			manage_smart_notifications: true,
			security_hotspots: true,
			manage_server_sent_events: true,
			data_flow_bug_detection: false,
			full_synchronization: true,
			telemetry: false,
		}
	}
}

/// A server connection the engine should know about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
	pub id: String,
	/// Self-hosted server URL; `None` for a cloud connection.
	pub server_url: Option<String>,
	/// Cloud organization key.
	pub organization: Option<String>,
	pub disable_notifications: bool,
}

/// Engine launch and initialization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SloopSettings {
	pub launch: LaunchSettings,
	pub storage_root: PathBuf,
	pub work_dir: PathBuf,
	/// Languages analyzed in standalone mode and when connected.
	pub enabled_languages: Vec<String>,
	/// Languages the engine knows but only analyzes when connected.
	pub extra_connected_languages: Vec<String>,
	/// Languages excluded from analysis even if enabled.
	pub disabled_languages: Vec<String>,
	pub features: FeatureFlags,
	pub connections: Vec<ConnectionSettings>,
	/// Plugin key to jar path.
	pub embedded_plugins: BTreeMap<String, PathBuf>,
	/// Automatic starts allowed before the user has to restart manually.
	pub max_starts_before_user_notification: u64,
	/// Grace period for the `shutdown` request on disposal.
	pub shutdown_timeout_ms: u64,
}

impl SloopSettings {
	pub const fn shutdown_timeout(&self) -> Duration {
		Duration::from_millis(self.shutdown_timeout_ms)
	}
}

impl Default for SloopSettings {
	fn default() -> Self {
		Self {
			launch: LaunchSettings::default(),
			storage_root: PathBuf::new(),
			work_dir: PathBuf::new(),
			enabled_languages: ["JS", "TS", "CSS", "HTML", "SECRETS", "C", "CPP", "CS", "VBNET"]
				.into_iter()
				.map(String::from)
				.collect(),
			extra_connected_languages: Vec::new(),
			disabled_languages: Vec::new(),
			features: FeatureFlags::default(),
			connections: Vec::new(),
			embedded_plugins: BTreeMap::new(),
			max_starts_before_user_notification: 2,
			shutdown_timeout_ms: 2000,
		}
	}
}
