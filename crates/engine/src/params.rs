//! Payload of the `initialize` request.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::settings::{ConnectionSettings, FeatureFlags, SloopSettings};

/// Identifies this client to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConstants {
	pub ide_name: String,
	pub user_agent: String,
	pub version: String,
}

impl Default for ClientConstants {
	fn default() -> Self {
		let version = env!("CARGO_PKG_VERSION").to_owned();
		Self {
			ide_name: "sloop".to_owned(),
			user_agent: format!("sloop/{version}"),
			version,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagsDto {
	pub should_manage_smart_notifications: bool,
	pub are_security_hotspots_enabled: bool,
	pub should_manage_server_sent_events: bool,
	pub enable_data_flow_bug_detection: bool,
	pub should_manage_full_synchronization: bool,
	pub enable_telemetry: bool,
}

impl From<&FeatureFlags> for FeatureFlagsDto {
	fn from(flags: &FeatureFlags) -> Self {
		Self {
			should_manage_smart_notifications: flags.manage_smart_notifications,
			are_security_hotspots_enabled: flags.security_hotspots,
			should_manage_server_sent_events: flags.manage_server_sent_events,
			enable_data_flow_bug_detection: flags.data_flow_bug_detection,
			should_manage_full_synchronization: flags.full_synchronization,
			enable_telemetry: flags.telemetry,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConnectionDto {
	pub connection_id: String,
	pub server_url: String,
	pub disable_notification: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudConnectionDto {
	pub connection_id: String,
	pub organization: String,
	pub disable_notification: bool,
}

/// Everything the engine needs before it can serve requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
	pub client_constants: ClientConstants,
	pub feature_flags: FeatureFlagsDto,
	pub storage_root: PathBuf,
	pub work_dir: PathBuf,
	pub embedded_plugin_paths_by_key: BTreeMap<String, PathBuf>,
	pub server_connection_configs: Vec<ServerConnectionDto>,
	pub cloud_connection_configs: Vec<CloudConnectionDto>,
	pub enabled_languages_in_standalone_mode: Vec<String>,
	pub extra_enabled_languages_in_connected_mode: Vec<String>,
	pub disabled_languages_for_analysis: Vec<String>,
	pub is_telemetry_enabled: bool,
}

impl InitializeParams {
	pub fn from_settings(settings: &SloopSettings, client: ClientConstants) -> Self {
		let mut server_connection_configs = Vec::new();
		let mut cloud_connection_configs = Vec::new();
		for connection in &settings.connections {
			split_connection(connection, &mut server_connection_configs, &mut cloud_connection_configs);
		}

		Self {
			client_constants: client,
			feature_flags: FeatureFlagsDto::from(&settings.features),
			storage_root: settings.storage_root.clone(),
			work_dir: settings.work_dir.clone(),
			embedded_plugin_paths_by_key: settings.embedded_plugins.clone(),
			server_connection_configs,
			cloud_connection_configs,
			enabled_languages_in_standalone_mode: settings.enabled_languages.clone(),
			extra_enabled_languages_in_connected_mode: settings.extra_connected_languages.clone(),
			disabled_languages_for_analysis: settings.disabled_languages.clone(),
			is_telemetry_enabled: settings.features.telemetry,
		}
	}
}

fn split_connection(connection: &ConnectionSettings, servers: &mut Vec<ServerConnectionDto>, clouds: &mut Vec<CloudConnectionDto>) {
	match (&connection.server_url, &connection.organization) {
		(Some(url), _) => servers.push(ServerConnectionDto {
			connection_id: connection.id.clone(),
			server_url: url.clone(),
			disable_notification: connection.disable_notifications,
		}),
		(None, Some(organization)) => clouds.push(CloudConnectionDto {
			connection_id: connection.id.clone(),
			organization: organization.clone(),
			disable_notification: connection.disable_notifications,
		}),
		(None, None) => tracing::warn!(connection = %connection.id, "engine.params.connection_without_target"),
	}
}
