//! Host configuration file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sloop_engine::SloopSettings;

/// Contents of `sloop.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
	pub engine: SloopSettings,
}

/// `<config dir>/sloop/sloop.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("sloop").join("sloop.toml"))
}

impl HostSettings {
	/// Loads settings from `path`. A missing file yields defaults.
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let text = match std::fs::read_to_string(path) {
			Ok(text) => text,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(path = %path.display(), "host.settings.missing");
				return Ok(Self::default());
			}
			Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
		};
		toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
	}
}
