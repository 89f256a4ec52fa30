use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::brush::{BrushRegistry, PartialBrushOptions, RegistryError};
use crate::brushes;

/// Parameters of the legacy JSON import.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportOptions {
	/// Size of strokes that do not specify one.
	pub default_size: f32,
	/// Added to the `y` offset of each successive stroke, so that strokes drawn on a shared
	/// ground plane do not z-fight.
	pub y_fight_step: f32,
}

impl Default for ImportOptions {
	fn default() -> Self {
		Self {
			default_size: 0.2,
			y_fight_step: 0.0001,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PainterConfig {
	pub import: ImportOptions,
	/// Filter option overrides for the built-in brushes, by name.
	pub brushes: HashMap<String, PartialBrushOptions>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config {path:?}")]
	Read {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("failed to parse config {path:?}")]
	Parse {
		path: PathBuf,
		source: toml::de::Error,
	},
}

static_assertions::assert_impl_all!(ConfigError: std::error::Error, Send, Sync);

impl PainterConfig {
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_owned(),
			source,
		})?;
		toml::from_str(&text).map_err(|source| ConfigError::Parse {
			path: path.to_owned(),
			source,
		})
	}

	/// A registry with the built-in brushes and this config's overrides.
	pub fn registry(&self) -> Result<BrushRegistry, RegistryError> {
		let mut registry = BrushRegistry::new();
		brushes::register_defaults(&mut registry, &self.brushes)?;
		Ok(registry)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::brush::BrushOptions;

	#[test]
	fn empty_config_uses_defaults() {
		let config: PainterConfig = toml::from_str("").unwrap();
		assert_eq!(config, PainterConfig::default());
		assert_eq!(config.import.default_size, 0.2);
	}

	#[test]
	fn parse_overrides() {
		let config: PainterConfig = toml::from_str(
			r#"
			[import]
			y_fight_step = 0.001

			[brushes.flat]
			spacing = 0.01

			[brushes.stamp]
			max_points = 10
			"#,
		)
		.unwrap();
		assert_eq!(config.import.y_fight_step, 0.001);
		assert_eq!(config.import.default_size, 0.2);

		let registry = config.registry().unwrap();
		let options = |name| registry.kind(registry.lookup(name).unwrap()).options();
		assert_eq!(
			options("flat"),
			BrushOptions {
				spacing: 0.01,
				max_points: 0
			}
		);
		assert_eq!(
			options("stamp"),
			BrushOptions {
				spacing: 0.05,
				max_points: 10
			}
		);
	}

	#[test]
	fn unknown_fields_are_rejected() {
		assert!(toml::from_str::<PainterConfig>("[brushes.flat]\nwidth = 2").is_err());
		assert!(toml::from_str::<PainterConfig>("colour = 1").is_err());
	}

	#[test]
	fn missing_file() {
		let error = PainterConfig::load("/nonexistent/apainter.toml").unwrap_err();
		assert!(matches!(error, ConfigError::Read { .. }));
	}
}
