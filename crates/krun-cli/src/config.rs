// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered settings: built-in defaults, then the TOML config file, then
//! command-line and environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use krun_pod::ControllerConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("config file not found: {path}")]
	NotFound { path: PathBuf },

	#[error("failed to read config file {path}: {error}")]
	Read {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error("failed to parse config file {path}: {error}")]
	Parse {
		path: PathBuf,
		error: toml::de::Error,
	},

	#[error("invalid duration for timeouts.{key} '{value}': {error}")]
	Duration {
		key: &'static str,
		value: String,
		error: humantime::DurationError,
	},

	#[error("timeouts.{key} must be greater than zero")]
	ZeroDuration { key: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Pretty,
	#[default]
	Compact,
	Json,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
	pub controller: ControllerConfig,
	pub log_format: LogFormat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
	#[serde(default)]
	timeouts: TimeoutsLayer,
	#[serde(default)]
	logging: LoggingLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimeoutsLayer {
	create: Option<String>,
	status: Option<String>,
	delete: Option<String>,
	poll_interval: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingLayer {
	format: Option<LogFormat>,
}

/// `$XDG_CONFIG_HOME/krun/config.toml`, or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("krun").join("config.toml"))
}

/// Resolve settings. An explicit path must exist; the default path is
/// optional.
pub fn load(explicit: Option<&Path>, log_format: Option<LogFormat>) -> Result<Settings, ConfigError> {
	let file = match explicit {
		Some(path) if !path.exists() => {
			return Err(ConfigError::NotFound {
				path: path.to_path_buf(),
			})
		}
		Some(path) => read_file(path)?,
		None => match default_config_path() {
			Some(path) if path.exists() => read_file(&path)?,
			_ => FileConfig::default(),
		},
	};

	let mut settings = file.resolve()?;
	if let Some(format) = log_format {
		settings.log_format = format;
	}
	Ok(settings)
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
	let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
		path: path.to_path_buf(),
		error,
	})?;
	toml::from_str(&content).map_err(|error| ConfigError::Parse {
		path: path.to_path_buf(),
		error,
	})
}

impl FileConfig {
	fn resolve(self) -> Result<Settings, ConfigError> {
		let defaults = ControllerConfig::default();
		let t = self.timeouts;

		let controller = ControllerConfig {
			create_timeout: duration_or("create", t.create, defaults.create_timeout)?,
			status_timeout: duration_or("status", t.status, defaults.status_timeout)?,
			delete_timeout: duration_or("delete", t.delete, defaults.delete_timeout)?,
			poll_interval: duration_or("poll_interval", t.poll_interval, defaults.poll_interval)?,
		};

		Ok(Settings {
			controller,
			log_format: self.logging.format.unwrap_or_default(),
		})
	}
}

fn duration_or(
	key: &'static str,
	raw: Option<String>,
	default: Duration,
) -> Result<Duration, ConfigError> {
	let Some(value) = raw else {
		return Ok(default);
	};
	let parsed = humantime::parse_duration(value.trim()).map_err(|error| ConfigError::Duration {
		key,
		value: value.clone(),
		error,
	})?;
	if parsed.is_zero() {
		return Err(ConfigError::ZeroDuration { key });
	}
	Ok(parsed)
}
