use std::{fs, path::Path};

use analyzer_backend_service::{
	check::CheckConfig, config::BackendConfig, database::DatabaseConfig,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Hash, Default, Deserialize, Serialize)]
pub struct AnalyzerConfig {
	#[serde(default)]
	pub web: WebConfig,
	#[serde(default)]
	pub database: DatabaseConfig,
	#[serde(default)]
	pub check: CheckConfig,
}

impl AnalyzerConfig {
	/// Loads the configuration file, or the defaults without one.
	pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
		match path {
			Some(path) => {
				let content = fs::read_to_string(path)
					.with_context(|| format!("failed to read {}", path.display()))?;
				toml::from_str(&content)
					.with_context(|| format!("malformed configuration in {}", path.display()))
			}
			None => Ok(Self::default()),
		}
	}

	/// Applies command line and environment overrides.
	pub fn apply_overrides(&mut self, port: Option<u16>, database_url: Option<String>) {
		if let Some(port) = port {
			self.web.listen = format!("tcp://0.0.0.0:{port}");
		}
		if let Some(url) = database_url {
			self.database.url = url;
		}
	}
}

impl TryFrom<AnalyzerConfig> for BackendConfig {
	type Error = anyhow::Error;

	fn try_from(config: AnalyzerConfig) -> Result<Self, Self::Error> {
		Ok(BackendConfig {
			database: config.database,
			check: config.check,
		})
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
pub struct WebConfig {
	/// Address for the web server to listen on.
	///
	/// Examples:
	/// - `unix://analyzer.socket`
	/// - `tcp://127.0.0.1:7070`
	pub listen: String,
}

impl Default for WebConfig {
	fn default() -> Self {
		Self {
			listen: "tcp://0.0.0.0:7070".to_string(),
		}
	}
}

#[cfg(test)]
mod test {
	use std::io::Write;

	use super::*;

	#[test]
	fn test_defaults() {
		let config = AnalyzerConfig::load(None).unwrap();
		assert_eq!(config.web.listen, "tcp://0.0.0.0:7070");
		assert_eq!(config.database.url, "sqlite://:memory:");
		assert_eq!(config.database.pool_size(), 1);
		assert_eq!(config.check.timeout_secs, 10);
	}

	#[test]
	fn test_parse_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[web]
listen = "unix://run/analyzer.socket"

[database]
url = "postgres://analyzer@localhost/analyzer"
recreate-schema = true

[check]
timeout-secs = 3
"#
		)
		.unwrap();

		let config = AnalyzerConfig::load(Some(file.path())).unwrap();
		assert_eq!(config.web.listen, "unix://run/analyzer.socket");
		assert_eq!(config.database.url, "postgres://analyzer@localhost/analyzer");
		assert_eq!(config.database.max_connections, None);
		assert_eq!(config.database.pool_size(), 3);
		assert!(config.database.recreate_schema);
		assert_eq!(config.check.timeout_secs, 3);
		assert_eq!(config.check.user_agent, CheckConfig::default().user_agent);
	}

	#[test]
	fn test_malformed_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[database]\nmax-connections = \"many\"").unwrap();
		assert!(AnalyzerConfig::load(Some(file.path())).is_err());
	}

	#[test]
	fn test_overrides() {
		let mut config = AnalyzerConfig::default();
		config.apply_overrides(Some(8080), Some("sqlite://analyzer.db".to_string()));
		assert_eq!(config.web.listen, "tcp://0.0.0.0:8080");
		assert_eq!(config.database.url, "sqlite://analyzer.db");

		let backend = BackendConfig::try_from(config).unwrap();
		assert_eq!(backend.database.url, "sqlite://analyzer.db");
	}
}
