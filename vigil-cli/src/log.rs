use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Logging configuration; logs always go to stderr so stdout stays clean for output.
#[derive(clap::Args, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Log {
	/// The default log level, e.g. `debug`. `RUST_LOG` takes precedence when set.
	#[arg(long = "log-level", id = "log-level", env = "VIGIL_LOG_LEVEL")]
	pub level: Option<String>,
}

impl Log {
	pub fn level(&self) -> anyhow::Result<LevelFilter> {
		match self.level.as_deref() {
			None => Ok(LevelFilter::INFO),
			Some(level) => level.parse().with_context(|| format!("invalid log level: {level}")),
		}
	}

	pub fn init(&self) -> anyhow::Result<()> {
		let filter = EnvFilter::builder()
			.with_default_directive(self.level()?.into())
			.from_env_lossy(); // Allow overriding with RUST_LOG

		tracing_subscriber::fmt()
			.with_writer(std::io::stderr)
			.with_env_filter(filter)
			.init();

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_level_default() {
		assert_eq!(Log::default().level().unwrap(), LevelFilter::INFO);
	}

	#[test]
	fn test_level_parse() {
		let log = Log {
			level: Some("debug".to_string()),
		};
		assert_eq!(log.level().unwrap(), LevelFilter::DEBUG);

		let log = Log {
			level: Some("loud".to_string()),
		};
		assert!(log.level().is_err());
	}
}
