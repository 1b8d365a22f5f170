use std::{ffi::OsString, fs, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use vigil::PairingConfig;

use crate::log::Log;

#[derive(Parser, Clone, Debug, Default, Serialize, Deserialize)]
#[command(name = "vigil")]
#[command(about = "Inspect and update persisted vision observations", long_about = None)]
#[command(subcommand_required = true, arg_required_else_help = true)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
	/// Load defaults from the given TOML file.
	/// Flags on the command line take precedence over the file.
	#[arg(long)]
	#[serde(skip)]
	pub config: Option<PathBuf>,

	/// The log configuration.
	#[command(flatten)]
	pub log: Log,

	/// How detections are paired into action and object observations.
	#[command(flatten)]
	pub pairing: PairingArgs,

	/// The command to execute.
	#[command(subcommand)]
	#[serde(skip)]
	pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
	/// Print a persisted observation column, read from stdin unless --input is given.
	Decode {
		/// Read the column from this file instead of stdin.
		#[arg(long)]
		input: Option<PathBuf>,

		/// Print the column as indented JSON instead of one line per observation.
		#[arg(long)]
		json: bool,
	},

	/// Record an inference response, read from stdin, into a store.
	Ingest {
		/// The file holding the persisted column. It's created if missing.
		#[arg(long)]
		store: PathBuf,

		/// The frame timestamp; fractions are truncated to the frame id.
		/// Defaults to the frame number reported by the response.
		#[arg(long)]
		timestamp: Option<String>,

		/// The shape of the response.
		#[arg(long, value_enum, default_value_t = Format::Workflow)]
		format: Format,

		/// Replace the detections with every action paired with every object.
		#[arg(long)]
		pair: bool,

		/// Read the response from this file instead of stdin.
		#[arg(long)]
		input: Option<PathBuf>,
	},

	/// Check that a store decodes, re-encodes and decodes to the same observations.
	Verify {
		/// The file holding the persisted column.
		#[arg(long)]
		store: PathBuf,
	},
}

/// The upstream service that produced a response.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
	/// A workflow inference response with object detections.
	#[default]
	Workflow,

	/// A python inference server response with action observations.
	Python,
}

#[derive(clap::Args, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PairingArgs {
	/// Detections whose label starts with this prefix are actions.
	/// Default: action
	#[arg(long = "action-prefix", id = "action-prefix")]
	pub action_prefix: Option<String>,

	/// Detections whose label starts with this prefix are objects.
	/// Default: object
	#[arg(long = "object-prefix", id = "object-prefix")]
	pub object_prefix: Option<String>,
}

impl PairingArgs {
	pub fn config(&self) -> PairingConfig {
		let default = PairingConfig::default();

		PairingConfig {
			action_prefix: self.action_prefix.clone().unwrap_or(default.action_prefix),
			object_prefix: self.object_prefix.clone().unwrap_or(default.object_prefix),
		}
	}
}

impl Config {
	/// Parse the command line, then layer it over the config file if one is given.
	pub fn load() -> anyhow::Result<Self> {
		Config::parse().with_file(std::env::args_os())
	}

	/// Replace this config with the file it names, re-applying `args` on top.
	pub fn with_file<I, T>(self, args: I) -> anyhow::Result<Self>
	where
		I: IntoIterator<Item = T>,
		T: Into<OsString> + Clone,
	{
		let Some(path) = &self.config else {
			return Ok(self);
		};

		let contents = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		let mut config: Config = toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
		config.try_update_from(args)?;

		tracing::trace!(?config, "loaded config file");

		Ok(config)
	}
}
