use std::{fs, io, io::Write, path::Path};

use anyhow::Context;
use vigil::{
	observation::{pair_actions_with_objects, sort_by_probability},
	workflow::{ProcessResult, WorkflowResponse},
	Frames, Observation, PairingConfig,
};

use crate::{config::Format, store::Store};

/// Read from a file if given, otherwise from stdin.
pub fn read_input(input: Option<&Path>) -> anyhow::Result<String> {
	match input {
		Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
		None => io::read_to_string(io::stdin()).context("failed to read stdin"),
	}
}

/// Print a persisted column, one line per observation or as indented JSON.
pub fn decode<W: Write>(column: &str, json: bool, mut out: W) -> anyhow::Result<()> {
	let frames = vigil::decode(Some(column))?;

	if json {
		match &frames {
			Some(frames) => writeln!(out, "{}", frames.to_string_pretty()?)?,
			None => writeln!(out, "null")?,
		}

		return Ok(());
	}

	let Some(frames) = frames else {
		writeln!(out, "no observations")?;
		return Ok(());
	};

	for (frame, observations) in &frames {
		for observation in observations {
			writeln!(out, "{}", describe(*frame, observation))?;
		}
	}

	Ok(())
}

fn describe(frame: i64, observation: &Observation) -> String {
	format!(
		"frame {frame}: {} {} p={}",
		observation.kind(),
		observation.action_and_object().unwrap_or("-"),
		observation.probability()
	)
}

/// Options for recording a single response.
#[derive(Debug, Clone, Default)]
pub struct Ingest {
	pub timestamp: Option<String>,
	pub format: Format,

	/// Pair actions with objects using this config.
	pub pairing: Option<PairingConfig>,
}

impl Ingest {
	/// Record a response into the store, returning the frame id it was recorded under.
	pub fn run(&self, store: &Store, response: &str) -> anyhow::Result<i64> {
		let (mut observations, reported) = match self.format {
			Format::Workflow => {
				let response = WorkflowResponse::from_str(response).context("failed to parse workflow response")?;
				(response.observations(), response.frame_number())
			}
			Format::Python => {
				anyhow::ensure!(self.pairing.is_none(), "pairing only applies to workflow responses");

				let response = ProcessResult::from_str(response).context("failed to parse process result")?;
				(response.observations(), response.t)
			}
		};

		sort_by_probability(&mut observations);

		if let Some(pairing) = &self.pairing {
			observations = pair_actions_with_objects(&observations, pairing);
		}

		let mut frames = store.load()?.unwrap_or_default();
		let count = observations.len();

		let frame = match (&self.timestamp, reported) {
			(Some(timestamp), _) => frames.record(timestamp, observations)?,
			(None, Some(frame)) => {
				frames.insert(frame, observations);
				frame
			}
			(None, None) => anyhow::bail!("the response has no frame number; pass --timestamp"),
		};

		store.save(Some(&frames))?;

		tracing::info!(frame, observations = count, "recorded frame");

		Ok(frame)
	}
}

/// Decode a store, encode it again and check nothing changed.
pub fn verify(store: &Store) -> anyhow::Result<Option<Frames>> {
	let Some(frames) = store.load()? else {
		tracing::info!("store is empty");
		return Ok(None);
	};

	let encoded = vigil::encode(Some(&frames))?;
	let decoded = vigil::decode(encoded.as_deref())?;
	anyhow::ensure!(decoded.as_ref() == Some(&frames), "observations changed after re-encoding");

	tracing::info!(
		frames = frames.len(),
		observations = frames.observation_count(),
		"store verified"
	);

	Ok(Some(frames))
}
