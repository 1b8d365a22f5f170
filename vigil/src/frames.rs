//! Observations grouped by frame, and the persisted column they are stored in.
//!
//! The column is a single JSON object keyed by the decimal frame id:
//!
//! ```text
//! {"<frame>":[{"@type":"<kind>","probability":<num>,"actionAndObject":<string|null>,...},...],...}
//! ```
//!
//! A missing column (`None`) means "no observations" and is distinct from an
//! empty map (`{}`).

use std::collections::{btree_map, BTreeMap};

use serde::{de::Error as _, Serialize};

use crate::observation::{Kind, Observation, TAG};
use crate::{Error, Result};

/// The unit of persistence: frame id to the observations made in that frame.
///
/// Frames iterate in ascending id order. Observations keep their detection
/// order within a frame, including across an encode/decode round trip.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Frames(BTreeMap<i64, Vec<Observation>>);

impl Frames {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the observations of a frame, returning the previous ones.
	pub fn insert(&mut self, frame: i64, observations: Vec<Observation>) -> Option<Vec<Observation>> {
		self.0.insert(frame, observations)
	}

	/// Append a single observation to a frame, creating it if needed.
	pub fn push(&mut self, frame: i64, observation: impl Into<Observation>) {
		self.0.entry(frame).or_default().push(observation.into());
	}

	/// Insert observations under the frame named by a decimal timestamp.
	///
	/// Fractional timestamps are truncated toward zero, so `"1712.9"` is frame 1712.
	/// Returns the frame id used.
	pub fn record(&mut self, timestamp: &str, observations: Vec<Observation>) -> Result<i64> {
		let frame = frame_id(timestamp)?;
		self.insert(frame, observations);
		Ok(frame)
	}

	/// Move every frame of `other` into this collection, replacing frames with the same id.
	pub fn merge(&mut self, other: Frames) {
		self.0.extend(other.0);
	}

	pub fn get(&self, frame: i64) -> Option<&[Observation]> {
		self.0.get(&frame).map(Vec::as_slice)
	}

	pub fn get_mut(&mut self, frame: i64) -> Option<&mut Vec<Observation>> {
		self.0.get_mut(&frame)
	}

	pub fn remove(&mut self, frame: i64) -> Option<Vec<Observation>> {
		self.0.remove(&frame)
	}

	pub fn iter(&self) -> btree_map::Iter<'_, i64, Vec<Observation>> {
		self.0.iter()
	}

	pub fn frame_ids(&self) -> impl Iterator<Item = i64> + '_ {
		self.0.keys().copied()
	}

	/// The number of frames.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The number of observations across every frame.
	pub fn observation_count(&self) -> usize {
		self.0.values().map(Vec::len).sum()
	}

	pub fn into_inner(self) -> BTreeMap<i64, Vec<Observation>> {
		self.0
	}

	/// Decode a persisted column.
	///
	/// Parsing happens in full before anything is returned: a syntax error, a
	/// non-integer frame id, or a record without `@type` is [`Error::Malformed`],
	/// and an unregistered `@type` is [`Error::UnknownKind`].
	#[allow(clippy::should_implement_trait)]
	pub fn from_str(s: &str) -> Result<Self> {
		let raw: BTreeMap<i64, Vec<serde_json::Map<String, serde_json::Value>>> =
			serde_json::from_str(s).map_err(Error::malformed)?;

		let mut frames = BTreeMap::new();

		for (frame, records) in raw {
			let observations = records
				.into_iter()
				.map(|record| decode_record(frame, record))
				.collect::<Result<Vec<_>>>()?;

			frames.insert(frame, observations);
		}

		let frames = Self(frames);
		tracing::trace!(
			frames = frames.len(),
			observations = frames.observation_count(),
			"decoded frames"
		);

		Ok(frames)
	}

	/// Encode to the persisted column format.
	pub fn to_string(&self) -> Result<String> {
		self.check_finite()?;

		let encoded = serde_json::to_string(self)?;
		tracing::trace!(
			frames = self.len(),
			observations = self.observation_count(),
			size = encoded.len(),
			"encoded frames"
		);

		Ok(encoded)
	}

	/// Encode to an indented form of the column, for humans.
	pub fn to_string_pretty(&self) -> Result<String> {
		self.check_finite()?;
		Ok(serde_json::to_string_pretty(self)?)
	}

	// serde_json would write NaN and infinity as null, which doesn't decode back.
	fn check_finite(&self) -> Result<()> {
		for (&frame, observations) in &self.0 {
			if let Some(probability) = observations
				.iter()
				.map(Observation::probability)
				.find(|probability| !probability.is_finite())
			{
				return Err(Error::NonFiniteProbability { frame, probability });
			}
		}

		Ok(())
	}
}

/// Encode a column value; `None` stays `None` rather than becoming an empty map.
pub fn encode(frames: Option<&Frames>) -> Result<Option<String>> {
	frames.map(Frames::to_string).transpose()
}

/// Decode a column value; `None` and blank text decode to `None`.
pub fn decode(column: Option<&str>) -> Result<Option<Frames>> {
	match column {
		Some(column) if !column.trim().is_empty() => Frames::from_str(column).map(Some),
		_ => Ok(None),
	}
}

fn decode_record(frame: i64, record: serde_json::Map<String, serde_json::Value>) -> Result<Observation> {
	let kind = match record.get(TAG) {
		Some(serde_json::Value::String(tag)) => tag.parse::<Kind>().inspect_err(|_| {
			tracing::debug!(frame, tag = %tag, "unregistered observation kind");
		})?,
		Some(other) => {
			let err = serde_json::Error::custom(format!("frame {frame}: expected a string `{TAG}`, got {other}"));
			return Err(Error::malformed(err));
		}
		None => return Err(Error::malformed(serde_json::Error::missing_field(TAG))),
	};

	let observation: Observation =
		serde_json::from_value(serde_json::Value::Object(record)).map_err(Error::malformed)?;
	debug_assert_eq!(observation.kind(), kind);

	Ok(observation)
}

fn frame_id(timestamp: &str) -> Result<i64> {
	let value: f64 = timestamp
		.trim()
		.parse()
		.map_err(|_| Error::InvalidTimestamp(timestamp.to_string()))?;

	if !value.is_finite() {
		return Err(Error::InvalidTimestamp(timestamp.to_string()));
	}

	Ok(value.trunc() as i64)
}

impl From<BTreeMap<i64, Vec<Observation>>> for Frames {
	fn from(inner: BTreeMap<i64, Vec<Observation>>) -> Self {
		Self(inner)
	}
}

impl FromIterator<(i64, Vec<Observation>)> for Frames {
	fn from_iter<T: IntoIterator<Item = (i64, Vec<Observation>)>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl IntoIterator for Frames {
	type Item = (i64, Vec<Observation>);
	type IntoIter = btree_map::IntoIter<i64, Vec<Observation>>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a> IntoIterator for &'a Frames {
	type Item = (&'a i64, &'a Vec<Observation>);
	type IntoIter = btree_map::Iter<'a, i64, Vec<Observation>>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
