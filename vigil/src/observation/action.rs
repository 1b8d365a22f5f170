use serde::{Deserialize, Serialize};

use super::Observe;

/// A plain "action and object" observation with its probability.
///
/// This is what a classifier-style inference server returns, e.g. `open door`
/// at 0.95, and what a consumer synthesizes when a frame has no detections.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionObservation {
	/// The probability of the action and object, nominally 0.0 to 1.0.
	pub probability: f64,

	/// The combined action and object, such as `open door` or `cut paper`.
	pub action_and_object: Option<String>,
}

impl ActionObservation {
	pub fn new(action_and_object: impl Into<String>, probability: f64) -> Self {
		Self {
			probability,
			action_and_object: Some(action_and_object.into()),
		}
	}
}

impl Observe for ActionObservation {
	fn probability(&self) -> f64 {
		self.probability
	}

	fn set_probability(&mut self, probability: f64) {
		self.probability = probability;
	}

	fn action_and_object(&self) -> Option<&str> {
		self.action_and_object.as_deref()
	}
}
