use serde::{Deserialize, Serialize};

use super::{Observation, SinglePrediction};

/// Which labels count as actions and which as objects when pairing detections.
///
/// Every field has an explicit default; a config file only needs to name the
/// fields it changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PairingConfig {
	/// Detections whose label starts with this prefix are actions.
	pub action_prefix: String,

	/// Detections whose label starts with this prefix are objects.
	pub object_prefix: String,
}

impl Default for PairingConfig {
	fn default() -> Self {
		Self {
			action_prefix: "action".to_string(),
			object_prefix: "object".to_string(),
		}
	}
}

/// Combine every action detection with every object detection.
///
/// The result is action-major: all pairs for the first action come first.
/// Observations that aren't predictions are ignored, as are predictions
/// matching neither prefix.
pub fn pair_actions_with_objects(observations: &[Observation], config: &PairingConfig) -> Vec<Observation> {
	let predictions = || observations.iter().filter_map(Observation::as_prediction);

	let actions: Vec<&SinglePrediction> = predictions()
		.filter(|p| p.label.starts_with(&config.action_prefix))
		.collect();

	let objects: Vec<&SinglePrediction> = predictions()
		.filter(|p| p.label.starts_with(&config.object_prefix))
		.collect();

	let pairs: Vec<Observation> = actions
		.iter()
		.flat_map(|action| {
			objects
				.iter()
				.map(move |object| Observation::from(SinglePrediction::combine(action, object)))
		})
		.collect();

	tracing::debug!(
		actions = actions.len(),
		objects = objects.len(),
		pairs = pairs.len(),
		"paired detections"
	);

	pairs
}
