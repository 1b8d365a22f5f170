use serde::{Deserialize, Deserializer, Serialize};

use super::Observe;

/// A single object detected in a single frame.
///
/// The same shape is produced by the upstream inference service (without the
/// `@type`, `probability` and `actionAndObject` fields) and persisted by the
/// frame column (with them), so one serde schema serves both.
///
/// `probability` is an alias of [`confidence`](Self::confidence) and
/// `actionAndObject` is derived from [`class`](Self::class); both are written
/// for downstream readers and neither is stored separately.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(from = "Wire", into = "Wire")]
pub struct SinglePrediction {
	/// The model label, e.g. `action_grab` or `object_cup`.
	pub label: String,

	/// The detection confidence, 0.0 to 1.0.
	pub confidence: f64,

	/// The bounding box in pixels, anchored at the top-left corner.
	pub x: i32,
	pub y: i32,
	pub width: i32,
	pub height: i32,

	/// The numeric class id assigned by the model.
	pub class_id: i32,

	/// The symbolic class name, such as `Action13`.
	pub class: Option<String>,

	/// Opaque identifiers assigned upstream; passed through unchanged.
	pub detection_id: Option<String>,
	pub parent_id: Option<String>,
}

impl SinglePrediction {
	/// Pair an action detection with an object detection, e.g. `grab` and `cup`.
	///
	/// The labels and classes are joined and the confidences multiplied.
	/// Every other field of the result is left at its default.
	pub fn combine(action: &SinglePrediction, object: &SinglePrediction) -> Self {
		let class = format!(
			"{} {}",
			action.class.as_deref().unwrap_or_default(),
			object.class.as_deref().unwrap_or_default()
		);

		Self {
			label: format!("{} and {}", action.label, object.label),
			confidence: action.confidence * object.confidence,
			class: Some(class),
			..Default::default()
		}
	}
}

impl Observe for SinglePrediction {
	fn probability(&self) -> f64 {
		self.confidence
	}

	fn set_probability(&mut self, probability: f64) {
		self.confidence = probability;
	}

	fn action_and_object(&self) -> Option<&str> {
		self.class.as_deref()
	}
}

// The field names and order on the wire.
// Derived fields come first so every observation kind starts the same way.
#[derive(Serialize, Deserialize)]
struct Wire {
	#[serde(default)]
	probability: Option<f64>,

	#[serde(default, rename = "actionAndObject")]
	action_and_object: Option<String>,

	#[serde(default)]
	label: Option<String>,

	#[serde(default)]
	confidence: Option<f64>,

	#[serde(default, deserialize_with = "pixel")]
	x: i32,

	#[serde(default, deserialize_with = "pixel")]
	y: i32,

	#[serde(default, deserialize_with = "pixel")]
	width: i32,

	#[serde(default, deserialize_with = "pixel")]
	height: i32,

	#[serde(default, rename = "class_id")]
	class_id: i32,

	#[serde(default, rename = "class")]
	class: Option<String>,

	#[serde(default, rename = "detection_id")]
	detection_id: Option<String>,

	#[serde(default, rename = "parent_id")]
	parent_id: Option<String>,
}

impl From<SinglePrediction> for Wire {
	fn from(prediction: SinglePrediction) -> Self {
		Self {
			probability: Some(prediction.confidence),
			action_and_object: prediction.class.clone(),
			label: Some(prediction.label),
			confidence: Some(prediction.confidence),
			x: prediction.x,
			y: prediction.y,
			width: prediction.width,
			height: prediction.height,
			class_id: prediction.class_id,
			class: prediction.class,
			detection_id: prediction.detection_id,
			parent_id: prediction.parent_id,
		}
	}
}

impl From<Wire> for SinglePrediction {
	fn from(wire: Wire) -> Self {
		// `actionAndObject` is derived from the class, so it's ignored here.
		Self {
			label: wire.label.unwrap_or_default(),
			confidence: wire.confidence.or(wire.probability).unwrap_or_default(),
			x: wire.x,
			y: wire.y,
			width: wire.width,
			height: wire.height,
			class_id: wire.class_id,
			class: wire.class,
			detection_id: wire.detection_id,
			parent_id: wire.parent_id,
		}
	}
}

/// Some models report sub-pixel boxes; truncate them to whole pixels.
fn pixel<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
	D: Deserializer<'de>,
{
	let value = f64::deserialize(deserializer)?;
	Ok(value as i32)
}
