//! Responses from the upstream inference services, as far as we model them.
//!
//! Anything we don't interpret is kept as a [`Payload`] so an evolving
//! response shape doesn't break parsing.

use derive_more::Debug;
use serde::{Deserialize, Deserializer, Serialize};

use crate::observation::{ActionObservation, Observation, SinglePrediction};
use crate::{Payload, Result};

/// The response of a workflow inference request.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct WorkflowResponse {
	/// One entry per input image.
	pub outputs: Vec<WorkflowOutput>,

	/// Timing information, passed through without interpretation.
	/// A present `null` is kept, so it's written back; only an absent trace is `None`.
	#[serde(deserialize_with = "present")]
	pub profiler_trace: Option<Payload>,
}

impl WorkflowResponse {
	/// Parse a response from a string.
	#[allow(clippy::should_implement_trait)]
	pub fn from_str(s: &str) -> Result<Self> {
		Ok(serde_json::from_str(s)?)
	}

	/// Parse a response from a slice of bytes.
	pub fn from_slice(v: &[u8]) -> Result<Self> {
		Ok(serde_json::from_slice(v)?)
	}

	/// Every detection of every output, in order.
	pub fn observations(&self) -> Vec<Observation> {
		self.outputs
			.iter()
			.filter_map(|output| output.predictions.as_ref())
			.flat_map(|predictions| predictions.predictions.iter().cloned())
			.map(Observation::from)
			.collect()
	}

	/// The frame number reported by the video source, if any output has one.
	pub fn frame_number(&self) -> Option<i64> {
		self.outputs
			.iter()
			.filter_map(|output| output.output_image.as_ref()?.video_metadata.as_ref())
			.map(|metadata| metadata.frame_number)
			.next()
	}
}

// Unlike the default for `Option`, a `null` value is `Some`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Payload>, D::Error>
where
	D: Deserializer<'de>,
{
	Payload::deserialize(deserializer).map(Some)
}

/// The result of the workflow for a single image.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct WorkflowOutput {
	pub predictions: Option<Predictions>,

	/// The number of objects counted by the workflow.
	pub count_objects: i32,

	/// The annotated image, if the workflow renders one.
	pub output_image: Option<OutputImage>,
}

/// Detections for a single image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Predictions {
	pub image: ImageSize,
	pub predictions: Vec<SinglePrediction>,
}

/// The size of the inferred image in pixels, when reported.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageSize {
	pub width: Option<u32>,
	pub height: Option<u32>,
}

/// An image produced by the workflow.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct OutputImage {
	/// The encoding of [`value`](Self::value), usually `base64`.
	#[serde(rename = "type")]
	pub kind: String,

	/// The encoded image.
	/// The debug implementation shows only the length for brevity.
	#[debug("{} bytes", value.len())]
	pub value: String,

	pub video_metadata: Option<VideoMetadata>,
}

/// Where a frame came from when the workflow runs against a video.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct VideoMetadata {
	pub video_identifier: String,
	pub frame_number: i64,
	pub frame_timestamp: String,
	pub fps: f64,
	pub measured_fps: Option<f64>,
	pub comes_from_video_file: Option<bool>,
}

/// The response of the python inference server: classifier output for one frame.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessResult {
	pub action_observations: Vec<ActionObservation>,

	/// The timestamp the server processed, echoed back.
	pub t: Option<i64>,
}

impl ProcessResult {
	/// Parse a response from a string.
	#[allow(clippy::should_implement_trait)]
	pub fn from_str(s: &str) -> Result<Self> {
		Ok(serde_json::from_str(s)?)
	}

	pub fn observations(&self) -> Vec<Observation> {
		self.action_observations.iter().cloned().map(Observation::from).collect()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::observation::Kind;
	use serde_json::json;

	const RESPONSE: &str = r#"{
		"outputs": [
			{
				"count_objects": 2,
				"output_image": {
					"type": "base64",
					"value": "iVBORw0KGgo=",
					"video_metadata": {
						"video_identifier": "camera-1",
						"frame_number": 1712,
						"frame_timestamp": "2024-11-05T10:15:30.123456",
						"fps": 30.0,
						"measured_fps": null,
						"comes_from_video_file": true
					}
				},
				"predictions": {
					"image": { "width": 1920, "height": 1080 },
					"predictions": [
						{
							"width": 938.0,
							"height": 531.0,
							"x": 636.0,
							"y": 404.0,
							"confidence": 0.89,
							"class_id": 1,
							"class": "Action13",
							"detection_id": "64a2c8e1-5b7d-4f0e-9a3c-2d1e8f7b6a50",
							"parent_id": "image",
							"label": "action_grab"
						},
						{
							"width": 50,
							"height": 60,
							"x": 10,
							"y": 20,
							"confidence": 0.5,
							"class_id": 2,
							"class": "Object2",
							"detection_id": "0c3f",
							"parent_id": "image",
							"label": "object_cup"
						}
					]
				}
			}
		],
		"profiler_trace": [
			{ "name": "model", "ph": "X", "dur": 12.5, "args": { "nested": [1, 2] } }
		]
	}"#;

	#[test]
	fn workflow() {
		let response = WorkflowResponse::from_str(RESPONSE).unwrap();

		let output = &response.outputs[0];
		assert_eq!(output.count_objects, 2);

		let predictions = output.predictions.as_ref().unwrap();
		assert_eq!(predictions.image.width, Some(1920));
		assert_eq!(predictions.predictions.len(), 2);
		assert_eq!(predictions.predictions[0].x, 636);
		assert_eq!(predictions.predictions[1].class.as_deref(), Some("Object2"));

		let image = output.output_image.as_ref().unwrap();
		assert_eq!(image.kind, "base64");
		assert_eq!(response.frame_number(), Some(1712));

		let metadata = image.video_metadata.as_ref().unwrap();
		assert_eq!(metadata.measured_fps, None);
		assert_eq!(metadata.comes_from_video_file, Some(true));
	}

	#[test]
	fn profiler_trace() {
		let response = WorkflowResponse::from_str(RESPONSE).unwrap();
		let trace = response.profiler_trace.as_ref().unwrap();

		assert_eq!(
			trace.as_value(),
			&json!([{ "name": "model", "ph": "X", "dur": 12.5, "args": { "nested": [1, 2] } }])
		);

		// The trace survives a second trip through the pipeline.
		let encoded = serde_json::to_string(&response).unwrap();
		let decoded = WorkflowResponse::from_str(&encoded).unwrap();
		assert_eq!(decoded.profiler_trace, response.profiler_trace);
	}

	#[test]
	fn profiler_trace_null() {
		let encoded = r#"{"outputs":[],"profiler_trace":null}"#;

		let decoded = WorkflowResponse::from_str(encoded).unwrap();
		assert_eq!(decoded.profiler_trace, Some(Payload::default()));
		assert_eq!(serde_json::to_string(&decoded).unwrap(), encoded);

		// An absent trace stays absent.
		let encoded = r#"{"outputs":[]}"#;
		let decoded = WorkflowResponse::from_str(encoded).unwrap();
		assert_eq!(decoded.profiler_trace, None);
		assert_eq!(serde_json::to_string(&decoded).unwrap(), encoded);
	}

	#[test]
	fn observations() {
		let response = WorkflowResponse::from_str(RESPONSE).unwrap();
		let observations = response.observations();

		assert_eq!(observations.len(), 2);
		assert!(observations.iter().all(|o| o.kind() == Kind::Prediction));
		assert_eq!(observations[0].action_and_object(), Some("Action13"));
		assert_eq!(observations[1].probability(), 0.5);
	}

	#[test]
	fn sparse() {
		// Workflows without detections or video still parse.
		let response = WorkflowResponse::from_str(r#"{"outputs":[{"count_objects":0}]}"#).unwrap();
		assert!(response.observations().is_empty());
		assert_eq!(response.frame_number(), None);
		assert_eq!(response.profiler_trace, None);

		assert!(WorkflowResponse::from_str(r#"{"outputs":"#).is_err());
	}

	#[test]
	fn debug_hides_image() {
		let image = OutputImage {
			kind: "base64".to_string(),
			value: "A".repeat(4096),
			video_metadata: None,
		};

		let debug = format!("{image:?}");
		assert!(debug.contains("4096 bytes"));
		assert!(!debug.contains("AAAA"));
	}

	#[test]
	fn python() {
		let result = ProcessResult::from_str(
			r#"{"actionObservations":[{"actionAndObject":"open door","probability":0.95},{"actionAndObject":"cut paper","probability":0.05}],"t":1712}"#,
		)
		.unwrap();

		assert_eq!(result.t, Some(1712));

		let observations = result.observations();
		assert_eq!(observations.len(), 2);
		assert_eq!(observations[0].kind(), Kind::Action);
		assert_eq!(observations[0].action_and_object(), Some("open door"));
		assert_eq!(observations[1].probability(), 0.05);
	}
}
