use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Result;

/// An arbitrary JSON value tunnelled through untouched.
///
/// Use this for fields of an upstream response whose shape we don't model,
/// such as a profiler trace. Deserializing captures the whole subtree at that
/// position (object, array or scalar) and serializing splices it back in as
/// JSON, not as an escaped string.
///
/// The value is kept as a tree so it can be inspected when needed.
/// Only structure is preserved: whitespace and number formatting may change,
/// object keys keep their order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Payload(serde_json::Value);

impl Payload {
	pub fn new(value: serde_json::Value) -> Self {
		Self(value)
	}

	/// Capture a payload from JSON text.
	pub fn from_raw(raw: &str) -> Result<Self> {
		Ok(serde_json::from_str(raw)?)
	}

	/// Render the payload as compact JSON text.
	pub fn to_raw(&self) -> String {
		self.0.to_string()
	}

	pub fn as_value(&self) -> &serde_json::Value {
		&self.0
	}

	pub fn into_value(self) -> serde_json::Value {
		self.0
	}

	/// Look up a key if the payload is an object.
	pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
		self.0.get(key)
	}

	/// Look up a nested value by JSON pointer, e.g. `/steps/0/duration`.
	pub fn pointer(&self, pointer: &str) -> Option<&serde_json::Value> {
		self.0.pointer(pointer)
	}

	pub fn is_null(&self) -> bool {
		self.0.is_null()
	}
}

impl From<serde_json::Value> for Payload {
	fn from(value: serde_json::Value) -> Self {
		Self(value)
	}
}

impl FromStr for Payload {
	type Err = crate::Error;

	fn from_str(s: &str) -> Result<Self> {
		Self::from_raw(s)
	}
}

impl fmt::Display for Payload {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use serde_json::json;

	#[derive(Serialize, Deserialize, Debug, PartialEq)]
	struct Response {
		name: String,
		trace: Payload,
	}

	#[test]
	fn capture_emit() {
		let payload = Payload::from_raw(r#"{ "a": 1, "b": [2, 3] }"#).unwrap();
		assert_eq!(payload.as_value(), &json!({"a": 1, "b": [2, 3]}));

		// Emitted text parses back to the same structure.
		let emitted = payload.to_raw();
		assert_eq!(emitted, r#"{"a":1,"b":[2,3]}"#);
		assert_eq!(Payload::from_raw(&emitted).unwrap(), payload);
	}

	#[test]
	fn nested() {
		let encoded = r#"{"name":"workflow","trace":{"z":{"deep":[true,null,"x"]},"a":1.5}}"#;

		let decoded: Response = serde_json::from_str(encoded).unwrap();
		assert_eq!(decoded.trace.pointer("/z/deep/0"), Some(&json!(true)));

		// Spliced back in as JSON, not as a string, and with the key order intact.
		let output = serde_json::to_string(&decoded).unwrap();
		assert_eq!(output, encoded);
	}

	#[test]
	fn scalars() {
		for raw in ["42", "-1.25", "\"text\"", "true", "null", "[]", "{}"] {
			let decoded: Response = serde_json::from_str(&format!(r#"{{"name":"n","trace":{raw}}}"#)).unwrap();
			assert_eq!(decoded.trace.to_raw(), raw);
		}
	}

	#[test]
	fn invalid() {
		assert!(Payload::from_raw(r#"{"a":"#).is_err());
		assert!("not json".parse::<Payload>().is_err());
	}

	#[test]
	fn accessors() {
		let payload = Payload::from(json!({"steps": [{"duration": 0.5}]}));
		assert!(payload.get("steps").unwrap().is_array());
		assert_eq!(payload.get("missing"), None);
		assert_eq!(payload.to_string(), r#"{"steps":[{"duration":0.5}]}"#);
		assert!(Payload::default().is_null());
	}
}
