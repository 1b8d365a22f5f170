use std::sync::Arc;

/// Error types for the vigil observation library.
///
/// This enum represents all possible errors that can occur when decoding a
/// persisted frame column, parsing a payload, or recording a frame.
#[derive(Debug, thiserror::Error, Clone)]
pub enum Error {
	/// The persisted text is not a well-formed frame column.
	///
	/// Decoding never partially applies; the wrapped error is the structural cause.
	#[error("malformed persisted data: {0}")]
	Malformed(#[source] Arc<serde_json::Error>),

	/// A record carries an `@type` discriminator with no registered variant.
	#[error("unknown observation kind: {0}")]
	UnknownKind(String),

	/// JSON serialization/deserialization error outside of column decoding.
	#[error("json error: {0}")]
	Json(Arc<serde_json::Error>),

	/// JSON has no representation for NaN or infinity, so such a probability can't be persisted.
	#[error("frame {frame}: probability {probability} is not finite")]
	NonFiniteProbability { frame: i64, probability: f64 },

	/// A frame timestamp could not be turned into a frame id.
	#[error("invalid timestamp: {0:?}")]
	InvalidTimestamp(String),
}

/// A Result type alias for vigil operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	pub(crate) fn malformed(err: serde_json::Error) -> Self {
		Error::Malformed(Arc::new(err))
	}
}

// Wrap in an Arc so it is Clone
impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Json(Arc::new(err))
	}
}
