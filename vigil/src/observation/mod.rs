//! Observations are the facts an inference pass produces about a single frame.
//!
//! The family is open-ended, so every persisted record carries an `@type`
//! discriminator. The `registry!` table below is the only place a variant is
//! declared: it generates the [`Observation`] sum type (and with it both
//! directions of the serde codec), the [`Kind`] discriminator enum, and the
//! dispatch to each variant's [`Observe`] implementation.
//!
//! Adding a variant means writing its struct, implementing [`Observe`] for it,
//! and adding one line to the table.

mod action;
mod pairing;
mod prediction;

pub use action::*;
pub use pairing::*;
pub use prediction::*;

use std::str::FromStr;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The name of the discriminator field in every persisted record.
pub const TAG: &str = "@type";

/// The contract every observation variant fulfils.
///
/// Downstream consumers rely on both the probability and the label being
/// available regardless of the concrete variant.
pub trait Observe {
	/// The confidence-like score, nominally in `[0.0, 1.0]` but not enforced.
	fn probability(&self) -> f64;

	/// Overwrite the score, writing through to the variant's own field.
	fn set_probability(&mut self, probability: f64);

	/// The human readable "action and object" label, e.g. `open door`.
	fn action_and_object(&self) -> Option<&str>;
}

macro_rules! registry {
	($($(#[$meta:meta])* $variant:ident($ty:ident) => $tag:literal,)+) => {
		/// A single observation, tagged on the wire by its [`Kind`].
		#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, From)]
		#[serde(tag = "@type")]
		pub enum Observation {
			$(
				$(#[$meta])*
				#[serde(rename = $tag)]
				$variant($ty),
			)+
		}

		/// The stable discriminator of each registered observation variant.
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
		pub enum Kind {
			$(
				#[display($tag)]
				$variant,
			)+
		}

		impl Kind {
			/// Every registered kind, in declaration order.
			pub const ALL: &'static [Kind] = &[$(Kind::$variant,)+];

			/// The discriminator string written to the `@type` field.
			pub const fn as_str(&self) -> &'static str {
				match self {
					$(Kind::$variant => $tag,)+
				}
			}
		}

		impl FromStr for Kind {
			type Err = Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($tag => Ok(Kind::$variant),)+
					_ => Err(Error::UnknownKind(s.to_string())),
				}
			}
		}

		impl Observation {
			/// The discriminator this observation is persisted under.
			pub fn kind(&self) -> Kind {
				match self {
					$(Observation::$variant(_) => Kind::$variant,)+
				}
			}
		}

		impl Observe for Observation {
			fn probability(&self) -> f64 {
				match self {
					$(Observation::$variant(inner) => inner.probability(),)+
				}
			}

			fn set_probability(&mut self, probability: f64) {
				match self {
					$(Observation::$variant(inner) => inner.set_probability(probability),)+
				}
			}

			fn action_and_object(&self) -> Option<&str> {
				match self {
					$(Observation::$variant(inner) => inner.action_and_object(),)+
				}
			}
		}
	};
}

registry! {
	/// The base variant, used whenever no more specific variant applies.
	Action(ActionObservation) => "actionObservation",

	/// A single detected object from the inference service.
	Prediction(SinglePrediction) => "singlePrediction",
}

impl Observation {
	/// The probability of this observation, see [`Observe::probability`].
	pub fn probability(&self) -> f64 {
		Observe::probability(self)
	}

	/// See [`Observe::set_probability`].
	pub fn set_probability(&mut self, probability: f64) {
		Observe::set_probability(self, probability)
	}

	/// See [`Observe::action_and_object`].
	pub fn action_and_object(&self) -> Option<&str> {
		Observe::action_and_object(self)
	}

	/// Returns the inner prediction if this is a [`Kind::Prediction`].
	pub fn as_prediction(&self) -> Option<&SinglePrediction> {
		match self {
			Observation::Prediction(prediction) => Some(prediction),
			_ => None,
		}
	}
}

/// Sort observations by descending probability, keeping detection order for ties.
pub fn sort_by_probability(observations: &mut [Observation]) {
	observations.sort_by(|a, b| b.probability().total_cmp(&a.probability()));
}
