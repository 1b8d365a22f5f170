//! # vigil: per-frame vision observations
//!
//! `vigil` stores what an external vision-inference service saw, frame by
//! frame, and reads it back exactly as it was written.
//!
//! ## Overview
//!
//! - **Observation**: a sum type of observation variants, each persisted with
//!   an `@type` discriminator. See [`observation`].
//! - **Frames**: frame id to ordered observations, encoded to and decoded from
//!   a single text column. See [`frames`].
//! - **Payload**: an opaque JSON value tunnelled through untouched.
//! - **Workflow**: the upstream response shapes that feed observations in.
//!
//! Encoding and decoding share one serde schema, so the field names and
//! discriminators written are always the ones read back.
mod error;
mod payload;

pub mod frames;
pub mod observation;
pub mod workflow;

pub use error::*;
pub use frames::{decode, encode, Frames};
pub use observation::{ActionObservation, Kind, Observation, Observe, PairingConfig, SinglePrediction};
pub use payload::*;
