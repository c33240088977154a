//! Tile capture: collaborator traits and the per-run sequencer.
//!
//! The capture side of the pipeline talks to two external collaborators
//! through narrow traits: a [`CaptureDevice`] that turns a camera placement
//! into pixels (asynchronously, behind two fences), and a [`ContentGate`]
//! that confirms the world content around a point has finished loading
//! before the shutter fires. The [`CaptureSequencer`] drives both, one tile
//! at a time, and fills a [`crate::store::TileStore`].

mod device;
mod sequencer;

pub use device::{AlwaysReady, CameraPlacement, CaptureDevice, ContentGate, DeviceError};
pub use sequencer::{CaptureSequencer, SequenceOutcome, SequencerConfig, TileFailure};
