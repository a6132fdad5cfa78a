//! Skeletal animation playback
//!
//! Clips are opaque named durations supplied by the asset provider; the
//! mixer keeps one playable action per clip and advances time, blending
//! weights and one-shot completion for all of them.

mod clip;
mod action;
mod mixer;

pub use clip::{AnimationClip, AnimationLibrary};
pub use action::{AnimationAction, LoopMode};
pub use mixer::{AnimationMixer, FinishedEvent, ListenerId};
