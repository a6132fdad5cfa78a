use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named animation clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    name: String,
    duration: f32,
}

impl AnimationClip {
    /// Create a clip; negative durations are treated as empty
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
        }
    }

    /// Clip name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

/// Clip table keyed by name, as produced by the asset loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationLibrary {
    clips: BTreeMap<String, AnimationClip>,
}

impl AnimationLibrary {
    /// Empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clip (builder pattern)
    pub fn with_clip(mut self, name: &str, duration: f32) -> Self {
        self.insert(AnimationClip::new(name, duration));
        self
    }

    /// Add or replace a clip
    pub fn insert(&mut self, clip: AnimationClip) {
        self.clips.insert(clip.name.clone(), clip);
    }

    /// Clip by name
    pub fn get(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }

    /// Whether a clip is present
    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// All clips in name order
    pub fn clips(&self) -> impl Iterator<Item = &AnimationClip> {
        self.clips.values()
    }

    /// Number of clips
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the library has no clips
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Names from `required` that have no clip
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect()
    }
}
