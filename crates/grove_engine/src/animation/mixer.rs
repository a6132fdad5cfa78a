//! Animation mixer
//!
//! Owns one [`AnimationAction`] per clip and advances all of them each frame.
//! One-shot completion is reported through finished-listeners registered per
//! action name and returned from [`AnimationMixer::update`] so callers can
//! react after the mixer is no longer borrowed.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use slotmap::{new_key_type, SlotMap};

use super::{AnimationAction, AnimationClip, AnimationLibrary};

new_key_type! {
    /// Finished-listener registration
    pub struct ListenerId;
}

/// A one-shot action completed while `listener` was registered for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedEvent {
    /// Registration that asked for the notification
    pub listener: ListenerId,
    /// Action that finished
    pub action: String,
}

/// Per-character animation mixer
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: BTreeMap<String, AnimationAction>,
    listeners: SlotMap<ListenerId, String>,
    time: f32,
}

impl AnimationMixer {
    /// Empty mixer
    pub fn new() -> Self {
        Self::default()
    }

    /// One action per clip in `library`
    pub fn from_library(library: &AnimationLibrary) -> Self {
        let mut mixer = Self::new();
        for clip in library.clips() {
            mixer.add_clip(clip.clone());
        }
        mixer
    }

    /// Create (or replace) the action for `clip`
    pub fn add_clip(&mut self, clip: AnimationClip) -> &mut AnimationAction {
        match self.actions.entry(clip.name().to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(AnimationAction::new(clip));
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(AnimationAction::new(clip)),
        }
    }

    /// Action by clip name
    pub fn action(&self, name: &str) -> Option<&AnimationAction> {
        self.actions.get(name)
    }

    /// Mutable action by clip name
    pub fn action_mut(&mut self, name: &str) -> Option<&mut AnimationAction> {
        self.actions.get_mut(name)
    }

    /// Whether an action exists for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// All actions in name order
    pub fn actions(&self) -> impl Iterator<Item = &AnimationAction> {
        self.actions.values()
    }

    /// Names of actions currently contributing to the pose
    pub fn running_actions(&self) -> Vec<&str> {
        self.actions
            .values()
            .filter(|action| action.is_scheduled() && action.is_enabled())
            .map(AnimationAction::name)
            .collect()
    }

    /// Schedule an action; `false` if there is no such clip
    pub fn play(&mut self, name: &str) -> bool {
        self.actions.get_mut(name).map(AnimationAction::play).is_some()
    }

    /// Fade `from` out and `to` in over `seconds`; `false` if `to` is
    /// unknown. A missing `from` only fades in.
    pub fn cross_fade(&mut self, from: &str, to: &str, seconds: f32) -> bool {
        if !self.actions.contains_key(to) {
            return false;
        }
        if from != to {
            if let Some(previous) = self.actions.get_mut(from) {
                previous.fade_out(seconds);
            }
        }
        if let Some(next) = self.actions.get_mut(to) {
            next.fade_in(seconds);
        }
        true
    }

    /// Unschedule and rewind every action
    pub fn stop_all(&mut self) {
        for action in self.actions.values_mut() {
            action.stop();
        }
    }

    /// Be told when `action` finishes a one-shot run
    pub fn add_finished_listener(&mut self, action: &str) -> ListenerId {
        self.listeners.insert(action.to_string())
    }

    /// Cancel a registration; `false` if it was already removed
    pub fn remove_finished_listener(&mut self, listener: ListenerId) -> bool {
        self.listeners.remove(listener).is_some()
    }

    /// Number of live finished-listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Total time advanced
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance every scheduled action by `delta_time`
    pub fn update(&mut self, delta_time: f32) -> Vec<FinishedEvent> {
        self.time += delta_time;

        let finished: Vec<String> = self
            .actions
            .iter_mut()
            .filter_map(|(name, action)| action.advance(delta_time).then(|| name.clone()))
            .collect();

        let mut events = Vec::new();
        for action in finished {
            log::trace!("Animation '{}' finished", action);
            events.extend(
                self.listeners
                    .iter()
                    .filter(|(_, target)| **target == action)
                    .map(|(listener, _)| FinishedEvent {
                        listener,
                        action: action.clone(),
                    }),
            );
        }
        events
    }
}
