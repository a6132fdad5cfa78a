//! Entity-local messages
//!
//! Messages are delivered synchronously by [`Entity::broadcast`] to every
//! component of that entity that subscribed to the message topic. Arguments
//! are key-value pairs so senders and receivers do not depend on order.
//!
//! [`Entity::broadcast`]: crate::ecs::Entity::broadcast

use std::collections::HashMap;
use std::rc::Rc;

use crate::animation::AnimationLibrary;
use crate::ecs::EntityId;
use crate::foundation::math::{Quat, Vec3};

/// Message topic identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Entity position or rotation changed
    TransformChanged,
    /// The animation driver reports the acting clip and its normalized time
    PlayerAction,
    /// Animation clips finished loading
    AnimationsReady,
    /// Another entity picked this one up
    Collect,
    /// Application-defined topic
    Named(&'static str),
}

/// Variant for type-safe message arguments
#[derive(Debug, Clone)]
pub enum MessageArg {
    /// World position
    Position(Vec3),
    /// Orientation
    Rotation(Quat),
    /// Clip or action name
    Action(String),
    /// Normalized time in `[0, 1]`
    Time(f32),
    /// Entity reference
    Entity(EntityId),
    /// Loaded clip table
    Animations(Rc<AnimationLibrary>),
    /// Free-form number
    Scalar(f32),
    /// Free-form text
    Text(String),
}

/// Message with topic and key-value arguments
#[derive(Debug, Clone)]
pub struct Message {
    /// Topic handlers subscribe to
    pub topic: Topic,
    args: HashMap<&'static str, MessageArg>,
}

impl Message {
    /// Create a new message with no arguments
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            args: HashMap::new(),
        }
    }

    /// Transform notification carrying both position and rotation
    pub fn transform_changed(position: Vec3, rotation: Quat) -> Self {
        Self::new(Topic::TransformChanged)
            .with_arg("position", MessageArg::Position(position))
            .with_arg("rotation", MessageArg::Rotation(rotation))
    }

    /// Acting clip and its normalized playback time
    pub fn player_action(action: impl Into<String>, time: f32) -> Self {
        Self::new(Topic::PlayerAction)
            .with_arg("action", MessageArg::Action(action.into()))
            .with_arg("time", MessageArg::Time(time))
    }

    /// Animation clips are available
    pub fn animations_ready(library: Rc<AnimationLibrary>) -> Self {
        Self::new(Topic::AnimationsReady).with_arg("animations", MessageArg::Animations(library))
    }

    /// Request sent to an entity that `collector` picked up
    pub fn collect(collector: EntityId) -> Self {
        Self::new(Topic::Collect).with_arg("entity", MessageArg::Entity(collector))
    }

    /// Add an argument to the message (builder pattern)
    pub fn with_arg(mut self, key: &'static str, value: MessageArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&MessageArg> {
        self.args.get(key)
    }

    /// Get position argument if present
    pub fn get_position(&self) -> Option<Vec3> {
        if let Some(MessageArg::Position(position)) = self.get_arg("position") {
            Some(*position)
        } else {
            None
        }
    }

    /// Get rotation argument if present
    pub fn get_rotation(&self) -> Option<Quat> {
        if let Some(MessageArg::Rotation(rotation)) = self.get_arg("rotation") {
            Some(*rotation)
        } else {
            None
        }
    }

    /// Get action argument if present
    pub fn get_action(&self) -> Option<&str> {
        if let Some(MessageArg::Action(action)) = self.get_arg("action") {
            Some(action)
        } else {
            None
        }
    }

    /// Get time argument if present
    pub fn get_time(&self) -> Option<f32> {
        if let Some(MessageArg::Time(time)) = self.get_arg("time") {
            Some(*time)
        } else {
            None
        }
    }

    /// Get entity argument if present
    pub fn get_entity(&self) -> Option<EntityId> {
        if let Some(MessageArg::Entity(entity)) = self.get_arg("entity") {
            Some(*entity)
        } else {
            None
        }
    }

    /// Get clip table argument if present
    pub fn get_animations(&self) -> Option<Rc<AnimationLibrary>> {
        if let Some(MessageArg::Animations(library)) = self.get_arg("animations") {
            Some(Rc::clone(library))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_action_arguments() {
        let message = Message::player_action("dance", 0.25);
        assert_eq!(message.topic, Topic::PlayerAction);
        assert_eq!(message.get_action(), Some("dance"));
        assert_eq!(message.get_time(), Some(0.25));
        assert!(message.get_position().is_none());
    }

    #[test]
    fn test_mismatched_argument_type_is_absent() {
        let message = Message::new(Topic::Named("custom"))
            .with_arg("time", MessageArg::Text("soon".to_string()));
        assert!(message.get_time().is_none());
        assert!(matches!(message.get_arg("time"), Some(MessageArg::Text(_))));
    }
}
