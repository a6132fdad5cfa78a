//! Component contract
//!
//! A component is a behaviour attached to exactly one [`Entity`]. The entity
//! drives it through four hooks and hands itself in as context, so
//! components never own their parent.

use std::any::Any;

use super::{Entity, Message, Topic};

/// Topics a component wants delivered, collected during [`Component::init`]
#[derive(Debug, Default)]
pub struct Subscriptions {
    topics: Vec<Topic>,
}

impl Subscriptions {
    /// Receive every broadcast of `topic` on this entity
    pub fn subscribe(&mut self, topic: Topic) {
        if !self.topics.contains(&topic) {
            self.topics.push(topic);
        }
    }

    /// Topics requested so far
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

/// Behaviour attached to an entity
///
/// Lifecycle: attached before the entity is registered, initialised once all
/// siblings are attached (in attachment order), updated every frame while the
/// entity is active, destroyed with the entity.
pub trait Component: Any {
    /// Called once after every sibling is attached
    fn init(&mut self, _entity: &Entity, _subscriptions: &mut Subscriptions) {}

    /// Called every frame while the entity is active
    fn update(&mut self, _entity: &Entity, _delta_time: f32) {}

    /// Called for every broadcast on a subscribed topic.
    ///
    /// Broadcasts made while this component is inside one of its own hooks
    /// are not delivered back to it; the entity state they describe can be
    /// read directly from `entity` instead.
    fn on_message(&mut self, _entity: &Entity, _message: &Message) {}

    /// Called when the entity is removed from its manager
    fn destroy(&mut self, _entity: &Entity) {}
}
