//! Collectible props
//!
//! A collectible leaves the scene on its first `Collect` message. Removal
//! goes through the manager, so it is deferred to the end of the frame when
//! the message arrives during an update.

use crate::ecs::{Component, Entity, EntityId, Message, Subscriptions, Topic};

/// Removes its entity from the scene the first time it is collected
#[derive(Debug, Default)]
pub struct Collectible {
    collected_by: Option<EntityId>,
    collected: bool,
}

impl Collectible {
    /// Uncollected
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `Collect` message has been received
    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Entity that collected this one
    pub fn collected_by(&self) -> Option<EntityId> {
        self.collected_by
    }
}

impl Component for Collectible {
    fn init(&mut self, _entity: &Entity, subscriptions: &mut Subscriptions) {
        subscriptions.subscribe(Topic::Collect);
    }

    fn on_message(&mut self, entity: &Entity, message: &Message) {
        if self.collected {
            return;
        }
        self.collected = true;
        self.collected_by = message.get_entity();

        entity.set_active(false);
        log::info!("{} collected", entity);
        if let Some(manager) = entity.manager() {
            if let Err(err) = manager.remove(entity.id()) {
                log::warn!("Could not remove collected {}: {}", entity, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::ecs::EntityManager;

    #[test]
    fn test_collect_removes_entity_once() {
        let manager = EntityManager::new();
        let apple = Entity::new();
        let collectible = apple.add_component(Collectible::new()).expect("attach");
        let id = manager.add(Rc::clone(&apple), Some("apple")).expect("register");
        let collector = manager.add(Entity::new(), Some("player")).expect("register");

        apple.broadcast(&Message::collect(collector));
        assert!(collectible.borrow().is_collected());
        assert_eq!(collectible.borrow().collected_by(), Some(collector));
        assert!(!apple.is_active());
        assert!(manager.get_by_id(id).is_none());

        // Already torn down: a second delivery is a no-op
        apple.broadcast(&Message::collect(collector));
        assert_eq!(manager.len(), 1);
    }

    /// Listens for `Collect` after the collectible in attachment order
    #[derive(Default)]
    struct Witness {
        deliveries: usize,
        torn_down: bool,
    }

    impl Component for Witness {
        fn init(&mut self, _entity: &Entity, subscriptions: &mut Subscriptions) {
            subscriptions.subscribe(Topic::Collect);
        }

        fn on_message(&mut self, _entity: &Entity, _message: &Message) {
            self.deliveries += 1;
        }

        fn destroy(&mut self, _entity: &Entity) {
            self.torn_down = true;
        }
    }

    #[test]
    fn test_siblings_after_removal_hear_nothing() {
        let manager = EntityManager::new();
        let apple = Entity::new();
        apple.add_component(Collectible::new()).expect("attach collectible");
        let witness = apple.add_component(Witness::default()).expect("attach witness");
        manager.add(Rc::clone(&apple), Some("apple")).expect("register");
        let collector = manager.add(Entity::new(), Some("player")).expect("register");

        apple.broadcast(&Message::collect(collector));

        assert!(apple.is_destroyed());
        assert!(witness.borrow().torn_down);
        assert_eq!(witness.borrow().deliveries, 0);
    }

    #[test]
    fn test_removal_inside_update_is_deferred() {
        let manager = EntityManager::new();
        let apple = Entity::new();
        apple.add_component(Collectible::new()).expect("attach collectible");
        let witness = apple.add_component(Witness::default()).expect("attach witness");
        manager.add(Rc::clone(&apple), Some("apple")).expect("register");

        let collector = manager.add(Entity::new(), Some("player")).expect("register");
        let sender = Entity::new();
        sender
            .add_component(Sender {
                target: Rc::clone(&apple),
                collector,
            })
            .expect("attach sender");
        manager.add(sender, None).expect("register sender");

        manager.update(0.1);

        // Deferred: the witness heard the message before teardown at frame end
        assert_eq!(witness.borrow().deliveries, 1);
        assert!(witness.borrow().torn_down);
        assert!(apple.is_destroyed());
        assert!(manager.get("apple").is_none());
    }

    struct Sender {
        target: Rc<Entity>,
        collector: EntityId,
    }

    impl Component for Sender {
        fn update(&mut self, _entity: &Entity, _delta_time: f32) {
            self.target.broadcast(&Message::collect(self.collector));
        }
    }
}
