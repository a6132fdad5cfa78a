//! Player character driver
//!
//! Waits for the animation clips, then each frame reads the sibling
//! [`PlayerInput`], advances the animation machine, publishes the acting clip
//! and its progress as a `PlayerAction` message and moves the entity.

use super::{Locomotion, PlayerInput};
use crate::config::{AnimationConfig, MovementConfig, RuntimeConfig};
use crate::ecs::{Component, Entity, Message, Subscriptions, Topic};
use crate::fsm::character::DANCE;
use crate::fsm::CharacterAnimator;
use crate::input::Intents;

/// Animation and movement for a player-controlled character
pub struct CharacterController {
    animator: CharacterAnimator,
    locomotion: Locomotion,
}

impl CharacterController {
    /// Controller with the given tuning
    pub fn new(animation: AnimationConfig, movement: &MovementConfig) -> Self {
        Self {
            animator: CharacterAnimator::new(animation),
            locomotion: Locomotion::new(movement),
        }
    }

    /// Controller tuned from a runtime configuration
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.animation.clone(), &config.movement)
    }

    /// Animation machine
    pub fn animator(&self) -> &CharacterAnimator {
        &self.animator
    }

    /// Movement state
    pub fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    fn read_input(entity: &Entity) -> Intents {
        entity
            .get_component::<PlayerInput>()
            .and_then(|input| input.try_borrow().ok().map(|input| input.intents()))
            .unwrap_or_default()
    }
}

impl Component for CharacterController {
    fn init(&mut self, _entity: &Entity, subscriptions: &mut Subscriptions) {
        subscriptions.subscribe(Topic::AnimationsReady);
    }

    fn update(&mut self, entity: &Entity, delta_time: f32) {
        let input = Self::read_input(entity);

        if let Err(err) = self.animator.update(delta_time, input) {
            log::error!("Animation update failed on {}: {}", entity, err);
        }
        if let Some((action, time)) = self.animator.current_action() {
            entity.broadcast(&Message::player_action(action, time));
        }

        let locked = self.animator.state() == Some(DANCE);
        let current = entity.transform();
        let next = self.locomotion.step(current, input, locked, delta_time);
        if next != current {
            entity.set_transform(next);
        }
    }

    fn on_message(&mut self, entity: &Entity, message: &Message) {
        let Some(library) = message.get_animations() else {
            return;
        };
        match self.animator.load(&library) {
            Ok(true) => log::debug!("{} animations loaded", entity),
            Ok(false) => {}
            Err(err) => log::error!("Could not start animations on {}: {}", entity, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::animation::AnimationLibrary;
    use crate::ecs::EntityManager;
    use crate::input::SharedInput;

    struct ActionLog(Rc<RefCell<Vec<(String, f32)>>>);

    impl Component for ActionLog {
        fn init(&mut self, _entity: &Entity, subscriptions: &mut Subscriptions) {
            subscriptions.subscribe(Topic::PlayerAction);
        }

        fn on_message(&mut self, _entity: &Entity, message: &Message) {
            if let (Some(action), Some(time)) = (message.get_action(), message.get_time()) {
                self.0.borrow_mut().push((action.to_string(), time));
            }
        }
    }

    fn library() -> Rc<AnimationLibrary> {
        Rc::new(
            AnimationLibrary::new()
                .with_clip("idle", 2.0)
                .with_clip("walk", 1.0)
                .with_clip("run", 0.8)
                .with_clip("dance", 1.0),
        )
    }

    fn player(
        manager: &EntityManager,
        input: &SharedInput,
    ) -> (Rc<Entity>, Rc<RefCell<CharacterController>>, Rc<RefCell<Vec<(String, f32)>>>) {
        let actions = Rc::new(RefCell::new(Vec::new()));
        let entity = Entity::new();
        entity.add_component(PlayerInput::new(input.clone())).expect("attach input");
        let controller = entity
            .add_component(CharacterController::from_config(&RuntimeConfig::default()))
            .expect("attach controller");
        entity
            .add_component(ActionLog(Rc::clone(&actions)))
            .expect("attach log");
        manager.add(Rc::clone(&entity), Some("player")).expect("register");
        (entity, controller, actions)
    }

    #[test]
    fn test_nothing_happens_before_ready() {
        let manager = EntityManager::new();
        let input = SharedInput::new();
        let (entity, controller, actions) = player(&manager, &input);

        input.set(Intents::FORWARD);
        manager.update(0.1);

        assert!(!controller.borrow().animator().is_ready());
        assert!(actions.borrow().is_empty());
        // Movement does not wait for animations
        assert!(entity.position().z > 0.0);
    }

    #[test]
    fn test_publishes_action_progress() {
        let manager = EntityManager::new();
        let input = SharedInput::new();
        let (entity, controller, actions) = player(&manager, &input);

        entity.broadcast(&Message::animations_ready(library()));
        assert_eq!(controller.borrow().animator().state(), Some("idle"));

        manager.update(0.5);
        manager.update(0.5);

        let actions = actions.borrow();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].0, "idle");
        assert!((actions[1].1 - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_second_ready_signal_is_ignored() {
        let manager = EntityManager::new();
        let input = SharedInput::new();
        let (entity, controller, _) = player(&manager, &input);

        entity.broadcast(&Message::animations_ready(library()));
        input.set(Intents::FORWARD);
        manager.update(0.1);
        assert_eq!(controller.borrow().animator().state(), Some("walk"));

        entity.broadcast(&Message::animations_ready(library()));
        assert_eq!(controller.borrow().animator().state(), Some("walk"));
    }

    #[test]
    fn test_dancing_stops_movement_input() {
        let manager = EntityManager::new();
        let input = SharedInput::new();
        let (entity, controller, _) = player(&manager, &input);
        entity.broadcast(&Message::animations_ready(library()));

        input.set(Intents::TRIGGER | Intents::FORWARD | Intents::LEFT);
        // Movement wins over the trigger in idle
        manager.update(0.1);
        assert_eq!(controller.borrow().animator().state(), Some("walk"));

        input.set(Intents::empty());
        for _ in 0..20 {
            manager.update(0.1);
        }
        input.set(Intents::TRIGGER);
        manager.update(0.1);
        assert_eq!(controller.borrow().animator().state(), Some("dance"));

        let rotation = entity.rotation();
        input.set(Intents::LEFT | Intents::FORWARD);
        manager.update(0.1);
        assert_eq!(controller.borrow().animator().state(), Some("dance"));
        assert_eq!(entity.rotation(), rotation);
    }
}
