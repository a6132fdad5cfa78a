//! Proximity pickup on an animation cue
//!
//! The pickup fires once per play-through of the acting clip, when its
//! normalized time crosses the configured timing. Everything registered in
//! the surrounding grid cells is then sent a `Collect` message.

use super::SpatialGridController;
use crate::config::PickupConfig;
use crate::ecs::{Component, Entity, Message, Subscriptions, Topic};

/// Rising-edge detector on a clip's normalized time
///
/// Fires when the previous sample was below the threshold and the current
/// one is at or above it. A change of clip restarts tracking from zero.
#[derive(Debug, Clone)]
pub struct ThresholdTrigger {
    threshold: f32,
    action: Option<String>,
    previous: f32,
}

impl ThresholdTrigger {
    /// Detector for `threshold`
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            action: None,
            previous: 0.0,
        }
    }

    /// Configured threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Feed one sample; `true` on a crossing
    pub fn observe(&mut self, action: &str, time: f32) -> bool {
        if self.action.as_deref() != Some(action) {
            self.action = Some(action.to_string());
            self.previous = 0.0;
        }
        let previous = std::mem::replace(&mut self.previous, time);
        previous < self.threshold && time >= self.threshold
    }
}

/// Collects nearby entities when the acting clip reaches its cue
pub struct PickupController {
    trigger: ThresholdTrigger,
    search_cells: usize,
    actions: Vec<String>,
    pickups: usize,
}

impl PickupController {
    /// Controller tuned by `config`
    pub fn new(config: &PickupConfig) -> Self {
        Self {
            trigger: ThresholdTrigger::new(config.timing),
            search_cells: config.search_cells as usize,
            actions: config.actions.clone(),
            pickups: 0,
        }
    }

    /// Number of active, collectable entities picked up so far
    pub fn pickups(&self) -> usize {
        self.pickups
    }

    fn accepts(&self, action: &str) -> bool {
        self.actions.is_empty() || self.actions.iter().any(|allowed| allowed == action)
    }

    fn pick_up(&mut self, entity: &Entity) {
        let Some(grid) = entity.get_component::<SpatialGridController>() else {
            log::debug!("{} has no grid controller; nothing to pick up", entity);
            return;
        };
        let nearby = match grid.try_borrow() {
            Ok(grid) => grid.find_nearby_in_cells(self.search_cells),
            Err(_) => return,
        };

        let message = Message::collect(entity.id());
        for target in nearby {
            // Inactive or unsubscribed entities get the message but do not count
            let reacts = target.is_active() && target.subscribes_to(Topic::Collect);
            target.broadcast(&message);
            if reacts {
                log::info!("{} picks up {}", entity, target);
                self.pickups += 1;
            } else {
                log::debug!("{} ignored pickup by {}", target, entity);
            }
        }
    }
}

impl Component for PickupController {
    fn init(&mut self, entity: &Entity, subscriptions: &mut Subscriptions) {
        if !entity.has_component::<SpatialGridController>() {
            log::warn!("Pickup on {} without a grid controller will never collect", entity);
        }
        subscriptions.subscribe(Topic::PlayerAction);
    }

    fn on_message(&mut self, entity: &Entity, message: &Message) {
        let (Some(action), Some(time)) = (message.get_action(), message.get_time()) else {
            return;
        };
        if self.trigger.observe(action, time) && self.accepts(action) {
            log::debug!("{} reached pickup cue in '{}' at {:.2}", entity, action, time);
            self.pick_up(entity);
        }
    }
}
