use std::rc::Rc;

use crate::ecs::Component;
use crate::input::{InputSource, Intents};

/// Exposes the host's intent snapshot to sibling components
pub struct PlayerInput {
    source: Rc<dyn InputSource>,
}

impl PlayerInput {
    /// Read intents from `source`
    pub fn new(source: impl InputSource + 'static) -> Self {
        Self {
            source: Rc::new(source),
        }
    }

    /// Intents held right now
    pub fn intents(&self) -> Intents {
        self.source.snapshot()
    }
}

impl Component for PlayerInput {}
