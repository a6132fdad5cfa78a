//! Input intents
//!
//! Keyboard capture lives outside the runtime. The host writes a snapshot of
//! named boolean intents once per frame and components read it back.

use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;

bitflags! {
    /// Named boolean intents sampled once per update
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u8 {
        /// Move forward
        const FORWARD = 1 << 0;
        /// Move backward
        const BACKWARD = 1 << 1;
        /// Turn left
        const LEFT = 1 << 2;
        /// Turn right
        const RIGHT = 1 << 3;
        /// One-shot action (dance)
        const TRIGGER = 1 << 4;
        /// Run modifier
        const MODIFIER = 1 << 5;
    }
}

impl Intents {
    /// Forward or backward is held
    pub fn is_moving(self) -> bool {
        self.intersects(Self::FORWARD | Self::BACKWARD)
    }

    /// Run modifier is held
    pub fn is_running(self) -> bool {
        self.contains(Self::MODIFIER)
    }
}

impl Default for Intents {
    fn default() -> Self {
        Self::empty()
    }
}

/// Source of the current intent snapshot
pub trait InputSource {
    /// Intents held right now
    fn snapshot(&self) -> Intents;
}

/// Shared, host-writable intent cell
///
/// Clones observe the same state, so the host keeps one clone and hands the
/// other to a [`PlayerInput`](crate::ecs::components::PlayerInput).
#[derive(Debug, Clone)]
pub struct SharedInput {
    state: Rc<Cell<Intents>>,
}

impl SharedInput {
    /// Create with nothing held
    pub fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(Intents::empty())),
        }
    }

    /// Replace the whole snapshot
    pub fn set(&self, intents: Intents) {
        self.state.set(intents);
    }

    /// Press or release individual intents
    pub fn set_held(&self, intents: Intents, held: bool) {
        let mut current = self.state.get();
        current.set(intents, held);
        self.state.set(current);
    }
}

impl Default for SharedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for SharedInput {
    fn snapshot(&self) -> Intents {
        self.state.get()
    }
}
