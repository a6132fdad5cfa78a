//! Generic named-state machine

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// State machine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsmError {
    /// No state registered under this name
    #[error("unknown state `{0}`")]
    UnknownState(String),
}

/// Result of a state's per-frame update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Remain in the current state
    Stay,
    /// Switch to the named state
    Switch(&'static str),
}

/// One state of a [`StateMachine`] operating on context `C`
pub trait State<C> {
    /// Registered name of this state
    fn name(&self) -> &'static str;

    /// Called when the state becomes current; `previous` is the state being
    /// left, already exited.
    fn enter(&mut self, _context: &mut C, _previous: Option<&dyn State<C>>) {}

    /// Called when the state stops being current
    fn exit(&mut self, _context: &mut C) {}

    /// Per-frame update
    fn update(&mut self, _context: &mut C, _delta_time: f32) -> Transition {
        Transition::Stay
    }
}

type StateFactory<C> = Box<dyn Fn() -> Box<dyn State<C>>>;

/// Machine over an open set of states registered by name
///
/// No state is current until [`set_state`](Self::set_state) is first called.
pub struct StateMachine<C> {
    factories: HashMap<&'static str, StateFactory<C>>,
    current: Option<Box<dyn State<C>>>,
}

impl<C> StateMachine<C> {
    /// Machine with no states
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            current: None,
        }
    }

    /// Register (or replace) the constructor for `name`
    pub fn add_state<F>(&mut self, name: &'static str, factory: F)
    where
        F: Fn() -> Box<dyn State<C>> + 'static,
    {
        self.factories.insert(name, Box::new(factory));
    }

    /// Whether `name` is registered
    pub fn has_state(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Name of the current state
    pub fn current_name(&self) -> Option<&'static str> {
        self.current.as_ref().map(|state| state.name())
    }

    /// The current state
    pub fn current(&self) -> Option<&dyn State<C>> {
        self.current.as_deref()
    }

    /// Make `name` the current state.
    ///
    /// Requesting the current state again does nothing and returns
    /// `Ok(false)`. Otherwise the current state is exited, a fresh instance
    /// of `name` is entered with the old state as `previous`, and only then
    /// becomes current.
    pub fn set_state(&mut self, name: &str, context: &mut C) -> Result<bool, FsmError> {
        if self.current_name() == Some(name) {
            return Ok(false);
        }
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| FsmError::UnknownState(name.to_string()))?;

        let mut previous = self.current.take();
        if let Some(state) = previous.as_mut() {
            state.exit(context);
        }

        let mut next = factory();
        next.enter(context, previous.as_deref());
        log::debug!(
            "State transition {} -> {}",
            previous.as_ref().map_or("none", |state| state.name()),
            next.name()
        );
        self.current = Some(next);
        Ok(true)
    }

    /// Update the current state and apply the transition it asks for
    pub fn update(&mut self, context: &mut C, delta_time: f32) -> Result<(), FsmError> {
        let transition = match self.current.as_mut() {
            Some(state) => state.update(context, delta_time),
            None => Transition::Stay,
        };
        if let Transition::Switch(name) = transition {
            self.set_state(name, context)?;
        }
        Ok(())
    }
}

impl<C> Default for StateMachine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for StateMachine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut states: Vec<_> = self.factories.keys().collect();
        states.sort();
        f.debug_struct("StateMachine")
            .field("states", &states)
            .field("current", &self.current_name())
            .finish()
    }
}
