//! Finite state machines
//!
//! [`StateMachine`] is generic over the context its states operate on;
//! [`character`] builds the idle/walk/run/dance animation machine on top.

mod state_machine;
pub mod character;

pub use state_machine::{FsmError, State, StateMachine, Transition};
pub use character::{CharacterAnimator, CharacterProxy};
