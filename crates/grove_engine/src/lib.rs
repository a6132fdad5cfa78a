//! # Grove Engine
//!
//! Runtime core for an interactive 3D scene: entities with ordered
//! components and entity-local messages, a spatial hash grid for proximity
//! queries, and the animation state machine a player character drives.
//!
//! ## Features
//!
//! - **Entities and components**: typed sibling lookup, synchronous
//!   messages, deferred registration and removal
//! - **Spatial hash grid**: O(1) client moves, broad-phase neighbour queries
//! - **Animation**: clip mixer with cross-fades and one-shot completion
//! - **State machines**: generic named-state machine plus the
//!   idle/walk/run/dance character machine
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grove_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = SceneRuntime::new(RuntimeConfig::default())?;
//!     let input = SharedInput::new();
//!
//!     let player = Entity::new();
//!     player.add_component(PlayerInput::new(input.clone()))?;
//!     player.add_component(runtime.grid_controller())?;
//!     player.add_component(CharacterController::from_config(runtime.config()))?;
//!     runtime.spawn(player, Some("player"))?;
//!
//!     input.set(Intents::FORWARD);
//!     runtime.step(1.0 / 60.0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod input;
pub mod ecs;
pub mod spatial;
pub mod animation;
pub mod fsm;

mod runtime;

pub use runtime::{RuntimeError, SceneRuntime};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        RuntimeError, SceneRuntime,
        animation::{AnimationClip, AnimationLibrary},
        config::{Config, RuntimeConfig},
        ecs::{Component, Entity, EntityId, EntityManager, Message, MessageArg, Subscriptions, Topic},
        ecs::components::{
            CharacterController, Collectible, PickupController, PlayerInput, SpatialGridController,
        },
        foundation::math::{Quat, Transform, Vec3},
        fsm::{CharacterAnimator, State, StateMachine, Transition},
        input::{InputSource, Intents, SharedInput},
        spatial::SpatialHashGrid,
    };
}
