//! Entity/component runtime
//!
//! Entities are world objects with a transform and an ordered list of
//! components. Components talk to siblings through typed lookup and to each
//! other through synchronous, entity-local messages. The [`EntityManager`]
//! owns every live entity and drives the per-frame update.

pub mod entity;
pub mod component;
pub mod message;
pub mod manager;
pub mod components;

pub use entity::{Entity, EntityId};
pub use component::{Component, Subscriptions};
pub use message::{Message, MessageArg, Topic};
pub use manager::{EntityManager, ManagerHandle};

use thiserror::Error;

/// Entity and registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// Components can only be attached before the entity is registered
    #[error("cannot attach `{component}`: entity is already initialized")]
    AlreadyInitialized {
        /// Type name of the rejected component
        component: &'static str,
    },

    /// Only one component of each type per entity
    #[error("component `{0}` is already attached")]
    DuplicateComponent(&'static str),

    /// Entity names are unique among registered entities
    #[error("an entity named `{0}` is already registered")]
    DuplicateName(String),

    /// The entity was registered before (possibly with another manager)
    #[error("entity is already registered")]
    AlreadyRegistered,

    /// No live entity with this id
    #[error("no entity with id {0:?}")]
    UnknownEntity(EntityId),
}
