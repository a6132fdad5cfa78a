//! Scene runtime
//!
//! The context object a host builds once at startup. It owns the entity
//! registry, the shared spatial grid and the frame clock, and turns host
//! frame callbacks into clamped simulation steps.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::config::{Config, ConfigError, RuntimeConfig};
use crate::ecs::components::{SharedGrid, SpatialGridController};
use crate::ecs::{Entity, EntityError, EntityId, EntityManager, Message};
use crate::foundation::time::FrameClock;
use crate::spatial::{SpatialError, SpatialHashGrid};

/// Runtime construction and scene setup errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is out of range
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Grid could not be built
    #[error("spatial grid error: {0}")]
    Spatial(#[from] SpatialError),

    /// Scene population failed
    #[error("entity error: {0}")]
    Entity(#[from] EntityError),
}

/// Owner of everything a running scene needs
pub struct SceneRuntime {
    config: RuntimeConfig,
    entities: EntityManager,
    grid: SharedGrid,
    clock: FrameClock,
}

impl SceneRuntime {
    /// Validate `config` and build the registry, grid and clock
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let grid = SpatialHashGrid::from_config(&config.grid)?;
        log::info!(
            "Scene runtime ready: grid {:?}..{:?} in {:?} cells, max step {:.4}s",
            config.grid.min,
            config.grid.max,
            config.grid.dimensions,
            config.frame.max_step_seconds
        );

        Ok(Self {
            clock: FrameClock::new(config.frame.max_step_seconds),
            entities: EntityManager::new(),
            grid: Rc::new(RefCell::new(grid)),
            config,
        })
    }

    /// Load a TOML or RON configuration and build from it
    pub fn from_file(path: &str) -> Result<Self, RuntimeError> {
        let config = RuntimeConfig::load_from_file(path)?;
        log::info!("Loaded runtime configuration from {}", path);
        Self::new(config)
    }

    /// Active configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Entity registry
    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Shared spatial grid
    pub fn grid(&self) -> SharedGrid {
        Rc::clone(&self.grid)
    }

    /// Frame timing
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Grid controller bound to this runtime's grid
    pub fn grid_controller(&self) -> SpatialGridController {
        SpatialGridController::new(self.grid())
    }

    /// Register a fully assembled entity
    pub fn spawn(&self, entity: Rc<Entity>, name: Option<&str>) -> Result<EntityId, RuntimeError> {
        Ok(self.entities.add(entity, name)?)
    }

    /// Broadcast `message` on the named entity; `false` if there is none
    pub fn notify(&self, name: &str, message: &Message) -> bool {
        match self.entities.get(name) {
            Some(entity) => {
                entity.broadcast(message);
                true
            }
            None => {
                log::warn!("No entity named '{}' to notify", name);
                false
            }
        }
    }

    /// Run one frame for `elapsed_seconds` of host time; returns the step
    /// actually simulated.
    pub fn step(&mut self, elapsed_seconds: f32) -> f32 {
        let delta_time = self.clock.tick(elapsed_seconds);
        self.entities.update(delta_time);
        delta_time
    }
}
