//! Entity registry and frame driver
//!
//! The manager owns every registered entity, assigns ids, enforces unique
//! names and updates active entities once per frame in registration order.
//! Entities added during a frame are visible to lookups straight away but
//! are first updated on the next frame; entities removed during a frame are
//! deactivated at once and torn down when the frame ends.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use slotmap::SlotMap;

use super::{Entity, EntityError, EntityId};

#[derive(Default)]
struct Registry {
    entities: SlotMap<EntityId, Rc<Entity>>,
    order: Vec<EntityId>,
    names: HashMap<String, EntityId>,
    updating: bool,
    pending_removals: Vec<EntityId>,
    frame: u64,
}

/// Shared handle to the entity registry
///
/// Cloning is cheap; every clone refers to the same registry.
#[derive(Clone, Default)]
pub struct EntityManager {
    registry: Rc<RefCell<Registry>>,
}

/// Non-owning reference held by registered entities
#[derive(Clone, Default)]
pub struct ManagerHandle {
    registry: Weak<RefCell<Registry>>,
}

impl ManagerHandle {
    /// The manager, if it is still alive
    pub fn upgrade(&self) -> Option<EntityManager> {
        self.registry.upgrade().map(|registry| EntityManager { registry })
    }
}

impl EntityManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Weak handle for entities and components
    pub fn handle(&self) -> ManagerHandle {
        ManagerHandle {
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Register `entity`, optionally under a unique `name`, and initialise
    /// its components.
    ///
    /// A name collision leaves the registry unchanged.
    pub fn add(&self, entity: Rc<Entity>, name: Option<&str>) -> Result<EntityId, EntityError> {
        if entity.is_initialized() {
            return Err(EntityError::AlreadyRegistered);
        }

        let (id, deferred) = {
            let mut registry = self.registry.borrow_mut();
            if let Some(name) = name {
                if registry.names.contains_key(name) {
                    return Err(EntityError::DuplicateName(name.to_string()));
                }
            }

            let id = registry.entities.insert(Rc::clone(&entity));
            registry.order.push(id);
            if let Some(name) = name {
                registry.names.insert(name.to_string(), id);
            }
            (id, registry.updating)
        };

        entity.attach(id, name.map(str::to_string), self.handle());
        entity.init_entity();

        log::debug!(
            "Registered entity {} with {} components{}",
            entity,
            entity.component_count(),
            if deferred { " (first update next frame)" } else { "" }
        );
        Ok(id)
    }

    /// Look up a registered entity by name
    pub fn get(&self, name: &str) -> Option<Rc<Entity>> {
        let registry = self.registry.borrow();
        let id = registry.names.get(name)?;
        registry.entities.get(*id).cloned()
    }

    /// Look up a registered entity by id
    pub fn get_by_id(&self, id: EntityId) -> Option<Rc<Entity>> {
        self.registry.borrow().entities.get(id).cloned()
    }

    /// Whether `id` refers to a registered entity
    pub fn contains(&self, id: EntityId) -> bool {
        self.registry.borrow().entities.contains_key(id)
    }

    /// Unregister an entity and tear its components down.
    ///
    /// During [`update`](Self::update) the entity is deactivated immediately
    /// and torn down once the frame completes.
    pub fn remove(&self, id: EntityId) -> Result<(), EntityError> {
        let mut registry = self.registry.borrow_mut();
        let entity = registry
            .entities
            .get(id)
            .cloned()
            .ok_or(EntityError::UnknownEntity(id))?;

        if registry.updating {
            if !registry.pending_removals.contains(&id) {
                registry.pending_removals.push(id);
            }
            drop(registry);
            entity.set_active(false);
            log::debug!("Removal of entity {} deferred to end of frame", entity);
            return Ok(());
        }

        drop(registry);
        self.remove_now(id);
        Ok(())
    }

    /// Update every active entity once, in registration order.
    ///
    /// The set of entities is fixed on entry. Nested calls from inside a
    /// component are ignored.
    pub fn update(&self, delta_time: f32) {
        let snapshot: Vec<Rc<Entity>> = {
            let mut guard = self.registry.borrow_mut();
            if guard.updating {
                log::warn!("Nested EntityManager::update ignored");
                return;
            }
            let registry = &mut *guard;
            registry.updating = true;
            registry.frame += 1;
            registry
                .order
                .iter()
                .filter_map(|id| registry.entities.get(*id))
                .filter(|entity| entity.is_active())
                .cloned()
                .collect()
        };

        for entity in &snapshot {
            // Deactivated earlier this frame
            if entity.is_active() {
                entity.update(delta_time);
            }
        }

        let removals = {
            let mut registry = self.registry.borrow_mut();
            registry.updating = false;
            std::mem::take(&mut registry.pending_removals)
        };
        for id in removals {
            self.remove_now(id);
        }
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.registry.borrow().entities.len()
    }

    /// Whether no entity is registered
    pub fn is_empty(&self) -> bool {
        self.registry.borrow().entities.is_empty()
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> Vec<EntityId> {
        self.registry.borrow().order.clone()
    }

    /// Number of completed or in-progress update calls
    pub fn frame(&self) -> u64 {
        self.registry.borrow().frame
    }

    /// Whether an update is in progress
    pub fn is_updating(&self) -> bool {
        self.registry.borrow().updating
    }

    fn remove_now(&self, id: EntityId) -> Option<Rc<Entity>> {
        let entity = {
            let mut registry = self.registry.borrow_mut();
            let entity = registry.entities.remove(id)?;
            registry.order.retain(|other| *other != id);
            if let Some(name) = entity.name() {
                if registry.names.get(&name) == Some(&id) {
                    registry.names.remove(&name);
                }
            }
            entity
        };

        entity.destroy();
        log::debug!("Removed entity {}", entity);
        Some(entity)
    }
}

impl std::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.registry.try_borrow() {
            Ok(registry) => f
                .debug_struct("EntityManager")
                .field("entities", &registry.entities.len())
                .field("frame", &registry.frame)
                .field("updating", &registry.updating)
                .finish(),
            Err(_) => f.write_str("EntityManager { <busy> }"),
        }
    }
}

impl std::fmt::Debug for ManagerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerHandle")
            .field("alive", &(self.registry.strong_count() > 0))
            .finish()
    }
}
