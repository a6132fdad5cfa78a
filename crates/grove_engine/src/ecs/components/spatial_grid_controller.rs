//! Grid membership for one entity
//!
//! Registers a client at the entity's position on init, mirrors every
//! transform change into the grid and removes the client when the entity is
//! torn down (or, failing that, when the component is dropped).

use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::{Component, Entity, EntityId, ManagerHandle, Message, Subscriptions, Topic};
use crate::foundation::math::Vec3;
use crate::spatial::{CellCoord, ClientHandle, NearbyClient, SpatialHashGrid};

/// Grid shared by every controller in a scene
pub type SharedGrid = Rc<RefCell<SpatialHashGrid>>;

/// Keeps an entity's grid client in sync and answers proximity queries
pub struct SpatialGridController {
    grid: SharedGrid,
    client: Option<ClientHandle>,
    entity: Option<EntityId>,
    manager: Option<ManagerHandle>,
}

impl SpatialGridController {
    /// Controller that will register with `grid` on init
    pub fn new(grid: SharedGrid) -> Self {
        Self {
            grid,
            client: None,
            entity: None,
            manager: None,
        }
    }

    /// Whether a grid client is currently held
    pub fn is_registered(&self) -> bool {
        self.client.is_some()
    }

    /// Cell the client is linked into
    pub fn cell(&self) -> Option<CellCoord> {
        let client = self.client.as_ref()?;
        self.grid.try_borrow().ok()?.client_cell(client)
    }

    /// Grid clients around this entity within `radius` world units,
    /// excluding this entity. Broad phase: see [`SpatialHashGrid::find_nearby`].
    pub fn nearby_clients(&self, radius: f32) -> Vec<NearbyClient> {
        self.query(|grid, position| grid.find_nearby(position, radius))
    }

    /// Grid clients within `cells` cells of this entity's cell, excluding
    /// this entity
    pub fn clients_in_cells(&self, cells: usize) -> Vec<NearbyClient> {
        self.query(|grid, position| grid.find_in_cells(position, cells))
    }

    /// Entities around this one within `radius` world units
    pub fn find_nearby_entities(&self, radius: f32) -> Vec<Rc<Entity>> {
        self.resolve(&self.nearby_clients(radius))
    }

    /// Entities within `cells` cells in each direction
    pub fn find_nearby_in_cells(&self, cells: usize) -> Vec<Rc<Entity>> {
        self.resolve(&self.clients_in_cells(cells))
    }

    fn query<F>(&self, search: F) -> Vec<NearbyClient>
    where
        F: FnOnce(&SpatialHashGrid, Vec3) -> Vec<NearbyClient>,
    {
        let Some(client) = self.client.as_ref() else {
            return Vec::new();
        };
        let Ok(grid) = self.grid.try_borrow() else {
            log::warn!("Spatial grid is busy; proximity query skipped");
            return Vec::new();
        };
        let Some(position) = grid.client_position(client) else {
            return Vec::new();
        };

        search(&*grid, Vec3::new(position.x, 0.0, position.y))
            .into_iter()
            .filter(|hit| Some(hit.entity) != self.entity)
            .collect()
    }

    fn resolve(&self, hits: &[NearbyClient]) -> Vec<Rc<Entity>> {
        let Some(manager) = self.manager.as_ref().and_then(ManagerHandle::upgrade) else {
            return Vec::new();
        };
        hits.iter()
            .filter_map(|hit| manager.get_by_id(hit.entity))
            .collect()
    }

    fn sync(&self, position: Vec3) {
        let Some(client) = self.client.as_ref() else {
            return;
        };
        match self.grid.try_borrow_mut() {
            Ok(mut grid) => {
                if let Err(err) = grid.update_client(client, position) {
                    log::error!("Grid client update failed: {}", err);
                }
            }
            Err(_) => log::warn!("Spatial grid is busy; client update skipped"),
        }
    }

    fn release(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        match self.grid.try_borrow_mut() {
            Ok(mut grid) => {
                if let Err(err) = grid.remove_client(client) {
                    log::error!("Grid client removal failed: {}", err);
                }
            }
            Err(_) => log::error!("Spatial grid is busy; client of {:?} leaked", self.entity),
        }
    }
}

impl Component for SpatialGridController {
    fn init(&mut self, entity: &Entity, subscriptions: &mut Subscriptions) {
        self.entity = Some(entity.id());
        self.manager = entity.manager().map(|manager| manager.handle());

        match self.grid.try_borrow_mut() {
            Ok(mut grid) => self.client = Some(grid.new_client(entity.position(), entity.id())),
            Err(_) => log::error!("Spatial grid is busy; {} not registered", entity),
        }
        subscriptions.subscribe(Topic::TransformChanged);
    }

    fn update(&mut self, entity: &Entity, _delta_time: f32) {
        self.sync(entity.position());
    }

    fn on_message(&mut self, _entity: &Entity, message: &Message) {
        if let Some(position) = message.get_position() {
            self.sync(position);
        }
    }

    fn destroy(&mut self, _entity: &Entity) {
        self.release();
    }
}

impl Drop for SpatialGridController {
    fn drop(&mut self) {
        self.release();
    }
}
