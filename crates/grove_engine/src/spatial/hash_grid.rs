//! Uniform spatial hash grid over a bounded ground plane
//!
//! The grid owns no entities. Each client record remembers the entity it
//! stands for, its last position and the cell it is linked into. Cells are
//! intrusive doubly-linked lists threaded through a slot map, so insert,
//! move and remove are all O(1).
//!
//! Positions are 3D; only `x` and `z` participate, height is ignored.

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::config::GridConfig;
use crate::ecs::EntityId;
use crate::foundation::math::{ground, Vec2, Vec3};

new_key_type! {
    struct ClientKey;
}

/// Errors raised by the grid
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    /// Bounds are empty or inverted
    #[error("grid bounds {min:?}..{max:?} are empty or inverted")]
    InvalidBounds {
        /// Lower corner
        min: [f32; 2],
        /// Upper corner
        max: [f32; 2],
    },

    /// A dimension is zero
    #[error("grid dimensions {0:?} must be at least 1x1")]
    InvalidDimensions([usize; 2]),

    /// The handle does not belong to a live client of this grid
    #[error("client handle is not registered with this grid")]
    StaleClient,
}

/// Column/row of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    /// Column (x axis)
    pub x: usize,
    /// Row (z axis)
    pub y: usize,
}

/// Move-only token for a client record.
///
/// `remove_client` consumes the handle, so a removed client cannot be
/// updated or removed again through it.
#[derive(Debug, PartialEq, Eq)]
pub struct ClientHandle {
    key: ClientKey,
}

/// One result of a proximity query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyClient {
    /// Entity the client stands for
    pub entity: EntityId,
    /// Last position pushed for the client (ground plane)
    pub position: Vec2,
    /// Squared ground-plane distance to the query point
    pub distance_squared: f32,
}

#[derive(Debug)]
struct Client {
    entity: EntityId,
    position: Vec2,
    cell: CellCoord,
    prev: Option<ClientKey>,
    next: Option<ClientKey>,
}

/// Uniform grid of buckets over a fixed rectangle
#[derive(Debug)]
pub struct SpatialHashGrid {
    min: Vec2,
    max: Vec2,
    dimensions: [usize; 2],
    cell_size: Vec2,
    heads: Vec<Option<ClientKey>>,
    clients: SlotMap<ClientKey, Client>,
}

impl SpatialHashGrid {
    /// Create a grid covering `min..max` split into `dimensions` cells
    pub fn new(min: Vec2, max: Vec2, dimensions: [usize; 2]) -> Result<Self, SpatialError> {
        if !(max.x > min.x && max.y > min.y) {
            return Err(SpatialError::InvalidBounds {
                min: [min.x, min.y],
                max: [max.x, max.y],
            });
        }
        if dimensions.contains(&0) {
            return Err(SpatialError::InvalidDimensions(dimensions));
        }

        let extent = max - min;
        let cell_size = Vec2::new(
            extent.x / dimensions[0] as f32,
            extent.y / dimensions[1] as f32,
        );

        log::debug!(
            "Spatial grid {}x{} over {:?}..{:?}, cell size {:?}",
            dimensions[0], dimensions[1], min, max, cell_size
        );

        Ok(Self {
            min,
            max,
            dimensions,
            cell_size,
            heads: vec![None; dimensions[0] * dimensions[1]],
            clients: SlotMap::with_key(),
        })
    }

    /// Create a grid from its configuration record
    pub fn from_config(config: &GridConfig) -> Result<Self, SpatialError> {
        Self::new(
            config.min_corner(),
            config.max_corner(),
            [config.dimensions[0] as usize, config.dimensions[1] as usize],
        )
    }

    /// Lower corner of the grid
    pub fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper corner of the grid
    pub fn max(&self) -> Vec2 {
        self.max
    }

    /// Cells along x and z
    pub fn dimensions(&self) -> [usize; 2] {
        self.dimensions
    }

    /// World size of one cell
    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// Number of live clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the grid has no clients
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Cell containing a ground-plane point, clamped to the grid extent
    pub fn cell_of(&self, point: Vec2) -> CellCoord {
        CellCoord {
            x: Self::axis_index(point.x, self.min.x, self.cell_size.x, self.dimensions[0]),
            y: Self::axis_index(point.y, self.min.y, self.cell_size.y, self.dimensions[1]),
        }
    }

    fn axis_index(value: f32, min: f32, cell: f32, count: usize) -> usize {
        let scaled = ((value - min) / cell).floor();
        // NaN and everything left of the grid land in the first cell
        if scaled.is_nan() || scaled <= 0.0 {
            0
        } else {
            (scaled as usize).min(count - 1)
        }
    }

    fn slot(&self, cell: CellCoord) -> usize {
        cell.y * self.dimensions[0] + cell.x
    }

    /// Register a client for `entity` at `position`
    pub fn new_client(&mut self, position: Vec3, entity: EntityId) -> ClientHandle {
        let point = ground(position);
        let cell = self.cell_of(point);
        let key = self.clients.insert(Client {
            entity,
            position: point,
            cell,
            prev: None,
            next: None,
        });
        self.link(key, cell);
        ClientHandle { key }
    }

    /// Move a client to `position`, relinking it if it changed cells
    pub fn update_client(&mut self, handle: &ClientHandle, position: Vec3) -> Result<(), SpatialError> {
        let point = ground(position);
        let cell = self.cell_of(point);

        let client = self.clients.get_mut(handle.key).ok_or(SpatialError::StaleClient)?;
        client.position = point;
        if client.cell == cell {
            return Ok(());
        }

        self.unlink(handle.key);
        self.link(handle.key, cell);
        Ok(())
    }

    /// Remove a client, returning the entity it stood for
    pub fn remove_client(&mut self, handle: ClientHandle) -> Result<EntityId, SpatialError> {
        if !self.clients.contains_key(handle.key) {
            return Err(SpatialError::StaleClient);
        }
        self.unlink(handle.key);
        self.clients
            .remove(handle.key)
            .map(|client| client.entity)
            .ok_or(SpatialError::StaleClient)
    }

    /// Cell a client is currently linked into
    pub fn client_cell(&self, handle: &ClientHandle) -> Option<CellCoord> {
        self.clients.get(handle.key).map(|client| client.cell)
    }

    /// Last position pushed for a client
    pub fn client_position(&self, handle: &ClientHandle) -> Option<Vec2> {
        self.clients.get(handle.key).map(|client| client.position)
    }

    /// Entity a client stands for
    pub fn client_entity(&self, handle: &ClientHandle) -> Option<EntityId> {
        self.clients.get(handle.key).map(|client| client.entity)
    }

    /// Number of clients linked into one cell
    pub fn cell_occupancy(&self, cell: CellCoord) -> usize {
        if cell.x >= self.dimensions[0] || cell.y >= self.dimensions[1] {
            return 0;
        }
        self.cell_entries(cell).count()
    }

    /// Every client in the cells overlapping the square `position ± radius`.
    ///
    /// Broad phase only: results may include clients slightly outside the
    /// circle (cell corners). Callers wanting an exact range filter on
    /// `distance_squared`.
    pub fn find_nearby(&self, position: Vec3, radius: f32) -> Vec<NearbyClient> {
        let center = ground(position);
        let reach = Vec2::repeat(radius.max(0.0));
        let low = self.cell_of(center - reach);
        let high = self.cell_of(center + reach);
        self.scan(low, high, center)
    }

    /// Every client within `cell_radius` cells of the cell containing
    /// `position`, in each direction.
    ///
    /// The physical reach depends on the cell size: one cell radius covers
    /// between one and two cell widths from the query point.
    pub fn find_in_cells(&self, position: Vec3, cell_radius: usize) -> Vec<NearbyClient> {
        let center = ground(position);
        let cell = self.cell_of(center);
        let low = CellCoord {
            x: cell.x.saturating_sub(cell_radius),
            y: cell.y.saturating_sub(cell_radius),
        };
        let high = CellCoord {
            x: cell.x.saturating_add(cell_radius).min(self.dimensions[0] - 1),
            y: cell.y.saturating_add(cell_radius).min(self.dimensions[1] - 1),
        };
        self.scan(low, high, center)
    }

    fn scan(&self, low: CellCoord, high: CellCoord, center: Vec2) -> Vec<NearbyClient> {
        let mut results = Vec::new();
        for y in low.y..=high.y {
            for x in low.x..=high.x {
                for client in self.cell_entries(CellCoord { x, y }) {
                    results.push(NearbyClient {
                        entity: client.entity,
                        position: client.position,
                        distance_squared: (client.position - center).norm_squared(),
                    });
                }
            }
        }
        results
    }

    fn cell_entries(&self, cell: CellCoord) -> impl Iterator<Item = &Client> + '_ {
        let mut cursor = self.heads[self.slot(cell)];
        std::iter::from_fn(move || {
            let client = self.clients.get(cursor?)?;
            cursor = client.next;
            Some(client)
        })
    }

    fn link(&mut self, key: ClientKey, cell: CellCoord) {
        let slot = self.slot(cell);
        let old_head = self.heads[slot];
        if let Some(client) = self.clients.get_mut(key) {
            client.cell = cell;
            client.prev = None;
            client.next = old_head;
        }
        if let Some(head) = old_head.and_then(|head| self.clients.get_mut(head)) {
            head.prev = Some(key);
        }
        self.heads[slot] = Some(key);
    }

    fn unlink(&mut self, key: ClientKey) {
        let Some(client) = self.clients.get_mut(key) else {
            return;
        };
        let (prev, next, cell) = (client.prev.take(), client.next.take(), client.cell);

        match prev.and_then(|prev| self.clients.get_mut(prev)) {
            Some(prev_client) => prev_client.next = next,
            None => {
                let slot = self.slot(cell);
                self.heads[slot] = next;
            }
        }
        if let Some(next_client) = next.and_then(|next| self.clients.get_mut(next)) {
            next_client.prev = prev;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn entities(count: usize) -> Vec<EntityId> {
        let mut map: SlotMap<EntityId, ()> = SlotMap::with_key();
        (0..count).map(|_| map.insert(())).collect()
    }

    fn grid() -> SpatialHashGrid {
        SpatialHashGrid::new(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0), [10, 10])
            .expect("valid grid")
    }

    #[test]
    fn test_rejects_degenerate_layouts() {
        assert!(matches!(
            SpatialHashGrid::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0), [4, 4]),
            Err(SpatialError::InvalidBounds { .. })
        ));
        assert_eq!(
            SpatialHashGrid::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), [0, 4]).err(),
            Some(SpatialError::InvalidDimensions([0, 4]))
        );
    }

    #[test]
    fn test_cell_index_clamps_to_extent() {
        let grid = grid();
        assert_eq!(grid.cell_of(Vec2::new(-100.0, -100.0)), CellCoord { x: 0, y: 0 });
        assert_eq!(grid.cell_of(Vec2::new(-5000.0, 5000.0)), CellCoord { x: 0, y: 9 });
        // exactly on the upper boundary
        assert_eq!(grid.cell_of(Vec2::new(100.0, 100.0)), CellCoord { x: 9, y: 9 });
        assert_eq!(grid.cell_of(Vec2::new(0.0, 0.0)), CellCoord { x: 5, y: 5 });
        assert_eq!(grid.cell_of(Vec2::new(-0.01, 19.99)), CellCoord { x: 4, y: 5 });
        assert_eq!(grid.cell_of(Vec2::new(f32::NAN, 0.0)).x, 0);
    }

    #[test]
    fn test_height_is_ignored() {
        let mut grid = grid();
        let ids = entities(1);
        let handle = grid.new_client(Vec3::new(15.0, 500.0, -15.0), ids[0]);
        assert_eq!(grid.client_cell(&handle), Some(grid.cell_of(Vec2::new(15.0, -15.0))));
    }

    #[test]
    fn test_update_relinks_between_cells() {
        let mut grid = grid();
        let ids = entities(3);
        let a = grid.new_client(Vec3::new(1.0, 0.0, 1.0), ids[0]);
        let b = grid.new_client(Vec3::new(2.0, 0.0, 2.0), ids[1]);
        let c = grid.new_client(Vec3::new(3.0, 0.0, 3.0), ids[2]);
        let home = CellCoord { x: 5, y: 5 };
        assert_eq!(grid.cell_occupancy(home), 3);

        // middle of the list
        grid.update_client(&b, Vec3::new(-90.0, 0.0, 90.0)).expect("live client");
        assert_eq!(grid.cell_occupancy(home), 2);
        assert_eq!(grid.client_cell(&b), Some(CellCoord { x: 0, y: 9 }));

        // head of the list
        grid.update_client(&c, Vec3::new(-90.0, 0.0, 90.0)).expect("live client");
        assert_eq!(grid.cell_occupancy(home), 1);
        assert_eq!(grid.cell_occupancy(CellCoord { x: 0, y: 9 }), 2);

        // moving within a cell keeps the link but updates the position
        grid.update_client(&a, Vec3::new(4.0, 0.0, 4.0)).expect("live client");
        assert_eq!(grid.client_cell(&a), Some(home));
        assert_eq!(grid.client_position(&a), Some(Vec2::new(4.0, 4.0)));
    }

    #[test]
    fn test_remove_returns_entity_and_frees_cell() {
        let mut grid = grid();
        let ids = entities(2);
        let a = grid.new_client(Vec3::new(1.0, 0.0, 1.0), ids[0]);
        let b = grid.new_client(Vec3::new(2.0, 0.0, 2.0), ids[1]);

        assert_eq!(grid.remove_client(a), Ok(ids[0]));
        assert_eq!(grid.len(), 1);

        let found: Vec<_> = grid.find_nearby(Vec3::zeros(), 5.0).iter().map(|n| n.entity).collect();
        assert_eq!(found, vec![ids[1]]);

        assert_eq!(grid.remove_client(b), Ok(ids[1]));
        assert!(grid.is_empty());
        assert!(grid.find_nearby(Vec3::zeros(), 200.0).is_empty());
    }

    #[test]
    fn test_handle_from_another_grid_is_rejected() {
        let mut first = grid();
        let mut second = grid();
        let ids = entities(1);
        let handle = first.new_client(Vec3::zeros(), ids[0]);

        assert_eq!(second.update_client(&handle, Vec3::zeros()), Err(SpatialError::StaleClient));
        assert_eq!(second.remove_client(handle), Err(SpatialError::StaleClient));
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_find_nearby_covers_neighbouring_cells() {
        let mut grid = grid();
        let ids = entities(3);
        grid.new_client(Vec3::new(19.0, 0.0, 0.0), ids[0]);
        grid.new_client(Vec3::new(21.0, 0.0, 0.0), ids[1]);
        grid.new_client(Vec3::new(80.0, 0.0, 80.0), ids[2]);

        let mut found: Vec<_> = grid
            .find_nearby(Vec3::new(15.0, 0.0, 0.0), 10.0)
            .into_iter()
            .map(|n| n.entity)
            .collect();
        found.sort();
        let mut expected = vec![ids[0], ids[1]];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_find_nearby_reports_distance() {
        let mut grid = grid();
        let ids = entities(1);
        grid.new_client(Vec3::new(3.0, 7.0, 4.0), ids[0]);

        let found = grid.find_nearby(Vec3::zeros(), 1.0);
        assert_eq!(found.len(), 1);
        assert!((found[0].distance_squared - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_out_of_bounds_clients_stay_queryable() {
        let mut grid = grid();
        let ids = entities(1);
        grid.new_client(Vec3::new(400.0, 0.0, -400.0), ids[0]);

        let found = grid.find_nearby(Vec3::new(95.0, 0.0, -95.0), 1.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity, ids[0]);
    }

    #[test]
    fn test_find_in_cells_counts_cells_not_units() {
        let mut grid = grid();
        let ids = entities(3);
        grid.new_client(Vec3::new(1.0, 0.0, 1.0), ids[0]);
        grid.new_client(Vec3::new(35.0, 0.0, 1.0), ids[1]);
        grid.new_client(Vec3::new(45.0, 0.0, 1.0), ids[2]);

        let same_cell = grid.find_in_cells(Vec3::new(1.0, 0.0, 1.0), 0);
        assert_eq!(same_cell.len(), 1);

        // cells 4..=6 along x cover -20..40
        let one_ring = grid.find_in_cells(Vec3::new(1.0, 0.0, 1.0), 1);
        assert_eq!(one_ring.len(), 2);

        // corner cell radius clamps instead of underflowing
        let corner = grid.find_in_cells(Vec3::new(-99.0, 0.0, -99.0), 3);
        assert!(corner.is_empty());
    }
}
