//! Spatial partitioning data structures
//!
//! Provides a bucketed ground-plane index for broad-phase proximity
//! queries between world objects.

mod hash_grid;

pub use hash_grid::{CellCoord, ClientHandle, NearbyClient, SpatialError, SpatialHashGrid};
