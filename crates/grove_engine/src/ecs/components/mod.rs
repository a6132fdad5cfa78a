//! Built-in components
//!
//! Behaviours the scene runtime ships with: grid membership, player input,
//! character animation and locomotion, proximity pickup and collectibles.

pub mod spatial_grid_controller;
pub mod player_input;
pub mod movement;
pub mod character_controller;
pub mod pickup;
pub mod collectible;

pub use spatial_grid_controller::{SharedGrid, SpatialGridController};
pub use player_input::PlayerInput;
pub use movement::Locomotion;
pub use character_controller::CharacterController;
pub use pickup::{PickupController, ThresholdTrigger};
pub use collectible::Collectible;
