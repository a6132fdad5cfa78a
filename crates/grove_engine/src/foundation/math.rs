//! Math utilities and types
//!
//! Provides the vector and rotation types shared by the scene runtime.

pub use nalgebra::{
    Vector2, Vector3,
    Quaternion,
    Unit,
    UnitQuaternion,
};

/// 2D vector type (ground-plane coordinates)
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Position and orientation of a world object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Local +Z axis in world space
    pub fn forward(&self) -> Vec3 {
        (self.rotation * Vec3::z()).normalize()
    }

    /// Local +X axis in world space
    pub fn right(&self) -> Vec3 {
        (self.rotation * Vec3::x()).normalize()
    }

    /// Project the position onto the ground plane (x, z); height is dropped
    pub fn ground_position(&self) -> Vec2 {
        ground(self.position)
    }
}

/// Project a 3D position onto the (x, z) ground plane
pub fn ground(position: Vec3) -> Vec2 {
    Vec2::new(position.x, position.z)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;
}

/// Math utility functions
pub mod utils {
    /// Clamp a value into `[0, 1]`
    pub fn saturate(value: f32) -> f32 {
        value.clamp(0.0, 1.0)
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}
