//! Character locomotion
//!
//! Velocity is kept in the character's local frame: `z` is forward speed,
//! `x` sideways drift. Forward/backward intents accelerate along `z`,
//! left/right yaw the character, and per-axis deceleration bleeds speed off
//! every frame without ever reversing direction.

use crate::config::MovementConfig;
use crate::foundation::math::{constants::PI, Quat, Transform, Vec3};
use crate::input::Intents;

/// Local-frame velocity integrator for a walking character
#[derive(Debug, Clone)]
pub struct Locomotion {
    /// Local velocity (`z` forward, `x` sideways)
    pub velocity: Vec3,

    /// Per-axis acceleration; `y` sets the turn rate
    pub acceleration: Vec3,

    /// Per-axis decay factors, negative
    pub deceleration: Vec3,

    /// Acceleration multiplier under the run modifier
    pub run_multiplier: f32,
}

impl Locomotion {
    /// Create from tuning values, at rest
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            velocity: Vec3::zeros(),
            acceleration: config.acceleration(),
            deceleration: config.deceleration(),
            run_multiplier: config.run_multiplier,
        }
    }

    /// Forward speed magnitude
    pub fn speed(&self) -> f32 {
        self.velocity.z.abs()
    }

    /// Advance one frame and return the new transform.
    ///
    /// With `locked` set the intents are ignored and the character only
    /// coasts to a stop.
    pub fn step(&mut self, transform: Transform, input: Intents, locked: bool, delta_time: f32) -> Transform {
        let mut decay = self.velocity.component_mul(&self.deceleration) * delta_time;
        decay.z = decay.z.signum() * decay.z.abs().min(self.velocity.z.abs());
        self.velocity += decay;

        let mut rotation = transform.rotation;
        if !locked {
            let mut acceleration = self.acceleration;
            if input.is_running() {
                acceleration *= self.run_multiplier;
            }

            if input.contains(Intents::FORWARD) {
                self.velocity.z += acceleration.z * delta_time;
            }
            if input.contains(Intents::BACKWARD) {
                self.velocity.z -= acceleration.z * delta_time;
            }

            let turn = 4.0 * PI * delta_time * self.acceleration.y;
            if input.contains(Intents::LEFT) {
                rotation *= Quat::from_axis_angle(&Vec3::y_axis(), turn);
            }
            if input.contains(Intents::RIGHT) {
                rotation *= Quat::from_axis_angle(&Vec3::y_axis(), -turn);
            }
        }

        let forward = rotation * Vec3::z();
        let sideways = rotation * Vec3::x();
        Transform {
            position: transform.position
                + forward * (self.velocity.z * delta_time)
                + sideways * (self.velocity.x * delta_time),
            rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn locomotion() -> Locomotion {
        Locomotion::new(&MovementConfig::default())
    }

    #[test]
    fn test_forward_accelerates_along_facing() {
        let mut locomotion = locomotion();
        let next = locomotion.step(Transform::identity(), Intents::FORWARD, false, 0.1);

        assert_relative_eq!(locomotion.velocity.z, 5.0, epsilon = 1e-5);
        assert_relative_eq!(next.position, Vec3::new(0.0, 0.0, 0.5), epsilon = 1e-5);
    }

    #[test]
    fn test_run_modifier_scales_acceleration() {
        let mut walking = locomotion();
        let mut running = locomotion();
        walking.step(Transform::identity(), Intents::FORWARD, false, 0.1);
        running.step(Transform::identity(), Intents::FORWARD | Intents::MODIFIER, false, 0.1);

        assert_relative_eq!(running.speed(), walking.speed() * 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_deceleration_never_reverses() {
        let mut locomotion = locomotion();
        locomotion.velocity = Vec3::new(0.0, 0.0, 1.0);

        // -5/s decay over a full second would overshoot past zero
        locomotion.step(Transform::identity(), Intents::empty(), false, 1.0);
        assert_eq!(locomotion.velocity.z, 0.0);

        locomotion.velocity = Vec3::new(0.0, 0.0, -1.0);
        locomotion.step(Transform::identity(), Intents::empty(), false, 1.0);
        assert_eq!(locomotion.velocity.z, 0.0);
    }

    #[test]
    fn test_turning_yaws_about_up() {
        let mut locomotion = locomotion();
        // 4 * pi * 0.5 * 0.25 = pi / 2
        let next = locomotion.step(Transform::identity(), Intents::LEFT, false, 0.5);

        assert_relative_eq!(next.forward(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(next.position, Vec3::zeros());
    }

    #[test]
    fn test_locked_ignores_intents_but_coasts() {
        let mut locomotion = locomotion();
        locomotion.velocity = Vec3::new(0.0, 0.0, 2.0);
        let next = locomotion.step(
            Transform::identity(),
            Intents::FORWARD | Intents::LEFT,
            true,
            0.1,
        );

        assert!(locomotion.velocity.z < 2.0);
        assert!(locomotion.velocity.z > 0.0);
        assert_eq!(next.rotation, Quat::identity());
        assert!(next.position.z > 0.0);
    }
}
