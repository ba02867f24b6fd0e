//! Collaborator contract toward the scene graph, renderer and physics
//! engine.
//!
//! The engine owns animation state only. Meshes, materials, the camera,
//! lights, the ground plane and rigid bodies live on the host side behind
//! [`WallScene`]; the engine writes interpolated values through it once
//! per tick and reads nothing back except body positions (needed for
//! distance-based staggering and floor-resting checks).

use glam::Vec3;
use slotmap::new_key_type;

use crate::color::Color;

new_key_type! {
    /// Opaque handle to a host-owned tile body (mesh + rigid body).
    pub struct BodyKey;
}

/// Initial placement for a newly created tile body.
#[derive(Debug, Clone, Copy)]
pub struct TileTransform {
    pub position: Vec3,
    /// Euler rotation, XYZ order, radians.
    pub rotation: Vec3,
    pub opacity: f32,
}

/// Minimal scene/physics surface the engine drives.
///
/// Bodies are created kinematic: in basic mode the engine moves them by
/// writing transforms, and only the mode controller hands them over to
/// the physics stepper. The host steps physics itself once per frame.
pub trait WallScene {
    /// Creates a tile body and returns its handle.
    fn create_tile_body(&mut self, color: Color, transform: TileTransform) -> BodyKey;

    /// Removes a body from the scene.
    fn remove_body(&mut self, body: BodyKey);

    fn set_position(&mut self, body: BodyKey, position: Vec3);

    /// Euler rotation, XYZ order, radians.
    fn set_rotation(&mut self, body: BodyKey, rotation: Vec3);

    fn set_material_color(&mut self, body: BodyKey, color: Color);

    fn set_opacity(&mut self, body: BodyKey, opacity: f32);

    /// Applies a one-shot impulse to a dynamic body.
    fn apply_impulse(&mut self, body: BodyKey, impulse: Vec3);

    /// Toggles a body between kinematic (engine-driven) and dynamic
    /// (physics-driven) control.
    fn set_kinematic(&mut self, body: BodyKey, kinematic: bool);

    /// Zeroes the body's linear/angular velocity and factors, pinning it
    /// in place while it is still dynamic.
    fn freeze_body(&mut self, body: BodyKey);

    /// Restores full linear/angular factors after a freeze.
    fn release_body(&mut self, body: BodyKey);

    /// Current world position of a body.
    fn position(&self, body: BodyKey) -> Vec3;

    fn set_camera_look_at(&mut self, target: Vec3);

    fn set_ground_opacity(&mut self, opacity: f32);

    fn set_light_position(&mut self, position: Vec3);

    fn set_light_intensity(&mut self, intensity: f32);
}
