//! Recording mock of the scene/physics collaborator, shared by the
//! integration tests.

#![allow(dead_code)]

use glam::Vec3;
use slotmap::SlotMap;
use tilewall::{BodyKey, Color, TileTransform, TileWall, WallScene};

/// Everything the engine ever wrote for one body.
#[derive(Debug, Clone)]
pub struct BodyRecord {
    pub position: Vec3,
    pub rotation: Vec3,
    pub color: Color,
    pub opacity: f32,
    pub kinematic: bool,
    pub frozen: bool,
    pub impulses: Vec<Vec3>,
    /// Scene clock value when the rotation first moved off its spawn
    /// value. Used to observe wave stagger.
    pub first_rotation_change: Option<f32>,
    pub released_at: Option<f32>,
}

/// A [`WallScene`] that records every write.
pub struct TestScene {
    pub bodies: SlotMap<BodyKey, BodyRecord>,
    /// Creation order; index-aligned with the wall's tile indices.
    pub order: Vec<BodyKey>,
    pub removed: Vec<BodyKey>,
    pub camera_look: Vec3,
    pub ground_opacity: f32,
    pub light_position: Vec3,
    pub light_intensity: f32,
    /// Test-driven clock in milliseconds, bumped by [`run`].
    pub now: f32,
}

impl TestScene {
    pub fn new() -> Self {
        Self {
            bodies: SlotMap::with_key(),
            order: Vec::new(),
            removed: Vec::new(),
            camera_look: Vec3::ZERO,
            ground_opacity: 0.0,
            light_position: Vec3::new(0.0, 500.0, 500.0),
            light_intensity: 1.0,
            now: 0.0,
        }
    }

    pub fn body(&self, index: usize) -> &BodyRecord {
        &self.bodies[self.order[index]]
    }

    pub fn body_mut(&mut self, index: usize) -> &mut BodyRecord {
        let key = self.order[index];
        &mut self.bodies[key]
    }
}

impl WallScene for TestScene {
    fn create_tile_body(&mut self, color: Color, transform: TileTransform) -> BodyKey {
        let key = self.bodies.insert(BodyRecord {
            position: transform.position,
            rotation: transform.rotation,
            color,
            opacity: transform.opacity,
            kinematic: true,
            frozen: false,
            impulses: Vec::new(),
            first_rotation_change: None,
            released_at: None,
        });
        self.order.push(key);
        key
    }

    fn remove_body(&mut self, body: BodyKey) {
        self.bodies.remove(body);
        self.removed.push(body);
    }

    fn set_position(&mut self, body: BodyKey, position: Vec3) {
        self.bodies[body].position = position;
    }

    fn set_rotation(&mut self, body: BodyKey, rotation: Vec3) {
        let now = self.now;
        let record = &mut self.bodies[body];
        if record.first_rotation_change.is_none() && rotation != record.rotation {
            record.first_rotation_change = Some(now);
        }
        record.rotation = rotation;
    }

    fn set_material_color(&mut self, body: BodyKey, color: Color) {
        self.bodies[body].color = color;
    }

    fn set_opacity(&mut self, body: BodyKey, opacity: f32) {
        self.bodies[body].opacity = opacity;
    }

    fn apply_impulse(&mut self, body: BodyKey, impulse: Vec3) {
        self.bodies[body].impulses.push(impulse);
    }

    fn set_kinematic(&mut self, body: BodyKey, kinematic: bool) {
        self.bodies[body].kinematic = kinematic;
    }

    fn freeze_body(&mut self, body: BodyKey) {
        self.bodies[body].frozen = true;
    }

    fn release_body(&mut self, body: BodyKey) {
        let now = self.now;
        let record = &mut self.bodies[body];
        record.frozen = false;
        record.released_at = Some(now);
    }

    fn position(&self, body: BodyKey) -> Vec3 {
        self.bodies[body].position
    }

    fn set_camera_look_at(&mut self, target: Vec3) {
        self.camera_look = target;
    }

    fn set_ground_opacity(&mut self, opacity: f32) {
        self.ground_opacity = opacity;
    }

    fn set_light_position(&mut self, position: Vec3) {
        self.light_position = position;
    }

    fn set_light_intensity(&mut self, intensity: f32) {
        self.light_intensity = intensity;
    }
}

/// Drives the wall for `total_ms` in fixed steps, bumping the scene
/// clock before each tick.
pub fn run(wall: &mut TileWall, scene: &mut TestScene, total_ms: f32, step_ms: f32) {
    let mut elapsed = 0.0;
    while elapsed < total_ms {
        scene.now += step_ms;
        wall.advance(step_ms, scene);
        elapsed += step_ms;
    }
}

pub const EPSILON: f32 = 1e-4;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}
