//! Basic/Physics mode controller.
//!
//! The wall runs in exactly one mode at a time. `Basic` is kinematic:
//! tween channels write transforms directly. `Physics` hands the tile
//! bodies to the rigid-body stepper and the engine only nudges them with
//! impulses. The authoritative flag flips immediately on a switch so
//! later calls see new-mode semantics even while the multi-second
//! cross-fade of camera, ground and spotlight is still running.

use glam::Vec3;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::easing::Easing;
use crate::errors::Result;
use crate::scene::WallScene;
use crate::tiles::ChannelKind;
use crate::tween::{Completion, CompletionSource, Prop, Value};
use crate::wall::{ChannelTarget, TileWall, WallEvent};

/// Operating state of the wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Kinematic, tween-driven.
    Basic,
    /// Rigid-body simulated.
    Physics,
}

pub(crate) const BASIC_CAMERA_LOOK: Vec3 = Vec3::ZERO;
pub(crate) const PHYSICS_CAMERA_LOOK: Vec3 = Vec3::new(0.0, -60.0, 0.0);
pub(crate) const BASIC_GROUND_OPACITY: f32 = 0.0;
const PHYSICS_GROUND_OPACITY: f32 = 1.0;
/// Spotlight rest position, matching the original scene rig.
pub(crate) const BASIC_LIGHT_POSITION: Vec3 = Vec3::new(0.0, 500.0, 500.0);
const PHYSICS_LIGHT_POSITION: Vec3 = Vec3::new(0.0, 260.0, 180.0);
pub(crate) const BASIC_LIGHT_INTENSITY: f32 = 1.0;
const PHYSICS_LIGHT_INTENSITY: f32 = 1.4;

const ENTER_FADE_MS: f32 = 2800.0;
const EXIT_FADE_MS: f32 = 1200.0;
/// Base hold before the first body is released, covering the one-frame
/// freeze that swallows inherited velocity.
const RELEASE_BASE_MS: f32 = 120.0;
/// Stagger per wall unit of distance from the trigger tile.
const RELEASE_STAGGER_MS: f32 = 6.0;

impl TileWall {
    /// Switches the operating mode. Returns an already-resolved signal
    /// when the wall is in the requested mode.
    pub fn switch_mode(&mut self, scene: &mut dyn WallScene, mode: Mode) -> Result<Completion> {
        if self.mode == mode {
            return Ok(Completion::resolved());
        }
        match mode {
            Mode::Physics => self.enter_physics(scene),
            Mode::Basic => self.exit_to_basic(scene),
        }
    }

    /// Hands every tile body to the physics stepper with a cascading
    /// collapse: bodies freeze for a beat, then regain their factors in
    /// distance order from a randomly chosen trigger tile.
    fn enter_physics(&mut self, scene: &mut dyn WallScene) -> Result<Completion> {
        self.mode = Mode::Physics;
        debug!("entering physics mode");

        // Atomic flush: no kinematic tween may fight the simulation, and
        // no stale callback may fire after this point.
        self.flush_all_channels();

        let mut live = Vec::new();
        for tile in self.tiles.iter_mut() {
            tile.floating = false;
            if !tile.dormant {
                live.push(tile.index);
            }
        }
        for &index in &live {
            let tile = self.tiles.get(index)?;
            scene.set_kinematic(tile.body, false);
            scene.freeze_body(tile.body);
        }

        if !live.is_empty() {
            let trigger = live[self.rng.random_range(0..live.len())];
            let origin = self.tiles.get(trigger)?.slot;
            for &index in &live {
                let distance = self.tiles.get(index)?.slot.distance(origin);
                let delay = RELEASE_BASE_MS + distance * RELEASE_STAGGER_MS;
                let key = self.tile_channel(index, ChannelKind::Rotation)?;
                let channel = self
                    .registry
                    .get_mut(key)
                    .expect("channel created by factory");
                channel
                    .wait(delay)
                    .call(WallEvent::ReleaseTile { index })
                    .resume();
            }
        }

        Ok(self.fade_scenery(
            PHYSICS_CAMERA_LOOK,
            PHYSICS_GROUND_OPACITY,
            PHYSICS_LIGHT_POSITION,
            PHYSICS_LIGHT_INTENSITY,
            ENTER_FADE_MS,
        ))
    }

    /// Returns to kinematic control and re-applies the last explicitly
    /// set layout.
    fn exit_to_basic(&mut self, scene: &mut dyn WallScene) -> Result<Completion> {
        self.mode = Mode::Basic;
        debug!("exiting to basic mode");

        self.flush_all_channels();

        // Re-home the bodies under kinematic control, seeding each
        // position channel from wherever physics actually left the body
        // so the re-layout tween starts without a jump.
        for index in 0..self.tiles.len() {
            let body = self.tiles.get(index)?.body;
            scene.set_kinematic(body, true);
            let position = scene.position(body);
            let key = self.tile_channel(index, ChannelKind::Position)?;
            let channel = self
                .registry
                .get_mut(key)
                .expect("channel created by factory");
            channel.set_value(Prop::X, Value::Scalar(position.x));
            channel.set_value(Prop::Y, Value::Scalar(position.y));
            channel.set_value(Prop::Z, Value::Scalar(position.z));
        }

        let layout = self.last_layout.clone();
        self.switch_layout(scene, layout)?;

        Ok(self.fade_scenery(
            BASIC_CAMERA_LOOK,
            BASIC_GROUND_OPACITY,
            BASIC_LIGHT_POSITION,
            BASIC_LIGHT_INTENSITY,
            EXIT_FADE_MS,
        ))
    }

    /// Cross-fades camera look target, ground opacity and spotlight
    /// toward the given view. Any previously running scenery tween was
    /// already cancelled; only the most recent targets survive.
    fn fade_scenery(
        &mut self,
        camera_look: Vec3,
        ground_opacity: f32,
        light_position: Vec3,
        light_intensity: f32,
        duration_ms: f32,
    ) -> Completion {
        let (source, completion) = CompletionSource::new();

        let key = self.scenery_channel(ChannelTarget::Camera);
        let channel = self
            .registry
            .get_mut(key)
            .expect("channel created by factory");
        channel.replace_queue();
        channel
            .to(
                smallvec![
                    (Prop::X, Value::Scalar(camera_look.x)),
                    (Prop::Y, Value::Scalar(camera_look.y)),
                    (Prop::Z, Value::Scalar(camera_look.z)),
                ],
                duration_ms,
                Easing::QuadInOut,
            )
            .call(WallEvent::Resolve(source))
            .resume();

        let key = self.scenery_channel(ChannelTarget::Ground);
        let channel = self
            .registry
            .get_mut(key)
            .expect("channel created by factory");
        channel.replace_queue();
        channel
            .to(
                smallvec![(Prop::Opacity, Value::Scalar(ground_opacity))],
                duration_ms,
                Easing::QuadInOut,
            )
            .resume();

        let key = self.scenery_channel(ChannelTarget::Light);
        let channel = self
            .registry
            .get_mut(key)
            .expect("channel created by factory");
        channel.replace_queue();
        channel
            .to(
                smallvec![
                    (Prop::X, Value::Scalar(light_position.x)),
                    (Prop::Y, Value::Scalar(light_position.y)),
                    (Prop::Z, Value::Scalar(light_position.z)),
                    (Prop::Intensity, Value::Scalar(light_intensity)),
                ],
                duration_ms,
                Easing::QuadInOut,
            )
            .resume();

        completion
    }
}
