//! The tile wall engine: public operation surface and the per-frame
//! advance loop.
//!
//! External callers invoke director operations (see `director.rs`), which
//! read or create tile state and push steps onto tween channels. The host
//! render loop calls [`TileWall::advance`] once per frame; the registry
//! ticks every channel, changed values are written back through the
//! [`WallScene`] collaborator, and the event outbox (completion resolves,
//! float re-arms, staggered body releases) drains afterwards. The channel
//! list itself is only mutated between ticks.

use glam::Vec3;
use log::debug;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::errors::Result;
use crate::layout::{self, LayoutSpec};
use crate::mode::{self, Mode};
use crate::scene::{TileTransform, WallScene};
use crate::tiles::{ChannelKind, Tile, TileTable};
use crate::tween::{
    ChannelKey, Completion, CompletionSource, Prop, TweenChannel, TweenRegistry, Value,
};

/// Wall primary color when none is supplied (the original visualization's
/// tile material).
pub const DEFAULT_PRIMARY: Color = Color::from_hex(0x2eade8);

/// Shared fade-in/fade-out point for dormant tiles, behind the wall.
pub const STAGING_POINT: Vec3 = Vec3::new(0.0, 0.0, -200.0);

/// Wall grid spacing; also the width of one radial force band.
pub const RING_WIDTH: f32 = 24.0;

/// Ground plane height in physics mode.
pub const FLOOR_Y: f32 = -100.0;
const FLOOR_EPS: f32 = 1.5;
const IMPULSE_SCALE: f32 = 40.0;

/// Duration of the layout transition window.
pub(crate) const LAYOUT_MS: f32 = 1000.0;
const SHOW_HIDE_MS: f32 = 600.0;
const CAMERA_ENERGY_DECAY_MS: f32 = 900.0;
const CAMERA_SWAY: f32 = 6.0;

/// Construction options for [`TileWall`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallOptions {
    /// Initial layout.
    pub layout: LayoutSpec,
    /// First entry is the wall primary color; extra entries are assigned
    /// to distinct tiles which are marked accent.
    pub colors: Vec<Color>,
    /// Seed for float-cycle jitter and trigger-tile selection. `None`
    /// seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for WallOptions {
    fn default() -> Self {
        Self {
            layout: LayoutSpec::Named(layout::DEFAULT_LAYOUT.to_owned()),
            colors: vec![DEFAULT_PRIMARY],
            seed: None,
        }
    }
}

/// What a channel's live values drive once they change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelTarget {
    TileRotation(usize),
    TileFloat(usize),
    TilePosition(usize),
    Camera,
    Ground,
    Light,
}

/// Events emitted by `Call` steps, drained after every tick.
#[derive(Debug)]
pub(crate) enum WallEvent {
    /// Plain completion resolve.
    Resolve(CompletionSource),
    /// Shake finished: snap the transform and resolve.
    ShakeSettled { index: usize, done: CompletionSource },
    /// Roll-over finished: snap the transform and resolve.
    RollSettled { index: usize, done: CompletionSource },
    /// One float cycle finished; re-arm with alternating sign while the
    /// tile's floating flag holds.
    FloatCycleDone {
        index: usize,
        offset: f32,
        done: Option<CompletionSource>,
    },
    /// Layout transition window elapsed: commit neutral rotations.
    LayoutSettled { len: usize, done: CompletionSource },
    /// Staggered physics-mode release of one tile body.
    ReleaseTile { index: usize },
}

/// The animation/state orchestration engine for the tile wall.
pub struct TileWall {
    pub(crate) registry: TweenRegistry<WallEvent>,
    pub(crate) tiles: TileTable,
    pub(crate) bindings: FxHashMap<ChannelKey, ChannelTarget>,
    pub(crate) camera_channel: Option<ChannelKey>,
    pub(crate) ground_channel: Option<ChannelKey>,
    pub(crate) light_channel: Option<ChannelKey>,
    pub(crate) mode: Mode,
    pub(crate) rng: SmallRng,
    active: bool,
    reactive_camera: bool,
    pub(crate) camera_energy: f32,
    pub(crate) primary: Color,
    accents: Vec<Color>,
    pub(crate) last_layout: LayoutSpec,
    pub(crate) light_position: Vec3,
    pub(crate) light_intensity: f32,
    pub(crate) camera_look: Vec3,
    pub(crate) ground_opacity: f32,
    events_scratch: Vec<WallEvent>,
}

impl TileWall {
    #[must_use]
    pub fn new(options: WallOptions) -> Self {
        let rng = options
            .seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        let mut colors = options.colors;
        if colors.is_empty() {
            colors.push(DEFAULT_PRIMARY);
        }
        let primary = colors[0];
        let accents = colors.split_off(1);
        Self {
            registry: TweenRegistry::new(),
            tiles: TileTable::new(),
            bindings: FxHashMap::default(),
            camera_channel: None,
            ground_channel: None,
            light_channel: None,
            mode: Mode::Basic,
            rng,
            active: false,
            reactive_camera: false,
            camera_energy: 0.0,
            primary,
            accents,
            last_layout: options.layout,
            light_position: mode::BASIC_LIGHT_POSITION,
            light_intensity: mode::BASIC_LIGHT_INTENSITY,
            camera_look: mode::BASIC_CAMERA_LOOK,
            ground_opacity: mode::BASIC_GROUND_OPACITY,
            events_scratch: Vec::new(),
        }
    }

    /// Builds the tile table and creates one scene body per slot of the
    /// configured layout. Call once before the first `advance`.
    pub fn init(&mut self, scene: &mut dyn WallScene) -> Result<()> {
        use rand::Rng;

        let slots = layout::resolve(&self.last_layout);
        for (index, slot) in slots.iter().enumerate() {
            let position = slot.position();
            let base_color = self.primary.lighten(slot.lightness);
            let body = scene.create_tile_body(
                base_color,
                TileTransform {
                    position,
                    rotation: Vec3::ZERO,
                    opacity: 1.0,
                },
            );
            scene.set_kinematic(body, true);
            self.tiles
                .push(Tile::new(index, body, base_color, slot.lightness, position));
        }

        // Extra init colors land on distinct tiles, marked accent so they
        // never serve as donor templates during layout growth.
        let accents = std::mem::take(&mut self.accents);
        for color in accents {
            let len = self.tiles.len();
            for _ in 0..len {
                let index = self.rng.random_range(0..len);
                let tile = self.tiles.get_mut(index)?;
                if !tile.accent {
                    tile.accent = true;
                    tile.base_color = color;
                    scene.set_material_color(tile.body, color);
                    break;
                }
            }
        }

        debug!("wall initialized with {} tiles", self.tiles.len());
        Ok(())
    }

    /// Resumes the advance loop.
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Halts the advance loop; channels keep their state and catch up on
    /// the next tick after `start`.
    pub fn pause(&mut self) {
        self.active = false;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Read access to a tile's animation state.
    pub fn tile(&self, index: usize) -> Result<&Tile> {
        self.tiles.get(index)
    }

    /// Number of live tween channels. One channel exists per (tile, kind)
    /// at most, plus the camera/ground/light singletons.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.registry.len()
    }

    pub fn enable_reactive_camera(&mut self) {
        self.reactive_camera = true;
    }

    pub fn disable_reactive_camera(&mut self) {
        self.reactive_camera = false;
        self.camera_energy = 0.0;
    }

    /// Fades the whole wall in. Dormant tiles stay hidden.
    pub fn show(&mut self) -> Result<Completion> {
        self.fade_wall(1.0)
    }

    /// Fades the whole wall out.
    pub fn hide(&mut self) -> Result<Completion> {
        self.fade_wall(0.0)
    }

    fn fade_wall(&mut self, opacity: f32) -> Result<Completion> {
        let (source, completion) = CompletionSource::new();
        let mut source = Some(source);
        for index in 0..self.tiles.len() {
            if self.tiles.get(index)?.dormant {
                continue;
            }
            let key = self.tile_channel(index, ChannelKind::Position)?;
            let channel = self
                .registry
                .get_mut(key)
                .expect("channel created by factory");
            channel.to(
                smallvec::smallvec![(Prop::Opacity, Value::Scalar(opacity))],
                SHOW_HIDE_MS,
                crate::easing::Easing::QuadInOut,
            );
            if let Some(source) = source.take() {
                channel.call(WallEvent::Resolve(source));
            }
            channel.resume();
        }
        // An all-dormant wall has nothing to fade.
        if let Some(source) = source.take() {
            source.resolve();
        }
        Ok(completion)
    }

    /// Advances every live channel by `dt_ms`, writes changed values to
    /// the scene, then drains the event outbox. The host calls this once
    /// per frame; a large `dt_ms` after a pause is consumed in one call.
    pub fn advance(&mut self, dt_ms: f32, scene: &mut dyn WallScene) {
        if !self.active {
            return;
        }
        let mut events = std::mem::take(&mut self.events_scratch);
        let changed = self.registry.advance(dt_ms, &mut events);
        for key in changed {
            self.apply_binding(key, scene);
        }
        for event in events.drain(..) {
            self.handle_event(event, scene);
        }
        self.events_scratch = events;
        self.update_reactive_camera(dt_ms, scene);
    }

    // ========================================================================
    // Channel factory
    // ========================================================================

    /// Returns the single channel for (tile, kind), creating it on first
    /// use. Created channels are seeded from the tile's current state so
    /// the first `To` step chains from the right values.
    pub(crate) fn tile_channel(&mut self, index: usize, kind: ChannelKind) -> Result<ChannelKey> {
        let tile = self.tiles.get(index)?;
        if let Some(key) = tile.channel(kind) {
            if self.registry.contains(key) {
                return Ok(key);
            }
        }

        let mut channel = TweenChannel::new();
        let target = match kind {
            ChannelKind::Rotation => {
                channel.set_value(Prop::RotX, Value::Scalar(tile.rotation_offset.x));
                channel.set_value(Prop::RotY, Value::Scalar(tile.rotation_offset.y));
                channel.set_value(Prop::RotZ, Value::Scalar(tile.rotation_offset.z));
                channel.set_value(Prop::Color, Value::Color(tile.base_color));
                ChannelTarget::TileRotation(index)
            }
            ChannelKind::Float => {
                channel.set_value(Prop::Offset, Value::Scalar(tile.float_offset));
                ChannelTarget::TileFloat(index)
            }
            ChannelKind::Position => {
                let position = if tile.dormant { STAGING_POINT } else { tile.slot };
                channel.set_value(Prop::X, Value::Scalar(position.x));
                channel.set_value(Prop::Y, Value::Scalar(position.y));
                channel.set_value(Prop::Z, Value::Scalar(position.z));
                channel.set_value(
                    Prop::Opacity,
                    Value::Scalar(if tile.dormant { 0.0 } else { 1.0 }),
                );
                ChannelTarget::TilePosition(index)
            }
        };

        let key = self.registry.register(channel);
        self.bindings.insert(key, target);
        self.tiles.get_mut(index)?.set_channel(kind, key);
        Ok(key)
    }

    /// Returns the camera/ground/light singleton channel, creating and
    /// seeding it on first use.
    pub(crate) fn scenery_channel(&mut self, target: ChannelTarget) -> ChannelKey {
        let slot = match target {
            ChannelTarget::Camera => &mut self.camera_channel,
            ChannelTarget::Ground => &mut self.ground_channel,
            ChannelTarget::Light => &mut self.light_channel,
            _ => unreachable!("tile channels go through tile_channel"),
        };
        if let Some(key) = *slot {
            if self.registry.contains(key) {
                return key;
            }
        }

        let mut channel = TweenChannel::new();
        match target {
            ChannelTarget::Camera => {
                let look = self.camera_look;
                channel.set_value(Prop::X, Value::Scalar(look.x));
                channel.set_value(Prop::Y, Value::Scalar(look.y));
                channel.set_value(Prop::Z, Value::Scalar(look.z));
            }
            ChannelTarget::Ground => {
                channel.set_value(Prop::Opacity, Value::Scalar(self.ground_opacity));
            }
            ChannelTarget::Light => {
                channel.set_value(Prop::X, Value::Scalar(self.light_position.x));
                channel.set_value(Prop::Y, Value::Scalar(self.light_position.y));
                channel.set_value(Prop::Z, Value::Scalar(self.light_position.z));
                channel.set_value(Prop::Intensity, Value::Scalar(self.light_intensity));
            }
            _ => unreachable!(),
        }

        let key = self.registry.register(channel);
        self.bindings.insert(key, target);
        match target {
            ChannelTarget::Camera => self.camera_channel = Some(key),
            ChannelTarget::Ground => self.ground_channel = Some(key),
            ChannelTarget::Light => self.light_channel = Some(key),
            _ => unreachable!(),
        }
        key
    }

    /// Drops every channel at once. No stale event fires afterwards;
    /// pending completions settle as cancelled.
    pub(crate) fn flush_all_channels(&mut self) {
        self.registry.cancel_all();
        self.bindings.clear();
        self.camera_channel = None;
        self.ground_channel = None;
        self.light_channel = None;
        for tile in self.tiles.iter_mut() {
            tile.clear_channels();
        }
    }

    // ========================================================================
    // Binding application and event drain
    // ========================================================================

    /// Where a tile currently rests, as far as its position channel knows.
    pub(crate) fn tile_world_position(&self, index: usize) -> Vec3 {
        let Ok(tile) = self.tiles.get(index) else {
            return Vec3::ZERO;
        };
        tile.channel(ChannelKind::Position)
            .and_then(|key| self.registry.get(key))
            .map_or(tile.slot, |channel| {
                Vec3::new(
                    channel.scalar(Prop::X, tile.slot.x),
                    channel.scalar(Prop::Y, tile.slot.y),
                    channel.scalar(Prop::Z, tile.slot.z),
                )
            })
    }

    fn apply_binding(&mut self, key: ChannelKey, scene: &mut dyn WallScene) {
        let Some(&target) = self.bindings.get(&key) else {
            return;
        };
        match target {
            ChannelTarget::TileRotation(index) => {
                let Some(channel) = self.registry.get(key) else {
                    return;
                };
                let rotation = Vec3::new(
                    channel.scalar(Prop::RotX, 0.0),
                    channel.scalar(Prop::RotY, 0.0),
                    channel.scalar(Prop::RotZ, 0.0),
                );
                let color = match channel.value(Prop::Color) {
                    Some(Value::Color(color)) => Some(color),
                    _ => None,
                };
                if let Ok(tile) = self.tiles.get(index) {
                    scene.set_rotation(tile.body, rotation);
                    if let Some(color) = color {
                        scene.set_material_color(tile.body, color);
                    }
                }
            }
            ChannelTarget::TileFloat(index) => {
                let Some(channel) = self.registry.get(key) else {
                    return;
                };
                let offset = channel.scalar(Prop::Offset, 0.0);
                let base = self.tile_world_position(index);
                if let Ok(tile) = self.tiles.get_mut(index) {
                    tile.float_offset = offset;
                    scene.set_position(tile.body, base + Vec3::Z * offset);
                }
            }
            ChannelTarget::TilePosition(index) => {
                let Some(channel) = self.registry.get(key) else {
                    return;
                };
                let position = Vec3::new(
                    channel.scalar(Prop::X, 0.0),
                    channel.scalar(Prop::Y, 0.0),
                    channel.scalar(Prop::Z, 0.0),
                );
                let opacity = channel.scalar(Prop::Opacity, 1.0);
                if let Ok(tile) = self.tiles.get(index) {
                    scene.set_position(tile.body, position + Vec3::Z * tile.float_offset);
                    scene.set_opacity(tile.body, opacity);
                }
            }
            ChannelTarget::Camera => {
                let Some(channel) = self.registry.get(key) else {
                    return;
                };
                let look = Vec3::new(
                    channel.scalar(Prop::X, 0.0),
                    channel.scalar(Prop::Y, 0.0),
                    channel.scalar(Prop::Z, 0.0),
                );
                self.camera_look = look;
                scene.set_camera_look_at(look);
            }
            ChannelTarget::Ground => {
                let Some(channel) = self.registry.get(key) else {
                    return;
                };
                let opacity = channel.scalar(Prop::Opacity, 0.0);
                self.ground_opacity = opacity;
                scene.set_ground_opacity(opacity);
            }
            ChannelTarget::Light => {
                let Some(channel) = self.registry.get(key) else {
                    return;
                };
                let position = Vec3::new(
                    channel.scalar(Prop::X, self.light_position.x),
                    channel.scalar(Prop::Y, self.light_position.y),
                    channel.scalar(Prop::Z, self.light_position.z),
                );
                let intensity = channel.scalar(Prop::Intensity, self.light_intensity);
                self.light_position = position;
                self.light_intensity = intensity;
                scene.set_light_position(position);
                scene.set_light_intensity(intensity);
            }
        }
    }

    fn handle_event(&mut self, event: WallEvent, scene: &mut dyn WallScene) {
        match event {
            WallEvent::Resolve(source) => source.resolve(),
            WallEvent::ShakeSettled { index, done } | WallEvent::RollSettled { index, done } => {
                if let Ok(tile) = self.tiles.get(index) {
                    scene.set_rotation(tile.body, tile.rotation_offset);
                    scene.set_material_color(tile.body, tile.base_color);
                }
                done.resolve();
            }
            WallEvent::FloatCycleDone {
                index,
                offset,
                done,
            } => {
                if let Some(done) = done {
                    done.resolve();
                }
                let rearm = self.tiles.get(index).map(|tile| tile.floating) == Ok(true);
                if rearm {
                    // Cooperative loop: the flag was checked at a natural
                    // cycle boundary, so stop never preempts a cycle.
                    let _ = self.float_steps(index, -offset, None);
                }
            }
            WallEvent::LayoutSettled { len, done } => {
                for index in 0..len.min(self.tiles.len()) {
                    if let Ok(tile) = self.tiles.get_mut(index) {
                        tile.rotation_offset = Vec3::ZERO;
                        let body = tile.body;
                        let rotation_channel = tile.channel(ChannelKind::Rotation);
                        scene.set_rotation(body, Vec3::ZERO);
                        // The channel may hold a full-turn equivalent;
                        // reseed so the next animation chains from zero.
                        if let Some(channel) =
                            rotation_channel.and_then(|key| self.registry.get_mut(key))
                        {
                            channel.set_value(Prop::RotX, Value::Scalar(0.0));
                            channel.set_value(Prop::RotY, Value::Scalar(0.0));
                            channel.set_value(Prop::RotZ, Value::Scalar(0.0));
                        }
                    }
                }
                done.resolve();
            }
            WallEvent::ReleaseTile { index } => {
                if let Ok(tile) = self.tiles.get(index) {
                    scene.release_body(tile.body);
                }
            }
        }
    }

    fn update_reactive_camera(&mut self, dt_ms: f32, scene: &mut dyn WallScene) {
        self.camera_energy *= (-dt_ms / CAMERA_ENERGY_DECAY_MS).exp();
        if !self.reactive_camera || self.camera_energy < 1e-3 {
            return;
        }
        // The cross-fade owns the camera while it runs.
        let fading = self
            .camera_channel
            .and_then(|key| self.registry.get(key))
            .is_some_and(|channel| !channel.is_idle());
        if fading {
            return;
        }
        let base = match self.mode {
            Mode::Basic => mode::BASIC_CAMERA_LOOK,
            Mode::Physics => mode::PHYSICS_CAMERA_LOOK,
        };
        scene.set_camera_look_at(base + Vec3::Y * (self.camera_energy * CAMERA_SWAY));
    }

    /// Maps per-band audio forces onto floor-resting tiles as upward
    /// impulses. Band selection uses the tile's ring distance from the
    /// wall center; airborne tiles are skipped so one beat cannot
    /// double-impulse them.
    pub fn apply_forces(&mut self, scene: &mut dyn WallScene, forces: &[f32]) -> Result<()> {
        for &force in forces {
            crate::errors::ensure_finite("force", force)?;
        }
        if forces.is_empty() {
            return Ok(());
        }

        let mean = forces.iter().sum::<f32>() / forces.len() as f32;
        self.camera_energy = (self.camera_energy + mean * 0.1).min(4.0);

        if self.mode != Mode::Physics {
            return Ok(());
        }
        for tile in self.tiles.iter() {
            if tile.dormant {
                continue;
            }
            let ring = (tile.slot.truncate().length() / RING_WIDTH) as usize;
            let band = ring.min(forces.len() - 1);
            let position = scene.position(tile.body);
            if position.y <= FLOOR_Y + FLOOR_EPS {
                scene.apply_impulse(tile.body, Vec3::Y * forces[band] * IMPULSE_SCALE);
            }
        }
        Ok(())
    }
}
