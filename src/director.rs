//! Director operations: the public per-tile and whole-wall animations.
//!
//! Every operation reads or lazily creates the tile's channels, pushes
//! steps onto them and hands back a completion signal. Calls issued in
//! program order land on a tile's channel queue in the same order; across
//! tiles the only ordering is the deliberate distance stagger of waves
//! and layout transitions.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::color::Color;
use crate::easing::Easing;
use crate::errors::{Result, ensure_finite, ensure_positive};
use crate::layout::{self, LayoutSpec};
use crate::scene::{TileTransform, WallScene};
use crate::tiles::{ChannelKind, Tile};
use crate::tween::{Completion, CompletionSource, Prop, Targets, Value};
use crate::wall::{LAYOUT_MS, STAGING_POINT, TileWall, WallEvent};

const SHAKE_OUT_MS: f32 = 300.0;
const SHAKE_RETURN_MS: f32 = 3600.0;
const ROLL_MS: f32 = 500.0;
const FLOAT_LEAD_MAX_MS: f32 = 1800.0;
const FLOAT_MOVE_MIN_MS: f32 = 3000.0;
const FLOAT_MOVE_MAX_MS: f32 = 6000.0;
const MOVE_LIGHT_MS: f32 = 10_000.0;

/// Options for [`TileWall::shake_tile`].
#[derive(Debug, Clone, Copy)]
pub struct ShakeOptions {
    /// Rotation displacement per axis, radians.
    pub rotation: Vec3,
    /// Temporary color pulse; the tile returns to its base color.
    pub color: Option<Color>,
}

impl Default for ShakeOptions {
    fn default() -> Self {
        Self {
            rotation: Vec3::new(-0.2 * PI, 0.2 * PI, 0.0),
            color: None,
        }
    }
}

/// Fold axis selection for roll-overs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollDirection {
    /// Fold over the x axis.
    Vertical,
    /// Fold over the y axis.
    Horizontal,
    /// Both at once, a diagonal fold.
    Cross,
}

/// Options for [`TileWall::roll_over_tile`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RollOverOptions {
    pub direction: RollDirection,
    /// Permanent re-coloring: becomes the tile's new base color.
    pub color: Option<Color>,
}

impl Default for RollOverOptions {
    fn default() -> Self {
        Self {
            direction: RollDirection::Vertical,
            color: None,
        }
    }
}

/// Which animation a wave propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveKind {
    Shake,
    RollOver,
}

/// Options for [`TileWall::wave_tiles`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaveOptions {
    /// Wave source point.
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Propagation speed, wall units per millisecond.
    pub speed: f32,
    /// Rotation magnitude scale for the shake case.
    pub power: f32,
    pub kind: WaveKind,
    /// Roll-over fold direction; auto-selected from the source when
    /// unset.
    pub direction: Option<RollDirection>,
    pub color: Option<Color>,
}

impl Default for WaveOptions {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            speed: 0.1,
            power: 1.0,
            kind: WaveKind::Shake,
            direction: None,
            color: None,
        }
    }
}

/// Options for [`TileWall::move_light`]. Unset axes keep the light's
/// current coordinate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveLightOptions {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
    /// Milliseconds.
    pub duration: f32,
}

impl Default for MoveLightOptions {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            z: None,
            duration: MOVE_LIGHT_MS,
        }
    }
}

fn nearest_full_turn(angle: f32) -> f32 {
    (angle / TAU).round() * TAU
}

/// Signed axis distance folded into a wave rotation magnitude. Zero
/// distance contributes nothing; everything else is clamped into
/// [-pi/2, pi/2] so tiles next to the wave source do not spin wildly.
fn wave_magnitude(power: f32, signed_distance: f32) -> f32 {
    if signed_distance == 0.0 {
        0.0
    } else {
        (power * (PI / 2.0) / signed_distance).clamp(-PI / 2.0, PI / 2.0)
    }
}

impl TileWall {
    /// Briefly displaces the tile's rotation, then springs back to its
    /// cumulative offset. A second shake on the same tile replaces the
    /// channel's queue; the last caller wins.
    pub fn shake_tile(&mut self, index: usize, options: &ShakeOptions) -> Result<Completion> {
        ensure_finite("shake rotation.x", options.rotation.x)?;
        ensure_finite("shake rotation.y", options.rotation.y)?;
        ensure_finite("shake rotation.z", options.rotation.z)?;
        let (source, completion) = CompletionSource::new();
        self.shake_steps(index, 0.0, options, source)?;
        Ok(completion)
    }

    pub(crate) fn shake_steps(
        &mut self,
        index: usize,
        delay_ms: f32,
        options: &ShakeOptions,
        done: CompletionSource,
    ) -> Result<()> {
        let (offset, base_color) = {
            let tile = self.tiles.get_mut(index)?;
            tile.capture_rest_pose();
            (tile.rotation_offset, tile.base_color)
        };

        let mut out: Targets = smallvec![
            (Prop::RotX, Value::Scalar(offset.x + options.rotation.x)),
            (Prop::RotY, Value::Scalar(offset.y + options.rotation.y)),
            (Prop::RotZ, Value::Scalar(offset.z + options.rotation.z)),
        ];
        let mut back: Targets = smallvec![
            (Prop::RotX, Value::Scalar(offset.x)),
            (Prop::RotY, Value::Scalar(offset.y)),
            (Prop::RotZ, Value::Scalar(offset.z)),
        ];
        if let Some(color) = options.color {
            out.push((Prop::Color, Value::Color(color)));
            back.push((Prop::Color, Value::Color(base_color)));
        }

        let key = self.tile_channel(index, ChannelKind::Rotation)?;
        let channel = self
            .registry
            .get_mut(key)
            .expect("channel created by factory");
        channel.replace_queue();
        if delay_ms > 0.0 {
            channel.wait(delay_ms);
        }
        channel
            .to(out, SHAKE_OUT_MS, Easing::CircInOut)
            .to(back, SHAKE_RETURN_MS, Easing::elastic_out())
            .call(WallEvent::ShakeSettled { index, done })
            .resume();
        Ok(())
    }

    /// Folds the tile 180 degrees, permanently advancing its cumulative
    /// rotation offset. The fold direction alternates: each call flips
    /// the involved adjustor so the next roll-over folds the other way.
    pub fn roll_over_tile(&mut self, index: usize, options: &RollOverOptions) -> Result<Completion> {
        let (source, completion) = CompletionSource::new();
        self.roll_steps(index, 0.0, options, source)?;
        Ok(completion)
    }

    pub(crate) fn roll_steps(
        &mut self,
        index: usize,
        delay_ms: f32,
        options: &RollOverOptions,
        done: CompletionSource,
    ) -> Result<()> {
        let (offset, base_color) = {
            let tile = self.tiles.get_mut(index)?;
            tile.capture_rest_pose();
            match options.direction {
                RollDirection::Vertical => {
                    tile.rotation_offset.x += PI * tile.adjust_y;
                    tile.adjust_y = -tile.adjust_y;
                }
                RollDirection::Horizontal => {
                    tile.rotation_offset.y += PI * tile.adjust_z;
                    tile.adjust_z = -tile.adjust_z;
                }
                RollDirection::Cross => {
                    tile.rotation_offset.x += PI * tile.adjust_y;
                    tile.rotation_offset.y += PI * tile.adjust_z;
                    tile.adjust_y = -tile.adjust_y;
                    tile.adjust_z = -tile.adjust_z;
                }
            }
            if let Some(color) = options.color {
                tile.base_color = color;
            }
            (tile.rotation_offset, tile.base_color)
        };

        let mut targets: Targets = smallvec![
            (Prop::RotX, Value::Scalar(offset.x)),
            (Prop::RotY, Value::Scalar(offset.y)),
            (Prop::RotZ, Value::Scalar(offset.z)),
        ];
        if options.color.is_some() {
            targets.push((Prop::Color, Value::Color(base_color)));
        }

        let key = self.tile_channel(index, ChannelKind::Rotation)?;
        let channel = self
            .registry
            .get_mut(key)
            .expect("channel created by factory");
        if delay_ms > 0.0 {
            channel.wait(delay_ms);
        }
        channel
            .to(targets, ROLL_MS, Easing::QuadInOut)
            .call(WallEvent::RollSettled { index, done })
            .resume();
        Ok(())
    }

    /// Runs one float cycle: drift out to `offset` on the z axis, drift
    /// back, with randomized lead-in and durations.
    pub fn float_tile(&mut self, index: usize, offset: f32) -> Result<Completion> {
        ensure_finite("float offset", offset)?;
        self.tiles.get(index)?;
        let (source, completion) = CompletionSource::new();
        self.float_steps(index, offset, Some(source))?;
        Ok(completion)
    }

    pub(crate) fn float_steps(
        &mut self,
        index: usize,
        offset: f32,
        done: Option<CompletionSource>,
    ) -> Result<()> {
        let lead = self.rng.random_range(0.0..=FLOAT_LEAD_MAX_MS);
        let rise = self.rng.random_range(FLOAT_MOVE_MIN_MS..=FLOAT_MOVE_MAX_MS);
        let hold = self.rng.random_range(0.0..=FLOAT_LEAD_MAX_MS);
        let fall = self.rng.random_range(FLOAT_MOVE_MIN_MS..=FLOAT_MOVE_MAX_MS);

        let key = self.tile_channel(index, ChannelKind::Float)?;
        let channel = self
            .registry
            .get_mut(key)
            .expect("channel created by factory");
        channel
            .wait(lead)
            .to(
                smallvec![(Prop::Offset, Value::Scalar(offset))],
                rise,
                Easing::QuadInOut,
            )
            .wait(hold)
            .to(
                smallvec![(Prop::Offset, Value::Scalar(0.0))],
                fall,
                Easing::QuadInOut,
            )
            .call(WallEvent::FloatCycleDone {
                index,
                offset,
                done,
            })
            .resume();
        Ok(())
    }

    /// Marks every tile floating and starts its cycle. Cycles re-arm
    /// themselves with alternating sign while the flag holds.
    pub fn start_floating_tiles(&mut self, offset: f32) -> Result<()> {
        ensure_finite("float offset", offset)?;
        for index in 0..self.tiles.len() {
            if self.tiles.get(index)?.dormant {
                continue;
            }
            self.tiles.get_mut(index)?.floating = true;
            self.float_steps(index, offset, None)?;
        }
        Ok(())
    }

    /// Clears the floating flag. In-flight cycles finish; the loop exits
    /// at the next natural cycle boundary rather than being preempted.
    pub fn stop_floating_tiles(&mut self) {
        for tile in self.tiles.iter_mut() {
            tile.floating = false;
        }
    }

    /// Propagates a shake or roll-over outward from a source point, each
    /// tile delayed by its distance over the wave speed.
    pub fn wave_tiles(&mut self, options: &WaveOptions) -> Result<()> {
        ensure_finite("wave source.x", options.x)?;
        ensure_finite("wave source.y", options.y)?;
        ensure_finite("wave source.z", options.z)?;
        ensure_finite("wave power", options.power)?;
        ensure_positive("wave speed", options.speed)?;

        let source = Vec3::new(options.x, options.y, options.z);
        for index in 0..self.tiles.len() {
            let (slot, dormant) = {
                let tile = self.tiles.get(index)?;
                (tile.slot, tile.dormant)
            };
            if dormant {
                continue;
            }
            let delay_ms = slot.distance(source) / options.speed;
            match options.kind {
                WaveKind::Shake => {
                    let rotation = Vec3::new(
                        wave_magnitude(options.power, slot.x - source.x),
                        wave_magnitude(options.power, slot.y - source.y),
                        wave_magnitude(options.power, slot.z - source.z),
                    );
                    let shake = ShakeOptions {
                        rotation,
                        color: options.color,
                    };
                    let (done, _) = CompletionSource::new();
                    self.shake_steps(index, delay_ms, &shake, done)?;
                }
                WaveKind::RollOver => {
                    let direction = options.direction.unwrap_or_else(|| {
                        if options.x == options.y {
                            RollDirection::Cross
                        } else if (slot.x - source.x).abs() < (slot.y - source.y).abs() {
                            RollDirection::Vertical
                        } else {
                            RollDirection::Horizontal
                        }
                    });
                    let roll = RollOverOptions {
                        direction,
                        color: options.color,
                    };
                    let (done, _) = CompletionSource::new();
                    self.roll_steps(index, delay_ms, &roll, done)?;
                }
            }
        }
        Ok(())
    }

    /// Re-targets the wall toward a new layout over a fixed one-second
    /// window.
    ///
    /// Growth reuses dormant tiles first and then clones the donor color
    /// for genuinely new tiles, spawned invisible at the staging point.
    /// Shrink never removes tiles: the extras fade to the staging point
    /// and wait, dormant, for future regrowth.
    pub fn switch_layout(
        &mut self,
        scene: &mut dyn WallScene,
        spec: LayoutSpec,
    ) -> Result<Completion> {
        let slots = layout::resolve(&spec);
        self.last_layout = spec;

        if slots.len() > self.tiles.len() {
            let template = self.tiles.donor().map_or(self.primary, |d| d.base_color);
            for index in self.tiles.len()..slots.len() {
                let slot = slots[index];
                let base_color = template.lighten(slot.lightness);
                let body = scene.create_tile_body(
                    base_color,
                    TileTransform {
                        position: STAGING_POINT,
                        rotation: Vec3::ZERO,
                        opacity: 0.0,
                    },
                );
                scene.set_kinematic(body, true);
                let mut tile = Tile::new(index, body, base_color, slot.lightness, slot.position());
                tile.dormant = true;
                self.tiles.push(tile);
            }
        }

        let (source, completion) = CompletionSource::new();
        let mut source = Some(source);

        for index in 0..self.tiles.len() {
            if let Some(slot) = slots.get(index) {
                let target = slot.position();

                // Rotation back to neutral, via the nearest full turn so
                // a rolled tile does not unwind through extra spins.
                let (needs_rotation, offset, base_color) = {
                    let tile = self.tiles.get(index)?;
                    (
                        tile.channel(ChannelKind::Rotation).is_some()
                            || tile.rotation_offset != Vec3::ZERO,
                        tile.rotation_offset,
                        tile.base_color,
                    )
                };
                if needs_rotation {
                    let key = self.tile_channel(index, ChannelKind::Rotation)?;
                    let channel = self
                        .registry
                        .get_mut(key)
                        .expect("channel created by factory");
                    channel.replace_queue();
                    channel
                        .to(
                            smallvec![
                                (Prop::RotX, Value::Scalar(nearest_full_turn(offset.x))),
                                (Prop::RotY, Value::Scalar(nearest_full_turn(offset.y))),
                                (Prop::RotZ, Value::Scalar(nearest_full_turn(offset.z))),
                                (Prop::Color, Value::Color(base_color)),
                            ],
                            LAYOUT_MS,
                            Easing::CircInOut,
                        )
                        .resume();
                }

                let key = self.tile_channel(index, ChannelKind::Position)?;
                {
                    let tile = self.tiles.get_mut(index)?;
                    tile.slot = target;
                    tile.dormant = false;
                }
                let channel = self
                    .registry
                    .get_mut(key)
                    .expect("channel created by factory");
                channel.replace_queue();
                channel.to(
                    smallvec![
                        (Prop::X, Value::Scalar(target.x)),
                        (Prop::Y, Value::Scalar(target.y)),
                        (Prop::Z, Value::Scalar(target.z)),
                        (Prop::Opacity, Value::Scalar(1.0)),
                    ],
                    LAYOUT_MS,
                    Easing::CircInOut,
                );
                if let Some(done) = source.take() {
                    channel.call(WallEvent::LayoutSettled {
                        len: slots.len(),
                        done,
                    });
                }
                channel.resume();
            } else {
                let key = self.tile_channel(index, ChannelKind::Position)?;
                {
                    let tile = self.tiles.get_mut(index)?;
                    tile.dormant = true;
                    tile.floating = false;
                }
                let channel = self
                    .registry
                    .get_mut(key)
                    .expect("channel created by factory");
                channel.replace_queue();
                channel
                    .to(
                        smallvec![
                            (Prop::X, Value::Scalar(STAGING_POINT.x)),
                            (Prop::Y, Value::Scalar(STAGING_POINT.y)),
                            (Prop::Z, Value::Scalar(STAGING_POINT.z)),
                            (Prop::Opacity, Value::Scalar(0.0)),
                        ],
                        LAYOUT_MS,
                        Easing::CircInOut,
                    )
                    .resume();
            }
        }

        // An empty explicit layout leaves nothing to animate.
        if let Some(done) = source {
            done.resolve();
        }

        debug!(
            "layout switch: {} slots, {} tiles",
            slots.len(),
            self.tiles.len()
        );
        Ok(completion)
    }

    /// Retargets the spotlight position. Axes left unset keep their
    /// current coordinate; a periodic caller gets the ambient breathing
    /// drift.
    pub fn move_light(&mut self, options: &MoveLightOptions) -> Result<Completion> {
        for (what, axis) in [
            ("light x", options.x),
            ("light y", options.y),
            ("light z", options.z),
        ] {
            if let Some(value) = axis {
                ensure_finite(what, value)?;
            }
        }
        ensure_positive("light duration", options.duration)?;

        let target = Vec3::new(
            options.x.unwrap_or(self.light_position.x),
            options.y.unwrap_or(self.light_position.y),
            options.z.unwrap_or(self.light_position.z),
        );
        let (source, completion) = CompletionSource::new();
        let key = self.scenery_channel(crate::wall::ChannelTarget::Light);
        let channel = self
            .registry
            .get_mut(key)
            .expect("channel created by factory");
        channel.replace_queue();
        channel
            .to(
                smallvec![
                    (Prop::X, Value::Scalar(target.x)),
                    (Prop::Y, Value::Scalar(target.y)),
                    (Prop::Z, Value::Scalar(target.z)),
                ],
                options.duration,
                Easing::CircInOut,
            )
            .call(WallEvent::Resolve(source))
            .resume();
        Ok(completion)
    }
}
