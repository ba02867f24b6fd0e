//! Per-tile mutable animation state.
//!
//! A [`Tile`] is the engine-side record for one visual unit of the wall:
//! cumulative rotation offsets, fold-direction adjustors, color identity
//! and the handles of its three tween channels. Tiles are keyed by their
//! stable index; the table never shrinks — when a layout has fewer slots
//! than tiles, the extras go dormant and keep their identity for future
//! regrowth.

use glam::Vec3;

use crate::color::Color;
use crate::errors::{Result, WallError};
use crate::scene::BodyKey;
use crate::tween::ChannelKey;

/// The three channel kinds a tile owns.
///
/// At most one channel instance exists per (tile, kind); channels are
/// created lazily on first use through the wall's factory and reused by
/// every later animation on the same tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Rotation offsets and material color (shake, roll-over, wave).
    Rotation = 0,
    /// Float-cycle z-offset.
    Float = 1,
    /// Slot position and opacity (layout switches, show/hide).
    Position = 2,
}

/// Per-tile mutable animation record.
#[derive(Debug)]
pub struct Tile {
    /// Stable ordinal identity.
    pub index: usize,
    /// Host-owned scene node handle.
    pub body: BodyKey,
    /// Canonical color; persists across temporary overrides.
    pub base_color: Color,
    /// Shading offset relative to the wall primary color.
    pub lightness: f32,
    /// Cumulative Euler rotation offsets carried between animations.
    /// Roll-over composes onto these; shake returns to them.
    pub rotation_offset: Vec3,
    /// Fold-direction adjustor for vertical roll-overs. Always ±1.
    pub adjust_y: f32,
    /// Fold-direction adjustor for horizontal roll-overs. Always ±1.
    pub adjust_z: f32,
    /// Excluded from donor-color selection when the layout grows.
    pub accent: bool,
    /// Liveness flag for the float loop; cleared cooperatively.
    pub floating: bool,
    /// Latest float-cycle offset, composed additively with the position
    /// channel at apply time.
    pub float_offset: f32,
    /// Current layout rest position.
    pub slot: Vec3,
    /// Faded out at the staging point, retained for regrowth.
    pub dormant: bool,

    /// Rotation the engine last wrote during layout application; the rest
    /// pose that lazy capture starts the offsets from.
    pub(crate) spawn_rotation: Vec3,
    pose_captured: bool,
    channels: [Option<ChannelKey>; 3],
}

impl Tile {
    #[must_use]
    pub fn new(index: usize, body: BodyKey, base_color: Color, lightness: f32, slot: Vec3) -> Self {
        Self {
            index,
            body,
            base_color,
            lightness,
            rotation_offset: Vec3::ZERO,
            adjust_y: 1.0,
            adjust_z: 1.0,
            accent: false,
            floating: false,
            float_offset: 0.0,
            slot,
            dormant: false,
            spawn_rotation: Vec3::ZERO,
            pose_captured: false,
            channels: [None; 3],
        }
    }

    /// Copies the rest pose into the rotation offsets the first time any
    /// animation touches the tile. The initial pose is set during layout
    /// application, not construction, so capture has to wait until the
    /// offsets are actually needed.
    pub fn capture_rest_pose(&mut self) {
        if !self.pose_captured {
            self.rotation_offset = self.spawn_rotation;
            self.pose_captured = true;
        }
    }

    #[must_use]
    pub fn channel(&self, kind: ChannelKind) -> Option<ChannelKey> {
        self.channels[kind as usize]
    }

    pub fn set_channel(&mut self, kind: ChannelKind, key: ChannelKey) {
        self.channels[kind as usize] = Some(key);
    }

    /// Forgets all channel handles. Used by the mode controller's full
    /// registry flush; the channels themselves are already gone.
    pub fn clear_channels(&mut self) {
        self.channels = [None; 3];
    }
}

/// Owned table of all tiles, keyed by stable index.
#[derive(Debug, Default)]
pub struct TileTable {
    tiles: Vec<Tile>,
}

impl TileTable {
    #[must_use]
    pub fn new() -> Self {
        Self { tiles: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn push(&mut self, tile: Tile) {
        debug_assert_eq!(tile.index, self.tiles.len());
        self.tiles.push(tile);
    }

    /// Fails fast on an out-of-bounds index; a silent no-op here would
    /// desynchronize animation state from the caller's view of the wall.
    pub fn get(&self, index: usize) -> Result<&Tile> {
        self.tiles.get(index).ok_or(WallError::InvalidIndex {
            index,
            len: self.tiles.len(),
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Tile> {
        let len = self.tiles.len();
        self.tiles
            .get_mut(index)
            .ok_or(WallError::InvalidIndex { index, len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut()
    }

    /// The donor whose color seeds newly grown tiles: the non-accent tile
    /// with the smallest lightness, i.e. the closest to the wall primary.
    #[must_use]
    pub fn donor(&self) -> Option<&Tile> {
        self.tiles
            .iter()
            .filter(|tile| !tile.accent)
            .min_by(|a, b| a.lightness.total_cmp(&b.lightness))
    }
}
