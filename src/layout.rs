//! Named tile layouts.
//!
//! A layout is an ordered list of slots, each carrying a rest position on
//! the 24-unit wall grid and a lightness offset applied to the wall
//! primary color. Layouts are resolved by name or supplied explicitly;
//! an unknown name falls back to the default `musicNote` template instead
//! of failing, which keeps a mistyped name from blanking the wall.

use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

/// One tile slot of a layout template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Rest position `[x, y, z]` on the wall grid.
    pub coords: [f32; 3],
    /// Shading offset toward white, relative to the wall primary color.
    pub lightness: f32,
}

impl Slot {
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.coords)
    }
}

/// Layout selection: a named template or an explicit slot list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutSpec {
    Named(String),
    Explicit(Vec<Slot>),
}

impl From<&str> for LayoutSpec {
    fn from(name: &str) -> Self {
        LayoutSpec::Named(name.to_owned())
    }
}

/// Name of the fallback template.
pub const DEFAULT_LAYOUT: &str = "musicNote";

const fn sl(x: f32, y: f32, l: f32) -> Slot {
    Slot {
        coords: [x, y, 0.0],
        lightness: l,
    }
}

/// Eighth-note glyph, 17 tiles.
pub const MUSIC_NOTE: &[Slot] = &[
    sl(12.0, 84.0, 0.2),
    sl(36.0, 84.0, 0.1),
    sl(12.0, 60.0, 0.1),
    sl(36.0, 60.0, 0.02),
    sl(60.0, 60.0, 0.03),
    sl(12.0, 36.0, 0.0),
    sl(60.0, 36.0, 0.0),
    sl(12.0, 12.0, 0.0),
    sl(-36.0, -12.0, 0.11),
    sl(-12.0, -12.0, 0.08),
    sl(12.0, -12.0, 0.0),
    sl(-60.0, -36.0, 0.09),
    sl(-36.0, -36.0, 0.0),
    sl(-12.0, -36.0, 0.0),
    sl(12.0, -36.0, 0.0),
    sl(-36.0, -60.0, 0.0),
    sl(-12.0, -60.0, 0.03),
];

/// Right-pointing triangle, 15 tiles.
pub const PLAY: &[Slot] = &[
    sl(-36.0, 48.0, 0.35),
    sl(-12.0, 36.0, 0.15),
    sl(-36.0, 24.0, 0.15),
    sl(12.0, 24.0, 0.1),
    sl(-12.0, 12.0, 0.1),
    sl(36.0, 12.0, 0.0),
    sl(-36.0, 0.0, 0.1),
    sl(12.0, 0.0, 0.0),
    sl(60.0, 0.0, 0.0),
    sl(-12.0, -12.0, 0.0),
    sl(36.0, -12.0, 0.0),
    sl(-36.0, -24.0, 0.0),
    sl(12.0, -24.0, 0.0),
    sl(-12.0, -36.0, 0.0),
    sl(-36.0, -48.0, 0.0),
];

/// Two vertical bars, 20 tiles.
pub const PAUSE: &[Slot] = &[
    sl(-60.0, 48.0, 0.25),
    sl(-36.0, 48.0, 0.12),
    sl(36.0, 48.0, 0.18),
    sl(60.0, 48.0, 0.08),
    sl(-60.0, 24.0, 0.1),
    sl(-36.0, 24.0, 0.05),
    sl(36.0, 24.0, 0.07),
    sl(60.0, 24.0, 0.0),
    sl(-60.0, 0.0, 0.05),
    sl(-36.0, 0.0, 0.0),
    sl(36.0, 0.0, 0.0),
    sl(60.0, 0.0, 0.0),
    sl(-60.0, -24.0, 0.0),
    sl(-36.0, -24.0, 0.0),
    sl(36.0, -24.0, 0.0),
    sl(60.0, -24.0, 0.02),
    sl(-60.0, -48.0, 0.0),
    sl(-36.0, -48.0, 0.0),
    sl(36.0, -48.0, 0.0),
    sl(60.0, -48.0, 0.0),
];

/// Filled square, 16 tiles.
pub const STOP: &[Slot] = &[
    sl(-36.0, 36.0, 0.22),
    sl(-12.0, 36.0, 0.12),
    sl(12.0, 36.0, 0.08),
    sl(36.0, 36.0, 0.1),
    sl(-36.0, 12.0, 0.09),
    sl(-12.0, 12.0, 0.04),
    sl(12.0, 12.0, 0.0),
    sl(36.0, 12.0, 0.0),
    sl(-36.0, -12.0, 0.05),
    sl(-12.0, -12.0, 0.0),
    sl(12.0, -12.0, 0.0),
    sl(36.0, -12.0, 0.0),
    sl(-36.0, -36.0, 0.0),
    sl(-12.0, -36.0, 0.0),
    sl(12.0, -36.0, 0.03),
    sl(36.0, -36.0, 0.0),
];

/// Left-pointing triangle against a bar, 14 tiles.
pub const PREVIOUS_TRACK: &[Slot] = &[
    sl(-60.0, 36.0, 0.25),
    sl(-60.0, 12.0, 0.1),
    sl(-60.0, -12.0, 0.05),
    sl(-60.0, -36.0, 0.0),
    sl(-36.0, 0.0, 0.12),
    sl(-12.0, 12.0, 0.08),
    sl(-12.0, -12.0, 0.0),
    sl(12.0, 24.0, 0.06),
    sl(12.0, 0.0, 0.0),
    sl(12.0, -24.0, 0.0),
    sl(36.0, 36.0, 0.1),
    sl(36.0, 12.0, 0.0),
    sl(36.0, -12.0, 0.0),
    sl(36.0, -36.0, 0.0),
];

/// Right-pointing triangle against a bar, 14 tiles.
pub const NEXT_TRACK: &[Slot] = &[
    sl(-36.0, 36.0, 0.25),
    sl(-36.0, 12.0, 0.12),
    sl(-36.0, -12.0, 0.05),
    sl(-36.0, -36.0, 0.0),
    sl(-12.0, 24.0, 0.1),
    sl(-12.0, 0.0, 0.04),
    sl(-12.0, -24.0, 0.0),
    sl(12.0, 12.0, 0.06),
    sl(12.0, -12.0, 0.0),
    sl(36.0, 0.0, 0.0),
    sl(60.0, 36.0, 0.1),
    sl(60.0, 12.0, 0.0),
    sl(60.0, -12.0, 0.0),
    sl(60.0, -36.0, 0.02),
];

/// Looks up a named template.
#[must_use]
pub fn by_name(name: &str) -> Option<&'static [Slot]> {
    match name {
        "musicNote" => Some(MUSIC_NOTE),
        "play" => Some(PLAY),
        "pause" => Some(PAUSE),
        "stop" => Some(STOP),
        "previousTrack" => Some(PREVIOUS_TRACK),
        "nextTrack" => Some(NEXT_TRACK),
        _ => None,
    }
}

/// Resolves a layout spec to its slot list.
///
/// Unknown names fall back to [`MUSIC_NOTE`] with a warning rather than
/// failing.
#[must_use]
pub fn resolve(spec: &LayoutSpec) -> Vec<Slot> {
    match spec {
        LayoutSpec::Named(name) => by_name(name)
            .unwrap_or_else(|| {
                warn!("unknown layout '{name}', falling back to '{DEFAULT_LAYOUT}'");
                MUSIC_NOTE
            })
            .to_vec(),
        LayoutSpec::Explicit(slots) => slots.clone(),
    }
}
