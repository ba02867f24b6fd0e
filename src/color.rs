//! RGB color values used for tile materials.
//!
//! Colors interpolate component-wise in RGB space. This is a deliberate
//! simplification: perceptual blends are not worth the cost for short
//! material pulses, and it keeps interpolation symmetric with the scalar
//! channel values. Components are clamped to [0, 1] after every blend so
//! interpolation artifacts can never produce a negative channel.

use serde::{Deserialize, Serialize};

/// A linear RGB color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Moves the color toward white by `amount` in [0, 1].
    ///
    /// Layout templates carry a per-slot lightness offset relative to the
    /// wall primary color; this is how that offset is applied.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        Self {
            r: self.r + (1.0 - self.r) * amount,
            g: self.g + (1.0 - self.g) * amount,
            b: self.b + (1.0 - self.b) * amount,
        }
    }

    /// Component-wise RGB interpolation, clamped to [0, 1].
    #[must_use]
    pub fn lerp(self, end: Self, t: f32) -> Self {
        Self {
            r: self.r + (end.r - self.r) * t,
            g: self.g + (end.g - self.g) * t,
            b: self.b + (end.b - self.b) * t,
        }
        .clamped()
    }

    #[must_use]
    fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }
}
