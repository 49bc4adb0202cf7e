/// Normalized RGBA color
use serde::{Deserialize, Serialize};

/// A color with each channel in the normalized `[0, 1]` range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    pub const BLACK: Color4 = Color4::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color4 = Color4::new(1.0, 1.0, 1.0, 1.0);
    pub const YELLOW: Color4 = Color4::new(1.0, 1.0, 0.0, 1.0);
    pub const MAGENTA: Color4 = Color4::new(1.0, 0.0, 1.0, 1.0);
    pub const CYAN: Color4 = Color4::new(0.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from three channels
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Convert to 8-bit samples in RGBA order.
    ///
    /// Channels are clamped to `[0, 1]` first, so out-of-range input
    /// saturates rather than wrapping.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
            channel_to_u8(self.a),
        ]
    }
}

impl Default for Color4 {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color4 {
    fn from(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

fn channel_to_u8(channel: f32) -> u8 {
    // NaN survives clamp; the saturating cast maps it to 0
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
