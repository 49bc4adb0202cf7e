//! Line and triangle rasterization into a [`PixelSurface`](crate::surface::PixelSurface).
//!
//! All rasterizers take points that are already in screen space and clip each
//! candidate pixel against the surface, so off-screen geometry is never an error.

pub mod line;
pub mod triangle;

pub use line::{draw_line, draw_line_subdivide, draw_point, line_points};
pub use triangle::{fill_triangle, fill_triangle_parallel, scanline_spans, Span};

/// Linear blend between `min` and `max`, with `gradient` clamped to `[0, 1]`
#[inline]
pub fn interpolate(min: f32, max: f32, gradient: f32) -> f32 {
    min + (max - min) * gradient.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_clamps_gradient() {
        assert_eq!(interpolate(2.0, 4.0, 0.5), 3.0);
        assert_eq!(interpolate(2.0, 4.0, -0.1), 2.0);
        assert_eq!(interpolate(2.0, 4.0, 1.2), 4.0);
        assert_eq!(interpolate(4.0, 2.0, 0.25), 3.5);
    }
}
