/// Scan-line triangle fill
use std::ops::{Range, RangeInclusive};

use rayon::prelude::*;

use super::interpolate;
use crate::color::Color4;
use crate::projection::ScreenPoint;
use crate::surface::PixelSurface;

/// One scanline of a triangle: pixels `x_start..x_end` on row `y`,
/// with the depth at each boundary.
///
/// Boundaries are edge crossings rounded to the nearest pixel, so two faces
/// sharing an edge split its pixels instead of both writing them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub y: i32,
    pub x_start: i32,
    pub x_end: i32,
    pub z_start: f32,
    pub z_end: f32,
}

impl Span {
    /// Depth at column `x`, blended between the two boundaries
    #[inline]
    pub fn depth_at(&self, x: i32) -> f32 {
        if self.x_end == self.x_start {
            return self.z_start;
        }
        let start = self.x_start as f32;
        let gradient = (x as f32 - start) / (self.x_end as f32 - start);
        interpolate(self.z_start, self.z_end, gradient)
    }

    /// Columns of this span that land on a surface `width` pixels wide
    fn clipped_columns(&self, width: usize) -> Range<i32> {
        self.x_start.max(0)..self.x_end.min(width as i32)
    }
}

/// Sorted vertices plus which side the long p1-p3 edge sits on
#[derive(Debug, Clone, Copy)]
struct Setup {
    p1: ScreenPoint,
    p2: ScreenPoint,
    p3: ScreenPoint,
    long_edge_left: bool,
}

impl Setup {
    fn new(mut p1: ScreenPoint, mut p2: ScreenPoint, mut p3: ScreenPoint) -> Self {
        // Order top to bottom
        if p1.y > p2.y {
            std::mem::swap(&mut p1, &mut p2);
        }
        if p2.y > p3.y {
            std::mem::swap(&mut p2, &mut p3);
        }
        if p1.y > p2.y {
            std::mem::swap(&mut p1, &mut p2);
        }

        let slope_p1p2 = inverse_slope(&p1, &p2);
        let slope_p1p3 = inverse_slope(&p1, &p3);

        // p2 right of the long edge puts the long edge on the left. Along a
        // flat top both slopes can't be compared, so compare x directly.
        let long_edge_left = if p2.y > p1.y {
            slope_p1p2 > slope_p1p3
        } else {
            p2.x > p1.x
        };

        Self {
            p1,
            p2,
            p3,
            long_edge_left,
        }
    }

    /// Rows from the top vertex to the bottom one; `None` without vertical extent
    fn rows(&self) -> Option<RangeInclusive<i32>> {
        if !(self.p3.y > self.p1.y) {
            return None;
        }
        Some((self.p1.y as i32)..=(self.p3.y as i32))
    }

    fn span(&self, y: i32) -> Span {
        let row = y as f32;
        // A flat bottom has no lower edge to switch to
        let short_edge = if row < self.p2.y || self.p2.y == self.p3.y {
            (self.p1, self.p2)
        } else {
            (self.p2, self.p3)
        };
        let long_edge = (self.p1, self.p3);

        let (left, right) = if self.long_edge_left {
            (long_edge, short_edge)
        } else {
            (short_edge, long_edge)
        };

        let (x_start, z_start) = edge_at(left.0, left.1, row);
        let (x_end, z_end) = edge_at(right.0, right.1, row);
        Span {
            y,
            x_start: x_start.round() as i32,
            x_end: x_end.round() as i32,
            z_start,
            z_end,
        }
    }
}

/// dX/dY, or 0 for an edge with no vertical extent
fn inverse_slope(a: &ScreenPoint, b: &ScreenPoint) -> f32 {
    if b.y - a.y > 0.0 {
        (b.x - a.x) / (b.y - a.y)
    } else {
        0.0
    }
}

/// X and depth where edge `a`-`b` crosses row `y`
fn edge_at(a: ScreenPoint, b: ScreenPoint, y: f32) -> (f32, f32) {
    let gradient = if a.y != b.y { (y - a.y) / (b.y - a.y) } else { 1.0 };
    (interpolate(a.x, b.x, gradient), interpolate(a.z, b.z, gradient))
}

/// Every scanline of the triangle, top to bottom, unclipped.
///
/// A triangle with no vertical extent yields nothing.
pub fn scanline_spans(
    p1: ScreenPoint,
    p2: ScreenPoint,
    p3: ScreenPoint,
) -> impl Iterator<Item = Span> {
    let setup = Setup::new(p1, p2, p3);
    setup.rows().into_iter().flatten().map(move |y| setup.span(y))
}

/// Rows of the triangle that land on the surface
fn clipped_rows(setup: &Setup, height: usize) -> Option<RangeInclusive<i32>> {
    let rows = setup.rows()?;
    let clipped = (*rows.start()).max(0)..=(*rows.end()).min(height as i32 - 1);
    (!clipped.is_empty()).then_some(clipped)
}

/// Fill a flat-colored triangle given in screen space.
///
/// Depth is interpolated per pixel and passed to the surface, which only
/// tests it when it carries a depth buffer.
pub fn fill_triangle(
    surface: &mut PixelSurface,
    p1: ScreenPoint,
    p2: ScreenPoint,
    p3: ScreenPoint,
    color: Color4,
) {
    let setup = Setup::new(p1, p2, p3);
    let width = surface.width();

    let Some(rows) = clipped_rows(&setup, surface.height()) else {
        return;
    };

    for y in rows {
        let span = setup.span(y);
        for x in span.clipped_columns(width) {
            surface.put_pixel_depth(x as usize, y as usize, span.depth_at(x), color);
        }
    }
}

/// [`fill_triangle`] with rows spread across the rayon pool.
///
/// Each worker owns whole rows, so no pixel is written by two workers.
pub fn fill_triangle_parallel(
    surface: &mut PixelSurface,
    p1: ScreenPoint,
    p2: ScreenPoint,
    p3: ScreenPoint,
    color: Color4,
) {
    let setup = Setup::new(p1, p2, p3);
    let Some(rows) = clipped_rows(&setup, surface.height()) else {
        return;
    };
    let first = *rows.start() as usize;
    let count = (*rows.end() - *rows.start()) as usize + 1;

    surface
        .par_rows_mut()
        .skip(first)
        .take(count)
        .for_each(|mut row| {
            let span = setup.span(row.y() as i32);
            for x in span.clipped_columns(row.width()) {
                row.put_pixel_depth(x as usize, span.depth_at(x), color);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_row(surface: &PixelSurface, y: usize) -> Vec<usize> {
        (0..surface.width())
            .filter(|&x| surface.pixel(x, y) != [0, 0, 0, 0])
            .collect()
    }

    #[test]
    fn test_reference_triangle_is_gap_free() {
        let mut surface = PixelSurface::new(16, 16);
        fill_triangle(
            &mut surface,
            ScreenPoint::new(5.0, 0.0, 0.0),
            ScreenPoint::new(0.0, 10.0, 0.0),
            ScreenPoint::new(10.0, 10.0, 0.0),
            Color4::WHITE,
        );

        // The apex row has zero width
        assert!(lit_row(&surface, 0).is_empty());
        assert_eq!(lit_row(&surface, 1), vec![5]);
        assert_eq!(lit_row(&surface, 10), (0..10).collect::<Vec<_>>());

        for y in 1..=10 {
            let row = lit_row(&surface, y);
            assert!(!row.is_empty(), "row {y} is empty");
            // Contiguous within the row
            assert_eq!(row.last().unwrap() - row.first().unwrap() + 1, row.len());
        }
        assert!(lit_row(&surface, 11).is_empty());
    }

    #[test]
    fn test_span_end_is_exclusive() {
        let spans: Vec<_> = scanline_spans(
            ScreenPoint::new(5.0, 0.0, 0.0),
            ScreenPoint::new(0.0, 10.0, 0.0),
            ScreenPoint::new(10.0, 10.0, 0.0),
        )
        .collect();
        assert_eq!(spans.len(), 11);
        assert_eq!((spans[0].x_start, spans[0].x_end), (5, 5));
        assert_eq!((spans[10].x_start, spans[10].x_end), (0, 10));
    }

    #[test]
    fn test_shared_edge_is_written_once() {
        // Two halves of a square split along the diagonal
        let (a, b, c, d) = (
            ScreenPoint::new(1.0, 1.0, 0.0),
            ScreenPoint::new(11.0, 1.0, 0.0),
            ScreenPoint::new(11.0, 11.0, 0.0),
            ScreenPoint::new(1.0, 11.0, 0.0),
        );
        let mut upper = PixelSurface::new(12, 12);
        let mut lower = PixelSurface::new(12, 12);
        fill_triangle(&mut upper, a, b, c, Color4::WHITE);
        fill_triangle(&mut lower, a, c, d, Color4::WHITE);

        let mut covered = 0;
        for y in 0..12 {
            for x in 0..12 {
                let in_upper = upper.pixel(x, y) != [0, 0, 0, 0];
                let in_lower = lower.pixel(x, y) != [0, 0, 0, 0];
                assert!(!(in_upper && in_lower), "({x}, {y}) written twice");
                if in_upper || in_lower {
                    covered += 1;
                }
            }
        }
        // Rows 1..=11, columns 1..11
        assert_eq!(covered, 110);
    }

    #[test]
    fn test_vertex_order_does_not_matter() {
        let a = ScreenPoint::new(3.0, 1.0, 0.0);
        let b = ScreenPoint::new(14.0, 6.0, 0.0);
        let c = ScreenPoint::new(6.0, 13.0, 0.0);

        let mut reference = PixelSurface::new(16, 16);
        fill_triangle(&mut reference, a, b, c, Color4::WHITE);
        for (p1, p2, p3) in [(b, c, a), (c, a, b), (a, c, b), (c, b, a)] {
            let mut surface = PixelSurface::new(16, 16);
            fill_triangle(&mut surface, p1, p2, p3, Color4::WHITE);
            assert_eq!(surface.as_bytes(), reference.as_bytes());
        }
    }

    #[test]
    fn test_flat_top_fills() {
        let mut surface = PixelSurface::new(12, 12);
        fill_triangle(
            &mut surface,
            ScreenPoint::new(0.0, 0.0, 0.0),
            ScreenPoint::new(10.0, 0.0, 0.0),
            ScreenPoint::new(5.0, 10.0, 0.0),
            Color4::WHITE,
        );
        assert_eq!(lit_row(&surface, 0), (0..10).collect::<Vec<_>>());
        assert_eq!(lit_row(&surface, 9), vec![5]);
        assert!(lit_row(&surface, 10).is_empty());
    }

    #[test]
    fn test_zero_area_triangle_draws_nothing() {
        // All three vertices on one vertical line
        let mut surface = PixelSurface::new(10, 12);
        fill_triangle(
            &mut surface,
            ScreenPoint::new(5.0, 0.0, 0.0),
            ScreenPoint::new(5.0, 5.0, 0.0),
            ScreenPoint::new(5.0, 10.0, 0.0),
            Color4::WHITE,
        );
        assert!(surface.as_bytes().iter().all(|&b| b == 0));

        let mut parallel = PixelSurface::new(10, 12);
        fill_triangle_parallel(
            &mut parallel,
            ScreenPoint::new(5.0, 0.0, 0.0),
            ScreenPoint::new(5.0, 5.0, 0.0),
            ScreenPoint::new(5.0, 10.0, 0.0),
            Color4::WHITE,
        );
        assert!(parallel.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_height_draws_nothing() {
        assert_eq!(
            scanline_spans(
                ScreenPoint::new(0.0, 4.0, 0.0),
                ScreenPoint::new(5.0, 4.0, 0.0),
                ScreenPoint::new(9.0, 4.0, 0.0),
            )
            .count(),
            0
        );

        let mut surface = PixelSurface::new(10, 10);
        fill_triangle(
            &mut surface,
            ScreenPoint::new(0.0, 4.0, 0.0),
            ScreenPoint::new(5.0, 4.0, 0.0),
            ScreenPoint::new(9.0, 4.0, 0.0),
            Color4::WHITE,
        );
        assert!(surface.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_constant_depth_stays_constant() {
        let mut surface = PixelSurface::new(32, 32).with_depth_buffer();
        fill_triangle(
            &mut surface,
            ScreenPoint::new(2.0, 3.0, 0.5),
            ScreenPoint::new(29.0, 11.0, 0.5),
            ScreenPoint::new(9.0, 30.0, 0.5),
            Color4::WHITE,
        );
        let mut written = 0;
        for y in 0..32 {
            for x in 0..32 {
                let depth = surface.depth_at(x, y).unwrap();
                if depth.is_finite() {
                    assert_eq!(depth, 0.5);
                    written += 1;
                }
            }
        }
        assert!(written > 100);
    }

    #[test]
    fn test_centroid_depth_is_average() {
        let mut surface = PixelSurface::new(64, 100).with_depth_buffer();
        fill_triangle(
            &mut surface,
            ScreenPoint::new(30.0, 0.0, 0.0),
            ScreenPoint::new(0.0, 90.0, 0.6),
            ScreenPoint::new(60.0, 90.0, 0.3),
            Color4::WHITE,
        );
        let depth = surface.depth_at(30, 60).unwrap();
        assert!((depth - 0.3).abs() < 1e-2, "depth {depth}");
    }

    #[test]
    fn test_off_surface_triangle_is_clipped() {
        let mut surface = PixelSurface::new(8, 8);
        fill_triangle(
            &mut surface,
            ScreenPoint::new(-20.0, -20.0, 0.0),
            ScreenPoint::new(40.0, -20.0, 0.0),
            ScreenPoint::new(-20.0, 40.0, 0.0),
            Color4::WHITE,
        );
        // The triangle covers the whole surface
        assert!(surface.as_bytes().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let (a, b, c) = (
            ScreenPoint::new(-4.0, 2.5, 0.9),
            ScreenPoint::new(50.0, 17.0, 0.1),
            ScreenPoint::new(12.0, 70.0, 0.4),
        );
        let mut serial = PixelSurface::new(48, 48).with_depth_buffer();
        let mut parallel = PixelSurface::new(48, 48).with_depth_buffer();
        fill_triangle(&mut serial, a, b, c, Color4::CYAN);
        fill_triangle_parallel(&mut parallel, a, b, c, Color4::CYAN);

        assert_eq!(serial.as_bytes(), parallel.as_bytes());
        for y in 0..48 {
            for x in 0..48 {
                assert_eq!(serial.depth_at(x, y), parallel.depth_at(x, y));
            }
        }
    }
}
