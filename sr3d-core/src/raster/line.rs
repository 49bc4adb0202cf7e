/// Line and point drawing
use crate::color::Color4;
use crate::projection::ScreenPoint;
use crate::surface::PixelSurface;

/// Clip a point against the surface and write it with its depth
pub fn draw_point(surface: &mut PixelSurface, point: ScreenPoint, color: Color4) {
    if point.x >= 0.0
        && point.y >= 0.0
        && point.x < surface.width() as f32
        && point.y < surface.height() as f32
    {
        surface.put_pixel_depth(point.x as usize, point.y as usize, point.z, color);
    }
}

fn plot(surface: &mut PixelSurface, x: i64, y: i64, color: Color4) {
    if x >= 0 && y >= 0 && (x as usize) < surface.width() && (y as usize) < surface.height() {
        surface.put_pixel(x as usize, y as usize, color);
    }
}

/// Liang-Barsky: the parameter range `[t0, t1]` of `a + t * (b - a)` that lies
/// inside `[0, max_x] x [0, max_y]`, or `None` when nothing does.
///
/// Non-finite input is rejected.
fn clip_range(a: (f64, f64), b: (f64, f64), max_x: f64, max_y: f64) -> Option<(f64, f64)> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [(-dx, a.0), (dx, max_x - a.0), (-dy, a.1), (dy, max_y - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((t0, t1))
}

/// Integer points of the Bresenham line between two screen points that land
/// on a `width` x `height` surface.
///
/// Coordinates are truncated to integers. The endpoints are put in a fixed
/// order and the segment is clipped to the surface before walking, so both
/// directions yield the same set of points and far-off endpoints cost nothing.
pub fn line_points(p0: ScreenPoint, p1: ScreenPoint, width: usize, height: usize) -> LinePoints {
    let a = (p0.x.trunc() as f64, p0.y.trunc() as f64);
    let b = (p1.x.trunc() as f64, p1.y.trunc() as f64);
    let (a, b) = if (a.1, a.0) <= (b.1, b.0) { (a, b) } else { (b, a) };

    let (max_x, max_y) = (width as f64 - 1.0, height as f64 - 1.0);
    let Some((t0, t1)) = clip_range(a, b, max_x, max_y) else {
        return LinePoints::empty();
    };

    // Clipped ends land on the surface; unclipped ends stay exact
    let at = |t: f64| {
        let x = (a.0 + (b.0 - a.0) * t).round().clamp(0.0, max_x);
        let y = (a.1 + (b.1 - a.1) * t).round().clamp(0.0, max_y);
        (x as i64, y as i64)
    };
    let (x0, y0) = at(t0);
    let (x1, y1) = at(t1);

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    LinePoints {
        x: x0,
        y: y0,
        x1,
        y1,
        dx,
        dy,
        sx: if x0 < x1 { 1 } else { -1 },
        sy: if y0 < y1 { 1 } else { -1 },
        err: dx - dy,
        done: false,
    }
}

/// Iterator returned by [`line_points`]
#[derive(Debug, Clone)]
pub struct LinePoints {
    x: i64,
    y: i64,
    x1: i64,
    y1: i64,
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
    err: i64,
    done: bool,
}

impl LinePoints {
    fn empty() -> Self {
        Self {
            x: 0,
            y: 0,
            x1: 0,
            y1: 0,
            dx: 0,
            dy: 0,
            sx: 1,
            sy: 1,
            err: 0,
            done: true,
        }
    }
}

impl Iterator for LinePoints {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = (self.x, self.y);

        if self.x == self.x1 && self.y == self.y1 {
            self.done = true;
        } else {
            let e2 = 2 * self.err;
            if e2 > -self.dy {
                self.err -= self.dy;
                self.x += self.sx;
            }
            if e2 < self.dx {
                self.err += self.dx;
                self.y += self.sy;
            }
        }

        Some(current)
    }
}

/// Draw a one-pixel line, skipping pixels that fall off the surface.
///
/// Lines are overlays: they ignore the depth buffer.
pub fn draw_line(surface: &mut PixelSurface, p0: ScreenPoint, p1: ScreenPoint, color: Color4) {
    for (x, y) in line_points(p0, p1, surface.width(), surface.height()) {
        plot(surface, x, y, color);
    }
}

/// Draw a line by recursive midpoint bisection.
///
/// The segment is first clipped to the surface. Both ends are plotted, then
/// midpoints until segments are shorter than two pixels.
pub fn draw_line_subdivide(
    surface: &mut PixelSurface,
    p0: ScreenPoint,
    p1: ScreenPoint,
    color: Color4,
) {
    let a = (p0.x as f64, p0.y as f64);
    let b = (p1.x as f64, p1.y as f64);
    let Some((t0, t1)) = clip_range(a, b, surface.width() as f64, surface.height() as f64) else {
        return;
    };
    let lerp = |t: f64| {
        let t = t as f32;
        ScreenPoint::new(
            p0.x + (p1.x - p0.x) * t,
            p0.y + (p1.y - p0.y) * t,
            p0.z + (p1.z - p0.z) * t,
        )
    };
    // Keep exact coordinates for ends that needed no clipping
    let start = if t0 == 0.0 { p0 } else { lerp(t0) };
    let end = if t1 == 1.0 { p1 } else { lerp(t1) };

    plot(surface, start.x as i64, start.y as i64, color);
    plot(surface, end.x as i64, end.y as i64, color);
    subdivide(surface, start, end, color);
}

fn subdivide(surface: &mut PixelSurface, p0: ScreenPoint, p1: ScreenPoint, color: Color4) {
    let (dx, dy) = (p1.x - p0.x, p1.y - p0.y);
    // Negated so NaN lengths stop the recursion too
    if !((dx * dx + dy * dy).sqrt() >= 2.0) {
        return;
    }

    let middle = ScreenPoint::new(p0.x + dx / 2.0, p0.y + dy / 2.0, (p0.z + p1.z) / 2.0);
    plot(surface, middle.x as i64, middle.y as i64, color);
    subdivide(surface, p0, middle, color);
    subdivide(surface, middle, p1, color);
}
