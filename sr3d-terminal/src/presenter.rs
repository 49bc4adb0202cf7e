/// Surface presenters: half-block terminal cells and PNG snapshots
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use image::{Rgba, RgbaImage};
use sr3d_core::PixelSurface;

/// Upper half block: foreground paints the top pixel, background the bottom
const HALF_BLOCK: char = '\u{2580}';

/// Pixel rows covered by one character cell
pub const PIXELS_PER_CELL: usize = 2;

/// Writes a surface to a terminal, two pixel rows per character row
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    // Last colors sent, so unchanged runs skip escape sequences
    fg: Option<[u8; 3]>,
    bg: Option<[u8; 3]>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the whole surface starting at the top-left cell. Nothing is
    /// flushed.
    pub fn present<W: Write>(&mut self, out: &mut W, surface: &PixelSurface) -> std::io::Result<()> {
        self.fg = None;
        self.bg = None;

        let rows = surface.height().div_ceil(PIXELS_PER_CELL);
        for row in 0..rows {
            out.queue(cursor::MoveTo(0, row as u16))?;
            let top_y = row * PIXELS_PER_CELL;
            let bottom_y = top_y + 1;

            for x in 0..surface.width() {
                let top = rgb(surface.pixel(x, top_y));
                let bottom = if bottom_y < surface.height() {
                    rgb(surface.pixel(x, bottom_y))
                } else {
                    [0, 0, 0]
                };

                if self.fg != Some(top) {
                    out.queue(SetForegroundColor(to_color(top)))?;
                    self.fg = Some(top);
                }
                if self.bg != Some(bottom) {
                    out.queue(SetBackgroundColor(to_color(bottom)))?;
                    self.bg = Some(bottom);
                }
                out.queue(Print(HALF_BLOCK))?;
            }
        }

        out.queue(ResetColor)?;
        Ok(())
    }
}

fn rgb([r, g, b, _]: [u8; 4]) -> [u8; 3] {
    [r, g, b]
}

fn to_color([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb { r, g, b }
}

/// Copy the surface into an RGBA image, whatever its channel order
pub fn to_image(surface: &PixelSurface) -> RgbaImage {
    RgbaImage::from_fn(surface.width() as u32, surface.height() as u32, |x, y| {
        Rgba(surface.pixel(x as usize, y as usize))
    })
}

/// Write the surface to a PNG file
pub fn save_png(surface: &PixelSurface, path: &Path) -> Result<()> {
    to_image(surface)
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    log::info!("wrote {}x{} snapshot to {}", surface.width(), surface.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr3d_core::{ChannelOrder, Color4};

    #[test]
    fn test_image_is_rgba_for_bgra_surface() {
        let mut surface = PixelSurface::with_order(3, 2, ChannelOrder::Bgra);
        surface.clear(0, 0, 0, 255);
        surface.put_pixel(2, 1, Color4::rgb(1.0, 0.0, 0.0));

        let image = to_image(&surface);
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_present_emits_one_cell_per_column() {
        let mut surface = PixelSurface::new(4, 3);
        surface.clear(10, 20, 30, 255);

        let mut out = Vec::new();
        TerminalPresenter::new().present(&mut out, &surface).unwrap();
        let text = String::from_utf8(out).unwrap();
        // Two character rows for three pixel rows
        assert_eq!(text.matches(HALF_BLOCK).count(), 8);
        assert!(text.contains("38;2;10;20;30"));
    }
}
