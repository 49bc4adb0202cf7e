/// Owned pixel surface the rasterizers draw into
use rayon::prelude::*;

use crate::color::Color4;

/// Byte order of the four channels of one stored sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgba,
    /// Windows-style bitmaps
    Bgra,
}

impl ChannelOrder {
    fn pack(self, [r, g, b, a]: [u8; 4]) -> [u8; 4] {
        match self {
            ChannelOrder::Rgba => [r, g, b, a],
            ChannelOrder::Bgra => [b, g, r, a],
        }
    }

    fn unpack(self, stored: [u8; 4]) -> [u8; 4] {
        // Both orders are involutions
        self.pack(stored)
    }
}

/// A fixed-size grid of packed 8-bit color samples with an optional depth buffer.
///
/// The backing buffer always holds exactly `width * height * 4` bytes and is
/// never resized. Writes index straight into the buffer: callers clip against
/// [`PixelSurface::contains`] before writing.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: usize,
    height: usize,
    order: ChannelOrder,
    bytes: Vec<u8>,
    depth: Option<Vec<f32>>,
}

impl PixelSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_order(width, height, ChannelOrder::Rgba)
    }

    /// # Panics
    /// Panics if either dimension is zero.
    pub fn with_order(width: usize, height: usize, order: ChannelOrder) -> Self {
        assert!(width > 0 && height > 0, "surface dimensions must be non-zero");
        Self {
            width,
            height,
            order,
            bytes: vec![0; width * height * 4],
            depth: None,
        }
    }

    /// Attach a depth buffer so depth-aware writes keep the nearest sample
    pub fn with_depth_buffer(mut self) -> Self {
        self.depth = Some(vec![f32::INFINITY; self.width * self.height]);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    pub fn has_depth_buffer(&self) -> bool {
        self.depth.is_some()
    }

    /// Aspect ratio used for the projection matrix
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Whether integer pixel coordinates fall on the surface
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Overwrite every sample with the given channels and reset depth
    pub fn clear(&mut self, r: u8, g: u8, b: u8, a: u8) {
        let packed = self.order.pack([r, g, b, a]);
        for sample in self.bytes.chunks_exact_mut(4) {
            sample.copy_from_slice(&packed);
        }
        if let Some(depth) = &mut self.depth {
            depth.fill(f32::INFINITY);
        }
    }

    /// Write one sample, last write wins
    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, color: Color4) {
        debug_assert!(x < self.width && y < self.height, "pixel ({x}, {y}) off surface");
        let index = x + y * self.width;
        write_sample(&mut self.bytes, index, self.order, color);
    }

    /// Write one sample if `z` is not behind what the depth buffer holds.
    ///
    /// Without a depth buffer this is the same as [`PixelSurface::put_pixel`].
    #[inline]
    pub fn put_pixel_depth(&mut self, x: usize, y: usize, z: f32, color: Color4) {
        debug_assert!(x < self.width && y < self.height, "pixel ({x}, {y}) off surface");
        let index = x + y * self.width;
        if let Some(depth) = &mut self.depth {
            if !depth_test(&mut depth[index], z) {
                return;
            }
        }
        write_sample(&mut self.bytes, index, self.order, color);
    }

    /// Read a sample back in RGBA order, whatever the storage order
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let offset = (x + y * self.width) * 4;
        let mut stored = [0u8; 4];
        stored.copy_from_slice(&self.bytes[offset..offset + 4]);
        self.order.unpack(stored)
    }

    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        self.depth.as_ref().map(|depth| depth[x + y * self.width])
    }

    /// Raw samples in storage order, for presentation
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Split the surface into disjoint rows that can be written from separate workers
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = SurfaceRow<'_>> {
        let width = self.width;
        let order = self.order;
        let depth_rows: Vec<Option<&mut [f32]>> = match &mut self.depth {
            Some(depth) => depth.chunks_mut(width).map(Some).collect(),
            None => (0..self.height).map(|_| None).collect(),
        };

        self.bytes
            .par_chunks_mut(width * 4)
            .zip(depth_rows.into_par_iter())
            .enumerate()
            .map(move |(y, (bytes, depth))| SurfaceRow {
                y,
                order,
                bytes,
                depth,
            })
    }
}

/// Exclusive view of one surface row
pub struct SurfaceRow<'a> {
    y: usize,
    order: ChannelOrder,
    bytes: &'a mut [u8],
    depth: Option<&'a mut [f32]>,
}

impl SurfaceRow<'_> {
    pub fn y(&self) -> usize {
        self.y
    }

    pub fn width(&self) -> usize {
        self.bytes.len() / 4
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, color: Color4) {
        write_sample(self.bytes, x, self.order, color);
    }

    #[inline]
    pub fn put_pixel_depth(&mut self, x: usize, z: f32, color: Color4) {
        if let Some(depth) = self.depth.as_deref_mut() {
            if !depth_test(&mut depth[x], z) {
                return;
            }
        }
        write_sample(self.bytes, x, self.order, color);
    }
}

#[inline]
fn write_sample(bytes: &mut [u8], index: usize, order: ChannelOrder, color: Color4) {
    let offset = index * 4;
    bytes[offset..offset + 4].copy_from_slice(&order.pack(color.to_rgba8()));
}

/// Minimum-depth test; records `z` when it passes
#[inline]
fn depth_test(stored: &mut f32, z: f32) -> bool {
    if *stored < z {
        return false;
    }
    *stored = z;
    true
}
