use crate::composite::layer::RasterLayer;
use crate::composite::policy::OccupancyColorPolicy;
use crate::foundation::core::Dimensions;

/// Alpha value a layer must have at a pixel to count as covering it.
pub const OPAQUE: u8 = 255;

/// Per-pixel count of fully-opaque layers, accumulated one alpha plane at a time.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    dims: Dimensions,
    counts: Vec<u32>,
    layers: u32,
}

impl OccupancyGrid {
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            counts: vec![0; dims.pixel_count()],
            layers: 0,
        }
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn layer_count(&self) -> u32 {
        self.layers
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn count_at(&self, x: u32, y: u32) -> u32 {
        self.counts[y as usize * self.dims.width as usize + x as usize]
    }

    /// Adds one alpha plane. The caller guarantees the plane has `dims.pixel_count()` entries.
    pub fn accumulate(&mut self, alpha: impl Iterator<Item = u8>) {
        for (count, a) in self.counts.iter_mut().zip(alpha) {
            *count += u32::from(a == OPAQUE);
        }
        self.layers += 1;
    }

    pub fn accumulate_layer(&mut self, layer: &RasterLayer) {
        debug_assert_eq!(layer.dims, self.dims);
        self.accumulate(layer.alpha());
    }

    /// Colors every pixel through `policy`. Counts never exceed the number of accumulated
    /// layers, so the colors come from a table built once per grid.
    pub fn colorize(&self, policy: &OccupancyColorPolicy) -> Vec<u8> {
        let lut = policy.lookup_table(self.layers);
        let mut out = Vec::with_capacity(self.counts.len() * 4);
        for &count in &self.counts {
            out.extend_from_slice(&lut[count as usize]);
        }
        out
    }
}
