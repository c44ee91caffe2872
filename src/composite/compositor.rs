use std::io::Cursor;

use anyhow::Context;

use crate::composite::layer::RasterLayer;
use crate::composite::occupancy::OccupancyGrid;
use crate::composite::policy::OccupancyColorPolicy;
use crate::foundation::core::{Dimensions, Rgba8};
use crate::foundation::error::{CoverlapError, CoverlapResult};
use crate::mask::group::MaskGroup;

/// Overlap visualization for one mask group. Straight RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRaster {
    pub dims: Dimensions,
    pub rgba8: Vec<u8>,
}

impl OutputRaster {
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        let i = (y as usize * self.dims.width as usize + x as usize) * 4;
        [
            self.rgba8[i],
            self.rgba8[i + 1],
            self.rgba8[i + 2],
            self.rgba8[i + 3],
        ]
    }

    pub fn to_image(&self) -> CoverlapResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.dims.width, self.dims.height, self.rgba8.clone())
            .ok_or_else(|| CoverlapError::decode("output raster buffer does not match dimensions"))
    }

    pub fn encode_png(&self) -> CoverlapResult<Vec<u8>> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(self.to_image()?)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode output raster as png")?;
        Ok(buf)
    }
}

/// Turns a group of same-sized coverage masks into one overlap raster.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlapCompositor {
    policy: OccupancyColorPolicy,
}

impl OverlapCompositor {
    pub fn new(policy: OccupancyColorPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &OccupancyColorPolicy {
        &self.policy
    }

    /// Decodes every buffer of `group`, counts fully-opaque layers per pixel and colors the counts.
    ///
    /// Layers are decoded and folded into the count grid one at a time, so only one decoded
    /// layer is alive at once. Any decode failure or size disagreement fails the whole group
    /// before an output raster exists.
    #[tracing::instrument(skip(self, group), fields(group = %group.name, layers = group.len()))]
    pub fn composite(&self, group: &MaskGroup) -> CoverlapResult<OutputRaster> {
        let Some(first) = group.buffers.first() else {
            return Err(CoverlapError::decode(format!(
                "mask group '{}' has no layers",
                group.name
            )));
        };

        let first = decode_in(group, 0, first)?;
        let dims = first.dims;
        let mut grid = OccupancyGrid::new(dims);
        grid.accumulate_layer(&first);
        drop(first);

        for (i, bytes) in group.buffers.iter().enumerate().skip(1) {
            let layer = decode_in(group, i, bytes)?;
            if layer.dims != dims {
                return Err(CoverlapError::dimension_mismatch(
                    &group.name,
                    dims,
                    layer.dims,
                ));
            }
            grid.accumulate_layer(&layer);
        }

        tracing::debug!(%dims, layers = grid.layer_count(), "composited mask group");
        Ok(OutputRaster {
            dims,
            rgba8: grid.colorize(&self.policy),
        })
    }
}

fn decode_in(group: &MaskGroup, index: usize, bytes: &[u8]) -> CoverlapResult<RasterLayer> {
    let bundle = group.bundles.get(index).map_or("?", String::as_str);
    RasterLayer::decode(bytes).map_err(|e| match e {
        CoverlapError::Decode(msg) => CoverlapError::decode(format!(
            "group '{}', bundle '{bundle}': {msg}",
            group.name
        )),
        other => other,
    })
}
