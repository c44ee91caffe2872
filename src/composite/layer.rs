use crate::foundation::core::Dimensions;
use crate::foundation::error::{CoverlapError, CoverlapResult};

/// A decoded coverage mask, normalized to straight RGBA8 (row-major, tightly packed).
#[derive(Clone, Debug)]
pub struct RasterLayer {
    pub dims: Dimensions,
    pub rgba8: Vec<u8>,
}

impl RasterLayer {
    pub fn decode(bytes: &[u8]) -> CoverlapResult<Self> {
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|e| CoverlapError::decode(format!("decode raster from memory: {e}")))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            dims: Dimensions::new(width, height),
            rgba8: rgba.into_raw(),
        })
    }

    /// Alpha channel, one byte per pixel.
    pub fn alpha(&self) -> impl ExactSizeIterator<Item = u8> + '_ {
        self.rgba8.chunks_exact(4).map(|px| px[3])
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png(img: image::DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_keeps_straight_alpha() {
        let img = image::RgbaImage::from_raw(2, 1, vec![100, 50, 200, 128, 1, 2, 3, 255]).unwrap();
        let layer = RasterLayer::decode(&png(image::DynamicImage::ImageRgba8(img))).unwrap();
        assert_eq!(layer.dims, Dimensions::new(2, 1));
        assert_eq!(layer.rgba8, vec![100, 50, 200, 128, 1, 2, 3, 255]);
        assert_eq!(layer.alpha().collect::<Vec<_>>(), vec![128, 255]);
    }

    #[test]
    fn decode_normalizes_rgb_to_opaque_rgba() {
        let img = image::RgbImage::from_raw(1, 1, vec![9, 8, 7]).unwrap();
        let layer = RasterLayer::decode(&png(image::DynamicImage::ImageRgb8(img))).unwrap();
        assert_eq!(layer.rgba8, vec![9, 8, 7, 255]);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = RasterLayer::decode(b"definitely not a png").unwrap_err();
        assert!(matches!(err, CoverlapError::Decode(_)));
    }
}
