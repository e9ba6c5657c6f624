//! Transforms that ship with the binary

use crate::error::PreprocessError;
use crate::preprocessing::steps::grayscale;
use crate::preprocessing::Pipeline;
use crate::transform::ImageTransform;
use image::DynamicImage;

/// Channel reduction followed by the mask pipeline
#[derive(Debug, Default)]
pub struct PrettyOofTransform {
    pipeline: Pipeline,
}

impl PrettyOofTransform {
    pub const NAME: &'static str = "pretty-oof";

    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

impl ImageTransform for PrettyOofTransform {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Binarized edge/foreground mask (gradient blend, histogram level cap, adaptive threshold)"
    }

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, PreprocessError> {
        let gray = grayscale::reduce_channels(image);
        let result = self.pipeline.process(&gray, None)?;
        tracing::debug!("pretty-oof finished in {}ms", result.total_time_ms);
        Ok(DynamicImage::ImageLuma8(result.mask))
    }
}

#[derive(Debug, Default)]
pub struct GrayscaleTransform;

impl ImageTransform for GrayscaleTransform {
    fn name(&self) -> &str {
        "grayscale"
    }

    fn description(&self) -> &str {
        "Reduce to a single intensity channel"
    }

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, PreprocessError> {
        Ok(grayscale::reduce_channels(image))
    }
}

/// Quarter turn clockwise; dimensions swap
#[derive(Debug, Default)]
pub struct RotateTransform;

impl ImageTransform for RotateTransform {
    fn name(&self) -> &str {
        "rotate"
    }

    fn description(&self) -> &str {
        "Rotate 90 degrees clockwise"
    }

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, PreprocessError> {
        Ok(image.rotate90())
    }
}

#[derive(Debug, Default)]
pub struct IdentityTransform;

impl ImageTransform for IdentityTransform {
    fn name(&self) -> &str {
        "identity"
    }

    fn description(&self) -> &str {
        "Return the image unchanged"
    }

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, PreprocessError> {
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_pretty_oof_accepts_color_input() {
        let img = RgbImage::from_fn(30, 20, |x, _| Rgb([x as u8 * 8, 40, 200]));
        let out = PrettyOofTransform::default()
            .apply(DynamicImage::ImageRgb8(img))
            .unwrap();
        let mask = out.as_luma8().expect("single-channel mask");
        assert_eq!(mask.dimensions(), (30, 20));
        assert!(mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_rotate_is_clockwise() {
        // 2x1: [a, b] becomes a 1x2 column with a on top
        let img = GrayImage::from_raw(2, 1, vec![10, 20]).unwrap();
        let out = RotateTransform.apply(DynamicImage::ImageLuma8(img)).unwrap();
        let out = out.as_luma8().unwrap();
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(out.get_pixel(0, 0), &Luma([10]));
        assert_eq!(out.get_pixel(0, 1), &Luma([20]));
    }

    #[test]
    fn test_four_rotations_restore_image() {
        let img = GrayImage::from_fn(3, 2, |x, y| Luma([(x + 3 * y) as u8]));
        let mut current = DynamicImage::ImageLuma8(img.clone());
        for _ in 0..4 {
            current = RotateTransform.apply(current).unwrap();
        }
        assert_eq!(current.as_luma8(), Some(&img));
    }
}
