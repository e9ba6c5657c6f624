use crate::error::PreprocessError;
use image::{DynamicImage, GrayImage, ImageFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::steps;
use super::Plane;

/// File name written into the save directory
pub const SAVE_FILE_NAME: &str = "pretty_oof_preprocess.png";

/// Fixed numeric parameters of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineParams {
    /// Weight of the inverted gradient in the blend
    pub alpha: f64,
    /// Side of the square adaptive-threshold window, odd
    pub block_size: u32,
    /// Constant subtracted from the local mean
    pub offset: i32,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            alpha: 0.21,
            block_size: 149,
            offset: 21,
        }
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Binarized mask (not serialized)
    #[serde(skip)]
    pub mask: GrayImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
    /// Where the mask was written, if a save directory was given and the write succeeded
    pub saved_to: Option<PathBuf>,
    /// Non-fatal save failure; the mask is still valid
    #[serde(skip)]
    pub save_error: Option<PreprocessError>,
    pub warnings: Vec<String>,
}

/// Gradient / level-cap / adaptive-threshold mask pipeline
///
/// Stateless apart from its parameters: every call allocates its own
/// buffers and only borrows the input, so one pipeline can serve many
/// threads at once.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    params: PipelineParams,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: PipelineParams) -> Result<Self, PreprocessError> {
        if !(0.0..=1.0).contains(&params.alpha) {
            return Err(PreprocessError::InvalidInput(format!(
                "alpha must be within [0, 1], got {}",
                params.alpha
            )));
        }
        if params.block_size < 3 || params.block_size % 2 == 0 {
            return Err(PreprocessError::InvalidInput(format!(
                "block size must be odd and at least 3, got {}",
                params.block_size
            )));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Compute the mask for `image`, optionally writing it to
    /// `<save_dir>/pretty_oof_preprocess.png`
    ///
    /// The input must be single-channel 8- or 16-bit. A failed save is
    /// reported through `save_error` and `warnings`, never as `Err`.
    pub fn process(
        &self,
        image: &DynamicImage,
        save_dir: Option<&Path>,
    ) -> Result<PreprocessingResult, PreprocessError> {
        let start = Instant::now();
        let mut timings = Vec::new();

        let input = intensity_plane(image)?;
        tracing::debug!(
            width = input.width(),
            height = input.height(),
            "running preprocess pipeline"
        );

        let normalized = run_step("normalize", &mut timings, || {
            Ok(steps::normalize::stretch_plane(&input))
        })?;

        let edges = run_step("gradient", &mut timings, || {
            Ok(steps::gradient::inverted_magnitude(&normalized))
        })?;

        let mean_image = run_step("blend", &mut timings, || {
            Ok(steps::blend::mix(&edges, &normalized, self.params.alpha))
        })?;

        let mean_image = run_step("renormalize", &mut timings, || {
            Ok(steps::normalize::stretch_plane(&mean_image))
        })?;

        let adjusted = run_step("level_cap", &mut timings, || {
            Ok(steps::histogram::apply_mode_cap(&mean_image))
        })?;

        let adjusted = run_step("normalize_capped", &mut timings, || {
            Ok(steps::normalize::stretch(&adjusted))
        })?;

        let binary = run_step("threshold", &mut timings, || {
            steps::threshold::adaptive_mean(&adjusted, self.params.block_size, self.params.offset)
        })?;

        let mask = run_step("final_normalize", &mut timings, || {
            Ok(steps::normalize::stretch(&binary))
        })?;

        let mut warnings = Vec::new();
        let mut saved_to = None;
        let mut save_error = None;

        if let Some(dir) = save_dir {
            match save_mask(&mask, dir) {
                Ok(path) => {
                    tracing::info!("Saved mask to {}", path.display());
                    saved_to = Some(path);
                }
                Err(err) => {
                    tracing::warn!("{}", err);
                    warnings.push(err.to_string());
                    save_error = Some(err);
                }
            }
        }

        Ok(PreprocessingResult {
            mask,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: timings,
            saved_to,
            save_error,
            warnings,
        })
    }
}

/// Validate the input and copy it into a float plane
///
/// Floating-point samples are `UnsupportedFormat` whatever their channel
/// count; other multi-channel layouts are `InvalidInput`.
fn intensity_plane(image: &DynamicImage) -> Result<Plane, PreprocessError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PreprocessError::InvalidInput(format!(
            "image is empty ({}x{})",
            image.width(),
            image.height()
        )));
    }

    match image {
        DynamicImage::ImageLuma8(gray) => Ok(Plane::from_gray(gray)),
        DynamicImage::ImageLuma16(gray) => Ok(Plane::from_luma16(gray)),
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            Err(PreprocessError::UnsupportedFormat(format!(
                "{:?} has floating-point samples; expected 8- or 16-bit integers",
                image.color()
            )))
        }
        other if other.color().channel_count() != 1 => Err(PreprocessError::InvalidInput(format!(
            "expected a single-channel image, got {} channels ({:?}); reduce channels first",
            other.color().channel_count(),
            other.color()
        ))),
        other => Err(PreprocessError::UnsupportedFormat(format!("{:?}", other.color()))),
    }
}

fn save_mask(mask: &GrayImage, dir: &Path) -> Result<PathBuf, PreprocessError> {
    let path = dir.join(SAVE_FILE_NAME);
    mask.save_with_format(&path, ImageFormat::Png)
        .map_err(|e| PreprocessError::SaveFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    Ok(path)
}

fn run_step<T, F>(name: &str, timings: &mut Vec<StepTiming>, step_fn: F) -> Result<T, PreprocessError>
where
    F: FnOnce() -> Result<T, PreprocessError>,
{
    let step_start = Instant::now();
    let result = step_fn()?;
    timings.push(StepTiming {
        name: name.to_string(),
        time_ms: step_start.elapsed().as_millis() as u64,
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, RgbImage};

    #[test]
    fn test_records_every_stage_in_order() {
        let img = GrayImage::from_fn(20, 20, |x, y| Luma([((x * 13 + y * 7) % 256) as u8]));
        let result = Pipeline::new().process(&DynamicImage::ImageLuma8(img), None).unwrap();

        let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "normalize",
                "gradient",
                "blend",
                "renormalize",
                "level_cap",
                "normalize_capped",
                "threshold",
                "final_normalize"
            ]
        );
        assert!(result.saved_to.is_none());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_rejects_empty_image() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 10));
        assert!(matches!(
            Pipeline::new().process(&img, None),
            Err(PreprocessError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_color_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(matches!(
            Pipeline::new().process(&img, None),
            Err(PreprocessError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_float_samples_as_unsupported() {
        for img in [DynamicImage::new_rgb32f(4, 4), DynamicImage::new_rgba32f(4, 4)] {
            assert!(matches!(
                Pipeline::new().process(&img, None),
                Err(PreprocessError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn test_accepts_sixteen_bit_input() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(12, 9, |x, _| Luma([x as u16 * 5000]));
        let result = Pipeline::new()
            .process(&DynamicImage::ImageLuma16(img), None)
            .unwrap();
        assert_eq!(result.mask.dimensions(), (12, 9));
    }

    #[test]
    fn test_params_validation() {
        let bad_block = PipelineParams {
            block_size: 10,
            ..PipelineParams::default()
        };
        assert!(Pipeline::with_params(bad_block).is_err());

        let bad_alpha = PipelineParams {
            alpha: 1.5,
            ..PipelineParams::default()
        };
        assert!(Pipeline::with_params(bad_alpha).is_err());

        assert_eq!(
            Pipeline::with_params(PipelineParams::default()).unwrap().params(),
            &PipelineParams::default()
        );
    }

    #[test]
    fn test_does_not_mutate_input() {
        let img = GrayImage::from_fn(16, 16, |x, y| Luma([(x * y) as u8]));
        let input = DynamicImage::ImageLuma8(img.clone());
        let _ = Pipeline::new().process(&input, None).unwrap();
        assert_eq!(input.as_luma8(), Some(&img));
    }

    #[test]
    fn test_unwritable_save_dir_still_returns_mask() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([x as u8 * 20]));
        let missing = Path::new("/definitely/not/a/real/dir");

        let result = Pipeline::new()
            .process(&DynamicImage::ImageLuma8(img), Some(missing))
            .unwrap();

        assert_eq!(result.mask.dimensions(), (10, 10));
        assert!(result.saved_to.is_none());
        assert!(matches!(result.save_error, Some(PreprocessError::SaveFailed { .. })));
        assert_eq!(result.warnings.len(), 1);
    }
}
