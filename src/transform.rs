use crate::error::PreprocessError;
use image::DynamicImage;

/// Trait for anything that can be applied to the current image
///
/// The mask pipeline is one implementation; out-of-band user functions are
/// plugged in through [`crate::transforms::FnTransform`].
pub trait ImageTransform: Send + Sync {
    /// Returns the transform identifier (e.g., "pretty-oof", "rotate")
    fn name(&self) -> &str;

    /// Returns a human-readable description of the transform
    fn description(&self) -> &str;

    /// Map one image to another
    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, PreprocessError>;
}
