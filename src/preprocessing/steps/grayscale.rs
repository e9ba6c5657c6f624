use image::DynamicImage;

/// Reduce a multi-channel image to a single intensity plane
///
/// This is the caller-side step that runs before the pipeline, which only
/// accepts single-channel input. Colour and alpha images go through the
/// image crate's luma conversion; 8- and 16-bit grayscale pass through
/// untouched so their full sample range reaches the first normalization.
pub fn reduce_channels(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => image,
        DynamicImage::ImageLumaA16(_) | DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => {
            DynamicImage::ImageLuma16(image.to_luma16())
        }
        other => DynamicImage::ImageLuma8(other.to_luma8()),
    }
}
