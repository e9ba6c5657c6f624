use crate::preprocessing::Plane;
use image::GrayImage;

/// Min-max stretch a plane onto the full 0-255 range
///
/// Values are rounded half to even and saturated. A constant plane has no
/// range to stretch and maps to all zeros.
pub fn stretch_plane(plane: &Plane) -> GrayImage {
    let (width, height) = plane.dimensions();
    let Some((min_val, max_val)) = plane.min_max() else {
        return GrayImage::new(width, height);
    };

    // Avoid division by zero
    if max_val <= min_val {
        return GrayImage::new(width, height);
    }

    let scale = 255.0 / (max_val - min_val);
    let raw = plane
        .as_slice()
        .iter()
        .map(|&v| saturate_u8((v - min_val) * scale))
        .collect();

    GrayImage::from_raw(width, height, raw).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Min-max stretch an 8-bit image onto the full 0-255 range
pub fn stretch(image: &GrayImage) -> GrayImage {
    stretch_plane(&Plane::from_gray(image))
}

/// Round half to even, then clamp into `u8`
pub fn saturate_u8(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}
