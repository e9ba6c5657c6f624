use crate::preprocessing::Plane;
use image::GrayImage;

/// Per-pixel linear interpolation `alpha * edges + (1 - alpha) * intensity`
///
/// Both inputs share the same dimensions; the pipeline guarantees it.
pub fn mix(edges: &Plane, intensity: &GrayImage, alpha: f64) -> Plane {
    debug_assert_eq!(edges.dimensions(), intensity.dimensions());

    let mut out = edges.clone();
    for (value, px) in out.as_mut_slice().iter_mut().zip(intensity.as_raw()) {
        *value = alpha * *value + (1.0 - alpha) * f64::from(*px);
    }
    out
}
