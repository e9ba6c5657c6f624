use super::normalize::saturate_u8;
use crate::preprocessing::Plane;
use image::imageops::crop_imm;
use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Inverted Sobel gradient magnitude
///
/// Both 3x3 Sobel responses are taken with reflect-101 borders (`gfedcb|abcdefgh|gfedcba`),
/// their absolute values saturated to 8 bits and averaged with equal weight.
/// The average is then inverted so flat regions are bright and edges dark:
/// `(1 - m / max(m)) * 255`. A flat image (max of 0) yields all 255.
pub fn inverted_magnitude(image: &GrayImage) -> Plane {
    let magnitude = edge_magnitude(image);
    let (width, height) = magnitude.dimensions();

    let max_val = magnitude.pixels().map(|p| p.0[0]).max().unwrap_or(0);
    if max_val == 0 {
        return Plane::filled(width, height, 255.0);
    }

    let max_val = f64::from(max_val);
    let mut plane = Plane::new(width, height);
    for (out, px) in plane.as_mut_slice().iter_mut().zip(magnitude.pixels()) {
        *out = (1.0 - f64::from(px.0[0]) / max_val) * 255.0;
    }
    plane
}

/// Equal-weight average of the saturated absolute Sobel responses
pub fn edge_magnitude(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    // imageproc clamps at the edges; filtering a reflected frame and cropping
    // it off again leaves every kernel tap inside real or mirrored pixels
    let padded = pad_reflect_101(image);
    let grad_x = crop_imm(&horizontal_sobel(&padded), 1, 1, width, height).to_image();
    let grad_y = crop_imm(&vertical_sobel(&padded), 1, 1, width, height).to_image();

    GrayImage::from_fn(width, height, |x, y| {
        let gx = abs_saturated(grad_x.get_pixel(x, y).0[0]);
        let gy = abs_saturated(grad_y.get_pixel(x, y).0[0]);
        image::Luma([saturate_u8(0.5 * f64::from(gx) + 0.5 * f64::from(gy))])
    })
}

/// One-pixel frame mirrored about the edge pixel, which is not repeated
fn pad_reflect_101(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width + 2, height + 2, |x, y| {
        *image.get_pixel(reflect_101(x, width), reflect_101(y, height))
    })
}

/// Map a padded coordinate back into `0..len`
fn reflect_101(padded: u32, len: u32) -> u32 {
    if padded == 0 {
        // A single row or column mirrors onto itself
        1.min(len - 1)
    } else if padded > len {
        len.saturating_sub(2)
    } else {
        padded - 1
    }
}

fn abs_saturated(value: i16) -> u8 {
    value.unsigned_abs().min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_flat_image_inverts_to_white() {
        let img = GrayImage::from_pixel(8, 6, Luma([90]));
        let plane = inverted_magnitude(&img);
        assert_eq!(plane.dimensions(), (8, 6));
        assert!(plane.as_slice().iter().all(|&v| v == 255.0));
    }

    #[test]
    fn test_vertical_edge_is_darkest() {
        // Left half dark, right half light
        let img = GrayImage::from_fn(10, 5, |x, _| if x < 5 { Luma([0]) } else { Luma([200]) });
        let plane = inverted_magnitude(&img);
        let row: Vec<f64> = plane.as_slice()[20..30].to_vec();

        // Strongest response straddles the edge, flat areas stay bright
        assert_eq!(row[4], 0.0);
        assert_eq!(row[5], 0.0);
        assert_eq!(row[0], 255.0);
        assert_eq!(row[9], 255.0);
    }

    #[test]
    fn test_magnitude_saturates_instead_of_wrapping() {
        let img = GrayImage::from_fn(6, 6, |x, _| if x < 3 { Luma([0]) } else { Luma([255]) });
        let magnitude = edge_magnitude(&img);
        // |gx| = 1020 saturates to 255, gy = 0: round(127.5) = 128
        assert_eq!(magnitude.get_pixel(2, 3).0[0], 128);
        assert_eq!(magnitude.get_pixel(0, 3).0[0], 0);
    }

    #[test]
    fn test_border_rows_mirror_their_inner_neighbour() {
        // Row 0 is dark, everything below is white
        let img = GrayImage::from_fn(5, 5, |_, y| if y == 0 { Luma([0]) } else { Luma([255]) });
        let magnitude = edge_magnitude(&img);

        // Row -1 mirrors row 1, so row 0 sees white on both sides
        let top: Vec<u8> = (0..5).map(|x| magnitude.get_pixel(x, 0).0[0]).collect();
        assert_eq!(top, vec![0, 0, 0, 0, 0]);
        assert!((0..5).all(|x| magnitude.get_pixel(x, 1).0[0] == 128));
        assert!((0..5).all(|x| magnitude.get_pixel(x, 4).0[0] == 0));
    }

    #[test]
    fn test_reflect_101_indices() {
        assert_eq!(reflect_101(0, 4), 1);
        assert_eq!(reflect_101(1, 4), 0);
        assert_eq!(reflect_101(4, 4), 3);
        assert_eq!(reflect_101(5, 4), 2);
        // Degenerate axes fall back to the only pixel
        assert_eq!(reflect_101(0, 1), 0);
        assert_eq!(reflect_101(2, 1), 0);
    }

    #[test]
    fn test_single_pixel_has_no_edges() {
        let img = GrayImage::from_pixel(1, 1, Luma([77]));
        assert_eq!(edge_magnitude(&img).get_pixel(0, 0).0[0], 0);
        assert_eq!(inverted_magnitude(&img).as_slice(), &[255.0]);
    }

    #[test]
    fn test_abs_saturated_handles_extremes() {
        assert_eq!(abs_saturated(i16::MIN), 255);
        assert_eq!(abs_saturated(-12), 12);
        assert_eq!(abs_saturated(0), 0);
    }
}
