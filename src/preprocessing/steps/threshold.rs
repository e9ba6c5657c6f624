use crate::error::PreprocessError;
use image::{GrayImage, Luma};

/// Local-mean adaptive thresholding
///
/// For each pixel, threshold = mean(block_size x block_size window) - offset.
/// Pixels strictly above their threshold become 255, the rest 0.
///
/// The window extends past the image by replicating edge pixels, so a
/// window wider than the image still averages `block_size²` samples. The
/// mean is rounded half to even to 8 bits before the comparison.
pub fn adaptive_mean(
    img: &GrayImage,
    block_size: u32,
    offset: i32,
) -> Result<GrayImage, PreprocessError> {
    if block_size < 3 || block_size % 2 == 0 {
        return Err(PreprocessError::InvalidInput(format!(
            "block size must be odd and at least 3, got {}",
            block_size
        )));
    }

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Ok(GrayImage::new(width, height));
    }

    let radius = (block_size / 2) as usize;
    let area = f64::from(block_size) * f64::from(block_size);
    let sums = replicated_box_sums(img, radius);

    Ok(GrayImage::from_fn(width, height, |x, y| {
        let idx = y as usize * width as usize + x as usize;
        let mean = (sums[idx] as f64 / area).round_ties_even() as i32;
        let pixel = i32::from(img.get_pixel(x, y).0[0]);
        if pixel > mean - offset {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    }))
}

/// Window sums over `(2r+1)²` neighbourhoods with edge replication
///
/// Separable: a horizontal pass per row, then a vertical pass per column.
fn replicated_box_sums(img: &GrayImage, radius: usize) -> Vec<u64> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let raw = img.as_raw();

    let mut horizontal = vec![0u64; width * height];
    let mut line = vec![0u64; width.max(height)];
    let mut prefix = vec![0u64; width.max(height) + 1];
    let mut out_line = vec![0u64; width.max(height)];

    for y in 0..height {
        for x in 0..width {
            line[x] = u64::from(raw[y * width + x]);
        }
        window_sums(&line[..width], radius, &mut prefix, &mut out_line[..width]);
        horizontal[y * width..(y + 1) * width].copy_from_slice(&out_line[..width]);
    }

    let mut sums = vec![0u64; width * height];
    for x in 0..width {
        for y in 0..height {
            line[y] = horizontal[y * width + x];
        }
        window_sums(&line[..height], radius, &mut prefix, &mut out_line[..height]);
        for y in 0..height {
            sums[y * width + x] = out_line[y];
        }
    }

    sums
}

/// 1-D sums of `values[clamp(i + k)]` for `k` in `-radius..=radius`
///
/// Samples falling off either end are the first or last value repeated.
fn window_sums(values: &[u64], radius: usize, prefix: &mut [u64], out: &mut [u64]) {
    let n = values.len();
    prefix[0] = 0;
    for (i, &v) in values.iter().enumerate() {
        prefix[i + 1] = prefix[i] + v;
    }

    let first = values[0];
    let last = values[n - 1];

    for (i, slot) in out.iter_mut().enumerate() {
        let lo = i as i64 - radius as i64;
        let hi = i as i64 + radius as i64;
        let left_missing = (-lo).max(0) as u64;
        let right_missing = (hi - (n as i64 - 1)).max(0) as u64;
        let start = lo.max(0) as usize;
        let end = (hi.min(n as i64 - 1) + 1) as usize;

        *slot = prefix[end] - prefix[start] + left_missing * first + right_missing * last;
    }
}
