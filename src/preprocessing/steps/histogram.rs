//! Histogram-mode level cap
//!
//! Buckets an 8-bit image into 16 coarse bins of width 16, picks the most
//! populous bin and clamps every pixel to that bin's lower bound. Bright
//! outliers above the dominant intensity band are flattened away.

use image::GrayImage;

pub const BIN_COUNT: usize = 16;
pub const BIN_WIDTH: u8 = 16;

/// Occupancy counts for 16 bins covering `[16i, 16i + 16)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; BIN_COUNT],
}

impl Histogram {
    pub fn from_counts(counts: [u64; BIN_COUNT]) -> Self {
        Self { counts }
    }

    pub fn from_image(image: &GrayImage) -> Self {
        let mut counts = [0u64; BIN_COUNT];
        for &value in image.as_raw() {
            counts[(value / BIN_WIDTH) as usize] += 1;
        }
        Self { counts }
    }

    pub fn counts(&self) -> &[u64; BIN_COUNT] {
        &self.counts
    }

    /// Index of the fullest bin; ties go to the lowest index
    pub fn mode_bin(&self) -> usize {
        let mut best = 0;
        for (i, &count) in self.counts.iter().enumerate().skip(1) {
            if count > self.counts[best] {
                best = i;
            }
        }
        best
    }

    /// Lower bound of the mode bin, the level every pixel gets capped at
    pub fn level_cap(&self) -> u8 {
        self.mode_bin() as u8 * BIN_WIDTH
    }
}

/// Clamp every pixel to at most `cap`
pub fn cap_levels(image: &GrayImage, cap: u8) -> GrayImage {
    let mut out = image.clone();
    for value in out.iter_mut() {
        *value = (*value).min(cap);
    }
    out
}

/// Build the histogram and apply its level cap in one go
pub fn apply_mode_cap(image: &GrayImage) -> GrayImage {
    let histogram = Histogram::from_image(image);
    let cap = histogram.level_cap();
    tracing::debug!(mode_bin = histogram.mode_bin(), cap, "histogram level cap");
    cap_levels(image, cap)
}
