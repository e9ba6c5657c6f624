//! Ordered collection of image files with a cursor
//!
//! Scans one directory (not recursively) for files with a known image
//! extension and keeps them sorted by path. The cursor never leaves the
//! valid range; stepping past either end is a no-op.

use crate::error::PreprocessError;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions recognised as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    dir: PathBuf,
    entries: Vec<PathBuf>,
    cursor: usize,
}

impl ImageCatalog {
    /// List the images in `dir`
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self, PreprocessError> {
        let dir = dir.as_ref();
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                entries.push(path);
            }
        }
        entries.sort();

        tracing::info!("Loaded {} images from {}", entries.len(), dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
            cursor: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Path> {
        self.entries.get(self.cursor).map(PathBuf::as_path)
    }

    /// Move to `index`, clamped into range
    pub fn seek(&mut self, index: usize) -> Option<&Path> {
        if self.entries.is_empty() {
            return None;
        }
        self.cursor = index.min(self.entries.len() - 1);
        self.current()
    }

    pub fn next(&mut self) -> Option<&Path> {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
        self.current()
    }

    pub fn prev(&mut self) -> Option<&Path> {
        self.cursor = self.cursor.saturating_sub(1);
        self.current()
    }

    /// Drop the current entry from the listing (the file itself is untouched)
    ///
    /// The cursor stays put, or moves to the new last entry if it fell off
    /// the end.
    pub fn remove_current(&mut self) -> Option<PathBuf> {
        if self.entries.is_empty() {
            return None;
        }
        let removed = self.entries.remove(self.cursor);
        if self.cursor >= self.entries.len() {
            self.cursor = self.entries.len().saturating_sub(1);
        }
        Some(removed)
    }

    /// Human-readable position, e.g. "Image 3 of 12"
    pub fn progress(&self) -> String {
        if self.entries.is_empty() {
            String::new()
        } else {
            format!("Image {} of {}", self.cursor + 1, self.entries.len())
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Decode an image file and apply its EXIF orientation
pub fn load_oriented(path: &Path) -> Result<DynamicImage, PreprocessError> {
    let decode_err =
        |e: image::ImageError| PreprocessError::DecodeFailed(format!("{}: {}", path.display(), e));

    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()
        .map_err(decode_err)?;
    let orientation = decoder.orientation().map_err(decode_err)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    image.apply_orientation(orientation);
    Ok(image)
}
