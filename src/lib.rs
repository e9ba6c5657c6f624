//! Binarized edge/foreground masks for raster images.
//!
//! The core is [`preprocessing::Pipeline`]: normalize, inverted Sobel
//! magnitude, blend, histogram-mode level cap, adaptive mean threshold.
//! Around it sit a registry of interchangeable image transforms, a
//! directory catalog, and an HTTP front end.

pub mod catalog;
pub mod config;
pub mod error;
pub mod preprocessing;
pub mod server;
pub mod transform;
pub mod transforms;

pub use error::PreprocessError;
pub use preprocessing::{Pipeline, PipelineParams, PreprocessingResult, SAVE_FILE_NAME};
