//! Edge/foreground mask preprocessing
//!
//! A fixed, strictly linear chain of numeric stages that turns one
//! single-channel image into a binarized 8-bit mask.

pub mod pipeline;
pub mod plane;
pub mod steps;

pub use pipeline::{Pipeline, PipelineParams, PreprocessingResult, StepTiming, SAVE_FILE_NAME};
pub use plane::Plane;
