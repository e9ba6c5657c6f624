//! Individual preprocessing stages

pub mod blend;
pub mod gradient;
pub mod grayscale;
pub mod histogram;
pub mod normalize;
pub mod threshold;
