//! Transform implementations
//!
//! Built-in transforms plus a closure adapter, collected into a registry
//! keyed by name. Callers pick one per request; the mask pipeline is the
//! default.

pub mod builtin;

use crate::error::PreprocessError;
use crate::transform::ImageTransform;
use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;

pub use builtin::{GrayscaleTransform, IdentityTransform, PrettyOofTransform, RotateTransform};

type TransformFn = dyn Fn(DynamicImage) -> Result<DynamicImage, PreprocessError> + Send + Sync;

/// Adapter turning any one-argument image function into a transform
pub struct FnTransform {
    name: String,
    description: String,
    func: Box<TransformFn>,
}

impl FnTransform {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(DynamicImage) -> Result<DynamicImage, PreprocessError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            func: Box::new(func),
        }
    }
}

impl ImageTransform for FnTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, PreprocessError> {
        let output = (self.func)(image)?;
        if output.width() == 0 || output.height() == 0 {
            return Err(PreprocessError::TransformFailed {
                name: self.name.clone(),
                reason: "returned an empty image".to_string(),
            });
        }
        Ok(output)
    }
}

/// Information about an available transform
#[derive(Debug, Clone, Serialize)]
pub struct TransformInfo {
    pub name: String,
    pub description: String,
}

/// Registry of available transforms
pub struct TransformRegistry {
    transforms: Vec<Arc<dyn ImageTransform>>,
    default_transform: String,
}

impl TransformRegistry {
    /// Registry holding only the given default
    pub fn new(default: Arc<dyn ImageTransform>) -> Self {
        let default_transform = default.name().to_string();
        Self {
            transforms: vec![default],
            default_transform,
        }
    }

    /// Registry with every built-in transform, `pretty-oof` as default
    pub fn with_builtins() -> Self {
        let mut registry = Self::new(Arc::new(PrettyOofTransform::default()));
        registry.register(Arc::new(GrayscaleTransform));
        registry.register(Arc::new(RotateTransform));
        registry.register(Arc::new(IdentityTransform));
        registry
    }

    /// Add a transform, replacing any existing one with the same name
    pub fn register(&mut self, transform: Arc<dyn ImageTransform>) {
        if let Some(slot) = self
            .transforms
            .iter_mut()
            .find(|t| t.name() == transform.name())
        {
            tracing::info!("Replacing transform '{}'", transform.name());
            *slot = transform;
        } else {
            tracing::debug!("Registered transform '{}'", transform.name());
            self.transforms.push(transform);
        }
    }

    /// Get a transform by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ImageTransform>> {
        self.transforms.iter().find(|t| t.name() == name).cloned()
    }

    /// Get a transform by name, or `UnknownTransform`
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ImageTransform>, PreprocessError> {
        self.get(name)
            .ok_or_else(|| PreprocessError::UnknownTransform(name.to_string()))
    }

    /// Get the default transform
    pub fn default(&self) -> Option<Arc<dyn ImageTransform>> {
        self.get(&self.default_transform)
    }

    pub fn default_name(&self) -> &str {
        &self.default_transform
    }

    /// List all available transform names
    pub fn list(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Get info about all available transforms
    pub fn info(&self) -> Vec<TransformInfo> {
        self.transforms
            .iter()
            .map(|t| TransformInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_builtins_are_registered() {
        let registry = TransformRegistry::with_builtins();
        assert_eq!(registry.list(), vec!["pretty-oof", "grayscale", "rotate", "identity"]);
        assert_eq!(registry.default_name(), "pretty-oof");
        assert_eq!(registry.default().unwrap().name(), "pretty-oof");
        assert_eq!(registry.info().len(), 4);
    }

    #[test]
    fn test_unknown_name_resolves_to_error() {
        let registry = TransformRegistry::with_builtins();
        assert!(registry.get("sharpen").is_none());
        assert!(matches!(
            registry.resolve("sharpen"),
            Err(PreprocessError::UnknownTransform(name)) if name == "sharpen"
        ));
    }

    #[test]
    fn test_closure_transform_is_pluggable() {
        let mut registry = TransformRegistry::with_builtins();
        registry.register(Arc::new(FnTransform::new("invert", "Invert levels", |img| {
            let mut gray = img.to_luma8();
            image::imageops::invert(&mut gray);
            Ok(DynamicImage::ImageLuma8(gray))
        })));

        let invert = registry.resolve("invert").unwrap();
        let out = invert
            .apply(DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([10]))))
            .unwrap();
        assert_eq!(out.as_luma8().unwrap().get_pixel(1, 1), &Luma([245]));
    }

    #[test]
    fn test_closure_returning_empty_image_fails() {
        let shrink = FnTransform::new("shrink", "Drop everything", |_| {
            Ok(DynamicImage::ImageLuma8(GrayImage::new(0, 0)))
        });
        let err = shrink
            .apply(DynamicImage::ImageLuma8(GrayImage::new(3, 3)))
            .unwrap_err();
        assert!(matches!(err, PreprocessError::TransformFailed { name, .. } if name == "shrink"));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = TransformRegistry::with_builtins();
        registry.register(Arc::new(FnTransform::new("rotate", "no-op rotate", Ok)));
        assert_eq!(registry.list().len(), 4);
        assert_eq!(registry.get("rotate").unwrap().description(), "no-op rotate");
    }
}
