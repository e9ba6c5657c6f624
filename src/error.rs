use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to save {}: {reason}", .path.display())]
    SaveFailed { path: PathBuf, reason: String },

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Unknown transform: {0}")]
    UnknownTransform(String),

    #[error("Transform '{name}' failed: {reason}")]
    TransformFailed { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Image too large: {} (max: {max} bytes)", upload_size(.size))]
    ImageTooLarge { size: Option<usize>, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Size is unknown when the body limit cut the upload off mid-stream
fn upload_size(size: &Option<usize>) -> String {
    match size {
        Some(bytes) => format!("{} bytes", bytes),
        None => "upload exceeds the request body limit".to_string(),
    }
}

impl From<std::io::Error> for PreprocessError {
    fn from(err: std::io::Error) -> Self {
        PreprocessError::Io(err.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl PreprocessError {
    /// Stable machine-readable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            PreprocessError::InvalidInput(_) => "INVALID_INPUT",
            PreprocessError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            PreprocessError::SaveFailed { .. } => "SAVE_FAILED",
            PreprocessError::DecodeFailed(_) => "DECODE_FAILED",
            PreprocessError::UnknownTransform(_) => "UNKNOWN_TRANSFORM",
            PreprocessError::TransformFailed { .. } => "TRANSFORM_FAILED",
            PreprocessError::Io(_) => "IO_ERROR",
            PreprocessError::ImageTooLarge { .. } => "IMAGE_TOO_LARGE",
            PreprocessError::MissingFile => "MISSING_FILE",
            PreprocessError::InvalidRequest(_) => "INVALID_REQUEST",
            PreprocessError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            PreprocessError::InvalidInput(_)
            | PreprocessError::UnsupportedFormat(_)
            | PreprocessError::DecodeFailed(_)
            | PreprocessError::UnknownTransform(_)
            | PreprocessError::MissingFile
            | PreprocessError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PreprocessError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PreprocessError::SaveFailed { .. }
            | PreprocessError::TransformFailed { .. }
            | PreprocessError::Io(_)
            | PreprocessError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PreprocessError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        assert_eq!(
            PreprocessError::UnknownTransform("blur".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PreprocessError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PreprocessError::ImageTooLarge { size: Some(10), max: 5 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_too_large_without_known_size() {
        let err = PreprocessError::ImageTooLarge { size: None, max: 1024 };
        assert_eq!(err.code(), "IMAGE_TOO_LARGE");
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            err.to_string(),
            "Image too large: upload exceeds the request body limit (max: 1024 bytes)"
        );

        let known = PreprocessError::ImageTooLarge { size: Some(4096), max: 1024 };
        assert_eq!(known.to_string(), "Image too large: 4096 bytes (max: 1024 bytes)");
    }

    #[test]
    fn test_save_failed_message_names_path() {
        let err = PreprocessError::SaveFailed {
            path: PathBuf::from("/nope/pretty_oof_preprocess.png"),
            reason: "permission denied".into(),
        };
        let message = err.to_string();
        assert!(message.contains("/nope/pretty_oof_preprocess.png"));
        assert!(message.contains("permission denied"));
        assert_eq!(err.code(), "SAVE_FAILED");
    }
}
