use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DenoiseError {
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid window size: {0} (must be odd, between 1 and 255)")]
    InvalidWindowSize(u32),

    #[error("Invalid noise density: {0} (must be within 0.0..=1.0)")]
    InvalidDensity(f64),

    #[error("Image dimensions differ: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Unknown filter method: {0}")]
    UnknownMethod(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to encode image: {0}")]
    ImageEncode(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Request body exceeds the upload limit of {max} bytes")]
    BodyTooLarge { max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for DenoiseError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            DenoiseError::InvalidDimensions { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_DIMENSIONS")
            }
            DenoiseError::InvalidWindowSize(_) => (StatusCode::BAD_REQUEST, "INVALID_WINDOW_SIZE"),
            DenoiseError::InvalidDensity(_) => (StatusCode::BAD_REQUEST, "INVALID_DENSITY"),
            DenoiseError::DimensionMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DIMENSION_MISMATCH")
            }
            DenoiseError::UnknownMethod(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_METHOD"),
            DenoiseError::ImageDecode(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT"),
            DenoiseError::ImageEncode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ENCODE_ERROR"),
            DenoiseError::ImageTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE")
            }
            DenoiseError::BodyTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE")
            }
            DenoiseError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            DenoiseError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            DenoiseError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
