use crate::imaging::ShapeError;
use thiserror::Error;

/// Everything that can end a removal call. There are no partial results.
#[derive(Error, Debug)]
pub enum RemovalError {
    #[error("Background removal failed: API key must not be empty")]
    InvalidCredential,
    #[error("Background removal failed: {0}")]
    InvalidImageShape(#[from] ShapeError),
    #[error("Background removal failed: API error {code}: {message}")]
    RemoteApi { code: i64, message: String },
    #[error("Background removal failed: network error: {0}")]
    Network(String),
    #[error("Background removal failed: unrecognized response type '{0}'")]
    UnrecognizedResponse(String),
    #[error("Background removal failed: image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Background removal failed: HTTP client setup: {0}")]
    Client(String),
}
