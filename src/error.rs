//! Error types for controller and device operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("coordinate mapping requested before the first screenshot set the target size")]
    Uncalibrated,

    #[error("neither screenshot target long side nor short side is configured")]
    Config,

    #[error("device command failed: {0}")]
    Driver(String),

    #[error("device returned an empty screenshot")]
    EmptyScreenshot,

    #[error("command timeout: {0}")]
    Timeout(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ControlError>;
