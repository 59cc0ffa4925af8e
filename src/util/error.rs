//! Error types for markalign.

use thiserror::Error;

/// Result alias for markalign operations.
pub type Result<T> = std::result::Result<T, MarkAlignError>;

/// Errors that can occur while configuring or running the inspection pipeline.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MarkAlignError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the layout requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Region of interest does not fit inside the image.
    #[error("roi ({x}, {y}, {width}x{height}) outside image {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// A filter or detector parameter is outside its valid range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    /// The configured circle transform is a line-transform identifier.
    #[error("hough method {0} cannot detect circles")]
    UnsupportedHoughMethod(&'static str),
    /// A required top-level configuration section is missing.
    #[error("configuration is missing section `{0}`")]
    MissingSection(&'static str),
    /// Configuration JSON is malformed or has the wrong shape.
    #[error("configuration parse error: {reason}")]
    ConfigParse { reason: String },
    /// Configuration parsed but violates an invariant.
    #[error("invalid configuration: {reason}")]
    ConfigInvalid { reason: String },
    /// The named model has no stored configuration.
    #[error("model `{name}` not found")]
    ModelNotFound { name: String },
    /// The model name cannot be used as a directory name.
    #[error("invalid model name `{name}`")]
    InvalidModelName { name: String },
    /// Filesystem or socket failure.
    #[error("io error: {reason}")]
    Io { reason: String },
    /// Image decoding or encoding failure.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
    /// The trigger listener could not bind its address.
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
    /// Camera collaborator failure.
    #[error("camera error: {0}")]
    Camera(#[from] crate::camera::CameraError),
}

impl From<std::io::Error> for MarkAlignError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for MarkAlignError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigParse {
            reason: err.to_string(),
        }
    }
}
