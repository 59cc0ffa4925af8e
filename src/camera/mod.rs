//! Camera abstraction and an explicit open/grab/close state machine.
//!
//! Vendor SDKs plug in by implementing [`Camera`]. [`CameraHandle`] enforces
//! the `Closed -> Opened -> Grabbing -> Closed` lifecycle and releases the
//! device when dropped.

use crate::image::Frame;
use crate::trace::{log_info, log_warn};
use thiserror::Error;

#[cfg(feature = "image-io")]
mod folder;
mod still;

#[cfg(feature = "image-io")]
pub use folder::ImageFolderCamera;
pub use still::StillCamera;

/// Camera failures, each with a stable short code.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("no camera device found")]
    NotFoundDevice,
    #[error("failed to create device: {0}")]
    CreateDeviceFail(String),
    #[error("unsupported camera model: {0}")]
    ModelName(String),
    #[error("failed to load feature file: {0}")]
    LoadFeatureFail(String),
    #[error("camera configuration is missing")]
    ConfigIsNone,
    #[error("failed to grab frame: {0}")]
    GrabFail(String),
    #[error("cannot {op} while {state:?}")]
    InvalidState { op: &'static str, state: CameraState },
}

impl CameraError {
    /// Short code reported to operators.
    pub fn code(&self) -> &'static str {
        match self {
            CameraError::NotFoundDevice => "ERR_NOT_FOUND_DEVICE",
            CameraError::CreateDeviceFail(_) => "ERR_CREATE_DEVICE_FAIL",
            CameraError::ModelName(_) => "ERR_MODEL_NAME",
            CameraError::LoadFeatureFail(_) => "ERR_LOAD_FEATURE_FAIL",
            CameraError::ConfigIsNone => "ERR_CONFIG_IS_NONE",
            CameraError::GrabFail(_) => "ERR_GRAB_FAIL",
            CameraError::InvalidState { .. } => "ERR_INVALID_STATE",
        }
    }
}

/// A frame source.
///
/// Implementations only perform device calls; lifecycle ordering is checked
/// by [`CameraHandle`].
pub trait Camera: Send {
    /// Human-readable model or source name.
    fn model_name(&self) -> &str;
    fn open(&mut self) -> Result<(), CameraError>;
    fn close(&mut self) -> Result<(), CameraError>;
    fn start_grabbing(&mut self) -> Result<(), CameraError>;
    fn stop_grabbing(&mut self) -> Result<(), CameraError>;
    /// Returns the next frame.
    fn grab(&mut self) -> Result<Frame, CameraError>;
}

/// Lifecycle state of a [`CameraHandle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraState {
    Closed,
    Opened,
    Grabbing,
}

/// Owns a camera and tracks its lifecycle.
pub struct CameraHandle {
    camera: Box<dyn Camera>,
    state: CameraState,
}

impl CameraHandle {
    /// Wraps a closed camera.
    pub fn new(camera: Box<dyn Camera>) -> Self {
        Self {
            camera,
            state: CameraState::Closed,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn model_name(&self) -> &str {
        self.camera.model_name()
    }

    /// `Closed -> Opened`.
    pub fn open(&mut self) -> Result<(), CameraError> {
        self.require(CameraState::Closed, "open")?;
        self.camera.open()?;
        self.state = CameraState::Opened;
        log_info!("camera {} opened", self.camera.model_name());
        Ok(())
    }

    /// `Opened -> Grabbing`.
    pub fn start(&mut self) -> Result<(), CameraError> {
        self.require(CameraState::Opened, "start grabbing")?;
        self.camera.start_grabbing()?;
        self.state = CameraState::Grabbing;
        Ok(())
    }

    /// Opens if needed and starts grabbing.
    pub fn open_and_start(&mut self) -> Result<(), CameraError> {
        if self.state == CameraState::Closed {
            self.open()?;
        }
        if self.state == CameraState::Opened {
            self.start()?;
        }
        Ok(())
    }

    /// Grabs one frame; only valid while grabbing.
    pub fn grab(&mut self) -> Result<Frame, CameraError> {
        self.require(CameraState::Grabbing, "grab")?;
        self.camera.grab()
    }

    /// `Grabbing -> Opened`.
    pub fn stop(&mut self) -> Result<(), CameraError> {
        self.require(CameraState::Grabbing, "stop grabbing")?;
        self.camera.stop_grabbing()?;
        self.state = CameraState::Opened;
        Ok(())
    }

    /// Stops grabbing if needed and closes. Closing a closed handle is a no-op.
    pub fn close(&mut self) -> Result<(), CameraError> {
        if self.state == CameraState::Grabbing {
            self.stop()?;
        }
        if self.state == CameraState::Opened {
            self.camera.close()?;
            self.state = CameraState::Closed;
            log_info!("camera {} closed", self.camera.model_name());
        }
        Ok(())
    }

    fn require(&self, wanted: CameraState, op: &'static str) -> Result<(), CameraError> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(CameraError::InvalidState {
                op,
                state: self.state,
            })
        }
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log_warn!("camera shutdown failed: {} ({err})", err.code());
            self.state = CameraState::Closed;
        }
    }
}
