use crate::camera::{Camera, CameraError};
use crate::image::Frame;

/// In-memory camera that cycles through a fixed list of frames.
///
/// An empty list behaves like an unplugged device.
#[derive(Clone, Debug)]
pub struct StillCamera {
    frames: Vec<Frame>,
    next: usize,
    name: String,
}

impl StillCamera {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            next: 0,
            name: "still".to_string(),
        }
    }

    /// Single-frame camera.
    pub fn single(frame: Frame) -> Self {
        Self::new(vec![frame])
    }

    /// Overrides the reported model name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Camera for StillCamera {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), CameraError> {
        if self.frames.is_empty() {
            return Err(CameraError::NotFoundDevice);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn start_grabbing(&mut self) -> Result<(), CameraError> {
        self.next = 0;
        Ok(())
    }

    fn stop_grabbing(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn grab(&mut self) -> Result<Frame, CameraError> {
        if self.frames.is_empty() {
            return Err(CameraError::GrabFail("no frames".to_string()));
        }
        let frame = self.frames[self.next % self.frames.len()].clone();
        self.next = self.next.wrapping_add(1);
        Ok(frame)
    }
}
