use crate::camera::{Camera, CameraError};
use crate::image::io::load_frame;
use crate::image::Frame;
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Replays the image files of a directory in name order, looping forever.
#[derive(Clone, Debug)]
pub struct ImageFolderCamera {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    name: String,
}

impl ImageFolderCamera {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let name = format!("folder:{}", dir.display());
        Self {
            dir,
            files: Vec::new(),
            next: 0,
            name,
        }
    }

    /// Files found by the last `open`.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl Camera for ImageFolderCamera {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), CameraError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|err| CameraError::CreateDeviceFail(format!("{}: {err}", self.dir.display())))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        if files.is_empty() {
            return Err(CameraError::NotFoundDevice);
        }
        files.sort();
        self.files = files;
        self.next = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<(), CameraError> {
        self.files.clear();
        Ok(())
    }

    fn start_grabbing(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn stop_grabbing(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn grab(&mut self) -> Result<Frame, CameraError> {
        if self.files.is_empty() {
            return Err(CameraError::GrabFail("no image files".to_string()));
        }
        let path = &self.files[self.next % self.files.len()];
        self.next = self.next.wrapping_add(1);
        load_frame(path).map_err(|err| CameraError::GrabFail(format!("{}: {err}", path.display())))
    }
}
