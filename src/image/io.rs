//! Convenience helpers for loading and saving frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{Frame, OwnedImage, PixelLayout};
use crate::util::{MarkAlignError, MarkAlignResult};
use std::path::Path;

/// Creates a frame from a decoded image, keeping gray images single-channel.
pub fn frame_from_dynamic_image(img: &image::DynamicImage) -> MarkAlignResult<Frame> {
    match img {
        image::DynamicImage::ImageLuma8(gray) => Frame::new(
            gray.as_raw().clone(),
            gray.width() as usize,
            gray.height() as usize,
            PixelLayout::Gray,
        ),
        other => {
            let rgb = other.to_rgb8();
            let width = rgb.width() as usize;
            let height = rgb.height() as usize;
            Frame::new(rgb.into_raw(), width, height, PixelLayout::Rgb)
        }
    }
}

/// Loads an image file as a frame.
pub fn load_frame<P: AsRef<Path>>(path: P) -> MarkAlignResult<Frame> {
    let img = image::open(path).map_err(|err| MarkAlignError::ImageIo {
        reason: err.to_string(),
    })?;
    frame_from_dynamic_image(&img)
}

/// Saves a frame; the format follows the file extension.
pub fn save_frame<P: AsRef<Path>>(frame: &Frame, path: P) -> MarkAlignResult<()> {
    let (width, height) = (frame.width() as u32, frame.height() as u32);
    let result = match frame.layout() {
        PixelLayout::Gray => {
            image::save_buffer(path, frame.data(), width, height, image::ExtendedColorType::L8)
        }
        PixelLayout::Rgb => {
            image::save_buffer(path, frame.data(), width, height, image::ExtendedColorType::Rgb8)
        }
    };
    result.map_err(|err| MarkAlignError::ImageIo {
        reason: err.to_string(),
    })
}

/// Saves a single-channel plane such as a binary mask.
pub fn save_plane<P: AsRef<Path>>(img: &OwnedImage, path: P) -> MarkAlignResult<()> {
    image::save_buffer(
        path,
        img.data(),
        img.width() as u32,
        img.height() as u32,
        image::ExtendedColorType::L8,
    )
    .map_err(|err| MarkAlignError::ImageIo {
        reason: err.to_string(),
    })
}
