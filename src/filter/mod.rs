//! Stage filters: blur, adaptive threshold and morphology on `u8` planes.
//!
//! Every filter takes a borrowed view and returns a new contiguous plane, so
//! stages chain without touching their inputs. Kernel sizes are normalized to
//! odd values before use. Blur and morphology kernels come from `imageproc`;
//! pixels beyond the border repeat the edge value.

use crate::image::{ImageView, OwnedImage};
use crate::util::math;
use image::{ImageBuffer, Luma};

mod blur;
mod morphology;
mod threshold;

pub use blur::{apply_blur, average_blur, blur_frame, gaussian_blur, median_blur};
pub use morphology::{apply_morphology, dilate, erode};
pub use threshold::apply_threshold;

/// Single-channel `f32` image as used by `imageproc::filter::gaussian_blur_f32`.
pub(crate) type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Rounds an even kernel size up to the next odd value; odd values pass through.
pub fn normalize_odd(value: u32) -> u32 {
    math::normalize_odd(value)
}

/// Kernel radius of a normalized odd size.
pub(crate) fn radius(ksize: u32) -> u32 {
    normalize_odd(ksize) / 2
}

/// Rows of a view as contiguous slices of length `width`.
pub(crate) fn rows<'a>(img: &ImageView<'a, u8>) -> impl Iterator<Item = &'a [u8]> + 'a {
    let data = img.as_slice();
    let (width, stride) = (img.width(), img.stride());
    (0..img.height()).map(move |y| &data[y * stride..y * stride + width])
}

/// Widens a view to `f32` for blurring without intermediate rounding.
pub(crate) fn to_float(img: ImageView<'_, u8>) -> FloatImage {
    let stride = img.stride();
    let data = img.as_slice();
    FloatImage::from_fn(img.width() as u32, img.height() as u32, |x, y| {
        Luma([data[y as usize * stride + x as usize] as f32])
    })
}

/// Rounds and saturates a filter response to `u8`.
#[inline]
pub(crate) fn saturate_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Packs rounded filter responses into an owned plane.
pub(crate) fn to_plane(img: &FloatImage) -> OwnedImage {
    let data = img.as_raw().iter().map(|&v| saturate_u8(v)).collect();
    OwnedImage::from_parts(data, img.width() as usize, img.height() as usize)
}
