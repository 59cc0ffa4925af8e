use crate::config::{MorphOp, MorphologyConfig};
use crate::filter::radius;
use crate::image::{ImageView, OwnedImage};
use crate::util::MarkAlignResult;
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Applies the configured morphological operation with a square kernel.
///
/// Non-zero pixels are foreground and the output is a 0/255 mask. Erode and
/// dilate repeat `iterations` times (at least once); open and close run a
/// single erode/dilate pair.
pub fn apply_morphology(
    img: ImageView<'_, u8>,
    cfg: &MorphologyConfig,
) -> MarkAlignResult<OwnedImage> {
    let k = square_radius(cfg.kernel_size);
    if k == 0 {
        return Ok(img.to_owned_image());
    }
    let start = img.to_gray_image();
    let out = match cfg.op {
        MorphOp::Erode => repeat(start, cfg.iterations, |im| morphology::erode(im, Norm::LInf, k)),
        MorphOp::Dilate => repeat(start, cfg.iterations, |im| morphology::dilate(im, Norm::LInf, k)),
        MorphOp::Open => morphology::open(&start, Norm::LInf, k),
        MorphOp::Close => morphology::close(&start, Norm::LInf, k),
    };
    Ok(OwnedImage::from_gray_image(out))
}

/// Chessboard radius of a `ksize x ksize` kernel, saturated to `u8`.
fn square_radius(ksize: u32) -> u8 {
    radius(ksize).min(u8::MAX as u32) as u8
}

fn repeat(img: GrayImage, times: u32, f: impl Fn(&GrayImage) -> GrayImage) -> GrayImage {
    (0..times.max(1)).fold(img, |acc, _| f(&acc))
}

/// Clears every pixel within a `ksize x ksize` window of a background pixel.
///
/// Pixels outside the image do not count as background.
pub fn erode(img: ImageView<'_, u8>, ksize: u32) -> OwnedImage {
    match square_radius(ksize) {
        0 => img.to_owned_image(),
        k => OwnedImage::from_gray_image(morphology::erode(&img.to_gray_image(), Norm::LInf, k)),
    }
}

/// Sets every pixel within a `ksize x ksize` window of a foreground pixel.
pub fn dilate(img: ImageView<'_, u8>, ksize: u32) -> OwnedImage {
    match square_radius(ksize) {
        0 => img.to_owned_image(),
        k => OwnedImage::from_gray_image(morphology::dilate(&img.to_gray_image(), Norm::LInf, k)),
    }
}
