use crate::config::{AdaptiveMethod, ThresholdConfig, ThresholdKind};
use crate::filter::{normalize_odd, rows, saturate_u8};
use crate::image::{ImageView, OwnedImage};
use crate::util::math::gaussian_kernel;
use crate::util::{MarkAlignError, MarkAlignResult};
use imageproc::filter::box_filter;

/// Adaptive threshold against the local (box or Gaussian) mean minus `c`.
///
/// The local mean is a `u8` plane with edge pixels repeated past the border,
/// and pixels strictly above `mean - c` count as "above".
pub fn apply_threshold(
    img: ImageView<'_, u8>,
    cfg: &ThresholdConfig,
) -> MarkAlignResult<OwnedImage> {
    let block = normalize_odd(cfg.block_size);
    if block < 3 {
        return Err(MarkAlignError::InvalidParameter {
            name: "block_size",
            reason: format!("must be at least 3, got {}", cfg.block_size),
        });
    }
    let means = match cfg.adaptive {
        AdaptiveMethod::Mean => {
            let r = block / 2;
            box_filter(&img.to_gray_image(), r, r).into_raw()
        }
        AdaptiveMethod::Gaussian => gaussian_mean(img, &gaussian_kernel(block)),
    };

    let width = img.width();
    let mut out = Vec::with_capacity(width * img.height());
    for (y, row) in rows(&img).enumerate() {
        let mean_row = &means[y * width..(y + 1) * width];
        for (&src, &mean) in row.iter().zip(mean_row) {
            let level = mean as i32 - cfg.c;
            out.push(classify(src, level, cfg.kind));
        }
    }
    Ok(OwnedImage::from_parts(out, width, img.height()))
}

/// Gaussian-weighted local mean over the full `block x block` window.
fn gaussian_mean(img: ImageView<'_, u8>, kernel: &[f64]) -> Vec<u8> {
    let (width, height) = (img.width(), img.height());
    let r = (kernel.len() / 2) as isize;
    let clamp = |i: isize, len: usize| i.clamp(0, len as isize - 1) as usize;

    let mut horizontal = vec![0.0f64; width * height];
    for (y, row) in rows(&img).enumerate() {
        let out = &mut horizontal[y * width..(y + 1) * width];
        for (x, dst) in out.iter_mut().enumerate() {
            *dst = kernel
                .iter()
                .enumerate()
                .map(|(k, &w)| w * row[clamp(x as isize + k as isize - r, width)] as f64)
                .sum();
        }
    }

    let mut means = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let acc: f64 = kernel
                .iter()
                .enumerate()
                .map(|(k, &w)| w * horizontal[clamp(y as isize + k as isize - r, height) * width + x])
                .sum();
            means[y * width + x] = saturate_u8(acc as f32);
        }
    }
    means
}

fn classify(src: u8, level: i32, kind: ThresholdKind) -> u8 {
    let above = src as i32 > level;
    match kind {
        ThresholdKind::Binary => {
            if above {
                255
            } else {
                0
            }
        }
        ThresholdKind::BinaryInverted => {
            if above {
                0
            } else {
                255
            }
        }
        ThresholdKind::Truncate => {
            if above {
                level.clamp(0, 255) as u8
            } else {
                src
            }
        }
        ThresholdKind::ToZero => {
            if above {
                src
            } else {
                0
            }
        }
        ThresholdKind::ToZeroInverted => {
            if above {
                0
            } else {
                src
            }
        }
    }
}
