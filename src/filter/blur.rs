use crate::config::{BlurConfig, BlurKind};
use crate::filter::{normalize_odd, radius, to_float, to_plane};
use crate::image::{Frame, ImageView, OwnedImage, PixelLayout};
use crate::util::math::sigma_for_kernel;
use crate::util::MarkAlignResult;
use imageproc::filter::{box_filter, gaussian_blur_f32, median_filter};

/// Applies the configured blur to a gray plane.
pub fn apply_blur(img: ImageView<'_, u8>, cfg: &BlurConfig) -> MarkAlignResult<OwnedImage> {
    Ok(match cfg.kind {
        BlurKind::Gaussian => gaussian_blur(img, cfg.ksize),
        BlurKind::Median => median_blur(img, cfg.ksize),
        BlurKind::Average => average_blur(img, cfg.ksize),
    })
}

/// Blurs every channel of a frame independently.
pub fn blur_frame(frame: &Frame, cfg: &BlurConfig) -> MarkAlignResult<Frame> {
    match frame.layout() {
        PixelLayout::Gray => {
            let gray = frame.to_gray();
            Ok(Frame::from_gray(apply_blur(gray.view(), cfg)?))
        }
        PixelLayout::Rgb => {
            let planes = frame
                .planes()
                .iter()
                .map(|plane| apply_blur(plane.view(), cfg))
                .collect::<MarkAlignResult<Vec<_>>>()?;
            Frame::from_planes(&planes[0], &planes[1], &planes[2])
        }
    }
}

/// Gaussian blur with sigma derived from the kernel size.
///
/// Runs in `f32` and rounds once at the end.
pub fn gaussian_blur(img: ImageView<'_, u8>, ksize: u32) -> OwnedImage {
    let k = normalize_odd(ksize);
    if k == 1 {
        return img.to_owned_image();
    }
    let blurred = gaussian_blur_f32(&to_float(img), sigma_for_kernel(k) as f32);
    to_plane(&blurred)
}

/// Normalized box filter.
pub fn average_blur(img: ImageView<'_, u8>, ksize: u32) -> OwnedImage {
    let r = radius(ksize);
    if r == 0 {
        return img.to_owned_image();
    }
    OwnedImage::from_gray_image(box_filter(&img.to_gray_image(), r, r))
}

/// Median filter over a square window.
pub fn median_blur(img: ImageView<'_, u8>, ksize: u32) -> OwnedImage {
    let r = radius(ksize);
    if r == 0 {
        return img.to_owned_image();
    }
    OwnedImage::from_gray_image(median_filter(&img.to_gray_image(), r, r))
}

#[cfg(test)]
mod tests {
    use super::{apply_blur, average_blur, blur_frame, gaussian_blur, median_blur};
    use crate::config::{BlurConfig, BlurKind};
    use crate::image::{Frame, OwnedImage, PixelLayout};

    fn constant(value: u8) -> OwnedImage {
        OwnedImage::filled(9, 7, value).unwrap()
    }

    #[test]
    fn blurs_preserve_constant_images() {
        let img = constant(77);
        for kind in [BlurKind::Gaussian, BlurKind::Median, BlurKind::Average] {
            let out = apply_blur(img.view(), &BlurConfig { kind, ksize: 5 }).unwrap();
            assert!(out.data().iter().all(|&v| v == 77), "{kind:?}");
        }
    }

    #[test]
    fn median_removes_isolated_spike() {
        let mut img = constant(10);
        img.set(4, 3, 250);
        let out = median_blur(img.view(), 3);
        assert_eq!(out.get(4, 3), Some(10));
    }

    #[test]
    fn median_matches_brute_force_on_gradient() {
        let img = OwnedImage::from_fn(6, 5, |x, y| ((x * 37 + y * 91) % 256) as u8).unwrap();
        let out = median_blur(img.view(), 3);
        // Interior pixel: plain 3x3 neighborhood.
        let mut window: Vec<u8> = (1..4)
            .flat_map(|y| (1..4).map(move |x| (x, y)))
            .map(|(x, y)| img.get(x, y).unwrap())
            .collect();
        window.sort_unstable();
        assert_eq!(out.get(2, 2), Some(window[4]));
    }

    #[test]
    fn even_kernel_sizes_are_bumped() {
        let img = OwnedImage::from_fn(8, 8, |x, _| (x * 30) as u8).unwrap();
        assert_eq!(average_blur(img.view(), 4), average_blur(img.view(), 5));
        assert_eq!(gaussian_blur(img.view(), 2), gaussian_blur(img.view(), 3));
    }

    #[test]
    fn ksize_one_is_identity() {
        let img = OwnedImage::from_fn(5, 4, |x, y| (x * 50 + y) as u8).unwrap();
        assert_eq!(gaussian_blur(img.view(), 1), img);
        assert_eq!(average_blur(img.view(), 1), img);
        assert_eq!(median_blur(img.view(), 0), img);
    }

    #[test]
    fn average_of_step_edge_is_symmetric() {
        let img = OwnedImage::from_fn(6, 1, |x, _| if x < 3 { 0 } else { 90 }).unwrap();
        let out = average_blur(img.view(), 3);
        assert_eq!(out.get(2, 0), Some(30));
        assert_eq!(out.get(3, 0), Some(60));
    }

    #[test]
    fn gaussian_softens_a_step_monotonically() {
        let img = OwnedImage::from_fn(12, 3, |x, _| if x < 6 { 0 } else { 200 }).unwrap();
        let out = gaussian_blur(img.view(), 5);
        let row: Vec<u8> = (0..12).map(|x| out.get(x, 1).unwrap()).collect();
        assert!(row.windows(2).all(|w| w[0] <= w[1]), "{row:?}");
        assert!(row[5] > 0 && row[6] < 200, "{row:?}");
    }

    #[test]
    fn rgb_frames_are_blurred_per_channel() {
        let mut data = Vec::new();
        for _ in 0..16 {
            data.extend_from_slice(&[10, 20, 30]);
        }
        let frame = Frame::new(data.clone(), 4, 4, PixelLayout::Rgb).unwrap();
        let cfg = BlurConfig {
            kind: BlurKind::Gaussian,
            ksize: 3,
        };
        let out = blur_frame(&frame, &cfg).unwrap();
        assert_eq!(out.layout(), PixelLayout::Rgb);
        assert_eq!(out.data(), &data[..]);
    }
}
