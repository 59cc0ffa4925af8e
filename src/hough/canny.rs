use crate::image::{ImageView, OwnedImage};
use image::GrayImage;
use imageproc::edges;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Smoothing applied before gradients are taken, as inside `imageproc::edges::canny`.
const EDGE_SIGMA: f32 = 1.4;

/// Sobel gradients and the thinned, hysteresis-linked edge set.
#[derive(Clone, Debug)]
pub struct EdgeMap {
    width: usize,
    height: usize,
    dx: Vec<i32>,
    dy: Vec<i32>,
    edges: Vec<bool>,
}

impl EdgeMap {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Horizontal and vertical Sobel responses of the smoothed image at `(x, y)`.
    pub fn gradient(&self, x: usize, y: usize) -> (i32, i32) {
        let idx = y * self.width + x;
        (self.dx[idx], self.dy[idx])
    }

    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        self.edges[y * self.width + x]
    }

    /// Edge pixel coordinates in raster order.
    pub fn edge_points(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, &e)| e)
            .map(move |(i, _)| (i % width, i / width))
    }

    /// Edge plane with 255 on edges.
    pub fn to_image(&self) -> OwnedImage {
        let data = self.edges.iter().map(|&e| if e { 255 } else { 0 }).collect();
        OwnedImage::from_parts(data, self.width, self.height)
    }
}

/// 3x3 Sobel derivatives; the border pixels repeat.
pub fn sobel(img: ImageView<'_, u8>) -> (Vec<i32>, Vec<i32>) {
    sobel_gray(&img.to_gray_image())
}

fn sobel_gray(gray: &GrayImage) -> (Vec<i32>, Vec<i32>) {
    let widen = |plane: Vec<i16>| plane.into_iter().map(i32::from).collect();
    (
        widen(horizontal_sobel(gray).into_raw()),
        widen(vertical_sobel(gray).into_raw()),
    )
}

/// Canny edges between `low` and `high` hysteresis thresholds.
///
/// Edge tracing is `imageproc::edges::canny`; the stored gradients come from
/// the same Gaussian-smoothed image so their directions follow the traced
/// edges.
pub fn canny(img: ImageView<'_, u8>, low: f64, high: f64) -> EdgeMap {
    let gray = img.to_gray_image();
    let traced = edges::canny(&gray, low as f32, high as f32);
    let (dx, dy) = sobel_gray(&gaussian_blur_f32(&gray, EDGE_SIGMA));
    EdgeMap {
        width: img.width(),
        height: img.height(),
        dx,
        dy,
        edges: traced.into_raw().into_iter().map(|v| v != 0).collect(),
    }
}
