//! Mathematical helpers for filters and alignment.

/// Folds an angle difference in degrees into `(-180, 180]` with a single
/// correction step.
///
/// Inputs are expected to be differences of two `atan2` angles, so they lie in
/// `(-360, 360)` and one step is enough.
pub(crate) fn wrap_deg(angle_deg: f64) -> f64 {
    if angle_deg > 180.0 {
        angle_deg - 360.0
    } else if angle_deg <= -180.0 {
        angle_deg + 360.0
    } else {
        angle_deg
    }
}

/// Direction of the vector `(dx, dy)` in degrees, measured with `atan2`.
pub(crate) fn heading_deg(dx: f64, dy: f64) -> f64 {
    dy.atan2(dx).to_degrees()
}

/// Euclidean distance between two points.
pub(crate) fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt()
}

/// Rounds an even kernel size up to the next odd value.
pub(crate) fn normalize_odd(value: u32) -> u32 {
    if value % 2 == 0 {
        value + 1
    } else {
        value
    }
}

/// Gaussian sigma derived from the kernel size, matching the usual
/// `0.3 * ((k - 1) * 0.5 - 1) + 0.8` convention.
pub(crate) fn sigma_for_kernel(ksize: u32) -> f64 {
    0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Builds a normalized 1D Gaussian kernel of odd length `ksize`.
pub(crate) fn gaussian_kernel(ksize: u32) -> Vec<f64> {
    let ksize = normalize_odd(ksize.max(1)) as usize;
    if ksize == 1 {
        return vec![1.0];
    }
    let sigma = sigma_for_kernel(ksize as u32);
    let half = (ksize / 2) as f64;
    let scale = -0.5 / (sigma * sigma);
    let mut kernel: Vec<f64> = (0..ksize)
        .map(|i| {
            let x = i as f64 - half;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for value in kernel.iter_mut() {
        *value /= sum;
    }
    kernel
}
