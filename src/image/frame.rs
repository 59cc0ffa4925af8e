use crate::geometry::Rect;
use crate::image::{ImageView, OwnedImage};
use crate::util::{MarkAlignError, MarkAlignResult};

/// Channel layout of a camera frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// One luminance channel.
    Gray,
    /// Interleaved red, green, blue.
    Rgb,
}

impl PixelLayout {
    /// Number of interleaved channels.
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb => 3,
        }
    }
}

/// Immutable camera frame. Produced by a camera, consumed by one pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: usize,
    height: usize,
    layout: PixelLayout,
}

impl Frame {
    /// Wraps an interleaved buffer of exactly `width * height * channels` bytes.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> MarkAlignResult<Self> {
        if width == 0 || height == 0 {
            return Err(MarkAlignError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(layout.channels()))
            .ok_or(MarkAlignError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(MarkAlignError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    /// Wraps a single-channel plane.
    pub fn from_gray(img: OwnedImage) -> Self {
        let width = img.width();
        let height = img.height();
        Self {
            data: img.into_data(),
            width,
            height,
            layout: PixelLayout::Gray,
        }
    }

    /// Interleaves three planes of equal size into an RGB frame.
    pub fn from_planes(r: &OwnedImage, g: &OwnedImage, b: &OwnedImage) -> MarkAlignResult<Self> {
        let (width, height) = (r.width(), r.height());
        if (g.width(), g.height()) != (width, height) || (b.width(), b.height()) != (width, height)
        {
            return Err(MarkAlignError::InvalidInput("planes differ in size"));
        }
        let mut data = Vec::with_capacity(width * height * 3);
        for ((&rv, &gv), &bv) in r.data().iter().zip(g.data()).zip(b.data()) {
            data.extend_from_slice(&[rv, gv, bv]);
        }
        Self::new(data, width, height, PixelLayout::Rgb)
    }

    /// Returns the frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the channel layout.
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Returns the interleaved pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Converts to a luminance plane.
    ///
    /// RGB uses the fixed-point weights `(77 R + 150 G + 29 B + 128) >> 8`.
    pub fn to_gray(&self) -> OwnedImage {
        let data = match self.layout {
            PixelLayout::Gray => self.data.clone(),
            PixelLayout::Rgb => self
                .data
                .chunks_exact(3)
                .map(|px| {
                    let y = 77 * px[0] as u32 + 150 * px[1] as u32 + 29 * px[2] as u32 + 128;
                    (y >> 8).min(255) as u8
                })
                .collect(),
        };
        OwnedImage {
            data,
            width: self.width,
            height: self.height,
        }
    }

    /// Returns a gray view when the frame is single-channel.
    pub fn gray_view(&self) -> Option<ImageView<'_, u8>> {
        match self.layout {
            PixelLayout::Gray => Some(ImageView {
                data: &self.data,
                width: self.width,
                height: self.height,
                stride: self.width,
            }),
            PixelLayout::Rgb => None,
        }
    }

    /// Splits the frame into one plane per channel.
    pub fn planes(&self) -> Vec<OwnedImage> {
        let channels = self.layout.channels();
        (0..channels)
            .map(|c| OwnedImage {
                data: self.data.iter().skip(c).step_by(channels).copied().collect(),
                width: self.width,
                height: self.height,
            })
            .collect()
    }

    /// Expands to RGB; gray values are replicated into all channels.
    pub fn to_rgb(&self) -> Frame {
        match self.layout {
            PixelLayout::Rgb => self.clone(),
            PixelLayout::Gray => Frame {
                data: self.data.iter().flat_map(|&v| [v, v, v]).collect(),
                width: self.width,
                height: self.height,
                layout: PixelLayout::Rgb,
            },
        }
    }

    /// Copies the part of `rect` that lies inside the frame.
    ///
    /// Returns the crop and the rectangle actually copied, or `None` when the
    /// rectangle misses the frame entirely.
    pub fn crop(&self, rect: Rect) -> Option<(Frame, Rect)> {
        let clamped = rect.clamp_to(self.width, self.height)?;
        let channels = self.layout.channels();
        let (x0, y0) = (clamped.x as usize, clamped.y as usize);
        let (w, h) = (clamped.width as usize, clamped.height as usize);
        let mut data = Vec::with_capacity(w * h * channels);
        for y in y0..y0 + h {
            let start = (y * self.width + x0) * channels;
            data.extend_from_slice(&self.data[start..start + w * channels]);
        }
        let frame = Frame {
            data,
            width: w,
            height: h,
            layout: self.layout,
        };
        Some((frame, clamped))
    }

    /// Writes an RGB color at `(x, y)`; gray frames store the color's luminance.
    /// Out-of-bounds coordinates are ignored.
    pub fn put_pixel(&mut self, x: i32, y: i32, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        match self.layout {
            PixelLayout::Gray => {
                let luma =
                    77 * rgb[0] as u32 + 150 * rgb[1] as u32 + 29 * rgb[2] as u32 + 128;
                self.data[idx] = (luma >> 8).min(255) as u8;
            }
            PixelLayout::Rgb => {
                self.data[idx * 3..idx * 3 + 3].copy_from_slice(&rgb);
            }
        }
    }
}
