//! Paint targets

use crate::{Error, Result};
use image::{ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};

/// A caller-owned pixel buffer the overlay can paint into.
///
/// Colors are written as given; a BGR frame simply receives the channels in
/// the order the caller supplied them.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Sets one pixel. `x`/`y` are always inside the canvas.
    fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>);
}

impl Canvas for RgbaImage {
    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        ImageBuffer::put_pixel(self, x, y, color);
    }
}

impl Canvas for RgbImage {
    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        let [r, g, b, _] = color.0;
        ImageBuffer::put_pixel(self, x, y, Rgb([r, g, b]));
    }
}

/// Fills the half-open rectangle `[left, right) x [top, bottom)`, clipped to the canvas
pub fn fill_rect<C: Canvas + ?Sized>(
    canvas: &mut C,
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
    color: Rgba<u8>,
) {
    let x_start = left.max(0);
    let y_start = top.max(0);
    let x_end = right.min(i64::from(canvas.width()));
    let y_end = bottom.min(i64::from(canvas.height()));

    if x_start >= x_end || y_start >= y_end {
        return; // Entirely off-canvas
    }

    for y in y_start..y_end {
        for x in x_start..x_end {
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn channel_count(channels: u32) -> Result<usize> {
    match channels {
        3 | 4 => Ok(channels as usize),
        other => Err(Error::InvalidFrame(format!(
            "unsupported channel count {other}"
        ))),
    }
}

/// Number of bytes a `width` x `height` frame occupies; the last row need not be padded
pub fn required_len(width: u32, height: u32, stride: usize, channels: u32) -> Result<usize> {
    let channels = channel_count(channels)?;
    let row_bytes = (width as usize)
        .checked_mul(channels)
        .ok_or_else(|| Error::InvalidFrame("row size overflows".into()))?;
    if stride < row_bytes {
        return Err(Error::InvalidFrame(format!(
            "stride {stride} is smaller than a row of {row_bytes} bytes"
        )));
    }

    match height {
        0 => Ok(0),
        h => stride
            .checked_mul(h as usize - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| Error::InvalidFrame("frame size overflows".into())),
    }
}

/// A view over a raw, row-major frame owned by the host.
///
/// Rows may be padded (`stride` >= `width * channels`). Three channels are
/// treated as BGR/RGB, four as RGBA/BGRA.
#[derive(Debug)]
pub struct FrameView<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
    channels: usize,
}

impl<'a> FrameView<'a> {
    /// Wraps `data`, checking that it is large enough for the given geometry
    pub fn new(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        channels: u32,
    ) -> Result<Self> {
        let required = required_len(width, height, stride, channels)?;
        if data.len() < required {
            return Err(Error::InvalidFrame(format!(
                "buffer holds {} bytes, {width}x{height} needs {required}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            stride,
            channels: channels as usize,
        })
    }
}

impl Canvas for FrameView<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        let offset = y as usize * self.stride + x as usize * self.channels;
        self.data[offset..offset + self.channels].copy_from_slice(&color.0[..self.channels]);
    }
}
