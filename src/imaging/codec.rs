//! Conversion between the host's float tensors and `image` pixel buffers.
//!
//! | Direction | Input | Output |
//! |---|---|---|
//! | [`decode`] | `[B, H, W, C]` or `[H, W, C]`, `f32` in `[0, 1]` | `ImageRgb8` / `ImageRgba8` |
//! | [`encode`] | any [`DynamicImage`] | `[1, H, W, 4]`, `f32` in `[0, 1]` |
//!
//! Float → byte scaling rounds to the nearest step, so a host value of
//! exactly `k / 255` always lands on byte `k` and the lossless path is
//! pixel-exact in both directions.

use image::{DynamicImage, RgbImage, RgbaImage};
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};
use thiserror::Error;

/// The host's image representation: `[batch?, height, width, channels]`.
pub type HostImage = ArrayD<f32>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid image shape {shape:?}: expected [H, W, 3|4] or [B, H, W, 3|4]")]
pub struct ShapeError {
    pub shape: Vec<usize>,
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn to_unit(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// Take the first element of a batched image, or the image itself.
fn strip_batch(image: &HostImage) -> ArrayViewD<'_, f32> {
    if image.ndim() == 4 {
        image.index_axis(Axis(0), 0)
    } else {
        image.view()
    }
}

/// Convert a host image to a pixel buffer.
///
/// A 4-D input is treated as a batch and only its first element is used.
pub fn decode(image: &HostImage) -> Result<DynamicImage, ShapeError> {
    let shape_error = || ShapeError {
        shape: image.shape().to_vec(),
    };

    let frame = strip_batch(image);
    if frame.ndim() != 3 {
        return Err(shape_error());
    }
    let (height, width, channels) = (frame.shape()[0], frame.shape()[1], frame.shape()[2]);
    if height == 0 || width == 0 {
        return Err(shape_error());
    }
    let (w, h) = (
        u32::try_from(width).map_err(|_| shape_error())?,
        u32::try_from(height).map_err(|_| shape_error())?,
    );

    // Logical (row-major) iteration order matches the interleaved pixel layout.
    let bytes: Vec<u8> = frame.iter().copied().map(to_byte).collect();

    match channels {
        3 => RgbImage::from_raw(w, h, bytes)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(shape_error),
        4 => RgbaImage::from_raw(w, h, bytes)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(shape_error),
        _ => Err(shape_error()),
    }
}

/// Convert a pixel buffer to a batched RGBA host image.
///
/// The output always has four channels; images without alpha get an opaque
/// one so downstream compositing sees consistent transparency.
pub fn encode(image: &DynamicImage) -> HostImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let shape = IxDyn(&[1, height as usize, width as usize, 4]);
    let values: Vec<f32> = rgba.into_raw().into_iter().map(to_unit).collect();
    ArrayD::from_shape_vec(shape, values).expect("RGBA buffer length matches its dimensions")
}
