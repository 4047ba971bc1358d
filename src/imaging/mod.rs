//! Image codec — host tensors in, pixel buffers out, and back again.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Host → pixels** | [`decode`]: `ndarray` view → `image::RgbImage` / `RgbaImage` |
//! | **Pixels → host** | [`encode`]: `to_rgba8` → `ndarray::ArrayD<f32>` |
//! | **Upload payload** | [`UploadArtifact`]: PNG in a `tempfile::NamedTempFile` |
//! | **Response bytes** | [`load_bytes`]: `image::load_from_memory` (PNG, WebP, JPEG) |

mod codec;
mod upload;

pub use codec::{HostImage, ShapeError, decode, encode};
pub use upload::UploadArtifact;

use image::DynamicImage;

/// Decode an encoded image (the API's response body) into a pixel buffer.
pub fn load_bytes(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}
