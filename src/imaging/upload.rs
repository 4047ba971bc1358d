//! The temporary PNG file sent as the `image_file` multipart part.

use image::{DynamicImage, ImageFormat};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// A pixel buffer serialized to a lossless PNG in a temporary file.
///
/// The file is removed when the artifact is dropped, so every exit path of a
/// removal call (success, error, unwinding) cleans it up.
#[derive(Debug)]
pub struct UploadArtifact {
    file: NamedTempFile,
}

impl UploadArtifact {
    pub const FILE_NAME: &'static str = "image.png";
    pub const MIME: &'static str = "image/png";

    /// Encode `image` as PNG into a fresh temporary file.
    pub fn create(image: &DynamicImage) -> Result<Self, image::ImageError> {
        let file = tempfile::Builder::new()
            .prefix("koukoutu-upload-")
            .suffix(".png")
            .tempfile()?;
        {
            let mut writer = BufWriter::new(file.as_file());
            image.write_to(&mut writer, ImageFormat::Png)?;
            writer.flush()?;
        }
        log::debug!("Wrote upload artifact {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the encoded PNG back for the request body.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbaImage};

    #[test]
    fn artifact_holds_decodable_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(7, 3));
        let artifact = UploadArtifact::create(&img).unwrap();

        let bytes = artifact.read().unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        assert_eq!(
            image::load_from_memory(&bytes).unwrap().dimensions(),
            (7, 3)
        );
    }

    #[test]
    fn artifact_removed_on_drop() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        let artifact = UploadArtifact::create(&img).unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }
}
