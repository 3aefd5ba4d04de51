//! Image decoding for the model input.
//!
//! Decodes PNG/JPEG/BMP/GIF, converts to 8-bit luminance, resizes to exactly
//! 48×48 and scales every pixel by 1/255.
use std::io;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};

use crate::preprocess::tensor::{ImageTensor, IMG_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("image not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("cannot read image {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode image: {0}")]
    Format(#[from] image::ImageError),
}

/// Reads the file at `path` and turns it into an [`ImageTensor`].
///
/// Only reads the file; nothing is written or cached.
pub fn load_image_tensor(path: impl AsRef<Path>) -> Result<ImageTensor, DecodeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DecodeError::Missing { path: path.to_path_buf() },
        _ => DecodeError::Unreadable { path: path.to_path_buf(), source: e },
    })?;
    image_bytes_to_tensor(&bytes)
}

/// Same pipeline as [`load_image_tensor`] for bytes already in memory
/// (e.g. an upload body).
pub fn image_bytes_to_tensor(bytes: &[u8]) -> Result<ImageTensor, DecodeError> {
    let img = image::load_from_memory(bytes)?;
    let gray = img.to_luma8();
    let resized = imageops::resize(&gray, IMG_SIZE, IMG_SIZE, FilterType::Triangle);
    Ok(ImageTensor::from_luma(resized.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(img: RgbImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn white_rgb_becomes_all_ones() {
        let bytes = png_bytes(RgbImage::from_pixel(100, 60, Rgb([255, 255, 255])));
        let t = image_bytes_to_tensor(&bytes).unwrap();
        assert_eq!(t.shape(), (48, 48, 1));
        assert!(t.as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn black_becomes_all_zeros() {
        let bytes = png_bytes(RgbImage::from_pixel(48, 48, Rgb([0, 0, 0])));
        let t = image_bytes_to_tensor(&bytes).unwrap();
        assert!(t.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn garbage_bytes_are_a_format_error() {
        let err = image_bytes_to_tensor(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DecodeError::Format(_)));
    }

    #[test]
    fn missing_path_is_reported_not_panicked() {
        let err = load_image_tensor("/nonexistent/dir/face.png").unwrap_err();
        assert!(matches!(err, DecodeError::Missing { .. }));
    }
}
