use serde::{Deserialize, Serialize};

/// Side length of the square model input.
pub const IMG_SIZE: u32 = 48;
/// Grayscale: one channel.
pub const IMG_CHANNELS: usize = 1;
/// Flattened input length fed to the network (48 × 48 × 1).
pub const IMAGE_INPUT_LEN: usize = (IMG_SIZE as usize) * (IMG_SIZE as usize) * IMG_CHANNELS;

/// A single preprocessed face: shape (height, width, channel) = (48, 48, 1),
/// values in [0, 1], stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageTensor {
    data: Vec<f32>,
}

impl ImageTensor {
    /// Wraps already-normalized pixels. Returns `None` unless exactly
    /// [`IMAGE_INPUT_LEN`] values in [0, 1] are supplied.
    pub fn from_normalized(data: Vec<f32>) -> Option<ImageTensor> {
        let in_range = data.iter().all(|v| (0.0..=1.0).contains(v));
        if data.len() == IMAGE_INPUT_LEN && in_range {
            Some(ImageTensor { data })
        } else {
            None
        }
    }

    /// Builds from 48×48 8-bit luma pixels, dividing each by 255.
    pub(crate) fn from_luma(pixels: Vec<u8>) -> ImageTensor {
        debug_assert_eq!(pixels.len(), IMAGE_INPUT_LEN);
        ImageTensor { data: pixels.into_iter().map(|p| p as f32 / 255.0).collect() }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (IMG_SIZE as usize, IMG_SIZE as usize, IMG_CHANNELS)
    }

    /// Value at (row, col, channel), or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize, channel: usize) -> Option<f32> {
        let (h, w, c) = self.shape();
        if row >= h || col >= w || channel >= c {
            return None;
        }
        self.data.get((row * w + col) * c + channel).copied()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Flattens to the `f64` row vector the network consumes.
    pub fn to_input(&self) -> Vec<f64> {
        self.data.iter().map(|&v| v as f64).collect()
    }
}
