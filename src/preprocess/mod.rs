pub mod tensor;
pub mod decode;

pub use tensor::{ImageTensor, IMAGE_INPUT_LEN, IMG_CHANNELS, IMG_SIZE};
pub use decode::{image_bytes_to_tensor, load_image_tensor, DecodeError};
