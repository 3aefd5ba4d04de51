pub mod loader;

pub use loader::{load_split, DatasetError, LabeledImages, IMAGE_EXTENSIONS};
