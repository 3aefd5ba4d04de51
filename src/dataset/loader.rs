use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::emotion::{EmotionLabel, EMOTIONS, NUM_CLASSES};
use crate::preprocess::load_image_tensor;

/// File extensions picked up from each class directory (case-insensitive).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset split directory not found: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("cannot list {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One split (`train` or `test`) loaded into network-ready vectors.
#[derive(Debug, Clone, Default)]
pub struct LabeledImages {
    /// Flattened 48×48 tensors.
    pub inputs: Vec<Vec<f64>>,
    /// One-hot targets in label-set order.
    pub labels: Vec<Vec<f64>>,
    /// Images loaded per class, indexed like the label set.
    pub class_counts: [usize; NUM_CLASSES],
    /// Files that matched an image extension but failed to decode.
    pub skipped: usize,
}

impl LabeledImages {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn count_for(&self, label: EmotionLabel) -> usize {
        self.class_counts[label.index()]
    }
}

/// Loads `<split_dir>/<emotion>/*.{jpg,jpeg,png}`.
///
/// Class directories are looked up by label name, so the one-hot index of
/// every sample comes from the label set rather than from directory order.
/// A missing class directory or an undecodable file is logged and skipped.
pub fn load_split(split_dir: impl AsRef<Path>) -> Result<LabeledImages, DatasetError> {
    let root = split_dir.as_ref();
    if !root.is_dir() {
        return Err(DatasetError::MissingRoot(root.to_path_buf()));
    }

    let mut out = LabeledImages::default();

    for label in EMOTIONS {
        let class_dir = root.join(label.dir_name());
        if !class_dir.is_dir() {
            warn!(dir = %class_dir.display(), "class directory not found");
            continue;
        }

        let files = image_files(&class_dir)?;
        let target = label.one_hot();

        for path in &files {
            match load_image_tensor(path) {
                Ok(tensor) => {
                    out.inputs.push(tensor.to_input());
                    out.labels.push(target.clone());
                    out.class_counts[label.index()] += 1;
                }
                Err(e) => {
                    warn!(error = %e, "skipping image");
                    out.skipped += 1;
                }
            }
        }

        info!(class = %label, loaded = out.count_for(label), found = files.len(), "loaded class");
    }

    Ok(out)
}

/// Image files directly inside `dir`, sorted by path.
fn image_files(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let read_err = |source| DatasetError::ReadDir { path: dir.to_path_buf(), source };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if is_image && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
