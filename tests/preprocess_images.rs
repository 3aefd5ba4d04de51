use image::{GrayImage, Luma, Rgb, RgbImage};

use emotion_net::preprocess::{load_image_tensor, DecodeError, IMAGE_INPUT_LEN};

#[test]
fn colour_jpeg_becomes_single_channel_tensor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.jpg");
    RgbImage::from_pixel(120, 90, Rgb([255, 255, 255])).save(&path).unwrap();

    let tensor = load_image_tensor(&path).unwrap();
    assert_eq!(tensor.shape(), (48, 48, 1));
    assert_eq!(tensor.as_slice().len(), IMAGE_INPUT_LEN);
    // JPEG is lossy; a flat white image still stays near 1.0.
    assert!(tensor.as_slice().iter().all(|&v| v > 0.95 && v <= 1.0));
}

#[test]
fn half_dark_image_keeps_its_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("split.png");
    let img = GrayImage::from_fn(96, 96, |x, _| if x < 48 { Luma([0]) } else { Luma([255]) });
    img.save(&path).unwrap();

    let tensor = load_image_tensor(&path).unwrap();
    assert_eq!(tensor.get(10, 0, 0), Some(0.0));
    assert_eq!(tensor.get(10, 47, 0), Some(1.0));
    assert_eq!(tensor.get(48, 0, 0), None);
}

#[test]
fn undecodable_and_missing_files_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.png");
    std::fs::write(&bogus, b"\x89PNG but not really").unwrap();

    assert!(matches!(load_image_tensor(&bogus), Err(DecodeError::Format(_))));
    assert!(matches!(load_image_tensor(dir.path().join("nope.png")), Err(DecodeError::Missing { .. })));
}
