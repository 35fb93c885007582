use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

use super::{ClassifierError, InputShape};

/// Resampling is pinned to triangle (bilinear) filtering so the same source
/// image always yields a bit-identical tensor.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Turn a decoded upload into the fixed-shape NHWC tensor the model expects:
/// convert to RGB, resize to the target spatial dimensions, scale into
/// [0, 1], and add a batch dimension of 1.
pub fn preprocess(image: &DynamicImage, shape: InputShape) -> Result<Array4<f32>, ClassifierError> {
    if shape.channels != 3 {
        return Err(ClassifierError::InvalidTargetShape(format!(
            "only 3-channel models are supported, got {} channels",
            shape.channels
        )));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(ClassifierError::UnsupportedImageFormat(
            "image has zero area".into(),
        ));
    }

    // Grayscale and alpha sources collapse to RGB before resizing.
    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, shape.width, shape.height, RESIZE_FILTER);

    let (height, width) = (shape.height as usize, shape.width as usize);
    let mut tensor = Array4::<f32>::zeros((1, height, width, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        tensor[[0, y as usize, x as usize, 0]] = r as f32 / 255.0;
        tensor[[0, y as usize, x as usize, 1]] = g as f32 / 255.0;
        tensor[[0, y as usize, x as usize, 2]] = b as f32 / 255.0;
    }
    Ok(tensor)
}
