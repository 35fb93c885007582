pub mod model;
pub mod preprocess;

pub use model::{InputShape, Model, ModelCache, Network, SimulatedNetwork};
pub use preprocess::preprocess;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model load error: {0}")]
    ModelLoad(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),
    #[error("Shape mismatch: model expects {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
    #[error("Inference error: {0}")]
    Inference(String),
    #[error("Invalid target shape: {0}")]
    InvalidTargetShape(String),
}
