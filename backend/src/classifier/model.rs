use std::fmt;
use std::sync::{Arc, Mutex};

use ndarray::Array4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::ClassifierError;
use crate::config::{ModelBackend, VerifierConfig};

/// Input geometry a loaded network expects: NHWC with a batch dimension of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub height: u32,
    pub width: u32,
    pub channels: u32,
}

impl InputShape {
    pub fn new(height: u32, width: u32, channels: u32) -> Result<Self, ClassifierError> {
        if height == 0 || width == 0 || channels == 0 {
            return Err(ClassifierError::InvalidTargetShape(format!(
                "{}x{}x{}",
                height, width, channels
            )));
        }
        Ok(Self {
            height,
            width,
            channels,
        })
    }

    pub fn rgb(height: u32, width: u32) -> Result<Self, ClassifierError> {
        Self::new(height, width, 3)
    }

    pub(crate) fn batched(&self) -> (usize, usize, usize, usize) {
        (
            1,
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1x{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// One forward pass from a batched NHWC tensor to P(real).
///
/// Weights are read-only after load, so implementations must be safe to call
/// from concurrent requests.
pub trait Network: Send + Sync {
    fn forward(&self, input: &Array4<f32>) -> Result<f32, ClassifierError>;
}

/// Stand-in backend from the original demo: draws the probability instead of
/// computing it. Keeps the rest of the pipeline running while no trained
/// artifact is wired in.
pub struct SimulatedNetwork {
    rng: Mutex<StdRng>,
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl Default for SimulatedNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Network for SimulatedNetwork {
    fn forward(&self, _input: &Array4<f32>) -> Result<f32, ClassifierError> {
        let mut rng = self.rng.lock().unwrap();
        Ok(rng.random::<f32>())
    }
}

/// TorchScript module loaded with tch. The module itself is not re-entrant,
/// so forward passes are serialized behind the mutex.
#[cfg(feature = "torch")]
pub struct TorchNetwork {
    module: Mutex<tch::CModule>,
}

#[cfg(feature = "torch")]
impl TorchNetwork {
    pub fn load(path: &std::path::Path) -> Result<Self, ClassifierError> {
        let device = tch::Device::cuda_if_available();
        let module = tch::CModule::load_on_device(path, device)
            .map_err(|e| ClassifierError::ModelLoad(format!("{:?}", e)))?;
        Ok(Self {
            module: Mutex::new(module),
        })
    }
}

#[cfg(feature = "torch")]
impl Network for TorchNetwork {
    fn forward(&self, input: &Array4<f32>) -> Result<f32, ClassifierError> {
        use tch::nn::ModuleT;

        let (n, h, w, c) = input.dim();
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = tch::Tensor::from_slice(&data)
            .reshape([n as i64, h as i64, w as i64, c as i64])
            .permute([0, 3, 1, 2]);

        let output = self.module.lock().unwrap().forward_t(&tensor, false);
        let flat = output.to_kind(tch::Kind::Float).view([-1]);
        if flat.size()[0] < 1 {
            return Err(ClassifierError::Inference("model produced no output".into()));
        }
        Ok(flat.double_value(&[0]) as f32)
    }
}

/// A classifier ready for inference: the network plus the input geometry it
/// was trained for. Loaded once per process and shared read-only afterwards.
pub struct Model {
    network: Box<dyn Network>,
    input_shape: InputShape,
}

impl Model {
    pub fn load(config: &VerifierConfig) -> Result<Self, ClassifierError> {
        match config.backend {
            ModelBackend::Simulated => Ok(Self::with_network(
                Box::new(SimulatedNetwork::new()),
                config.target_shape,
            )),
            ModelBackend::Torch => {
                if !config.model_path.is_file() {
                    return Err(ClassifierError::ModelLoad(format!(
                        "model file not found: {}",
                        config.model_path.display()
                    )));
                }
                Self::load_torch(config)
            }
        }
    }

    #[cfg(feature = "torch")]
    fn load_torch(config: &VerifierConfig) -> Result<Self, ClassifierError> {
        let network = TorchNetwork::load(&config.model_path)?;
        Ok(Self::with_network(Box::new(network), config.target_shape))
    }

    #[cfg(not(feature = "torch"))]
    fn load_torch(_config: &VerifierConfig) -> Result<Self, ClassifierError> {
        Err(ClassifierError::ModelLoad(
            "torch backend requested but this binary was built without the `torch` feature".into(),
        ))
    }

    pub fn with_network(network: Box<dyn Network>, input_shape: InputShape) -> Self {
        Self {
            network,
            input_shape,
        }
    }

    pub fn input_shape(&self) -> InputShape {
        self.input_shape
    }

    /// Forward pass. The tensor must match the declared input shape exactly,
    /// and the output must be a finite probability in [0, 1].
    pub fn predict(&self, tensor: &Array4<f32>) -> Result<f32, ClassifierError> {
        if tensor.dim() != self.input_shape.batched() {
            let (n, h, w, c) = tensor.dim();
            return Err(ClassifierError::ShapeMismatch {
                expected: self.input_shape.to_string(),
                actual: format!("{}x{}x{}x{}", n, h, w, c),
            });
        }

        let probability = self.network.forward(tensor)?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ClassifierError::Inference(format!(
                "model produced an invalid probability: {}",
                probability
            )));
        }
        Ok(probability)
    }
}

/// Process-wide load-once cache. The first caller loads the artifact under
/// the lock; later callers clone the shared handle. A failed load stores
/// nothing, so the next call retries instead of serving a half-built model.
pub struct ModelCache {
    slot: Mutex<Option<Arc<Model>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_load(&self, config: &VerifierConfig) -> Result<Arc<Model>, ClassifierError> {
        let mut slot = self.slot.lock().unwrap();
        if let Some(model) = slot.as_ref() {
            return Ok(model.clone());
        }
        let model = Arc::new(Model::load(config)?);
        *slot = Some(model.clone());
        Ok(model)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    struct ConstNetwork(f32);

    impl Network for ConstNetwork {
        fn forward(&self, _input: &Array4<f32>) -> Result<f32, ClassifierError> {
            Ok(self.0)
        }
    }

    fn shape_224() -> InputShape {
        InputShape::rgb(224, 224).unwrap()
    }

    #[test]
    fn input_shape_rejects_zero_dimensions() {
        assert!(matches!(
            InputShape::new(0, 224, 3),
            Err(ClassifierError::InvalidTargetShape(_))
        ));
        assert!(matches!(
            InputShape::new(224, 0, 3),
            Err(ClassifierError::InvalidTargetShape(_))
        ));
        assert!(matches!(
            InputShape::new(224, 224, 0),
            Err(ClassifierError::InvalidTargetShape(_))
        ));
    }

    #[test]
    fn predict_rejects_mismatched_tensor() {
        let model = Model::with_network(Box::new(ConstNetwork(0.9)), shape_224());
        let tensor = Array4::<f32>::zeros((1, 128, 128, 3));
        assert!(matches!(
            model.predict(&tensor),
            Err(ClassifierError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn predict_returns_network_output() {
        let model = Model::with_network(Box::new(ConstNetwork(0.9)), shape_224());
        let tensor = Array4::<f32>::zeros((1, 224, 224, 3));
        assert_eq!(model.predict(&tensor).unwrap(), 0.9);
    }

    #[test]
    fn predict_rejects_non_finite_output() {
        let model = Model::with_network(Box::new(ConstNetwork(f32::NAN)), shape_224());
        let tensor = Array4::<f32>::zeros((1, 224, 224, 3));
        assert!(matches!(
            model.predict(&tensor),
            Err(ClassifierError::Inference(_))
        ));
    }

    #[test]
    fn predict_rejects_out_of_range_output() {
        let model = Model::with_network(Box::new(ConstNetwork(1.5)), shape_224());
        let tensor = Array4::<f32>::zeros((1, 224, 224, 3));
        assert!(matches!(
            model.predict(&tensor),
            Err(ClassifierError::Inference(_))
        ));
    }

    #[test]
    fn load_fails_on_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = VerifierConfig {
            backend: ModelBackend::Torch,
            model_path: dir.path().join("missing.pt"),
            ..VerifierConfig::default()
        };
        assert!(matches!(
            Model::load(&config),
            Err(ClassifierError::ModelLoad(_))
        ));
    }

    #[test]
    fn cache_returns_same_model_instance() {
        let cache = ModelCache::new();
        let config = VerifierConfig::default();
        let first = cache.get_or_load(&config).unwrap();
        let second = cache.get_or_load(&config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn cache_stays_empty_after_failed_load() {
        let dir = tempfile::tempdir().unwrap();
        let bad = VerifierConfig {
            backend: ModelBackend::Torch,
            model_path: dir.path().join("missing.pt"),
            ..VerifierConfig::default()
        };
        let cache = ModelCache::new();
        assert!(cache.get_or_load(&bad).is_err());
        assert!(!cache.is_loaded());

        // A later call with a working configuration still succeeds.
        let good = VerifierConfig::default();
        assert!(cache.get_or_load(&good).is_ok());
        assert!(cache.is_loaded());
    }

    #[test]
    fn simulated_network_stays_in_range() {
        let net = SimulatedNetwork::with_rng(StdRng::seed_from_u64(11));
        let tensor = Array4::<f32>::zeros((1, 224, 224, 3));
        for _ in 0..100 {
            let p = net.forward(&tensor).unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
