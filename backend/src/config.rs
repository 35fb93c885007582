use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::classifier::{ClassifierError, InputShape};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
    #[error("Invalid target shape: {0}")]
    Shape(#[from] ClassifierError),
}

/// Which inference runtime backs the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    /// TorchScript artifact loaded with tch (requires the `torch` feature).
    Torch,
    /// The original demo's random draw; no artifact required.
    Simulated,
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub backend: ModelBackend,
    pub model_path: PathBuf,
    pub target_shape: InputShape,
    /// Decision boundary on P(real); above it the photo counts as genuine.
    pub threshold: f32,
    /// The fixed eco-spot label attached to every verdict.
    pub eco_spot: String,
    pub port: u16,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::Simulated,
            model_path: PathBuf::from("model.pt"),
            target_shape: InputShape {
                height: 224,
                width: 224,
                channels: 3,
            },
            threshold: 0.5,
            eco_spot: "Tokyo Station (Verified Eco-Spot)".to_string(),
            port: 8081,
        }
    }
}

impl VerifierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match env::var("MODEL_BACKEND") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "torch" => ModelBackend::Torch,
                "simulated" => ModelBackend::Simulated,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MODEL_BACKEND".into(),
                        value: raw,
                    });
                }
            },
            Err(_) => defaults.backend,
        };

        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let height = parse_env("TARGET_HEIGHT", defaults.target_shape.height)?;
        let width = parse_env("TARGET_WIDTH", defaults.target_shape.width)?;
        let target_shape = InputShape::rgb(height, width)?;

        Ok(Self {
            backend,
            model_path,
            target_shape,
            threshold: parse_env("THRESHOLD", defaults.threshold)?,
            eco_spot: env::var("ECO_SPOT").unwrap_or(defaults.eco_spot),
            port: parse_env("PORT", defaults.port)?,
        })
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key: key.into(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_settings() {
        let config = VerifierConfig::default();
        assert_eq!(config.backend, ModelBackend::Simulated);
        assert_eq!(config.target_shape.batched(), (1, 224, 224, 3));
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.eco_spot, "Tokyo Station (Verified Eco-Spot)");
    }
}
