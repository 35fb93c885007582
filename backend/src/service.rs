use std::sync::{Arc, Mutex};

use chrono::{FixedOffset, Utc};
use image::DynamicImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::VerificationResponse;
use uuid::Uuid;

use crate::classifier::{preprocess, ClassifierError, Model};
use crate::config::VerifierConfig;
use crate::verdict;

/// All verdicts are stamped in the eco-spot's locale (Asia/Tokyo, UTC+9).
const JST_OFFSET_SECS: i32 = 9 * 3600;

/// One verification request end to end: preprocess the upload, run the
/// forward pass, map the probability to a verdict card.
///
/// The model is shared read-only between clones; each request owns its own
/// image, tensor, and response.
#[derive(Clone)]
pub struct VerificationService {
    model: Arc<Model>,
    config: VerifierConfig,
    rng: Arc<Mutex<StdRng>>,
}

impl VerificationService {
    pub fn new(model: Arc<Model>, config: VerifierConfig) -> Self {
        Self::with_rng(model, config, StdRng::from_os_rng())
    }

    /// The fraud sub-type draw uses this RNG, so tests can seed it.
    pub fn with_rng(model: Arc<Model>, config: VerifierConfig, rng: StdRng) -> Self {
        Self {
            model,
            config,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn verify(&self, image: &DynamicImage) -> Result<VerificationResponse, ClassifierError> {
        let tensor = preprocess(image, self.model.input_shape())?;
        let probability = self.model.predict(&tensor)?;
        let confidence = probability * 100.0;

        let kind = {
            let mut rng = self.rng.lock().unwrap();
            verdict::decide(probability, self.config.threshold, &mut *rng)
        };
        let card = verdict::scenario(kind);

        let verified_at = Utc::now()
            .with_timezone(&FixedOffset::east_opt(JST_OFFSET_SECS).unwrap())
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        log::debug!("verdict {} at {:.1}% confidence", kind, confidence);

        Ok(VerificationResponse {
            id: Uuid::new_v4(),
            verdict: kind,
            confidence,
            verified_at,
            location: self.config.eco_spot.clone(),
            card,
        })
    }
}
