use rand::Rng;
use shared::{VerdictCard, VerdictKind};

/// Weighted split over fraud sub-types. The draw is a placeholder for real
/// sub-classification, so it stays behind an injected RNG and can be pinned
/// down or replaced without touching the rest of the pipeline.
const FRAUD_WEIGHTS: [(VerdictKind, f32); 3] = [
    (VerdictKind::AiGenerated, 0.5),
    (VerdictKind::Edited, 0.3),
    (VerdictKind::Reused, 0.2),
];

/// Threshold P(real) into a verdict: above the boundary the photo is genuine,
/// otherwise a fraud sub-type is drawn from the configured weights.
pub fn decide<R: Rng + ?Sized>(probability: f32, threshold: f32, rng: &mut R) -> VerdictKind {
    if probability > threshold {
        return VerdictKind::Valid;
    }

    let roll: f32 = rng.random();
    let mut cumulative = 0.0;
    for (kind, weight) in FRAUD_WEIGHTS {
        cumulative += weight;
        if roll < cumulative {
            return kind;
        }
    }
    // roll can land on 1.0; fold it into the last bucket.
    FRAUD_WEIGHTS[FRAUD_WEIGHTS.len() - 1].0
}

/// Presentation metadata per verdict, matching the demo's verification card.
pub fn scenario(kind: VerdictKind) -> VerdictCard {
    match kind {
        VerdictKind::Valid => VerdictCard {
            icon: "✅".into(),
            title: "Eco-Action Verified!".into(),
            color: "#2E8B57".into(),
            analysis: "✅ Real recycling bin detected".into(),
            reason: None,
            award_points: true,
            eco_points: 50,
        },
        VerdictKind::AiGenerated => VerdictCard {
            icon: "❌".into(),
            title: "Potential Fraud Detected".into(),
            color: "#FF6B6B".into(),
            analysis: "❌ AI-generated image suspected".into(),
            reason: Some("Synthetic texture patterns inconsistent with a camera capture".into()),
            award_points: false,
            eco_points: 0,
        },
        VerdictKind::Edited => VerdictCard {
            icon: "❌".into(),
            title: "Potential Fraud Detected".into(),
            color: "#FF6B6B".into(),
            analysis: "❌ Edited image suspected".into(),
            reason: Some("Local pixel statistics suggest retouching after capture".into()),
            award_points: false,
            eco_points: 0,
        },
        VerdictKind::Reused => VerdictCard {
            icon: "❌".into(),
            title: "Potential Fraud Detected".into(),
            color: "#FF6B6B".into(),
            analysis: "❌ Previously submitted image suspected".into(),
            reason: Some("Photo matches an earlier submission at another eco-spot".into()),
            award_points: false,
            eco_points: 0,
        },
    }
}
