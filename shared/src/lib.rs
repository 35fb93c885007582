use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Final classification of a submitted photo.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerdictKind {
    Valid,
    AiGenerated,
    Edited,
    Reused,
}

impl VerdictKind {
    pub fn is_fraud(self) -> bool {
        !matches!(self, VerdictKind::Valid)
    }
}

/// Presentation metadata for one verdict. The backend emits plain data; how
/// the card is laid out is the UI's business.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VerdictCard {
    pub icon: String,
    pub title: String,
    pub color: String,
    pub analysis: String,
    pub reason: Option<String>,
    pub award_points: bool,
    pub eco_points: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VerificationResponse {
    pub id: Uuid,
    pub verdict: VerdictKind,
    /// Percentage in [0, 100].
    pub confidence: f32,
    pub verified_at: String,
    pub location: String,
    pub card: VerdictCard,
}
