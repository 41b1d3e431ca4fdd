use serde::{Deserialize, Serialize};

/// Fixed confidences and floors used by the strategies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Confidence recorded for a senior or lead override.
    pub senior_override_confidence: f64,
    /// AI confidence assumed when the caller supplies none.
    pub default_ai_confidence: f64,
    /// Minimum hybrid confidence when every signal agrees.
    pub hybrid_agreement_floor: f64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            senior_override_confidence: 0.95,
            default_ai_confidence: 0.5,
            hybrid_agreement_floor: 0.85,
        }
    }
}
