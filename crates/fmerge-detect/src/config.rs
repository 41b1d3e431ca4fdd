use serde::{Deserialize, Serialize};

/// Thresholds used by the conflict detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Similarity above which two frames count as parallel solutions.
    pub parallel_threshold: f64,
    /// Output similarity below which two closed parallel solutions are critical.
    pub critical_output_threshold: f64,
    /// Output similarity below which parallel solutions are high severity.
    pub high_output_threshold: f64,
    /// A frame closed within this many minutes of creation scores a bonus.
    pub quick_close_minutes: i64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 0.8,
            critical_output_threshold: 0.5,
            high_output_threshold: 0.7,
            quick_close_minutes: 5,
        }
    }
}
