//! Combined configuration for the merge facade.

use fmerge_detect::DetectionConfig;
use fmerge_resolve::ResolutionConfig;
use fmerge_viz::{LayoutMode, PreviewConfig};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Settings for every component behind the facade.
///
/// Loads from TOML with one table per component; missing tables and keys
/// fall back to their defaults. Loaded values are checked by
/// [`validate`](Self::validate).
///
/// ```toml
/// layout = "timeline"
///
/// [detection]
/// parallel_threshold = 0.75
///
/// [resolution]
/// senior_override_confidence = 0.92
///
/// [preview]
/// success_floor = 0.05
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub detection: DetectionConfig,
    pub resolution: ResolutionConfig,
    pub preview: PreviewConfig,
    /// Layout used for divergence trees.
    pub layout: LayoutMode,
}

impl MergeConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the components cannot honor.
    ///
    /// Overrides must stay above 0.9 confidence, the hybrid agreement floor
    /// at or above 0.85, and the preview floor above zero so estimates stay
    /// in `(0, 1]`. A `parallel_threshold` above 1 is allowed and disables
    /// parallel-solution detection.
    pub fn validate(&self) -> SdkResult<()> {
        let d = &self.detection;
        check(
            "detection.parallel_threshold",
            d.parallel_threshold.is_finite() && d.parallel_threshold >= 0.0,
            "must be a finite number >= 0",
        )?;
        check(
            "detection.critical_output_threshold",
            unit(d.critical_output_threshold),
            "must lie in [0, 1]",
        )?;
        check(
            "detection.high_output_threshold",
            unit(d.high_output_threshold),
            "must lie in [0, 1]",
        )?;
        check(
            "detection.quick_close_minutes",
            d.quick_close_minutes >= 0 && TimeDelta::try_minutes(d.quick_close_minutes).is_some(),
            "must be a non-negative number of minutes within range",
        )?;

        let r = &self.resolution;
        check(
            "resolution.senior_override_confidence",
            r.senior_override_confidence > 0.9 && r.senior_override_confidence <= 1.0,
            "must lie in (0.9, 1]",
        )?;
        check(
            "resolution.default_ai_confidence",
            unit(r.default_ai_confidence),
            "must lie in [0, 1]",
        )?;
        check(
            "resolution.hybrid_agreement_floor",
            (0.85..=1.0).contains(&r.hybrid_agreement_floor),
            "must lie in [0.85, 1]",
        )?;

        let p = &self.preview;
        check(
            "preview.success_floor",
            p.success_floor > 0.0 && p.success_floor <= 1.0,
            "must lie in (0, 1]",
        )?;
        check(
            "preview penalties",
            [p.critical_penalty, p.high_penalty, p.medium_penalty, p.low_penalty]
                .iter()
                .all(|v| v.is_finite() && *v >= 0.0),
            "must be finite numbers >= 0",
        )
    }
}

fn unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn check(key: &'static str, ok: bool, message: &str) -> SdkResult<()> {
    if ok {
        Ok(())
    } else {
        Err(SdkError::InvalidSetting {
            key,
            message: message.to_string(),
        })
    }
}
