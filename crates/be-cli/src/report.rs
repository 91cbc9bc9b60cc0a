use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bone_enhancement::CalibrationParameters;
use serde::Serialize;

/// Calibration used at one scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleReport {
    pub sigma: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    /// Frangi structureness threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
}

impl ScaleReport {
    pub fn krcah(sigma: f64, params: &CalibrationParameters) -> Self {
        Self {
            sigma,
            alpha: Some(params.alpha()),
            beta: Some(params.beta()),
            gamma: Some(params.gamma()),
            c: None,
        }
    }

    pub fn frangi(sigma: f64, c: f64) -> Self {
        Self {
            sigma,
            alpha: None,
            beta: None,
            gamma: None,
            c: Some(c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Voxels with a response above zero.
    pub nonzero: usize,
}

impl ResponseSummary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                nonzero: 0,
            };
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut nonzero = 0;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            if v > 0.0 {
                nonzero += 1;
            }
        }
        Self {
            min,
            max,
            mean: sum / values.len() as f64,
            nonzero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreprocessReport {
    pub sigma: f64,
    pub scaling: f64,
}

/// Diagnostics written next to the enhanced volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub input: String,
    pub dims: [usize; 3],
    pub spacing: [f64; 3],
    pub measure: &'static str,
    pub polarity: &'static str,
    pub parameter_set: &'static str,
    /// Background label, when a mask was given.
    pub background: Option<u8>,
    pub preprocess: Option<PreprocessReport>,
    pub scales: Vec<ScaleReport>,
    pub response: ResponseSummary,
    pub elapsed_ms: f64,
}

pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(path, bytes).with_context(|| format!("writing json {}", path.display()))
}

#[cfg(test)]
mod tests {
    use bone_enhancement::CalibrationParameters;

    use super::{ResponseSummary, ScaleReport};

    #[test]
    fn summary_of_responses() {
        let s = ResponseSummary::from_values(&[0.0, 0.5, 0.0, 1.0]);
        assert_eq!(s.min, 0.0);
        assert_eq!(s.max, 1.0);
        assert_eq!(s.mean, 0.375);
        assert_eq!(s.nonzero, 2);

        let empty = ResponseSummary::from_values(&[]);
        assert_eq!(empty.nonzero, 0);
        assert_eq!(empty.max, 0.0);
    }

    #[test]
    fn scale_report_omits_unused_parameters() {
        let params = CalibrationParameters::new(50.0, 2.0, 0.5).expect("valid parameters");
        let json = serde_json::to_value(ScaleReport::krcah(1.0, &params)).expect("serializable");
        assert_eq!(json["alpha"], 50.0);
        assert_eq!(json["gamma"], 0.5);
        assert!(json.get("c").is_none());

        let json = serde_json::to_value(ScaleReport::frangi(0.75, 3.0)).expect("serializable");
        assert_eq!(json["c"], 3.0);
        assert!(json.get("alpha").is_none());
    }
}
