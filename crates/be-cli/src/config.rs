use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use bone_enhancement::{
    CalibrationStrategy, HessianConfig, Polarity, PreprocessConfig, SigmaStepMethod, sigma_array,
    validate_sigmas,
};
use serde::{Deserialize, Serialize};

/// Which eigenvalue measure the run applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    #[default]
    Krcah,
    Frangi,
}

impl MeasureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MeasureKind::Krcah => "krcah",
            MeasureKind::Frangi => "frangi",
        }
    }
}

impl FromStr for MeasureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "krcah" => Ok(MeasureKind::Krcah),
            "frangi" => Ok(MeasureKind::Frangi),
            _ => Err(format!("unknown measure '{s}' (expected krcah or frangi)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmaRange {
    pub min: f64,
    pub max: f64,
    pub steps: usize,
    #[serde(default)]
    pub logarithmic: bool,
}

/// Run settings as read from a JSON file. Command-line flags override fields.
///
/// `polarity` and `parameter_set` accept the names (`bright`/`dark`,
/// `implementation`/`journal`) or the numeric flags `1`/`0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub measure: MeasureKind,
    pub polarity: Option<String>,
    pub parameter_set: String,
    pub sigmas: Vec<f64>,
    /// Replaces `sigmas` when set.
    pub sigma_range: Option<SigmaRange>,
    pub background: u8,
    pub preprocess: bool,
    pub preprocess_sigma: f64,
    pub preprocess_scaling: f64,
    pub normalize_across_scale: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        let pre = PreprocessConfig::default();
        Self {
            measure: MeasureKind::Krcah,
            polarity: None,
            parameter_set: CalibrationStrategy::Implementation.to_string(),
            sigmas: vec![0.75, 1.0],
            sigma_range: None,
            background: 0,
            preprocess: true,
            preprocess_sigma: pre.sigma,
            preprocess_scaling: pre.scaling,
            normalize_across_scale: true,
        }
    }
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
    }

    /// Parses names and flags and validates scales.
    pub fn resolve(&self) -> Result<Settings> {
        let Some(polarity) = self.polarity.as_deref() else {
            bail!("polarity is required (bright, dark, 1 or 0)");
        };
        let polarity: Polarity = parse_flag(polarity).context("parsing polarity")?;
        let strategy: CalibrationStrategy =
            parse_flag(&self.parameter_set).context("parsing parameter set")?;

        let sigmas = match self.sigma_range {
            Some(r) => {
                let method = if r.logarithmic {
                    SigmaStepMethod::Logarithmic
                } else {
                    SigmaStepMethod::Equispaced
                };
                sigma_array(r.min, r.max, r.steps, method).context("generating sigmas")?
            }
            None => {
                validate_sigmas(&self.sigmas).context("checking sigmas")?;
                self.sigmas.clone()
            }
        };

        let preprocess = self.preprocess.then(|| PreprocessConfig {
            sigma: self.preprocess_sigma,
            scaling: self.preprocess_scaling,
            ..PreprocessConfig::default()
        });

        Ok(Settings {
            measure: self.measure,
            polarity,
            strategy,
            sigmas,
            background: self.background,
            preprocess,
            hessian: HessianConfig {
                normalize_across_scale: self.normalize_across_scale,
                ..HessianConfig::default()
            },
        })
    }
}

/// Validated, typed run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub measure: MeasureKind,
    pub polarity: Polarity,
    pub strategy: CalibrationStrategy,
    pub sigmas: Vec<f64>,
    pub background: u8,
    pub preprocess: Option<PreprocessConfig>,
    pub hessian: HessianConfig,
}

/// Accepts either a numeric `0`/`1` flag or a name.
pub fn parse_flag<T>(s: &str) -> Result<T, bone_enhancement::Error>
where
    T: FromStr<Err = bone_enhancement::Error> + TryFrom<i32, Error = bone_enhancement::Error>,
{
    match s.trim().parse::<i32>() {
        Ok(flag) => T::try_from(flag),
        Err(_) => s.parse(),
    }
}
