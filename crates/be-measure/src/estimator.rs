use core::fmt;
use core::str::FromStr;

use be_core::{EigenVolume, Error, MaskVolume, safe_ratio};
use tracing::{debug, warn};

use crate::statistics::EigenStatistics;

/// Statistic the `gamma` width is scaled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GammaReference {
    /// Largest `|l3|` over the foreground.
    #[default]
    LargestMagnitude,
    /// Mean of `|l1| + |l2| + |l3|` over the foreground.
    MeanAbsTrace,
}

/// Multipliers turning foreground statistics into functor widths.
///
/// Each width is `2 * (k * s)^2` where `s` is the matching statistic. With
/// `m1, m2, m3` the per-channel maxima of `|l1|, |l2|, |l3|`, alpha uses the
/// ratio `m2 / m3` and beta the ratio `m1 / sqrt(m2 * m3)`, so both live on the
/// same dimensionless scale as the functor's eigenvalue ratios. Gamma uses the
/// [`GammaReference`] and carries the intensity scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientSet {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub gamma_reference: GammaReference,
}

impl CoefficientSet {
    pub const IMPLEMENTATION: CoefficientSet = CoefficientSet {
        alpha: 0.5,
        beta: 0.5,
        gamma: 0.5,
        gamma_reference: GammaReference::LargestMagnitude,
    };

    pub const JOURNAL_ARTICLE: CoefficientSet = CoefficientSet {
        alpha: 0.5,
        beta: 0.5,
        gamma: 0.25,
        gamma_reference: GammaReference::MeanAbsTrace,
    };

    pub fn validate(&self) -> Result<(), Error> {
        check_non_negative("alpha", self.alpha)?;
        check_non_negative("beta", self.beta)?;
        check_non_negative("gamma", self.gamma)
    }
}

/// How alpha, beta and gamma are derived from the eigenvalue statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalibrationStrategy {
    /// Widths scaled from the observed maxima.
    #[default]
    Implementation,
    /// Published constants, gamma scaled from the mean absolute trace.
    JournalArticle,
}

impl CalibrationStrategy {
    pub fn coefficients(self) -> CoefficientSet {
        match self {
            CalibrationStrategy::Implementation => CoefficientSet::IMPLEMENTATION,
            CalibrationStrategy::JournalArticle => CoefficientSet::JOURNAL_ARTICLE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationStrategy::Implementation => "implementation",
            CalibrationStrategy::JournalArticle => "journal",
        }
    }
}

impl fmt::Display for CalibrationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalibrationStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "implementation" => Ok(CalibrationStrategy::Implementation),
            "journal" | "journal-article" => Ok(CalibrationStrategy::JournalArticle),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

/// Numeric flag as used by command lines: `1` selects the implementation
/// constants, `0` the journal ones.
impl TryFrom<i32> for CalibrationStrategy {
    type Error = Error;

    fn try_from(flag: i32) -> Result<Self, Self::Error> {
        match flag {
            1 => Ok(CalibrationStrategy::Implementation),
            0 => Ok(CalibrationStrategy::JournalArticle),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

/// Widths consumed by the Krcah functor. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationParameters {
    alpha: f64,
    beta: f64,
    gamma: f64,
}

impl CalibrationParameters {
    pub const ZERO: CalibrationParameters = CalibrationParameters {
        alpha: 0.0,
        beta: 0.0,
        gamma: 0.0,
    };

    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Result<Self, Error> {
        check_non_negative("alpha", alpha)?;
        check_non_negative("beta", beta)?;
        check_non_negative("gamma", gamma)?;
        Ok(Self { alpha, beta, gamma })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for CalibrationParameters {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Result of one estimator run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub parameters: CalibrationParameters,
    pub statistics: EigenStatistics,
    /// Set when no voxel was foreground and the zero parameters were used.
    pub fallback: bool,
}

/// Derives [`CalibrationParameters`] from one read-only pass over an
/// eigenvalue volume.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEstimator {
    coefficients: CoefficientSet,
    background: u8,
}

impl ParameterEstimator {
    pub fn new(strategy: CalibrationStrategy) -> Self {
        Self {
            coefficients: strategy.coefficients(),
            background: 0,
        }
    }

    /// Replaces the strategy's multipliers.
    pub fn with_coefficients(mut self, coefficients: CoefficientSet) -> Result<Self, Error> {
        coefficients.validate()?;
        self.coefficients = coefficients;
        Ok(self)
    }

    /// Mask label excluded from the statistics.
    pub fn with_background(mut self, background: u8) -> Self {
        self.background = background;
        self
    }

    pub fn coefficients(&self) -> &CoefficientSet {
        &self.coefficients
    }

    pub fn background(&self) -> u8 {
        self.background
    }

    pub fn estimate(
        &self,
        eigen: &EigenVolume,
        mask: Option<&MaskVolume>,
    ) -> Result<Estimate, Error> {
        let statistics = EigenStatistics::collect(eigen, mask, self.background)?;

        if statistics.is_empty() {
            warn!(
                voxels = eigen.len(),
                background = self.background,
                "no foreground voxels; using zero calibration"
            );
            return Ok(Estimate {
                parameters: CalibrationParameters::ZERO,
                statistics,
                fallback: true,
            });
        }

        let parameters = self.parameters_from(&statistics);
        debug!(
            count = statistics.count,
            alpha = parameters.alpha(),
            beta = parameters.beta(),
            gamma = parameters.gamma(),
            "estimated calibration"
        );

        Ok(Estimate {
            parameters,
            statistics,
            fallback: false,
        })
    }

    /// Maps statistics to widths with this estimator's coefficients.
    pub fn parameters_from(&self, statistics: &EigenStatistics) -> CalibrationParameters {
        let c = &self.coefficients;
        let [m1, m2, m3] = statistics.max_abs;
        let gamma_ref = match c.gamma_reference {
            GammaReference::LargestMagnitude => m3,
            GammaReference::MeanAbsTrace => statistics.mean_abs_trace(),
        };

        CalibrationParameters {
            alpha: width(c.alpha, safe_ratio(m2, m3)),
            beta: width(c.beta, safe_ratio(m1, m2.sqrt() * m3.sqrt())),
            gamma: width(c.gamma, gamma_ref),
        }
    }
}

impl Default for ParameterEstimator {
    fn default() -> Self {
        Self::new(CalibrationStrategy::default())
    }
}

// 2 * (k * s)^2, saturating instead of overflowing to infinity.
fn width(k: f64, s: f64) -> f64 {
    let w = k * s;
    (2.0 * w * w).min(f64::MAX)
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}
