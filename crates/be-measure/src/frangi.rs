use be_core::{EIGEN_EPS, EigenVolume, Eigenvalues3, Error, MaskVolume, Polarity, safe_ratio};
use tracing::debug;

use crate::krcah::falloff;
use crate::measure::{EigenMeasure, VoxelFunctor};
use crate::statistics::EigenStatistics;

/// Frangi vesselness settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FrangiConfig {
    /// Sensitivity of the `|l2| / |l3|` term.
    pub alpha: f64,
    /// Sensitivity of the `|l1| / sqrt(|l2 l3|)` term.
    pub beta: f64,
    /// Structureness threshold. `None` uses half the largest Frobenius norm
    /// over the foreground.
    pub c: Option<f64>,
    pub polarity: Polarity,
    pub background: u8,
}

impl Default for FrangiConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.5,
            c: None,
            polarity: Polarity::Bright,
            background: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrangiFunctor {
    c: f64,
    a: f64,
    b: f64,
    c2: f64,
    polarity: Polarity,
}

impl FrangiFunctor {
    pub fn new(alpha: f64, beta: f64, c: f64, polarity: Polarity) -> Self {
        Self {
            c,
            a: 2.0 * alpha * alpha,
            b: 2.0 * beta * beta,
            c2: 2.0 * c * c,
            polarity,
        }
    }

    /// Structureness threshold in use.
    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn evaluate(&self, e: Eigenvalues3) -> f64 {
        let a = self.polarity.orient(e);
        let [l1, l2, l3] = a.abs();

        if l3 < EIGEN_EPS || a.l2 < 0.0 || a.l3 <= 0.0 {
            return 0.0;
        }

        let ra = safe_ratio(l2, l3);
        let rb = safe_ratio(l1, (l2 * l3).sqrt());
        let s = a.frobenius();

        let v = (1.0 - falloff(ra, self.a)) * falloff(rb, self.b) * (1.0 - falloff(s, self.c2));
        if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
    }
}

impl VoxelFunctor for FrangiFunctor {
    #[inline]
    fn evaluate(&self, e: Eigenvalues3) -> f64 {
        FrangiFunctor::evaluate(self, e)
    }
}

/// Frangi vesselness behind the same measure interface as Krcah.
#[derive(Debug, Clone, PartialEq)]
pub struct FrangiMeasure {
    cfg: FrangiConfig,
}

impl FrangiMeasure {
    pub fn new(cfg: FrangiConfig) -> Result<Self, Error> {
        check("alpha", cfg.alpha)?;
        check("beta", cfg.beta)?;
        if let Some(c) = cfg.c {
            check("c", c)?;
        }
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &FrangiConfig {
        &self.cfg
    }
}

impl EigenMeasure for FrangiMeasure {
    type Functor = FrangiFunctor;

    fn name(&self) -> &'static str {
        "frangi"
    }

    fn prepare(
        &self,
        eigen: &EigenVolume,
        mask: Option<&MaskVolume>,
    ) -> Result<FrangiFunctor, Error> {
        let c = match self.cfg.c {
            Some(c) => {
                if let Some(mask) = mask {
                    eigen.ensure_same_grid(mask)?;
                }
                c
            }
            None => {
                let stats = EigenStatistics::collect(eigen, mask, self.cfg.background)?;
                0.5 * stats.max_frobenius
            }
        };
        debug!(c, polarity = %self.cfg.polarity, "frangi functor prepared");
        Ok(FrangiFunctor::new(
            self.cfg.alpha,
            self.cfg.beta,
            c,
            self.cfg.polarity,
        ))
    }
}

fn check(name: &'static str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}
