//! Krcah sheetness: a plate-like bone response driven by calibrated widths.
//!
//! For oriented eigenvalues `a = polarity.orient(e)` with `|a1| <= |a2| <= |a3|`
//! the response is
//!
//! ```text
//! R = exp(-(1 - |a2| / |a3|)^2 / alpha)              plate: two comparable large eigenvalues
//!   * exp(-(|a1| / sqrt(|a2| * |a3|))^2 / beta)      one small eigenvalue
//!   * (1 - exp(-|a3|^2 / gamma))                     overall curvature strength
//! ```
//!
//! and `0` whenever `a3 <= 0` or `a2 < 0`. The first two factors only see
//! eigenvalue ratios, so scaling a voxel's eigenvalues leaves its shape score
//! unchanged and only `gamma` reacts to intensity.

use be_core::{
    EIGEN_EPS, EigenVolume, Eigenvalues3, Error, MaskVolume, Polarity, Volume, safe_ratio,
};
use tracing::debug;

use crate::estimator::{
    CalibrationParameters, CalibrationStrategy, CoefficientSet, Estimate, ParameterEstimator,
};
use crate::measure::{EigenMeasure, VoxelFunctor, evaluate_volume};

/// Response for voxels rejected by the sign gate.
pub const NEUTRAL: f64 = 0.0;

/// `exp(-d^2 / w)`, taking the `w -> 0+` limit for a zero width.
#[inline]
pub(crate) fn falloff(d: f64, w: f64) -> f64 {
    if w > 0.0 {
        (-(d * d) / w).exp()
    } else if d == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Per-voxel Krcah response with fixed calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KrcahFunctor {
    params: CalibrationParameters,
    polarity: Polarity,
}

impl KrcahFunctor {
    pub fn new(params: CalibrationParameters, polarity: Polarity) -> Self {
        Self { params, polarity }
    }

    pub fn params(&self) -> &CalibrationParameters {
        &self.params
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Response at one voxel, in `[0, 1]`.
    pub fn evaluate(&self, e: Eigenvalues3) -> f64 {
        let a = self.polarity.orient(e);
        let [l1, l2, l3] = a.abs();

        if l3 < EIGEN_EPS || a.l3 <= 0.0 || a.l2 < 0.0 {
            return NEUTRAL;
        }

        let sheet = safe_ratio(l2, l3);
        let tube = safe_ratio(l1, l2.sqrt() * l3.sqrt());

        let plate = falloff(1.0 - sheet, self.params.alpha());
        let blob = falloff(tube, self.params.beta());
        let strength = 1.0 - falloff(l3, self.params.gamma());

        let r = plate * blob * strength;
        if r.is_finite() { r } else { NEUTRAL }
    }
}

impl VoxelFunctor for KrcahFunctor {
    #[inline]
    fn evaluate(&self, e: Eigenvalues3) -> f64 {
        KrcahFunctor::evaluate(self, e)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KrcahConfig {
    pub strategy: CalibrationStrategy,
    pub polarity: Polarity,
    /// Mask label excluded from calibration.
    pub background: u8,
    /// Overrides the strategy's multipliers when set.
    pub coefficients: Option<CoefficientSet>,
}

/// Estimated calibration together with the response it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct KrcahOutput {
    pub response: Volume<f64>,
    pub estimate: Estimate,
}

impl KrcahOutput {
    pub fn alpha(&self) -> f64 {
        self.estimate.parameters.alpha()
    }

    pub fn beta(&self) -> f64 {
        self.estimate.parameters.beta()
    }

    pub fn gamma(&self) -> f64 {
        self.estimate.parameters.gamma()
    }
}

/// Parameter estimation followed by the Krcah functor.
#[derive(Debug, Clone, PartialEq)]
pub struct KrcahMeasure {
    cfg: KrcahConfig,
    estimator: ParameterEstimator,
}

impl KrcahMeasure {
    /// Fails when `cfg.coefficients` holds a negative or non-finite multiplier.
    pub fn new(cfg: KrcahConfig) -> Result<Self, Error> {
        let mut estimator = ParameterEstimator::new(cfg.strategy).with_background(cfg.background);
        if let Some(coefficients) = cfg.coefficients {
            estimator = estimator.with_coefficients(coefficients)?;
        }
        Ok(Self { cfg, estimator })
    }

    pub fn config(&self) -> &KrcahConfig {
        &self.cfg
    }

    pub fn estimator(&self) -> &ParameterEstimator {
        &self.estimator
    }

    pub fn estimate(
        &self,
        eigen: &EigenVolume,
        mask: Option<&MaskVolume>,
    ) -> Result<Estimate, Error> {
        self.estimator.estimate(eigen, mask)
    }

    /// Calibrates on `eigen` and evaluates every voxel.
    pub fn enhance(
        &self,
        eigen: &EigenVolume,
        mask: Option<&MaskVolume>,
    ) -> Result<KrcahOutput, Error> {
        let estimate = self.estimate(eigen, mask)?;
        let functor = KrcahFunctor::new(estimate.parameters, self.cfg.polarity);
        let response = evaluate_volume(&functor, eigen);
        Ok(KrcahOutput { response, estimate })
    }
}

impl EigenMeasure for KrcahMeasure {
    type Functor = KrcahFunctor;

    fn name(&self) -> &'static str {
        "krcah"
    }

    fn prepare(
        &self,
        eigen: &EigenVolume,
        mask: Option<&MaskVolume>,
    ) -> Result<KrcahFunctor, Error> {
        let estimate = self.estimate(eigen, mask)?;
        debug!(
            polarity = %self.cfg.polarity,
            strategy = %self.cfg.strategy,
            fallback = estimate.fallback,
            "krcah functor prepared"
        );
        Ok(KrcahFunctor::new(estimate.parameters, self.cfg.polarity))
    }
}

#[cfg(test)]
mod tests {
    use be_core::{Dims3, EigenVolume, Eigenvalues3, Error, Polarity, Volume};

    use super::{KrcahConfig, KrcahFunctor, KrcahMeasure, NEUTRAL, falloff};
    use crate::estimator::{CalibrationParameters, CalibrationStrategy, CoefficientSet};
    use crate::measure::{EigenMeasure, apply};

    fn params(a: f64, b: f64, g: f64) -> CalibrationParameters {
        CalibrationParameters::new(a, b, g).expect("valid parameters")
    }

    fn single(e: Eigenvalues3) -> EigenVolume {
        Volume::from_vec(Dims3::new(1, 1, 1), vec![e]).expect("valid volume")
    }

    fn measure(strategy: CalibrationStrategy, polarity: Polarity) -> KrcahMeasure {
        KrcahMeasure::new(KrcahConfig {
            strategy,
            polarity,
            ..KrcahConfig::default()
        })
        .expect("default coefficients")
    }

    /// A few magnitude-ordered triples with mixed signs.
    fn samples() -> Vec<Eigenvalues3> {
        let mut out = Vec::new();
        for &l1 in &[0.0, 0.3, -0.7] {
            for &l2 in &[0.0, 1.5, -2.0, 4.0] {
                for &l3 in &[0.0, 5.0, -5.0, 9.0, -12.0] {
                    out.push(Eigenvalues3::new(l1, l2, l3).sorted_by_magnitude());
                }
            }
        }
        out
    }

    #[test]
    fn falloff_limits() {
        assert_eq!(falloff(0.0, 0.0), 1.0);
        assert_eq!(falloff(0.5, 0.0), 0.0);
        assert_eq!(falloff(0.0, 3.0), 1.0);
        assert!((falloff(2.0, 8.0) - (-0.5f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn output_is_finite_and_bounded() {
        let grids = [
            params(0.0, 0.0, 0.0),
            params(50.0, 50.0, 50.0),
            params(1e-300, 1e300, 1.0),
            params(f64::MAX, f64::MAX, f64::MAX),
        ];
        let extreme = [
            Eigenvalues3::new(1e-320, 1e300, -1e300),
            Eigenvalues3::new(0.0, 1e-13, 1e-11),
            Eigenvalues3::new(-f64::MAX, f64::MAX, -f64::MAX),
        ];
        for p in grids {
            for polarity in [Polarity::Bright, Polarity::Dark] {
                let f = KrcahFunctor::new(p, polarity);
                for e in samples().into_iter().chain(extreme) {
                    let r = f.evaluate(e);
                    assert!(r.is_finite(), "{e:?} -> {r}");
                    assert!((0.0..=1.0).contains(&r), "{e:?} -> {r}");
                }
            }
        }
    }

    #[test]
    fn sign_gate_returns_neutral() {
        let f = KrcahFunctor::new(params(50.0, 50.0, 50.0), Polarity::Dark);
        // Dark accepts negative dominant eigenvalues only.
        assert_eq!(f.evaluate(Eigenvalues3::new(-1.0, 10.0, -10.0)), NEUTRAL);
        assert_eq!(f.evaluate(Eigenvalues3::new(-1.0, -10.0, 10.0)), NEUTRAL);
        assert_eq!(f.evaluate(Eigenvalues3::new(1.0, 10.0, 10.0)), NEUTRAL);
        assert!(f.evaluate(Eigenvalues3::new(1.0, -10.0, -10.0)) > 0.0);

        let b = KrcahFunctor::new(params(50.0, 50.0, 50.0), Polarity::Bright);
        assert_eq!(b.evaluate(Eigenvalues3::new(0.0, -4.0, 8.0)), NEUTRAL);
        assert!(b.evaluate(Eigenvalues3::new(0.0, 4.0, 8.0)) > 0.0);
    }

    #[test]
    fn vanishing_eigenvalues_are_neutral() {
        let f = KrcahFunctor::new(params(0.0, 0.0, 0.0), Polarity::Bright);
        assert_eq!(f.evaluate(Eigenvalues3::ZERO), NEUTRAL);
        assert_eq!(f.evaluate(Eigenvalues3::new(0.0, 0.0, 1e-13)), NEUTRAL);
    }

    #[test]
    fn negating_input_and_polarity_is_symmetric() {
        let f = KrcahFunctor::new(params(3.0, 0.7, 20.0), Polarity::Bright);
        let g = KrcahFunctor::new(params(3.0, 0.7, 20.0), Polarity::Dark);
        for e in samples() {
            assert_eq!(f.evaluate(e).to_bits(), g.evaluate(e.negated()).to_bits());
        }
    }

    #[test]
    fn stronger_plate_gives_higher_response() {
        let f = KrcahFunctor::new(params(0.5, 0.5, 50.0), Polarity::Bright);
        let mut prev = 0.0;
        for l in [0.5, 1.0, 2.0, 4.0, 8.0] {
            let r = f.evaluate(Eigenvalues3::new(0.0, l, l));
            assert!(r > prev, "response must increase with |l3| = |l2| = {l}");
            prev = r;
        }
    }

    #[test]
    fn shape_terms_ignore_eigenvalue_scale() {
        // A zero gamma saturates the strength term, leaving the two ratio terms.
        let f = KrcahFunctor::new(params(0.5, 0.5, 0.0), Polarity::Bright);
        let shapes = [
            Eigenvalues3::new(0.0, 0.5, 1.0),
            Eigenvalues3::new(0.1, 0.9, 1.0),
            Eigenvalues3::new(0.3, 0.3, 1.0),
            Eigenvalues3::new(0.0, 1.0, 1.0),
        ];
        for e in shapes {
            let base = f.evaluate(e);
            assert!(base > 0.0);
            for c in [1e-3, 0.25, 2.0, 8.0, 1e4] {
                let scaled = Eigenvalues3::new(c * e.l1, c * e.l2, c * e.l3);
                let r = f.evaluate(scaled);
                assert!((r - base).abs() < 1e-12, "{e:?} * {c}: {r} vs {base}");
            }
        }

        let line = f.evaluate(Eigenvalues3::new(0.0, 0.0, 1.0));
        let half = f.evaluate(Eigenvalues3::new(0.0, 0.5, 1.0));
        let half_large = f.evaluate(Eigenvalues3::new(0.0, 5.0, 10.0));
        assert!(line < half);
        assert!((half - half_large).abs() < 1e-12);
    }

    #[test]
    fn shrinking_l2_never_raises_the_response() {
        let grids = [
            params(0.0, 0.0, 0.0),
            params(0.125, 0.005, 8.0),
            params(0.5, 0.5, 50.0),
            params(50.0, 50.0, 50.0),
        ];
        let ratios = [1.0, 0.95, 0.8, 0.6, 0.5, 0.3, 0.1, 0.0];
        for p in grids {
            let f = KrcahFunctor::new(p, Polarity::Bright);
            for l1 in [0.0, 0.05, 0.4] {
                for l3 in [1.0, 4.0, 10.0, 250.0] {
                    let mut prev = f64::INFINITY;
                    for ratio in ratios {
                        let l2 = ratio * l3;
                        if l2 < l1 {
                            break;
                        }
                        let r = f.evaluate(Eigenvalues3::new(l1, l2, l3));
                        assert!(r <= prev, "{p:?} ({l1}, {l2}, {l3}): {r} > {prev}");
                        prev = r;
                    }
                }
            }
        }
    }

    #[test]
    fn growing_l3_away_from_l2_never_raises_the_shape_score() {
        // With no small eigenvalue and a zero gamma only the plate term varies.
        for alpha in [0.0, 0.125, 0.5, 50.0] {
            let f = KrcahFunctor::new(params(alpha, 0.5, 0.0), Polarity::Dark);
            for l2 in [0.5, 5.0, 40.0] {
                let mut prev = f64::INFINITY;
                for k in [1.0, 1.1, 1.5, 2.0, 4.0, 10.0] {
                    let r = f.evaluate(Eigenvalues3::new(0.0, -l2, -k * l2));
                    assert!(r <= prev, "alpha {alpha}, l2 {l2}, l3 = {k} * l2: {r} > {prev}");
                    prev = r;
                }
            }
        }
    }

    #[test]
    fn dark_plate_beats_tube_like_triple() {
        let plate = Eigenvalues3::new(-1.0, -10.0, -10.0);
        let eigen = single(plate);
        let m = measure(CalibrationStrategy::Implementation, Polarity::Dark);
        let f = m.prepare(&eigen, None).expect("no mask");

        let r_plate = f.evaluate(plate);
        let r_other = f.evaluate(Eigenvalues3::new(-1.0, -10.0, -1.0));

        assert!(r_plate > 0.0);
        assert!(r_plate > r_other);
        // alpha = 0.5, beta = 0.005, gamma = 50 from the voxel itself.
        assert!((r_plate - 0.1170).abs() < 1e-3);
    }

    #[test]
    fn bright_polarity_rejects_dark_plate() {
        let plate = Eigenvalues3::new(-1.0, -10.0, -10.0);
        let eigen = single(plate);
        let m = measure(CalibrationStrategy::Implementation, Polarity::Bright);
        let out = m.enhance(&eigen, None).expect("no mask");

        assert_eq!(out.response.data(), &[NEUTRAL]);
        assert!((out.alpha() - 0.5).abs() < 1e-12);
        assert!((out.beta() - 0.005).abs() < 1e-12);
        assert!((out.gamma() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn zero_volume_is_neutral_everywhere() {
        let eigen = Volume::new_fill(Dims3::new(4, 3, 2), Eigenvalues3::ZERO);
        for strategy in [
            CalibrationStrategy::Implementation,
            CalibrationStrategy::JournalArticle,
        ] {
            for polarity in [Polarity::Bright, Polarity::Dark] {
                let out = measure(strategy, polarity)
                    .enhance(&eigen, None)
                    .expect("no mask");
                assert_eq!((out.alpha(), out.beta(), out.gamma()), (0.0, 0.0, 0.0));
                assert!(out.response.data().iter().all(|&r| r == NEUTRAL));
            }
        }
    }

    #[test]
    fn strategies_share_the_formula_shape() {
        let eigen = Volume::from_vec(
            Dims3::new(3, 1, 1),
            vec![
                Eigenvalues3::new(-0.5, -6.0, -8.0),
                Eigenvalues3::new(0.2, -1.0, -2.0),
                Eigenvalues3::new(0.0, 3.0, 4.0),
            ],
        )
        .expect("valid volume");
        let imp = measure(CalibrationStrategy::Implementation, Polarity::Dark);
        let jour = measure(CalibrationStrategy::JournalArticle, Polarity::Dark);

        let a = apply(&imp, &eigen, None).expect("no mask");
        let b = apply(&jour, &eigen, None).expect("no mask");
        // Same gate, different widths.
        assert_eq!(a.data()[2], 0.0);
        assert_eq!(b.data()[2], 0.0);
        assert!(a.data()[0] > 0.0 && b.data()[0] > 0.0);
        assert_ne!(a.data()[0], b.data()[0]);
    }

    #[test]
    fn invalid_override_is_a_configuration_error() {
        let cfg = KrcahConfig {
            coefficients: Some(CoefficientSet {
                gamma: f64::NAN,
                ..CoefficientSet::IMPLEMENTATION
            }),
            ..KrcahConfig::default()
        };
        assert!(matches!(
            KrcahMeasure::new(cfg),
            Err(Error::InvalidParameter { name: "gamma", .. })
        ));
    }

    #[test]
    fn mask_only_restricts_calibration() {
        let eigen = Volume::from_vec(
            Dims3::new(2, 1, 1),
            vec![
                Eigenvalues3::new(0.0, 1.0, 1.0),
                Eigenvalues3::new(0.0, 10.0, 10.0),
            ],
        )
        .expect("valid volume");
        let mask = Volume::from_vec(eigen.dims(), vec![1u8, 0]).expect("valid mask");
        let m = measure(CalibrationStrategy::Implementation, Polarity::Bright);

        let out = m.enhance(&eigen, Some(&mask)).expect("same grid");
        assert!((out.alpha() - 0.5).abs() < 1e-12);
        // The excluded voxel is still evaluated.
        assert!(out.response.data()[1] > 0.0);
        assert_eq!(m.name(), "krcah");
    }
}
