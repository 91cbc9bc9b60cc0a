use be_core::{BorderMode, Error, Volume};
use rayon::prelude::*;
use tracing::debug;

use crate::smooth::gaussian_smooth;

/// Unsharp masking applied before Hessian analysis:
/// `out = I + scaling * (I - G_sigma * I)`.
///
/// Sharpening separates adjacent cortical plates that the Hessian scales
/// would otherwise merge.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Physical blur scale.
    pub sigma: f64,
    pub scaling: f64,
    pub border: BorderMode,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            scaling: 10.0,
            border: BorderMode::Clamp,
        }
    }
}

pub fn krcah_preprocess(src: &Volume<f64>, cfg: &PreprocessConfig) -> Result<Volume<f64>, Error> {
    if !cfg.scaling.is_finite() || cfg.scaling < 0.0 {
        return Err(Error::InvalidParameter {
            name: "scaling",
            value: cfg.scaling,
        });
    }

    debug!(sigma = cfg.sigma, scaling = cfg.scaling, dims = %src.dims(), "unsharp preprocessing");
    let blurred = gaussian_smooth(src, cfg.sigma, cfg.border)?;

    let k = cfg.scaling;
    let data: Vec<f64> = src
        .data()
        .par_iter()
        .zip(blurred.data().par_iter())
        .map(|(&i, &g)| i + k * (i - g))
        .collect();

    src.with_data(data)
}

#[cfg(test)]
mod tests {
    use be_core::{Dims3, Error, Volume};

    use super::{PreprocessConfig, krcah_preprocess};

    #[test]
    fn flat_regions_are_unchanged() {
        let vol = Volume::new_fill(Dims3::new(5, 5, 5), 120.0f64);
        let out = krcah_preprocess(&vol, &PreprocessConfig::default()).expect("valid config");
        for &v in out.data() {
            assert!((v - 120.0).abs() < 1e-9);
        }
    }

    #[test]
    fn step_edge_overshoots_on_both_sides() {
        let dims = Dims3::new(12, 1, 1);
        let data = (0..12).map(|x| if x < 6 { 0.0 } else { 100.0 }).collect();
        let vol = Volume::from_vec(dims, data).expect("valid volume");

        let out = krcah_preprocess(&vol, &PreprocessConfig::default()).expect("valid config");
        assert!(*out.get(5, 0, 0).expect("in bounds") < 0.0);
        assert!(*out.get(6, 0, 0).expect("in bounds") > 100.0);
    }

    #[test]
    fn zero_scaling_is_identity() {
        let dims = Dims3::new(4, 3, 2);
        let data = (0..24).map(|i| (i * i) as f64).collect();
        let vol = Volume::from_vec(dims, data).expect("valid volume");
        let cfg = PreprocessConfig {
            scaling: 0.0,
            ..PreprocessConfig::default()
        };
        let out = krcah_preprocess(&vol, &cfg).expect("valid config");
        assert_eq!(out.data(), vol.data());
    }

    #[test]
    fn negative_scaling_is_rejected() {
        let vol = Volume::new_fill(Dims3::new(2, 2, 2), 0.0f64);
        let cfg = PreprocessConfig {
            scaling: -1.0,
            ..PreprocessConfig::default()
        };
        assert!(matches!(
            krcah_preprocess(&vol, &cfg),
            Err(Error::InvalidParameter { name: "scaling", .. })
        ));
    }
}
