use be_core::{EigenVolume, EigenvalueOrder, Eigenvalues3, Error, MaskVolume, Volume};
use be_measure::{EigenMeasure, evaluate_volume};
use rayon::prelude::*;
use tracing::debug;

use crate::eigen3::symmetric_eigenvalues;
use crate::hessian::{HessianConfig, hessian_at_scale};
use crate::scales::validate_sigmas;

#[derive(Debug, Clone, PartialEq)]
pub struct MultiScaleConfig {
    /// Physical scales, processed in order.
    pub sigmas: Vec<f64>,
    pub hessian: HessianConfig,
}

impl Default for MultiScaleConfig {
    fn default() -> Self {
        Self {
            sigmas: vec![1.0],
            hessian: HessianConfig::default(),
        }
    }
}

/// Calibrated functor used at one scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleResult<F> {
    pub sigma: f64,
    pub functor: F,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiScaleOutput<F> {
    /// Voxel-wise maximum response over all scales.
    pub response: Volume<f64>,
    /// Scale that produced each voxel's response; the first scale on ties.
    pub best_sigma: Volume<f64>,
    pub scales: Vec<ScaleResult<F>>,
}

/// Hessian eigenvalues of `src` at scale `sigma`, ordered per `order`.
pub fn eigen_volume(
    src: &Volume<f64>,
    sigma: f64,
    order: EigenvalueOrder,
    cfg: &HessianConfig,
) -> Result<EigenVolume, Error> {
    let hessian = hessian_at_scale(src, sigma, cfg)?;
    let data: Vec<Eigenvalues3> = hessian
        .data()
        .par_iter()
        .map(|m| Eigenvalues3::from_array(symmetric_eigenvalues(m)).sorted(order))
        .collect();
    Ok(hessian
        .with_data(data)
        .expect("one eigenvalue triple per hessian"))
}

pub fn enhance_multiscale<M>(
    src: &Volume<f64>,
    measure: &M,
    mask: Option<&MaskVolume>,
    cfg: &MultiScaleConfig,
) -> Result<MultiScaleOutput<M::Functor>, Error>
where
    M: EigenMeasure + ?Sized,
{
    enhance_multiscale_with_progress(src, measure, mask, cfg, |_, _| {})
}

/// Runs `measure` at every scale in `cfg.sigmas`, calibrating it afresh per
/// scale, and keeps the voxel-wise maximum.
///
/// `progress(done, total)` is called after each scale. Scales and the mask grid
/// are validated before any filtering starts.
pub fn enhance_multiscale_with_progress<M, P>(
    src: &Volume<f64>,
    measure: &M,
    mask: Option<&MaskVolume>,
    cfg: &MultiScaleConfig,
    mut progress: P,
) -> Result<MultiScaleOutput<M::Functor>, Error>
where
    M: EigenMeasure + ?Sized,
    P: FnMut(usize, usize),
{
    validate_sigmas(&cfg.sigmas)?;
    if let Some(mask) = mask {
        src.ensure_same_grid(mask)?;
    }

    let total = cfg.sigmas.len();
    let order = measure.eigenvalue_order();
    let mut response = src.map(|_| 0.0f64);
    let mut best_sigma = src.map(|_| cfg.sigmas[0]);
    let mut scales = Vec::with_capacity(total);

    for (i, &sigma) in cfg.sigmas.iter().enumerate() {
        let eigen = eigen_volume(src, sigma, order, &cfg.hessian)?;
        let functor = measure.prepare(&eigen, mask)?;
        let scale_response = evaluate_volume(&functor, &eigen);

        if i == 0 {
            response = scale_response;
        } else {
            response
                .data_mut()
                .par_iter_mut()
                .zip(best_sigma.data_mut().par_iter_mut())
                .zip(scale_response.data().par_iter())
                .for_each(|((best, best_s), &r)| {
                    if r > *best {
                        *best = r;
                        *best_s = sigma;
                    }
                });
        }

        debug!(
            measure = measure.name(),
            sigma,
            scale = i + 1,
            total,
            "scale processed"
        );
        scales.push(ScaleResult { sigma, functor });
        progress(i + 1, total);
    }

    Ok(MultiScaleOutput {
        response,
        best_sigma,
        scales,
    })
}
