use anyhow::{Context, Result};
use bone_enhancement::{
    FrangiConfig, FrangiMeasure, KrcahConfig, KrcahMeasure, MaskVolume, MultiScaleConfig, Volume,
    enhance_multiscale_with_progress, krcah_preprocess,
};
use tracing::info;

use crate::config::{MeasureKind, Settings};
use crate::report::ScaleReport;

pub struct RunOutput {
    /// Input after unsharp masking, or a copy of it when preprocessing is off.
    pub preprocessed: Volume<f64>,
    pub response: Volume<f64>,
    pub best_sigma: Volume<f64>,
    pub scales: Vec<ScaleReport>,
}

/// Preprocessing followed by the multi-scale measure.
pub fn run<P>(
    settings: &Settings,
    input: &Volume<f64>,
    mask: Option<&MaskVolume>,
    progress: P,
) -> Result<RunOutput>
where
    P: FnMut(usize, usize),
{
    let preprocessed = match &settings.preprocess {
        Some(cfg) => {
            info!(sigma = cfg.sigma, scaling = cfg.scaling, "preprocessing");
            krcah_preprocess(input, cfg).context("preprocessing input")?
        }
        None => input.clone(),
    };

    let cfg = MultiScaleConfig {
        sigmas: settings.sigmas.clone(),
        hessian: settings.hessian.clone(),
    };
    info!(
        measure = settings.measure.as_str(),
        scales = cfg.sigmas.len(),
        "running multi-scale measure"
    );

    let (response, best_sigma, scales) = match settings.measure {
        MeasureKind::Krcah => {
            let measure = KrcahMeasure::new(KrcahConfig {
                strategy: settings.strategy,
                polarity: settings.polarity,
                background: settings.background,
                coefficients: None,
            })?;
            let out =
                enhance_multiscale_with_progress(&preprocessed, &measure, mask, &cfg, progress)
                    .context("running krcah measure")?;
            let scales = out
                .scales
                .iter()
                .map(|s| ScaleReport::krcah(s.sigma, s.functor.params()))
                .collect();
            (out.response, out.best_sigma, scales)
        }
        MeasureKind::Frangi => {
            let measure = FrangiMeasure::new(FrangiConfig {
                polarity: settings.polarity,
                background: settings.background,
                ..FrangiConfig::default()
            })?;
            let out =
                enhance_multiscale_with_progress(&preprocessed, &measure, mask, &cfg, progress)
                    .context("running frangi measure")?;
            let scales = out
                .scales
                .iter()
                .map(|s| ScaleReport::frangi(s.sigma, s.functor.c()))
                .collect();
            (out.response, out.best_sigma, scales)
        }
    };

    Ok(RunOutput {
        preprocessed,
        response,
        best_sigma,
        scales,
    })
}
