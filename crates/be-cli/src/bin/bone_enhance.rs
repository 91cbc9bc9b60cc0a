//! Krcah bone enhancement of a NIfTI CT volume.
//!
//! Writes the preprocessed (unsharp-masked) volume and the multi-scale
//! enhancement response as float32 NIfTI, and optionally a JSON report with the
//! calibration estimated at each scale.
//!
//!   bone_enhance ct.nii.gz pre.nii.gz bone.nii.gz --polarity dark --sigma 0.75,1.0
//!   bone_enhance ct.nii pre.nii bone.nii --polarity 0 --parameter-set 1 \
//!       --min-sigma 0.5 --max-sigma 2.0 --steps 4 --log-steps --report run.json

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, bail};
use be_cli::{
    MeasureKind, PreprocessReport, Report, ResponseSummary, RunConfig, SigmaRange, nifti_io, run,
    write_json,
};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "bone_enhance")]
#[command(about = "Enhance cortical bone in CT volumes with the Krcah measure")]
struct Cli {
    /// Input volume (.nii or .nii.gz)
    input: PathBuf,

    /// Output path for the preprocessed volume
    preprocessed: PathBuf,

    /// Output path for the enhancement response
    output: PathBuf,

    /// Eigenvalue sign kept by the sign gate: dark keeps negative l2, l3
    /// (bright bone on darker tissue), bright keeps positive l2, l3 (dark
    /// sheets on a brighter surround). Also accepts 1 (bright) or 0 (dark)
    #[arg(long)]
    polarity: Option<String>,

    /// Calibration: implementation, journal, 1 (implementation) or 0 (journal)
    #[arg(long)]
    parameter_set: Option<String>,

    /// Measure applied to the eigenvalues: krcah or frangi
    #[arg(long)]
    measure: Option<MeasureKind>,

    /// Comma-separated physical scales
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    sigma: Option<Vec<f64>>,

    /// Smallest generated scale (with --max-sigma and --steps)
    #[arg(long, requires = "max_sigma", conflicts_with = "sigma")]
    min_sigma: Option<f64>,

    #[arg(long, requires = "steps")]
    max_sigma: Option<f64>,

    #[arg(long, requires = "min_sigma")]
    steps: Option<usize>,

    /// Space generated scales logarithmically
    #[arg(long, requires = "min_sigma")]
    log_steps: bool,

    /// Label volume restricting the calibration statistics
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Mask label treated as background
    #[arg(long)]
    background: Option<u8>,

    /// Skip the unsharp preprocessing step
    #[arg(long)]
    no_preprocess: bool,

    /// JSON run configuration; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON report with per-scale calibration
    #[arg(long)]
    report: Option<PathBuf>,

    /// Also write the scale of the maximum response per voxel
    #[arg(long)]
    best_sigma: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let run_cfg = merged_config(&cli)?;
    let settings = run_cfg.resolve()?;
    ensure_file_exists(&cli.input, "input")?;

    info!(
        input = %cli.input.display(),
        polarity = %settings.polarity,
        parameter_set = %settings.strategy,
        measure = settings.measure.as_str(),
        sigmas = ?settings.sigmas,
        "read parameters"
    );

    let t0 = Instant::now();
    let input = nifti_io::load(&cli.input)?;
    let mask = match &cli.mask {
        Some(path) => {
            ensure_file_exists(path, "mask")?;
            Some(nifti_io::load_mask(path)?)
        }
        None => None,
    };
    if run_cfg.background != 0 && mask.is_none() {
        warn!("background label given without a mask; every voxel is calibrated");
    }
    info!(
        dims = %input.volume.dims(),
        spacing = ?input.volume.spacing(),
        "loaded input"
    );

    let out = run(&settings, &input.volume, mask.as_ref(), |done, total| {
        info!("progress: {}%", 100 * done / total);
    })?;

    nifti_io::save(&cli.preprocessed, &out.preprocessed, &input.affine)?;
    info!(path = %cli.preprocessed.display(), "wrote preprocessed volume");
    nifti_io::save(&cli.output, &out.response, &input.affine)?;
    info!(path = %cli.output.display(), "wrote enhancement response");
    if let Some(path) = &cli.best_sigma {
        nifti_io::save(path, &out.best_sigma, &input.affine)?;
    }

    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;
    let summary = ResponseSummary::from_values(out.response.data());
    info!(
        max = summary.max,
        nonzero = summary.nonzero,
        elapsed_ms,
        "enhancement done"
    );

    if let Some(path) = &cli.report {
        let dims = input.volume.dims();
        let report = Report {
            input: cli.input.display().to_string(),
            dims: [dims.nx, dims.ny, dims.nz],
            spacing: input.volume.spacing(),
            measure: settings.measure.as_str(),
            polarity: settings.polarity.as_str(),
            parameter_set: settings.strategy.as_str(),
            background: mask.as_ref().map(|_| settings.background),
            preprocess: settings.preprocess.as_ref().map(|p| PreprocessReport {
                sigma: p.sigma,
                scaling: p.scaling,
            }),
            scales: out.scales,
            response: summary,
            elapsed_ms,
        };
        write_json(path, &report)?;
        info!(path = %path.display(), "wrote report");
    }

    Ok(())
}

fn merged_config(cli: &Cli) -> Result<RunConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            ensure_file_exists(path, "config")?;
            RunConfig::from_json_file(path)?
        }
        None => RunConfig::default(),
    };

    if let Some(p) = &cli.polarity {
        cfg.polarity = Some(p.clone());
    }
    if let Some(p) = &cli.parameter_set {
        cfg.parameter_set = p.clone();
    }
    if let Some(measure) = cli.measure {
        cfg.measure = measure;
    }
    if let Some(sigmas) = &cli.sigma {
        cfg.sigmas = sigmas.clone();
        cfg.sigma_range = None;
    }
    if let (Some(min), Some(max), Some(steps)) = (cli.min_sigma, cli.max_sigma, cli.steps) {
        cfg.sigma_range = Some(SigmaRange {
            min,
            max,
            steps,
            logarithmic: cli.log_steps,
        });
    }
    if let Some(background) = cli.background {
        cfg.background = background;
    }
    if cli.no_preprocess {
        cfg.preprocess = false;
    }

    Ok(cfg)
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
