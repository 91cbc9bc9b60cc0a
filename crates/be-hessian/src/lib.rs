//! Scale-space Hessian stage: Gaussian smoothing, second derivatives,
//! eigenvalues per voxel and the multi-scale driver that feeds an
//! [`be_measure::EigenMeasure`].

pub mod eigen3;
pub mod hessian;
pub mod multiscale;
pub mod scales;

pub use eigen3::{SymMat3, symmetric_eigenvalues};
pub use hessian::{HessianConfig, hessian_at_scale, second_derivatives};
pub use multiscale::{
    MultiScaleConfig, MultiScaleOutput, ScaleResult, eigen_volume, enhance_multiscale,
    enhance_multiscale_with_progress,
};
pub use scales::{SigmaStepMethod, sigma_array, validate_sigmas};
