//! Eigenvalue-to-scalar enhancement measures.
//!
//! A measure runs a read-only calibration pass over an eigenvalue volume
//! (optionally restricted by a mask) and returns a pure per-voxel functor. The
//! Krcah measure estimates its widths from the eigenvalue magnitudes; the
//! Frangi measure is available behind the same [`EigenMeasure`] interface.

pub mod estimator;
pub mod frangi;
pub mod krcah;
pub mod measure;
pub mod parallel;
pub mod statistics;

pub use estimator::{
    CalibrationParameters, CalibrationStrategy, CoefficientSet, Estimate, GammaReference,
    ParameterEstimator,
};
pub use frangi::{FrangiConfig, FrangiFunctor, FrangiMeasure};
pub use krcah::{KrcahConfig, KrcahFunctor, KrcahMeasure, KrcahOutput, NEUTRAL};
pub use measure::{EigenMeasure, VoxelFunctor, apply, evaluate_volume};
pub use statistics::EigenStatistics;
