//! Scale-space filtering for 3D volumes.
//!
//! Kernels are sampled Gaussians with `radius = ceil(3*sigma)`. Sigmas given to
//! [`gaussian_smooth`] are physical and converted per axis using the volume
//! spacing, so anisotropic CT grids are blurred isotropically in millimetres.
//!
//! [`krcah_preprocess`] is the unsharp-mask step that precedes Hessian
//! analysis in the bone enhancement pipeline.

pub mod conv;
pub mod kernel;
pub mod sharpen;
pub mod smooth;

pub use conv::convolve_axis;
pub use kernel::{GaussianKernel1D, MAX_SIGMA_PX};
pub use sharpen::{PreprocessConfig, krcah_preprocess};
pub use smooth::gaussian_smooth;
