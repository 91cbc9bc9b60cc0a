use be_core::{Axis, BorderMode, Error, Volume};
use tracing::trace;

use crate::conv::convolve_axis;
use crate::kernel::{GaussianKernel1D, MAX_SIGMA_PX};

/// Separable Gaussian blur with `sigma` in physical units.
///
/// Per-axis kernel width is `sigma / spacing[axis]`. Axes with a single voxel
/// are skipped. A per-axis width that is not finite or exceeds
/// [`MAX_SIGMA_PX`] samples is reported as [`Error::InvalidScale`].
pub fn gaussian_smooth(
    src: &Volume<f64>,
    sigma: f64,
    border: BorderMode,
) -> Result<Volume<f64>, Error> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::InvalidScale(sigma));
    }

    let dims = src.dims();
    let spacing = src.spacing();
    let mut out = src.clone();

    for axis in Axis::ALL {
        if dims.axis_len(axis) < 2 {
            continue;
        }
        let sigma_px = sigma / spacing[axis.as_index()];
        if !(sigma_px > 0.0 && sigma_px <= MAX_SIGMA_PX) {
            return Err(Error::InvalidScale(sigma));
        }
        let kernel = GaussianKernel1D::new(sigma_px);
        trace!(?axis, sigma_px, radius = kernel.radius, "gaussian pass");
        out = convolve_axis(&out, &kernel.g, kernel.radius, axis, border);
    }

    Ok(out)
}
