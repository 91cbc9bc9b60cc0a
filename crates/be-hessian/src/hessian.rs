use be_core::{BorderMode, Error, Volume, resolve_index};
use be_filter::gaussian_smooth;
use rayon::prelude::*;

use crate::eigen3::SymMat3;

/// Settings shared by every scale of the Hessian stage.
#[derive(Debug, Clone, PartialEq)]
pub struct HessianConfig {
    /// Multiply second derivatives by `sigma^2` so responses are comparable
    /// across scales.
    pub normalize_across_scale: bool,
    pub border: BorderMode,
}

impl Default for HessianConfig {
    fn default() -> Self {
        Self {
            normalize_across_scale: true,
            border: BorderMode::Clamp,
        }
    }
}

/// Hessian of `src` after Gaussian smoothing at physical scale `sigma`.
///
/// Second derivatives use central differences in physical units; samples past
/// the edge are resolved with `cfg.border` (a constant border contributes its
/// value).
pub fn hessian_at_scale(
    src: &Volume<f64>,
    sigma: f64,
    cfg: &HessianConfig,
) -> Result<Volume<SymMat3>, Error> {
    let smoothed = gaussian_smooth(src, sigma, cfg.border)?;
    let mut hessian = second_derivatives(&smoothed, cfg.border);

    if cfg.normalize_across_scale {
        let k = sigma * sigma;
        hessian
            .data_mut()
            .par_iter_mut()
            .for_each(|h| *h = h.scaled(k));
    }

    Ok(hessian)
}

/// Finite-difference Hessian of an already smoothed volume.
pub fn second_derivatives(src: &Volume<f64>, border: BorderMode) -> Volume<SymMat3> {
    let dims = src.dims();
    let [hx, hy, hz] = src.spacing();
    let data = src.data();
    let lens = [dims.nx, dims.ny, dims.nz];

    let sample = |x: isize, y: isize, z: isize| -> f64 {
        let ix = resolve_index(x, lens[0], border);
        let iy = resolve_index(y, lens[1], border);
        let iz = resolve_index(z, lens[2], border);
        match (ix, iy, iz) {
            (Some(ix), Some(iy), Some(iz)) => data[dims.index(ix, iy, iz)],
            _ => match border {
                BorderMode::Constant(c) => c,
                _ => 0.0,
            },
        }
    };

    let mut out = vec![SymMat3::default(); dims.len()];
    let slice_len = dims.nx * dims.ny;
    if slice_len > 0 {
        out.par_chunks_mut(slice_len)
            .enumerate()
            .for_each(|(z, out_slice)| {
                let z = z as isize;
                for y in 0..dims.ny as isize {
                    for x in 0..dims.nx as isize {
                        let c2 = 2.0 * sample(x, y, z);

                        let xx = (sample(x + 1, y, z) - c2 + sample(x - 1, y, z)) / (hx * hx);
                        let yy = (sample(x, y + 1, z) - c2 + sample(x, y - 1, z)) / (hy * hy);
                        let zz = (sample(x, y, z + 1) - c2 + sample(x, y, z - 1)) / (hz * hz);

                        let xy = (sample(x + 1, y + 1, z) - sample(x + 1, y - 1, z)
                            - sample(x - 1, y + 1, z)
                            + sample(x - 1, y - 1, z))
                            / (4.0 * hx * hy);
                        let xz = (sample(x + 1, y, z + 1) - sample(x + 1, y, z - 1)
                            - sample(x - 1, y, z + 1)
                            + sample(x - 1, y, z - 1))
                            / (4.0 * hx * hz);
                        let yz = (sample(x, y + 1, z + 1) - sample(x, y + 1, z - 1)
                            - sample(x, y - 1, z + 1)
                            + sample(x, y - 1, z - 1))
                            / (4.0 * hy * hz);

                        out_slice[x as usize + dims.nx * y as usize] =
                            SymMat3 { xx, yy, zz, xy, xz, yz };
                    }
                }
            });
    }

    src.with_data(out).expect("hessian buffer matches source grid")
}

#[cfg(test)]
mod tests {
    use be_core::{BorderMode, Dims3, Volume};

    use super::{HessianConfig, hessian_at_scale, second_derivatives};

    fn quadratic(dims: Dims3, f: impl Fn(f64, f64, f64) -> f64) -> Volume<f64> {
        let mut data = Vec::with_capacity(dims.len());
        for z in 0..dims.nz {
            for y in 0..dims.ny {
                for x in 0..dims.nx {
                    data.push(f(x as f64, y as f64, z as f64));
                }
            }
        }
        Volume::from_vec(dims, data).expect("valid volume")
    }

    #[test]
    fn exact_on_quadratics_in_the_interior() {
        let dims = Dims3::new(7, 7, 7);
        let vol = quadratic(dims, |x, y, z| 1.5 * x * x - 2.0 * y * y + 0.5 * z * z + x * y - 3.0 * y * z);
        let h = second_derivatives(&vol, BorderMode::Clamp);
        let m = h.get(3, 3, 3).expect("in bounds");

        assert!((m.xx - 3.0).abs() < 1e-9);
        assert!((m.yy + 4.0).abs() < 1e-9);
        assert!((m.zz - 1.0).abs() < 1e-9);
        assert!((m.xy - 1.0).abs() < 1e-9);
        assert!(m.xz.abs() < 1e-9);
        assert!((m.yz + 3.0).abs() < 1e-9);
    }

    #[test]
    fn spacing_scales_derivatives() {
        let dims = Dims3::new(5, 5, 5);
        let vol = quadratic(dims, |x, _, _| x * x)
            .with_spacing([2.0, 1.0, 1.0])
            .expect("valid spacing");
        let h = second_derivatives(&vol, BorderMode::Clamp);
        let m = h.get(2, 2, 2).expect("in bounds");
        // f = x_index^2 = (x_mm / 2)^2, so d2f/dx_mm^2 = 0.5.
        assert!((m.xx - 0.5).abs() < 1e-12);
    }

    #[test]
    fn flat_volume_has_zero_hessian() {
        let vol = Volume::new_fill(Dims3::new(4, 4, 4), 3.0f64);
        let h = hessian_at_scale(&vol, 1.0, &HessianConfig::default()).expect("valid sigma");
        for m in h.data() {
            assert!(m.xx.abs() < 1e-12 && m.xy.abs() < 1e-12 && m.zz.abs() < 1e-12);
        }
    }

    #[test]
    fn bright_slab_has_negative_curvature_across_it() {
        let dims = Dims3::new(15, 9, 9);
        let vol = quadratic(dims, |x, _, _| if (x - 7.0).abs() <= 1.0 { 100.0 } else { 0.0 });
        let h = hessian_at_scale(&vol, 1.0, &HessianConfig::default()).expect("valid sigma");
        let m = h.get(7, 4, 4).expect("in bounds");
        assert!(m.xx < 0.0);
        assert!(m.yy.abs() < 1e-9);
        assert!(m.zz.abs() < 1e-9);
    }
}
