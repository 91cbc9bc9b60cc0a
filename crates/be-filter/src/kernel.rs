/// Largest per-axis sigma, in samples, accepted by the smoothing passes.
pub const MAX_SIGMA_PX: f64 = 4096.0;

/// Sampled 1D Gaussian.
///
/// Conventions:
/// - `radius = ceil(3*sigma)`, minimum 1.
/// - `g` is normalized such that `sum(g) ~= 1`.
/// - `sigma` is in samples; callers convert physical scales with the voxel
///   spacing first.
#[derive(Debug, Clone)]
pub struct GaussianKernel1D {
    pub sigma: f64,
    pub radius: usize,
    pub g: Vec<f64>,
}

impl GaussianKernel1D {
    pub fn new(sigma: f64) -> Self {
        assert!(
            sigma.is_finite() && sigma > 0.0,
            "sigma must be > 0 and finite"
        );

        let radius = ((3.0 * sigma).ceil() as usize).max(1);
        let len = 2 * radius + 1;
        let two_sigma2 = 2.0 * sigma * sigma;

        let mut g: Vec<f64> = (0..len)
            .map(|i| {
                let x = i as f64 - radius as f64;
                (-(x * x) / two_sigma2).exp()
            })
            .collect();

        let sum: f64 = g.iter().sum();
        for gi in &mut g {
            *gi /= sum;
        }

        Self { sigma, radius, g }
    }

    pub fn len(&self) -> usize {
        self.g.len()
    }

    pub fn is_empty(&self) -> bool {
        self.g.is_empty()
    }
}
