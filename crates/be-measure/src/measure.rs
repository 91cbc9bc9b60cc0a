use be_core::{EigenVolume, EigenvalueOrder, Eigenvalues3, Error, MaskVolume, Volume};

use crate::parallel::parallel_map;

/// Pure per-voxel mapping from an eigenvalue triple to a scalar response.
pub trait VoxelFunctor: Sync {
    fn evaluate(&self, e: Eigenvalues3) -> f64;
}

/// An enhancement measure: a calibration pass over the eigenvalue volume that
/// yields a [`VoxelFunctor`] for the per-voxel pass.
///
/// The mask only restricts calibration. The prepared functor is evaluated at
/// every voxel.
pub trait EigenMeasure {
    type Functor: VoxelFunctor;

    fn name(&self) -> &'static str;

    /// Ordering the eigen-analysis stage must apply before calling
    /// [`EigenMeasure::prepare`].
    fn eigenvalue_order(&self) -> EigenvalueOrder {
        EigenvalueOrder::Magnitude
    }

    fn prepare(
        &self,
        eigen: &EigenVolume,
        mask: Option<&MaskVolume>,
    ) -> Result<Self::Functor, Error>;
}

/// Evaluates `functor` at every voxel of `eigen`.
pub fn evaluate_volume<F>(functor: &F, eigen: &EigenVolume) -> Volume<f64>
where
    F: VoxelFunctor + ?Sized,
{
    let data = parallel_map(eigen.data(), |e| functor.evaluate(*e));
    eigen
        .with_data(data)
        .expect("one response per eigenvalue voxel")
}

/// Calibrates `measure` on `eigen` and evaluates the result everywhere.
pub fn apply<M>(
    measure: &M,
    eigen: &EigenVolume,
    mask: Option<&MaskVolume>,
) -> Result<Volume<f64>, Error>
where
    M: EigenMeasure + ?Sized,
{
    let functor = measure.prepare(eigen, mask)?;
    Ok(evaluate_volume(&functor, eigen))
}
