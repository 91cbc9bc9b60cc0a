//! Foundational types for Hessian-based bone enhancement.
//!
//! ## Volumes
//! A [`Volume`] is a dense 3D grid stored with x varying fastest:
//! `index = x + nx * (y + ny * z)`. Voxel spacing is carried along so that
//! scale-space stages can work in physical units. Eigenvalue fields, masks and
//! scalar maps all share this layout; volumes that are used together must have
//! identical [`Dims3`].
//!
//! ## Eigenvalues
//! [`Eigenvalues3`] holds the three eigenvalues of the local Hessian at one
//! voxel. Enhancement measures require them sorted by ascending magnitude
//! (`|l1| <= |l2| <= |l3|`); the producer is responsible for that order.
//!
//! ## Polarity
//! [`Polarity`] selects bright or dark structures. It is applied by negating
//! the eigenvalues, so measures only implement one sign convention.

mod border;
mod eigen;
mod error;
mod polarity;
mod volume;

pub use border::{BorderMode, resolve_index};
pub use eigen::{EIGEN_EPS, EigenvalueOrder, Eigenvalues3, safe_ratio};
pub use error::Error;
pub use polarity::Polarity;
pub use volume::{Axis, Dims3, Volume};

/// Eigenvalue field aligned with the source intensity volume.
pub type EigenVolume = Volume<Eigenvalues3>;

/// Label volume; one configured label marks background.
pub type MaskVolume = Volume<u8>;
