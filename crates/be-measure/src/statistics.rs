use be_core::{EigenVolume, Eigenvalues3, Error, MaskVolume};

use crate::parallel::chunked_fold_reduce;

/// Summary of the eigenvalue magnitudes over the foreground voxels.
///
/// Voxels with a non-finite eigenvalue are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EigenStatistics {
    /// Foreground voxels that contributed.
    pub count: u64,
    /// Largest `|l1|`, `|l2|`, `|l3|` seen.
    pub max_abs: [f64; 3],
    pub sum_abs_trace: f64,
    /// Largest `sqrt(l1^2 + l2^2 + l3^2)` seen.
    pub max_frobenius: f64,
}

impl EigenStatistics {
    pub fn push(&mut self, e: Eigenvalues3) {
        if !e.is_finite() {
            return;
        }
        let abs = e.abs();
        for (m, a) in self.max_abs.iter_mut().zip(abs) {
            *m = m.max(a);
        }
        self.count += 1;
        self.sum_abs_trace += e.abs_trace();
        self.max_frobenius = self.max_frobenius.max(e.frobenius());
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            max_abs: [
                self.max_abs[0].max(other.max_abs[0]),
                self.max_abs[1].max(other.max_abs[1]),
                self.max_abs[2].max(other.max_abs[2]),
            ],
            sum_abs_trace: self.sum_abs_trace + other.sum_abs_trace,
            max_frobenius: self.max_frobenius.max(other.max_frobenius),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean of `|l1| + |l2| + |l3|`, zero when nothing was counted.
    pub fn mean_abs_trace(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_abs_trace / self.count as f64
        }
    }

    /// One pass over `eigen`. With a mask, voxels labelled `background` are
    /// skipped.
    ///
    /// The mask grid is checked before any voxel is read.
    pub fn collect(
        eigen: &EigenVolume,
        mask: Option<&MaskVolume>,
        background: u8,
    ) -> Result<Self, Error> {
        let labels = match mask {
            Some(mask) => {
                eigen.ensure_same_grid(mask)?;
                Some(mask.data())
            }
            None => None,
        };

        let stats = chunked_fold_reduce(
            eigen.data(),
            Self::default(),
            |offset, chunk| {
                let mut acc = Self::default();
                match labels {
                    Some(labels) => {
                        let labels = &labels[offset..offset + chunk.len()];
                        for (e, &label) in chunk.iter().zip(labels) {
                            if label != background {
                                acc.push(*e);
                            }
                        }
                    }
                    None => chunk.iter().for_each(|e| acc.push(*e)),
                }
                acc
            },
            Self::merge,
        );

        Ok(stats)
    }
}
