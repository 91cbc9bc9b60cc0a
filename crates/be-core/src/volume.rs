use core::fmt;

use crate::Error;

/// Grid extent in voxels along x, y and z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dims3 {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl Dims3 {
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Number of voxels, or `None` on overflow.
    pub fn checked_len(&self) -> Option<usize> {
        self.nx.checked_mul(self.ny)?.checked_mul(self.nz)
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0 || self.nz == 0
    }

    /// Linear index with x varying fastest.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.nx * (y + self.ny * z)
    }

    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.nx && y < self.ny && z < self.nz
    }

    pub fn axis_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.nx,
            Axis::Y => self.ny,
            Axis::Z => self.nz,
        }
    }

    /// Distance between neighbouring samples along `axis` in the linear buffer.
    pub fn axis_stride(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => 1,
            Axis::Y => self.nx,
            Axis::Z => self.nx * self.ny,
        }
    }
}

impl fmt::Display for Dims3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn as_index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Dense 3D grid stored x-fastest, with physical voxel spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T> {
    dims: Dims3,
    spacing: [f64; 3],
    data: Vec<T>,
}

impl<T> Volume<T> {
    pub fn from_vec(dims: Dims3, data: Vec<T>) -> Result<Self, Error> {
        let expected = dims.checked_len().ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            dims,
            spacing: [1.0; 3],
            data,
        })
    }

    /// Replaces the voxel spacing. Non-positive or non-finite entries are
    /// rejected.
    pub fn with_spacing(mut self, spacing: [f64; 3]) -> Result<Self, Error> {
        for (value, name) in spacing.iter().zip(["spacing.x", "spacing.y", "spacing.z"]) {
            if !value.is_finite() || *value <= 0.0 {
                return Err(Error::InvalidParameter {
                    name,
                    value: *value,
                });
            }
        }
        self.spacing = spacing;
        Ok(self)
    }

    pub fn dims(&self) -> Dims3 {
        self.dims
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&T> {
        if !self.dims.contains(x, y, z) {
            return None;
        }
        self.data.get(self.dims.index(x, y, z))
    }

    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut T> {
        if !self.dims.contains(x, y, z) {
            return None;
        }
        let idx = self.dims.index(x, y, z);
        self.data.get_mut(idx)
    }

    /// True when both volumes cover the same voxel grid.
    pub fn same_grid<U>(&self, other: &Volume<U>) -> bool {
        self.dims == other.dims
    }

    /// Fails with [`Error::GridMismatch`] unless `other` shares this grid.
    pub fn ensure_same_grid<U>(&self, other: &Volume<U>) -> Result<(), Error> {
        if self.same_grid(other) {
            Ok(())
        } else {
            Err(Error::GridMismatch {
                expected: self.dims,
                actual: other.dims,
            })
        }
    }

    /// Builds a volume on the same grid and spacing from per-voxel values.
    pub fn map<U, F>(&self, f: F) -> Volume<U>
    where
        F: FnMut(&T) -> U,
    {
        Volume {
            dims: self.dims,
            spacing: self.spacing,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Wraps `data` with this volume's grid and spacing.
    pub fn with_data<U>(&self, data: Vec<U>) -> Result<Volume<U>, Error> {
        if data.len() != self.data.len() {
            return Err(Error::SizeMismatch {
                expected: self.data.len(),
                actual: data.len(),
            });
        }
        Ok(Volume {
            dims: self.dims,
            spacing: self.spacing,
            data,
        })
    }
}

impl<T: Clone> Volume<T> {
    pub fn new_fill(dims: Dims3, value: T) -> Self {
        let len = dims.checked_len().expect("volume size overflow");
        Self {
            dims,
            spacing: [1.0; 3],
            data: vec![value; len],
        }
    }
}
