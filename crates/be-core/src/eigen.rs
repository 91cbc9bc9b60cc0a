/// Magnitudes below this are treated as zero when they would end up in a
/// denominator.
pub const EIGEN_EPS: f64 = 1e-12;

/// Ordering convention the upstream eigen-analysis stage must apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EigenvalueOrder {
    /// Ascending absolute value: `|l1| <= |l2| <= |l3|`.
    #[default]
    Magnitude,
    /// Ascending signed value: `l1 <= l2 <= l3`.
    Value,
}

/// The three eigenvalues of a local Hessian at one voxel.
///
/// Measures in this workspace expect [`EigenvalueOrder::Magnitude`]. The order
/// is a precondition, not re-checked per voxel: an unordered triple yields a
/// well-defined but meaningless response.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Eigenvalues3 {
    pub l1: f64,
    pub l2: f64,
    pub l3: f64,
}

impl Eigenvalues3 {
    pub const ZERO: Eigenvalues3 = Eigenvalues3 {
        l1: 0.0,
        l2: 0.0,
        l3: 0.0,
    };

    pub const fn new(l1: f64, l2: f64, l3: f64) -> Self {
        Self { l1, l2, l3 }
    }

    pub fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.l1, self.l2, self.l3]
    }

    pub fn abs(&self) -> [f64; 3] {
        [self.l1.abs(), self.l2.abs(), self.l3.abs()]
    }

    pub fn negated(&self) -> Self {
        Self::new(-self.l1, -self.l2, -self.l3)
    }

    pub fn sorted(&self, order: EigenvalueOrder) -> Self {
        match order {
            EigenvalueOrder::Magnitude => self.sorted_by_magnitude(),
            EigenvalueOrder::Value => self.sorted_by_value(),
        }
    }

    /// Sorts by ascending absolute value. Ties keep their input order.
    pub fn sorted_by_magnitude(&self) -> Self {
        let mut v = self.as_array();
        sort3_by_key(&mut v, f64::abs);
        Self::from_array(v)
    }

    pub fn sorted_by_value(&self) -> Self {
        let mut v = self.as_array();
        sort3_by_key(&mut v, |x| x);
        Self::from_array(v)
    }

    pub fn is_magnitude_ordered(&self) -> bool {
        let [a, b, c] = self.abs();
        a <= b && b <= c
    }

    /// Sum of absolute eigenvalues.
    pub fn abs_trace(&self) -> f64 {
        self.l1.abs() + self.l2.abs() + self.l3.abs()
    }

    /// Frobenius norm of the (diagonalized) Hessian.
    pub fn frobenius(&self) -> f64 {
        (self.l1 * self.l1 + self.l2 * self.l2 + self.l3 * self.l3).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.l1.is_finite() && self.l2.is_finite() && self.l3.is_finite()
    }
}

impl From<[f64; 3]> for Eigenvalues3 {
    fn from(v: [f64; 3]) -> Self {
        Self::from_array(v)
    }
}

/// `num / den`, resolving a vanishing denominator to a neutral ratio: `0` when
/// the numerator vanishes too, `1` otherwise.
#[inline]
pub fn safe_ratio(num: f64, den: f64) -> f64 {
    if den.abs() < EIGEN_EPS {
        if num.abs() < EIGEN_EPS { 0.0 } else { 1.0 }
    } else {
        num / den
    }
}

// Three-element insertion sort; NaN keys compare as equal and stay in place.
fn sort3_by_key(v: &mut [f64; 3], key: impl Fn(f64) -> f64) {
    for i in 1..3 {
        let mut j = i;
        while j > 0 && key(v[j]) < key(v[j - 1]) {
            v.swap(j, j - 1);
            j -= 1;
        }
    }
}
