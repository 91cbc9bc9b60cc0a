/// Upper triangle of a symmetric 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SymMat3 {
    pub xx: f64,
    pub yy: f64,
    pub zz: f64,
    pub xy: f64,
    pub xz: f64,
    pub yz: f64,
}

impl SymMat3 {
    pub fn diagonal(a: f64, b: f64, c: f64) -> Self {
        Self {
            xx: a,
            yy: b,
            zz: c,
            ..Self::default()
        }
    }

    pub fn trace(&self) -> f64 {
        self.xx + self.yy + self.zz
    }

    pub fn scaled(&self, k: f64) -> Self {
        Self {
            xx: self.xx * k,
            yy: self.yy * k,
            zz: self.zz * k,
            xy: self.xy * k,
            xz: self.xz * k,
            yz: self.yz * k,
        }
    }

    fn to_rows(self) -> [[f64; 3]; 3] {
        [
            [self.xx, self.xy, self.xz],
            [self.xy, self.yy, self.yz],
            [self.xz, self.yz, self.zz],
        ]
    }
}

const MAX_SWEEPS: usize = 32;

/// Eigenvalues of a symmetric 3x3 matrix by cyclic Jacobi rotations.
///
/// The result is unordered; callers sort with the convention their measure
/// needs.
pub fn symmetric_eigenvalues(m: &SymMat3) -> [f64; 3] {
    let mut a = m.to_rows();

    for _ in 0..MAX_SWEEPS {
        let off = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
        let diag = a[0][0] * a[0][0] + a[1][1] * a[1][1] + a[2][2] * a[2][2];
        if off == 0.0 || off <= f64::EPSILON * f64::EPSILON * diag {
            break;
        }

        for (p, q) in [(0usize, 1usize), (0, 2), (1, 2)] {
            let apq = a[p][q];
            if apq == 0.0 {
                continue;
            }

            let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            a[p][p] -= t * apq;
            a[q][q] += t * apq;
            a[p][q] = 0.0;
            a[q][p] = 0.0;

            let r = 3 - p - q;
            let arp = a[r][p];
            let arq = a[r][q];
            a[r][p] = c * arp - s * arq;
            a[p][r] = a[r][p];
            a[r][q] = s * arp + c * arq;
            a[q][r] = a[r][q];
        }
    }

    [a[0][0], a[1][1], a[2][2]]
}

#[cfg(test)]
mod tests {
    use super::{SymMat3, symmetric_eigenvalues};

    fn sorted(mut v: [f64; 3]) -> [f64; 3] {
        v.sort_by(|a, b| a.partial_cmp(b).expect("finite eigenvalues"));
        v
    }

    #[test]
    fn diagonal_matrix_returns_diagonal() {
        let ev = sorted(symmetric_eigenvalues(&SymMat3::diagonal(3.0, -1.0, 2.0)));
        assert_eq!(ev, [-1.0, 2.0, 3.0]);
    }

    #[test]
    fn coupled_block() {
        let m = SymMat3 {
            xx: 2.0,
            yy: 2.0,
            zz: 3.0,
            xy: 1.0,
            ..SymMat3::default()
        };
        let ev = sorted(symmetric_eigenvalues(&m));
        assert!((ev[0] - 1.0).abs() < 1e-12);
        assert!((ev[1] - 3.0).abs() < 1e-12);
        assert!((ev[2] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn dense_matrix_preserves_invariants() {
        let m = SymMat3 {
            xx: 4.0,
            yy: -2.0,
            zz: 1.0,
            xy: 0.5,
            xz: -1.5,
            yz: 2.0,
        };
        let ev = symmetric_eigenvalues(&m);

        let trace: f64 = ev.iter().sum();
        assert!((trace - m.trace()).abs() < 1e-10);

        let det = m.xx * (m.yy * m.zz - m.yz * m.yz) - m.xy * (m.xy * m.zz - m.yz * m.xz)
            + m.xz * (m.xy * m.yz - m.yy * m.xz);
        assert!((ev[0] * ev[1] * ev[2] - det).abs() < 1e-9);

        let frob2 = m.xx * m.xx
            + m.yy * m.yy
            + m.zz * m.zz
            + 2.0 * (m.xy * m.xy + m.xz * m.xz + m.yz * m.yz);
        let ev2: f64 = ev.iter().map(|v| v * v).sum();
        assert!((ev2 - frob2).abs() < 1e-9);
    }

    #[test]
    fn zero_matrix() {
        assert_eq!(symmetric_eigenvalues(&SymMat3::default()), [0.0; 3]);
    }
}
