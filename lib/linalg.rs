//! Small dense linear-algebra helpers for qudit operators.
//!
//! Basis states of a register with shape `[d0, d1, ...]` are indexed in
//! row-major (big-endian) order: the first qudit is the most significant
//! digit.

use std::f64::consts::{ PI, TAU };
use nalgebra as na;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rustc_hash::FxHashSet as HashSet;
use crate::{ c, control_values::ControlValues };

/// Convert a multi-index over a register of shape `shape` to a flat basis
/// index.
pub fn flat_index(digits: &[usize], shape: &[usize]) -> usize {
    digits.iter().zip(shape)
        .fold(0, |acc, (x, d)| acc * d + x)
}

/// Convert a flat basis index over a register of shape `shape` to a
/// multi-index.
pub fn digits(mut index: usize, shape: &[usize]) -> Vec<usize> {
    let mut out = vec![0; shape.len()];
    for (k, d) in shape.iter().enumerate().rev() {
        out[k] = index % d;
        index /= d;
    }
    out
}

/// Embed an operator acting on the qudits at `positions` into the full space
/// of a register with shape `shape`, acting as the identity elsewhere.
///
/// `matrix` must be square with dimension equal to the product of
/// `shape[p]` for `p` in `positions`.
pub fn embed(matrix: &nd::Array2<C64>, positions: &[usize], shape: &[usize])
    -> nd::Array2<C64>
{
    let total: usize = shape.iter().product();
    let sub_shape: Vec<usize> = positions.iter().map(|p| shape[*p]).collect();
    let sub_dim: usize = sub_shape.iter().product();
    let mut out: nd::Array2<C64> = nd::Array2::zeros((total, total));
    for col in 0..total {
        let col_digits = digits(col, shape);
        let sub_col_digits: Vec<usize> =
            positions.iter().map(|p| col_digits[*p]).collect();
        let sub_col = flat_index(&sub_col_digits, &sub_shape);
        for sub_row in 0..sub_dim {
            let amp = matrix[[sub_row, sub_col]];
            if amp == c!(0.0) { continue; }
            let mut row_digits = col_digits.clone();
            digits(sub_row, &sub_shape).into_iter()
                .zip(positions)
                .for_each(|(x, p)| { row_digits[*p] = x; });
            out[[flat_index(&row_digits, shape), col]] += amp;
        }
    }
    out
}

/// Embed `sub` as a block-diagonal operator controlled by a register of shape
/// `control_shape`.
///
/// The result acts as `sub` on the target block for every control assignment
/// produced by `control_values.expand()`, and as the identity on every other
/// assignment. The control register comes first.
pub fn controlled_embedding(
    control_shape: &[usize],
    control_values: &ControlValues,
    sub: &nd::Array2<C64>,
) -> nd::Array2<C64>
{
    let num_blocks: usize = control_shape.iter().product();
    let block = sub.nrows();
    let active: HashSet<usize> =
        control_values.expand()
        .map(|hot| flat_index(&hot, control_shape))
        .collect();
    let mut out: nd::Array2<C64> = nd::Array2::zeros((num_blocks * block, num_blocks * block));
    for b in 0..num_blocks {
        let range = b * block..(b + 1) * block;
        let mut view = out.slice_mut(nd::s![range.clone(), range]);
        if active.contains(&b) {
            view.assign(sub);
        } else {
            view.diag_mut().fill(c!(1.0));
        }
    }
    out
}

/// Return `true` if `a` and `b` have the same shape and all elements differ
/// by at most `atol`.
pub fn allclose(a: &nd::Array2<C64>, b: &nd::Array2<C64>, atol: f64) -> bool {
    a.shape() == b.shape()
        && a.iter().zip(b).all(|(x, y)| (x - y).norm() <= atol)
}

/// Like [`allclose`], but ignoring an overall phase factor.
pub fn allclose_up_to_global_phase(
    a: &nd::Array2<C64>,
    b: &nd::Array2<C64>,
    atol: f64,
) -> bool
{
    if a.shape() != b.shape() { return false; }
    let Some((k, x)) =
        a.iter().enumerate()
        .max_by(|(_, x), (_, y)| x.norm().total_cmp(&y.norm()))
        else { return true; };
    let y = b.iter().nth(k).copied().unwrap_or(c!(0.0));
    if x.norm() <= atol { return y.norm() <= atol && allclose(a, b, atol); }
    if y.norm() <= atol { return false; }
    let phase = (y / x) / (y / x).norm();
    let rotated = a.mapv(|z| z * phase);
    allclose(&rotated, b, atol)
}

/// Return the conjugate transpose of `a`.
pub fn dagger(a: &nd::Array2<C64>) -> nd::Array2<C64> {
    a.t().mapv(|z| z.conj())
}

/// Compute the eigenvalues of a square complex matrix.
///
/// Returns `None` if the underlying Schur iteration fails to converge.
pub fn eigenvalues(a: &nd::Array2<C64>) -> Option<Vec<C64>> {
    let n = a.nrows();
    if n <= 1 { return Some(a.diag().to_vec()); }
    let m: na::DMatrix<C64> = na::DMatrix::from_fn(n, n, |i, j| a[[i, j]]);
    let (_, t) = na::Schur::try_new(m, 1e-14, 0)?.unpack();
    Some(t.diagonal().iter().copied().collect())
}

/// Compute the eigenphases of a unitary matrix, in `(-π, π]`.
pub fn eigenphases(u: &nd::Array2<C64>) -> Option<Vec<f64>> {
    eigenvalues(u).map(|eigs| eigs.into_iter().map(|z| z.arg()).collect())
}

/// Compute an upper bound on the trace distance between the output of an
/// operator with eigenphases `angles` and its input.
///
/// The bound is determined by the largest arc on the unit circle free of
/// eigenphases: if the eigenvalues all fit in a half-circle the bound is
/// `sin(spread / 2)`, otherwise it is 1.
pub fn trace_distance_from_angle_list(angles: &[f64]) -> f64 {
    if angles.is_empty() { return 0.0; }
    let mut sorted: Vec<f64> = angles.to_vec();
    sorted.sort_by(f64::total_cmp);
    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    let maxim =
        sorted.windows(2)
        .map(|w| w[1] - w[0])
        .fold(TAU + first - last, f64::max);
    if maxim <= PI {
        1.0
    } else {
        (0.5 * maxim).sin().max(0.0)
    }
}

/// Compute a principal square root of a 2×2 unitary matrix.
///
/// For a 2×2 matrix `M` with determinant `δ` and trace `τ`, `(M + s I) / t`
/// with `s² = δ` and `t² = τ + 2 s` squares to `M`. Of the two choices of `s`,
/// the one giving the larger `|t|` is used, which for unitaries is never zero.
pub fn sqrt_2x2(u: &nd::Array2<C64>) -> nd::Array2<C64> {
    let det = u[[0, 0]] * u[[1, 1]] - u[[0, 1]] * u[[1, 0]];
    let tr = u[[0, 0]] + u[[1, 1]];
    let s0 = det.sqrt();
    let (s, t) =
        [s0, -s0].into_iter()
        .map(|s| (s, (tr + 2.0 * s).sqrt()))
        .max_by(|(_, t1), (_, t2)| t1.norm().total_cmp(&t2.norm()))
        .unwrap_or((s0, (tr + 2.0 * s0).sqrt()));
    let mut out = u.clone();
    out[[0, 0]] += s;
    out[[1, 1]] += s;
    out.mapv_inplace(|z| z / t);
    out
}

/// Angles of a *ZYZ* Euler decomposition of a 2×2 unitary.
///
/// `U = exp(i alpha) Rz(beta) Ry(gamma) Rz(delta)`, with
/// `Rz(θ) = diag(exp(-iθ/2), exp(iθ/2))` and
/// `Ry(θ) = [[cos(θ/2), -sin(θ/2)], [sin(θ/2), cos(θ/2)]]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Zyz {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
}

impl Zyz {
    /// Decompose a 2×2 unitary matrix.
    pub fn from_unitary(u: &nd::Array2<C64>) -> Self {
        let det = u[[0, 0]] * u[[1, 1]] - u[[0, 1]] * u[[1, 0]];
        let alpha = det.arg() / 2.0;
        let rot = C64::cis(-alpha);
        let v00 = u[[0, 0]] * rot;
        let v10 = u[[1, 0]] * rot;
        let v11 = u[[1, 1]] * rot;
        let gamma = 2.0 * v10.norm().atan2(v00.norm());
        // an identically zero entry leaves its angle undetermined; take zero
        let phi_sum = if v11.norm() > 1e-12 { v11.arg() } else { 0.0 };
        let phi_diff = if v10.norm() > 1e-12 { v10.arg() } else { 0.0 };
        Self {
            alpha,
            beta: phi_sum + phi_diff,
            gamma,
            delta: phi_sum - phi_diff,
        }
    }

    /// Recompose the 2×2 unitary.
    pub fn to_unitary(&self) -> nd::Array2<C64> {
        let (c, s) = ((self.gamma / 2.0).cos(), (self.gamma / 2.0).sin());
        let sum = (self.beta + self.delta) / 2.0;
        let diff = (self.beta - self.delta) / 2.0;
        let ph = C64::cis(self.alpha);
        nd::array![
            [ ph * C64::cis(-sum) * c, -ph * C64::cis(-diff) * s ],
            [ ph * C64::cis(diff) * s,  ph * C64::cis(sum) * c   ],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_values::ProductOfSums;

    const ATOL: f64 = 1e-10;

    fn hadamard() -> nd::Array2<C64> {
        let r = std::f64::consts::FRAC_1_SQRT_2;
        nd::array![[c!(r), c!(r)], [c!(r), c!(-r)]]
    }

    fn pauli_x() -> nd::Array2<C64> {
        nd::array![[c!(0.0), c!(1.0)], [c!(1.0), c!(0.0)]]
    }

    #[test]
    fn index_conversion() {
        let shape = [2, 3, 2];
        for k in 0..12 {
            assert_eq!(flat_index(&digits(k, &shape), &shape), k);
        }
        assert_eq!(digits(5, &shape), vec![0, 2, 1]);
        assert_eq!(flat_index(&[1, 0, 1], &shape), 7);
        assert_eq!(flat_index(&[], &[]), 0);
    }

    #[test]
    fn embed_cnot_reversed() {
        // X on qubit 0 conditioned on qubit 1, built from a control-first CX
        let cx = controlled_embedding(
            &[2], &ProductOfSums::from_values([1]).into(), &pauli_x());
        let reversed = embed(&cx, &[1, 0], &[2, 2]);
        let mut expected: nd::Array2<C64> = nd::Array2::zeros((4, 4));
        expected[[0, 0]] = c!(1.0);
        expected[[3, 1]] = c!(1.0);
        expected[[2, 2]] = c!(1.0);
        expected[[1, 3]] = c!(1.0);
        assert!(allclose(&reversed, &expected, ATOL));
    }

    #[test]
    fn controlled_blocks() {
        let cv: ControlValues = ProductOfSums::from_values([0]).into();
        let u = controlled_embedding(&[2], &cv, &pauli_x());
        let expected = nd::array![
            [c!(0.0), c!(1.0), c!(0.0), c!(0.0)],
            [c!(1.0), c!(0.0), c!(0.0), c!(0.0)],
            [c!(0.0), c!(0.0), c!(1.0), c!(0.0)],
            [c!(0.0), c!(0.0), c!(0.0), c!(1.0)],
        ];
        assert!(allclose(&u, &expected, ATOL));

        let cv: ControlValues = ProductOfSums::from_values([2]).into();
        let u = controlled_embedding(&[3], &cv, &pauli_x());
        assert_eq!(u.shape(), &[6, 6]);
        assert_eq!(u[[4, 5]], c!(1.0));
        assert_eq!(u[[0, 0]], c!(1.0));
        assert_eq!(u[[3, 3]], c!(1.0));
    }

    #[test]
    fn global_phase_comparison() {
        let h = hadamard();
        let hi = h.mapv(|z| z * C64::i());
        assert!(!allclose(&h, &hi, ATOL));
        assert!(allclose_up_to_global_phase(&h, &hi, ATOL));
        assert!(!allclose_up_to_global_phase(&h, &pauli_x(), ATOL));
    }

    #[test]
    fn square_root() {
        for u in [hadamard(), pauli_x(), nd::Array2::eye(2).mapv(|z: C64| -z)] {
            let v = sqrt_2x2(&u);
            assert!(allclose(&v.dot(&v), &u, ATOL));
        }
    }

    #[test]
    fn zyz_roundtrip() {
        let s = nd::array![[c!(1.0), c!(0.0)], [c!(0.0), c!(i 1.0)]];
        for u in [hadamard(), pauli_x(), s, nd::Array2::eye(2)] {
            let zyz = Zyz::from_unitary(&u);
            assert!(allclose(&zyz.to_unitary(), &u, ATOL));
        }
    }

    #[test]
    fn phases_and_distance() {
        let phases = eigenphases(&pauli_x()).unwrap();
        let mut phases: Vec<f64> = phases.into_iter().map(f64::abs).collect();
        phases.sort_by(f64::total_cmp);
        assert!(phases[0].abs() < ATOL);
        assert!((phases[1] - PI).abs() < ATOL);

        assert_eq!(trace_distance_from_angle_list(&[0.0, PI, 0.0]), 1.0);
        let d = trace_distance_from_angle_list(&[-0.1, 0.1, 0.0]);
        assert!((d - 0.1_f64.sin()).abs() < ATOL);
        assert!(trace_distance_from_angle_list(&[0.0, 0.0]) < ATOL);
    }
}
