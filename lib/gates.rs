//! A small library of concrete gates.
//!
//! These cover what the controlled-gate decomposition needs to emit
//! (rotations, phase shifts, CNOT, diagonal phases, explicit matrices) and a
//! few gates with restricted capabilities (measurements, channels) to exercise
//! construction rules.

use std::{
    fmt,
    hash::{ Hash, Hasher },
};
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rustc_hash::FxHashSet as HashSet;
use crate::{
    c,
    control_values::ControlValues,
    gate::{
        DecompositionContext,
        DiagramArgs,
        DiagramInfo,
        Gate,
        GateError,
        GateResult,
        Operation,
    },
    linalg::{ self, Zyz },
    param::{ Param, ParamResolver },
    qid::Qid,
};

fn pauli_x() -> nd::Array2<C64> {
    nd::array![
        [c!(0.0), c!(1.0)],
        [c!(1.0), c!(0.0)],
    ]
}

/// π-rotation about *x* (Pauli X).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct XGate;

impl fmt::Display for XGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X")
    }
}

impl Gate for XGate {
    fn qid_shape(&self) -> Vec<usize> { vec![2] }

    fn unitary(&self) -> Option<nd::Array2<C64>> { Some(pauli_x()) }

    fn controlled(
        &self,
        num_controls: usize,
        control_values: &ControlValues,
        control_qid_shape: &[usize],
    ) -> Option<Box<dyn Gate>>
    {
        (num_controls == 1
            && control_qid_shape == [2]
            && control_values.is_trivial()
        ).then(|| Box::new(CXGate) as Box<dyn Gate>)
    }

    fn diagram_info(&self, _args: &DiagramArgs) -> Option<DiagramInfo> {
        Some(DiagramInfo::new(["X"]))
    }
}

/// π-rotation about *x* on the second qubit, controlled by the first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CXGate;

impl fmt::Display for CXGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CX")
    }
}

impl Gate for CXGate {
    fn qid_shape(&self) -> Vec<usize> { vec![2, 2] }

    fn unitary(&self) -> Option<nd::Array2<C64>> {
        Some(nd::array![
            [c!(1.0), c!(0.0), c!(0.0), c!(0.0)],
            [c!(0.0), c!(1.0), c!(0.0), c!(0.0)],
            [c!(0.0), c!(0.0), c!(0.0), c!(1.0)],
            [c!(0.0), c!(0.0), c!(1.0), c!(0.0)],
        ])
    }

    fn diagram_info(&self, _args: &DiagramArgs) -> Option<DiagramInfo> {
        Some(DiagramInfo::new(["@", "X"]))
    }
}

// single-parameter gates whose powers scale the parameter
macro_rules! param_gate {
    (
        $( #[$meta:meta] )*
        $name:ident, $label:literal, shape: $shape:expr,
        |$theta:ident| $matrix:expr
    ) => {
        $( #[$meta] )*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub Param);

        impl $name {
            /// Create a new gate with angle `theta`.
            pub fn new<P>(theta: P) -> Self
            where P: Into<Param>
            {
                Self(theta.into())
            }

            /// Return the angle parameter.
            pub fn angle(&self) -> &Param { &self.0 }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl Gate for $name {
            fn qid_shape(&self) -> Vec<usize> { $shape }

            fn unitary(&self) -> Option<nd::Array2<C64>> {
                self.0.value().map(|$theta| $matrix)
            }

            fn is_parameterized(&self) -> bool { self.0.is_symbol() }

            fn parameter_names(&self) -> HashSet<String> {
                self.0.symbol().map(|s| s.to_string()).into_iter().collect()
            }

            fn resolve_parameters(&self, resolver: &ParamResolver, recursive: bool)
                -> Box<dyn Gate>
            {
                Box::new(Self(resolver.resolve(&self.0, recursive)))
            }

            fn pow(&self, exponent: f64) -> Option<Box<dyn Gate>> {
                self.0.scaled(exponent)
                    .map(|p| Box::new(Self(p)) as Box<dyn Gate>)
            }

            fn diagram_info(&self, args: &DiagramArgs) -> Option<DiagramInfo> {
                let label =
                    format!(concat!($label, "({})"), args.format_param(&self.0));
                Some(DiagramInfo::new(vec![label; self.num_qudits()]))
            }
        }
    }
}

param_gate!(
    /// Rotation about *z*: `diag(exp(-iθ/2), exp(iθ/2))`.
    RzGate, "Rz", shape: vec![2],
    |theta| nd::array![
        [C64::cis(-theta / 2.0), c!(0.0)                ],
        [c!(0.0),                C64::cis(theta / 2.0)  ],
    ]
);

param_gate!(
    /// Rotation about *y*.
    RyGate, "Ry", shape: vec![2],
    |theta| {
        let (cos, sin) = ((theta / 2.0).cos(), (theta / 2.0).sin());
        nd::array![
            [c!(cos), c!(-sin)],
            [c!(sin), c!(cos) ],
        ]
    }
);

param_gate!(
    /// Relative phase on the ∣1⟩ state: `diag(1, exp(iθ))`.
    PhaseShiftGate, "P", shape: vec![2],
    |theta| nd::array![
        [c!(1.0), c!(0.0)        ],
        [c!(0.0), C64::cis(theta)],
    ]
);

param_gate!(
    /// Overall phase `exp(iθ)` acting on no qudits.
    GlobalPhaseGate, "GlobalPhase", shape: Vec::new(),
    |theta| nd::array![[C64::cis(theta)]]
);

/// Diagonal phase gate on `log2(n)` qubits, `diag(exp(iθ_0), ..., exp(iθ_{n-1}))`.
#[derive(Clone, Debug)]
pub struct DiagonalGate {
    angles: Vec<f64>,
}

impl PartialEq for DiagonalGate {
    fn eq(&self, other: &Self) -> bool {
        self.angles.len() == other.angles.len()
            && self.angles.iter().zip(&other.angles)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for DiagonalGate { }

impl Hash for DiagonalGate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.angles.len().hash(state);
        self.angles.iter().for_each(|a| a.to_bits().hash(state));
    }
}

impl DiagonalGate {
    /// Create a new `DiagonalGate`.
    ///
    /// Fails if the number of angles is not a power of two.
    pub fn new(angles: Vec<f64>) -> GateResult<Self> {
        if !angles.len().is_power_of_two() {
            return Err(GateError::BadDiagonal(angles.len()));
        }
        Ok(Self { angles })
    }

    /// Return the phase angles, one per basis state.
    pub fn angles(&self) -> &[f64] { &self.angles }
}

impl fmt::Display for DiagonalGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Diag({})", self.angles.iter().join(", "))
    }
}

impl Gate for DiagonalGate {
    fn qid_shape(&self) -> Vec<usize> {
        vec![2; self.angles.len().trailing_zeros() as usize]
    }

    fn unitary(&self) -> Option<nd::Array2<C64>> {
        let diag: nd::Array1<C64> =
            self.angles.iter().map(|a| C64::cis(*a)).collect();
        Some(nd::Array2::from_diag(&diag))
    }

    fn pow(&self, exponent: f64) -> Option<Box<dyn Gate>> {
        let angles: Vec<f64> =
            self.angles.iter().map(|a| exponent * a).collect();
        Some(Box::new(Self { angles }))
    }

    fn diagram_info(&self, args: &DiagramArgs) -> Option<DiagramInfo> {
        let label =
            format!(
                "Diag({})",
                self.angles.iter()
                    .map(|a| args.format_param(&Param::Value(*a)))
                    .join(", "),
            );
        Some(DiagramInfo::new(vec![label; self.num_qudits()]))
    }
}

/// A gate given by an explicit unitary matrix.
#[derive(Clone, Debug)]
pub struct MatrixGate {
    matrix: nd::Array2<C64>,
    qid_shape: Vec<usize>,
}

impl PartialEq for MatrixGate {
    fn eq(&self, other: &Self) -> bool {
        self.qid_shape == other.qid_shape
            && self.matrix.shape() == other.matrix.shape()
            && self.matrix.iter().zip(&other.matrix)
                .all(|(a, b)| {
                    a.re.to_bits() == b.re.to_bits()
                        && a.im.to_bits() == b.im.to_bits()
                })
    }
}

impl Eq for MatrixGate { }

impl Hash for MatrixGate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qid_shape.hash(state);
        self.matrix.iter()
            .for_each(|z| { z.re.to_bits().hash(state); z.im.to_bits().hash(state); });
    }
}

// tolerance on U†U = I for explicit matrices
const UNITARY_ATOL: f64 = 1e-8;

impl MatrixGate {
    /// Create a new `MatrixGate` acting on qudits of dimensions `qid_shape`.
    ///
    /// Returns `None` if `matrix` is not square with dimension equal to the
    /// product of `qid_shape`, or is not unitary.
    pub fn new(matrix: nd::Array2<C64>, qid_shape: Vec<usize>) -> Option<Self> {
        let dim: usize = qid_shape.iter().product();
        if matrix.nrows() != dim || matrix.ncols() != dim { return None; }
        let gram = linalg::dagger(&matrix).dot(&matrix);
        linalg::allclose(&gram, &nd::Array2::eye(dim), UNITARY_ATOL)
            .then_some(Self { matrix, qid_shape })
    }

    /// Create a new single-qubit `MatrixGate` from a 2×2 matrix.
    pub fn single_qubit(matrix: nd::Array2<C64>) -> Option<Self> {
        Self::new(matrix, vec![2])
    }

    /// Return the matrix.
    pub fn matrix(&self) -> &nd::Array2<C64> { &self.matrix }
}

impl fmt::Display for MatrixGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix")
    }
}

impl Gate for MatrixGate {
    fn qid_shape(&self) -> Vec<usize> { self.qid_shape.clone() }

    fn unitary(&self) -> Option<nd::Array2<C64>> { Some(self.matrix.clone()) }

    // single-qubit matrices decompose to Rz·Ry·Rz, with the global phase
    // emitted separately only when asked for
    fn decompose(&self, qudits: &[Qid], ctx: &DecompositionContext)
        -> GateResult<Option<Vec<Operation>>>
    {
        if self.qid_shape != [2] { return Ok(None); }
        let Zyz { alpha, beta, gamma, delta } = Zyz::from_unitary(&self.matrix);
        let mut ops: Vec<Operation> = Vec::new();
        if delta.abs() > ctx.atol() {
            ops.push(RzGate::new(delta).on(qudits)?);
        }
        if gamma.abs() > ctx.atol() {
            ops.push(RyGate::new(gamma).on(qudits)?);
        }
        if beta.abs() > ctx.atol() {
            ops.push(RzGate::new(beta).on(qudits)?);
        }
        if ctx.extract_global_phases() && alpha.abs() > ctx.atol() {
            ops.push(GlobalPhaseGate::new(alpha).on(&[])?);
        }
        Ok(Some(ops))
    }

    fn diagram_info(&self, _args: &DiagramArgs) -> Option<DiagramInfo> {
        Some(DiagramInfo::new(vec!["U"; self.qid_shape.len()]))
    }
}

/// Computational-basis measurement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeasurementGate {
    key: String,
    qid_shape: Vec<usize>,
}

impl MeasurementGate {
    /// Create a new measurement with record key `key` on qudits of dimensions
    /// `qid_shape`.
    pub fn new<S>(key: S, qid_shape: Vec<usize>) -> Self
    where S: Into<String>
    {
        Self { key: key.into(), qid_shape }
    }

    /// Return the record key.
    pub fn key(&self) -> &str { &self.key }
}

impl fmt::Display for MeasurementGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M('{}')", self.key)
    }
}

impl Gate for MeasurementGate {
    fn qid_shape(&self) -> Vec<usize> { self.qid_shape.clone() }

    fn is_measurement(&self) -> bool { true }

    fn diagram_info(&self, _args: &DiagramArgs) -> Option<DiagramInfo> {
        Some(DiagramInfo::new(vec!["M"; self.qid_shape.len()]))
    }
}

/// Applies X with probability `p`.
///
/// This is a mixture of unitaries but has no unitary of its own.
#[derive(Copy, Clone, Debug)]
pub struct BitFlipChannel {
    p: f64,
}

impl PartialEq for BitFlipChannel {
    fn eq(&self, other: &Self) -> bool { self.p.to_bits() == other.p.to_bits() }
}

impl Eq for BitFlipChannel { }

impl Hash for BitFlipChannel {
    fn hash<H: Hasher>(&self, state: &mut H) { self.p.to_bits().hash(state); }
}

impl BitFlipChannel {
    /// Create a new bit-flip channel with flip probability `p`.
    pub fn new(p: f64) -> Self { Self { p } }

    /// Return the flip probability.
    pub fn p(&self) -> f64 { self.p }
}

impl fmt::Display for BitFlipChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BF({})", self.p)
    }
}

impl Gate for BitFlipChannel {
    fn qid_shape(&self) -> Vec<usize> { vec![2] }

    fn mixture(&self) -> Option<Vec<(f64, nd::Array2<C64>)>> {
        Some(vec![
            (1.0 - self.p, nd::Array2::eye(2)),
            (self.p, pauli_x()),
        ])
    }

    fn has_mixture(&self) -> bool { true }

    fn diagram_info(&self, args: &DiagramArgs) -> Option<DiagramInfo> {
        Some(DiagramInfo::new([
            format!("BF({})", args.format_param(&Param::Value(self.p)))
        ]))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{ FRAC_1_SQRT_2, PI };
    use super::*;
    use crate::{
        control_values::ProductOfSums,
        gate::unitary_of,
        linalg::{ allclose, allclose_up_to_global_phase },
    };

    const ATOL: f64 = 1e-10;

    #[test]
    fn rotation_unitaries() {
        let rz = RzGate::new(PI).unitary().unwrap();
        assert!(allclose(&rz, &nd::array![[c!(i -1.0), c!(0.0)], [c!(0.0), c!(i 1.0)]], ATOL));
        let ry = RyGate::new(PI).unitary().unwrap();
        assert!(allclose(&ry, &nd::array![[c!(0.0), c!(-1.0)], [c!(1.0), c!(0.0)]], ATOL));
        let p = PhaseShiftGate::new(PI / 2.0).unitary().unwrap();
        assert!(allclose(&p, &nd::array![[c!(1.0), c!(0.0)], [c!(0.0), c!(i 1.0)]], ATOL));
        let g = GlobalPhaseGate::new(PI).unitary().unwrap();
        assert_eq!(g.shape(), &[1, 1]);
        assert!((g[[0, 0]] - c!(-1.0)).norm() < ATOL);
        assert!(GlobalPhaseGate::new(0.5).qid_shape().is_empty());
    }

    #[test]
    fn symbolic_parameters() {
        let rz = RzGate::new("t");
        assert!(rz.is_parameterized());
        assert!(!rz.has_unitary());
        assert!(rz.pow(2.0).is_none());
        assert_eq!(
            rz.parameter_names(),
            ["t".to_string()].into_iter().collect::<HashSet<String>>(),
        );
        let resolver: ParamResolver = [("t", 0.25)].into_iter().collect();
        let resolved = rz.resolve_parameters(&resolver, true);
        assert_eq!(resolved.as_ref(), &RzGate::new(0.25) as &dyn Gate);
        assert!(!resolved.is_parameterized());
    }

    #[test]
    fn rotation_pow() {
        let g = RyGate::new(0.5).pow(3.0).unwrap();
        assert_eq!(g.as_ref(), &RyGate::new(1.5) as &dyn Gate);
    }

    #[test]
    fn x_native_controlled() {
        let one: ControlValues = ProductOfSums::ones(1).into();
        let two: ControlValues = ProductOfSums::ones(2).into();
        let zero: ControlValues = ProductOfSums::from_values([0]).into();
        let cx = XGate.controlled(1, &one, &[2]).unwrap();
        assert!(cx.is::<CXGate>());
        assert!(XGate.controlled(2, &two, &[2, 2]).is_none());
        assert!(XGate.controlled(1, &one, &[3]).is_none());
        assert!(XGate.controlled(1, &zero, &[2]).is_none());
    }

    #[test]
    fn diagonal_gate() {
        assert!(matches!(DiagonalGate::new(vec![0.0; 3]), Err(GateError::BadDiagonal(3))));
        assert!(matches!(DiagonalGate::new(Vec::new()), Err(GateError::BadDiagonal(0))));
        let d = DiagonalGate::new(vec![0.0, 0.0, 0.0, PI]).unwrap();
        assert_eq!(d.qid_shape(), vec![2, 2]);
        let u = d.unitary().unwrap();
        assert!((u[[3, 3]] - c!(-1.0)).norm() < ATOL);
        assert!((u[[0, 0]] - c!(1.0)).norm() < ATOL);
        assert_eq!(DiagonalGate::new(vec![0.5]).unwrap().num_qudits(), 0);
    }

    #[test]
    fn matrix_gate_decompose() {
        let r = FRAC_1_SQRT_2;
        let h = nd::array![[c!(r), c!(r)], [c!(r), c!(-r)]];
        assert!(MatrixGate::new(h.clone(), vec![2, 2]).is_none());
        let not_unitary = nd::array![[c!(2.0), c!(0.0)], [c!(0.0), c!(1.0)]];
        assert!(MatrixGate::single_qubit(not_unitary).is_none());
        assert!(MatrixGate::single_qubit(h.mapv(|z| z * 1.01)).is_none());
        let gate = MatrixGate::single_qubit(h.clone()).unwrap();
        let q = Qid::qubits(1);
        let ctx = DecompositionContext::new().extracting_global_phases();
        let ops = gate.decompose(&q, &ctx).unwrap().unwrap();
        assert!(ops.iter().any(|op| op.gate().is::<GlobalPhaseGate>()));
        assert!(allclose(&unitary_of(&ops, &q).unwrap(), &h, ATOL));

        let ops = gate.decompose(&q, &DecompositionContext::new()).unwrap().unwrap();
        assert!(ops.iter().all(|op| !op.gate().is::<GlobalPhaseGate>()));
        assert!(allclose_up_to_global_phase(&unitary_of(&ops, &q).unwrap(), &h, ATOL));
    }

    #[test]
    fn capabilities() {
        let m = MeasurementGate::new("m", vec![2]);
        assert!(m.is_measurement());
        assert!(!m.has_mixture());
        let bf = BitFlipChannel::new(0.25);
        assert!(!bf.has_unitary());
        assert!(bf.has_mixture());
        let mix = bf.mixture().unwrap();
        assert_eq!(mix.len(), 2);
        assert!((mix[0].0 - 0.75).abs() < ATOL);
    }

    #[test]
    fn display() {
        assert_eq!(XGate.to_string(), "X");
        assert_eq!(RzGate::new(0.5).to_string(), "Rz(0.5)");
        assert_eq!(PhaseShiftGate::new("a").to_string(), "P(a)");
        assert_eq!(DiagonalGate::new(vec![0.0, 1.0]).unwrap().to_string(), "Diag(0, 1)");
        assert_eq!(MeasurementGate::new("k", vec![2]).to_string(), "M('k')");
        let info = RzGate::new(0.5).diagram_info(&DiagramArgs::default()).unwrap();
        assert_eq!(info.wire_symbols, vec!["Rz(0.500)".to_string()]);
    }
}
