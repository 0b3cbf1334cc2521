use std::fmt;
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    control_values::ControlValues,
    controlled::ControlledGate,
    linalg,
    qid::{ self, Qid },
};
use super::{ DecompositionContext, Gate, GateResult, validate_qudits };

/// A gate applied to a particular register of qudits.
#[derive(Clone, Debug, Hash)]
pub struct Operation {
    gate: Box<dyn Gate>,
    qudits: Vec<Qid>,
}

impl Operation {
    /// Create a new `Operation`, checking that `qudits` match the qudit shape
    /// of `gate`.
    pub fn new(gate: Box<dyn Gate>, qudits: Vec<Qid>) -> GateResult<Self> {
        validate_qudits(gate.as_ref(), &qudits)?;
        Ok(Self { gate, qudits })
    }

    // for callers that have already checked the qudits
    pub(crate) fn new_unchecked(gate: Box<dyn Gate>, qudits: Vec<Qid>) -> Self {
        Self { gate, qudits }
    }

    /// Return a reference to the gate.
    pub fn gate(&self) -> &dyn Gate { self.gate.as_ref() }

    /// Return the qudits acted on, in the order expected by the gate.
    pub fn qudits(&self) -> &[Qid] { &self.qudits }

    /// Unpack `self` into its gate and qudits.
    pub fn into_parts(self) -> (Box<dyn Gate>, Vec<Qid>) {
        (self.gate, self.qudits)
    }

    /// Return the unitary matrix of the gate, if it has one.
    pub fn unitary(&self) -> Option<nd::Array2<C64>> { self.gate.unitary() }

    /// Decompose `self` one level.
    pub fn decompose(&self, ctx: &DecompositionContext)
        -> GateResult<Option<Vec<Operation>>>
    {
        self.gate.decompose(&self.qudits, ctx)
    }

    /// Add control qudits to `self`.
    ///
    /// If `control_values` is `None`, every control accepts only the value 1.
    /// The control qudit shape is taken from the dimensions of `controls`.
    /// Returns a copy of `self` if `controls` is empty.
    pub fn controlled_by(
        &self,
        controls: &[Qid],
        control_values: Option<ControlValues>,
    ) -> GateResult<Self>
    {
        if controls.is_empty() { return Ok(self.clone()); }
        let mut builder =
            ControlledGate::builder_boxed(self.gate.clone())
            .num_controls(controls.len())
            .control_qid_shape(qid::dimensions(controls));
        if let Some(cv) = control_values {
            builder = builder.control_values(cv);
        }
        let gate = builder.build()?;
        let qudits: Vec<Qid> =
            controls.iter().chain(self.qudits.iter()).copied().collect();
        Self::new(Box::new(gate), qudits)
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.gate.as_ref() == other.gate.as_ref() && self.qudits == other.qudits
    }
}

impl Eq for Operation { }

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.gate, self.qudits.iter().join(", "))
    }
}

/// Compute the unitary of a sequence of operations applied in order to the
/// register `qudits`.
///
/// Returns `None` if any operation lacks a unitary or acts on a qudit outside
/// of `qudits`.
pub fn unitary_of(ops: &[Operation], qudits: &[Qid]) -> Option<nd::Array2<C64>> {
    let shape = qid::dimensions(qudits);
    let dim: usize = shape.iter().product();
    let mut total: nd::Array2<C64> = nd::Array2::eye(dim);
    for op in ops.iter() {
        let u = op.unitary()?;
        let positions: Vec<usize> =
            op.qudits().iter()
            .map(|q| qudits.iter().position(|r| r == q))
            .collect::<Option<Vec<usize>>>()?;
        total = linalg::embed(&u, &positions, &shape).dot(&total);
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        c,
        control_values::ProductOfSums,
        gate::GateError,
        gates::{ CXGate, XGate },
    };

    #[test]
    fn new_checks_qudits() {
        assert!(matches!(
            Operation::new(Box::new(CXGate), Qid::qubits(1)),
            Err(GateError::WrongQuditCount { expected: 2, got: 1, .. }),
        ));
        assert!(matches!(
            Operation::new(Box::new(XGate), vec![Qid::new(0, 3)]),
            Err(GateError::WrongDimension { expected: 2, got: 3, .. }),
        ));
        let op = XGate.on(&[Qid::qubit(3)]).unwrap();
        assert_eq!(op.to_string(), "X(q(3))");
    }

    #[test]
    fn controlled_by() {
        let target = Qid::qubit(0);
        let op = XGate.on(&[target]).unwrap();
        assert_eq!(op.controlled_by(&[], None).unwrap(), op);

        let control = Qid::new(1, 3);
        let cop =
            op.controlled_by(&[control], Some(ProductOfSums::from_values([2]).into()))
            .unwrap();
        assert_eq!(cop.qudits(), &[control, target]);
        let gate = cop.gate().downcast_ref::<ControlledGate>().unwrap();
        assert_eq!(gate.control_qid_shape(), &[3]);
        assert_eq!(cop.to_string(), "C2X(q(1) (d=3), q(0))");

        assert!(
            op.controlled_by(&[Qid::qubit(1)], Some(ProductOfSums::from_values([2]).into()))
            .is_err()
        );
    }

    #[test]
    fn unitary_of_sequence() {
        let q = Qid::qubits(2);
        // CX with its control on the second qubit of the register
        let ops = vec![CXGate.on(&[q[1], q[0]]).unwrap()];
        let u = unitary_of(&ops, &q).unwrap();
        assert_eq!(u[[3, 1]], c!(1.0));
        assert_eq!(u[[1, 3]], c!(1.0));
        assert_eq!(u[[0, 0]], c!(1.0));
        assert_eq!(u[[2, 2]], c!(1.0));

        // X then CX: |00> -> |10> -> |11>
        let ops = vec![XGate.on(&q[..1]).unwrap(), CXGate.on(&q).unwrap()];
        let u = unitary_of(&ops, &q).unwrap();
        assert_eq!(u[[3, 0]], c!(1.0));

        assert!(unitary_of(&ops, &q[..1]).is_none());
        assert_eq!(unitary_of(&[], &q).unwrap(), nd::Array2::<C64>::eye(4));
    }
}
