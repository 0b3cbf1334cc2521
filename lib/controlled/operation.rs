use std::fmt;
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    control_values::ControlValues,
    gate::Operation,
    linalg,
    qid::{ self, Qid },
};
use super::ControlledGate;

/// A [`ControlledGate`] bound to a register of control qudits and a
/// sub-operation on the target qudits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ControlledOperation {
    controls: Vec<Qid>,
    sub_operation: Operation,
    control_values: ControlValues,
}

impl ControlledOperation {
    pub(crate) fn new_unchecked(
        controls: Vec<Qid>,
        sub_operation: Operation,
        control_values: ControlValues,
    ) -> Self
    {
        Self { controls, sub_operation, control_values }
    }

    /// Return the control qudits.
    pub fn controls(&self) -> &[Qid] { &self.controls }

    /// Return the operation applied when the controls are satisfied.
    pub fn sub_operation(&self) -> &Operation { &self.sub_operation }

    /// Return the condition on the control qudits.
    pub fn control_values(&self) -> &ControlValues { &self.control_values }

    /// Return all qudits, controls first.
    pub fn qudits(&self) -> Vec<Qid> {
        self.controls.iter()
            .chain(self.sub_operation.qudits())
            .copied()
            .collect()
    }

    /// Return the gate of `self`.
    pub fn gate(&self) -> ControlledGate {
        ControlledGate {
            sub_gate: self.sub_operation.gate().clone_gate(),
            control_values: self.control_values.clone(),
            control_qid_shape: qid::dimensions(&self.controls),
        }
    }

    /// Return the unitary matrix over [`qudits`][Self::qudits]: the identity
    /// on control assignments failing the condition and the sub-operation's
    /// unitary on those satisfying it.
    pub fn unitary(&self) -> Option<nd::Array2<C64>> {
        let sub = self.sub_operation.unitary()?;
        let shape = qid::dimensions(&self.controls);
        Some(linalg::controlled_embedding(&shape, &self.control_values, &sub))
    }

    /// Like [`unitary`][Self::unitary], for each component of the
    /// sub-operation's mixture. Probabilities are unchanged.
    pub fn mixture(&self) -> Option<Vec<(f64, nd::Array2<C64>)>> {
        let shape = qid::dimensions(&self.controls);
        let mix =
            self.sub_operation.gate().mixture()?
            .into_iter()
            .map(|(p, u)| {
                (p, linalg::controlled_embedding(&shape, &self.control_values, &u))
            })
            .collect();
        Some(mix)
    }
}

impl From<ControlledOperation> for Operation {
    fn from(op: ControlledOperation) -> Self {
        let qudits = op.qudits();
        Operation::new_unchecked(Box::new(op.gate()), qudits)
    }
}

impl fmt::Display for ControlledOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}({})",
            self.control_values,
            self.sub_operation.gate(),
            self.qudits().iter().join(", "),
        )
    }
}
