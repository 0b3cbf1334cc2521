//! Gates applied conditionally on the values of control qudits.
//!
//! A [`ControlledGate`] owns a sub-gate, a [`ControlValues`] condition and
//! the dimensions of its control qudits. Nesting is flattened on construction,
//! so the sub-gate of a `ControlledGate` is never itself a `ControlledGate`.
//!
//! ```
//! use qudit_control::{
//!     control_values::ProductOfSums,
//!     controlled::ControlledGate,
//!     gates::XGate,
//!     gate::Gate,
//! };
//!
//! let ccx =
//!     ControlledGate::builder(XGate)
//!     .control_values(ProductOfSums::from_values([1, 0]))
//!     .build()
//!     .unwrap();
//! assert_eq!(ccx.num_controls(), 2);
//! assert_eq!(ccx.qid_shape(), vec![2, 2, 2]);
//! assert_eq!(ccx.to_string(), "CC0X");
//! ```

use std::fmt;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rustc_hash::FxHashSet as HashSet;
use crate::{
    control_values::{ ControlValues, ProductOfSums },
    gate::{
        DecompositionContext,
        DiagramArgs,
        DiagramInfo,
        Gate,
        GateError,
        GateResult,
        Operation,
        validate_qudits,
    },
    linalg,
    param::ParamResolver,
    qid::Qid,
};

pub(crate) mod operation;
pub use operation::*;

pub(crate) mod decompose;
pub use decompose::*;

/// A sub-gate applied only when its control qudits satisfy a condition.
#[derive(Clone, Hash)]
pub struct ControlledGate {
    sub_gate: Box<dyn Gate>,
    control_values: ControlValues,
    control_qid_shape: Vec<usize>,
}

/// Builder for [`ControlledGate`]; see [`ControlledGate::builder`].
#[derive(Clone, Debug)]
pub struct ControlledGateBuilder {
    sub_gate: Box<dyn Gate>,
    num_controls: Option<usize>,
    control_values: Option<ControlValues>,
    control_qid_shape: Option<Vec<usize>>,
}

impl ControlledGateBuilder {
    /// Set the number of control qudits.
    pub fn num_controls(mut self, num_controls: usize) -> Self {
        self.num_controls = Some(num_controls);
        self
    }

    /// Set the condition on the control qudits.
    pub fn control_values<V>(mut self, control_values: V) -> Self
    where V: Into<ControlValues>
    {
        self.control_values = Some(control_values.into());
        self
    }

    /// Set the dimensions of the control qudits.
    pub fn control_qid_shape<I>(mut self, control_qid_shape: I) -> Self
    where I: IntoIterator<Item = usize>
    {
        self.control_qid_shape = Some(control_qid_shape.into_iter().collect());
        self
    }

    /// Validate and build the gate.
    ///
    /// Unset fields take defaults: `num_controls` is inferred from the control
    /// values, then from the control qudit shape, and is otherwise 1; every
    /// control accepts only the value 1; every control is a qubit.
    ///
    /// If the sub-gate is itself a `ControlledGate`, its controls are appended
    /// after those given here and its own sub-gate is taken in its place.
    pub fn build(self) -> GateResult<ControlledGate> {
        let Self { sub_gate, num_controls, control_values, control_qid_shape }
            = self;
        if sub_gate.is_measurement() {
            return Err(GateError::MeasurementSubGate(sub_gate.to_string()));
        }
        if !sub_gate.has_mixture() && !sub_gate.is_parameterized() {
            return Err(GateError::NonUnitarySubGate(sub_gate.to_string()));
        }

        let control_values = control_values.map(ControlValues::simplified);
        let num_controls =
            num_controls
            .or_else(|| control_values.as_ref().map(|cv| cv.num_qudits()))
            .or_else(|| control_qid_shape.as_ref().map(|shape| shape.len()))
            .unwrap_or(1);
        let control_values =
            control_values
            .unwrap_or_else(|| ProductOfSums::ones(num_controls).into());
        if control_values.num_qudits() != num_controls {
            return Err(GateError::NumControlsMismatch {
                num_controls,
                num_qudits: control_values.num_qudits(),
            });
        }
        let control_qid_shape =
            control_qid_shape.unwrap_or_else(|| vec![2; num_controls]);
        if control_qid_shape.len() != num_controls {
            return Err(GateError::QidShapeMismatch {
                num_controls,
                len: control_qid_shape.len(),
            });
        }
        if let Some(position) =
            control_qid_shape.iter().chain(&sub_gate.qid_shape())
            .position(|d| *d == 0)
        {
            return Err(GateError::ZeroDimension {
                gate: sub_gate.to_string(),
                position,
            });
        }
        control_values.validate(&control_qid_shape)?;

        Ok(ControlledGate::flattened(sub_gate, control_values, control_qid_shape))
    }
}

impl ControlledGate {
    /// Start building a new `ControlledGate` around `sub_gate`.
    pub fn builder<G>(sub_gate: G) -> ControlledGateBuilder
    where G: Gate + 'static
    {
        Self::builder_boxed(Box::new(sub_gate))
    }

    /// Like [`builder`][Self::builder], for an already boxed sub-gate.
    pub fn builder_boxed(sub_gate: Box<dyn Gate>) -> ControlledGateBuilder {
        ControlledGateBuilder {
            sub_gate,
            num_controls: None,
            control_values: None,
            control_qid_shape: None,
        }
    }

    /// Create a new `ControlledGate` with a single qubit control accepting
    /// only the value 1.
    pub fn new<G>(sub_gate: G) -> GateResult<Self>
    where G: Gate + 'static
    {
        Self::builder(sub_gate).build()
    }

    // absorb a controlled sub-gate; the caller must have validated the
    // outer controls
    fn flattened(
        sub_gate: Box<dyn Gate>,
        control_values: ControlValues,
        control_qid_shape: Vec<usize>,
    ) -> Self
    {
        match sub_gate.downcast_ref::<ControlledGate>() {
            Some(inner) => Self {
                sub_gate: inner.sub_gate.clone(),
                control_values: &control_values & &inner.control_values,
                control_qid_shape:
                    control_qid_shape.into_iter()
                    .chain(inner.control_qid_shape.iter().copied())
                    .collect(),
            },
            None => Self { sub_gate, control_values, control_qid_shape },
        }
    }

    /// Return the gate applied when the controls are satisfied.
    pub fn sub_gate(&self) -> &dyn Gate { self.sub_gate.as_ref() }

    /// Return the condition on the control qudits.
    pub fn control_values(&self) -> &ControlValues { &self.control_values }

    /// Return the dimensions of the control qudits.
    pub fn control_qid_shape(&self) -> &[usize] { &self.control_qid_shape }

    /// Return the number of control qudits.
    pub fn num_controls(&self) -> usize { self.control_qid_shape.len() }

    /// Apply `self` to a register of qudits, the first
    /// [`num_controls`][Self::num_controls] of which are the controls.
    pub fn on(&self, qudits: &[Qid]) -> GateResult<ControlledOperation> {
        if qudits.is_empty() {
            return Err(GateError::EmptyApplication(self.to_string()));
        }
        validate_qudits(self, qudits)?;
        Ok(self.bind(qudits))
    }

    // qudits must already match the qid shape
    fn bind(&self, qudits: &[Qid]) -> ControlledOperation {
        let (controls, targets) = qudits.split_at(self.num_controls());
        ControlledOperation::new_unchecked(
            controls.to_vec(),
            Operation::new_unchecked(self.sub_gate.clone(), targets.to_vec()),
            self.control_values.clone(),
        )
    }

    fn canonical_operation(&self) -> ControlledOperation {
        self.bind(&Qid::for_shape(&self.qid_shape()))
    }

    /// Compute an upper bound on the trace distance between the output of
    /// `self` and its input.
    ///
    /// Returns `None` if the sub-gate is parameterized or has no unitary.
    pub fn trace_distance_bound(&self) -> Option<f64> {
        if self.sub_gate.is_parameterized() { return None; }
        let u = self.sub_gate.unitary()?;
        let mut angles = linalg::eigenphases(&u)?;
        angles.push(0.0);
        Some(linalg::trace_distance_from_angle_list(&angles))
    }

    /// Return the structural content of `self`.
    pub fn payload(&self) -> ControlledGatePayload {
        ControlledGatePayload {
            control_values: self.control_values.clone(),
            control_qid_shape: self.control_qid_shape.clone(),
            sub_gate: self.sub_gate.clone(),
        }
    }

    // swap in a new sub-gate under the same controls
    fn rewrapped(&self, sub_gate: Box<dyn Gate>) -> Self {
        Self::flattened(
            sub_gate,
            self.control_values.clone(),
            self.control_qid_shape.clone(),
        )
    }
}

/// Structural content of a [`ControlledGate`], from which it can be rebuilt.
#[derive(Clone, Debug, Hash)]
pub struct ControlledGatePayload {
    pub control_values: ControlValues,
    pub control_qid_shape: Vec<usize>,
    pub sub_gate: Box<dyn Gate>,
}

impl PartialEq for ControlledGatePayload {
    fn eq(&self, other: &Self) -> bool {
        self.control_values == other.control_values
            && self.control_qid_shape == other.control_qid_shape
            && self.sub_gate.as_ref() == other.sub_gate.as_ref()
    }
}

impl Eq for ControlledGatePayload { }

impl TryFrom<ControlledGatePayload> for ControlledGate {
    type Error = GateError;

    fn try_from(payload: ControlledGatePayload) -> GateResult<Self> {
        let ControlledGatePayload { control_values, control_qid_shape, sub_gate }
            = payload;
        Self::builder_boxed(sub_gate)
            .control_values(control_values)
            .control_qid_shape(control_qid_shape)
            .build()
    }
}

impl PartialEq for ControlledGate {
    fn eq(&self, other: &Self) -> bool {
        self.sub_gate.as_ref() == other.sub_gate.as_ref()
            && self.control_values == other.control_values
            && self.control_qid_shape == other.control_qid_shape
    }
}

impl Eq for ControlledGate { }

impl fmt::Display for ControlledGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.control_values, self.sub_gate)
    }
}

impl fmt::Debug for ControlledGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trivial = self.control_values.is_trivial();
        let qubits =
            !self.control_qid_shape.is_empty()
            && self.control_qid_shape.iter().all(|d| *d == 2);
        if trivial && self.control_qid_shape == [2] {
            write!(f, "ControlledGate(sub_gate={:?})", self.sub_gate)
        } else if trivial && qubits {
            write!(f, "ControlledGate(sub_gate={:?}, num_controls={})",
                self.sub_gate, self.num_controls())
        } else {
            write!(f,
                "ControlledGate(sub_gate={:?}, control_values={:?}, control_qid_shape={:?})",
                self.sub_gate, self.control_values, self.control_qid_shape)
        }
    }
}

impl Gate for ControlledGate {
    fn qid_shape(&self) -> Vec<usize> {
        self.control_qid_shape.iter().copied()
            .chain(self.sub_gate.qid_shape())
            .collect()
    }

    fn unitary(&self) -> Option<nd::Array2<C64>> {
        self.canonical_operation().unitary()
    }

    fn has_unitary(&self) -> bool { self.sub_gate.has_unitary() }

    fn mixture(&self) -> Option<Vec<(f64, nd::Array2<C64>)>> {
        self.canonical_operation().mixture()
    }

    fn has_mixture(&self) -> bool { self.sub_gate.has_mixture() }

    fn decompose(&self, qudits: &[Qid], ctx: &DecompositionContext)
        -> GateResult<Option<Vec<Operation>>>
    {
        decompose_controlled(self, qudits, ctx)
    }

    fn is_parameterized(&self) -> bool { self.sub_gate.is_parameterized() }

    fn parameter_names(&self) -> HashSet<String> {
        self.sub_gate.parameter_names()
    }

    fn resolve_parameters(&self, resolver: &ParamResolver, recursive: bool)
        -> Box<dyn Gate>
    {
        let sub_gate = self.sub_gate.resolve_parameters(resolver, recursive);
        Box::new(self.rewrapped(sub_gate))
    }

    fn pow(&self, exponent: f64) -> Option<Box<dyn Gate>> {
        let sub_gate = self.sub_gate.pow(exponent)?;
        Self::builder_boxed(sub_gate)
            .control_values(self.control_values.clone())
            .control_qid_shape(self.control_qid_shape.iter().copied())
            .build()
            .ok()
            .map(|gate| Box::new(gate) as Box<dyn Gate>)
    }

    fn diagram_info(&self, args: &DiagramArgs) -> Option<DiagramInfo> {
        let sub_args = args.skip_qudits(self.num_controls());
        let sub_info = self.sub_gate.diagram_info(&sub_args)?;
        let wire_symbols: Vec<String> =
            self.control_values.wire_symbols().into_iter()
            .chain(sub_info.wire_symbols)
            .collect();
        Some(DiagramInfo { wire_symbols, exponent: sub_info.exponent })
    }

    fn on(&self, qudits: &[Qid]) -> GateResult<Operation> {
        ControlledGate::on(self, qudits).map(Operation::from)
    }
}
