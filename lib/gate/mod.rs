//! The capability surface of a quantum gate.
//!
//! Gates are consumed through the [`Gate`] trait: every capability a
//! controlled gate needs from its sub-gate (qudit shape, unitary or mixture,
//! decomposition, parameters, exponentiation, native controlled forms, diagram
//! metadata) is a trait method with a default meaning "unsupported". Gates are
//! held as `Box<dyn Gate>` and compared, hashed and cloned through
//! [`GateBase`], which is implemented automatically for every
//! `Gate + Clone + PartialEq + Hash` type.

use std::{
    any::{ Any, TypeId },
    fmt,
    hash::{ Hash, Hasher },
};
use ndarray as nd;
use num_complex::Complex64 as C64;
use rustc_hash::FxHashSet as HashSet;
use thiserror::Error;
use crate::{
    control_values::{ ControlValues, ControlValuesError },
    param::{ Param, ParamResolver },
    qid::Qid,
};

#[derive(Debug, Error)]
pub enum GateError {
    #[error("cannot control measurement {0}")]
    MeasurementSubGate(String),

    #[error("cannot control channel with non-unitary operators: {0}")]
    NonUnitarySubGate(String),

    #[error("control values cover {num_qudits} qudit(s), but num_controls is {num_controls}")]
    NumControlsMismatch { num_controls: usize, num_qudits: usize },

    #[error("control qid shape has length {len}, but num_controls is {num_controls}")]
    QidShapeMismatch { num_controls: usize, len: usize },

    #[error("qudit {position} of {gate} has dimension 0")]
    ZeroDimension { gate: String, position: usize },

    #[error("applied a gate to an empty set of qudits: {0}")]
    EmptyApplication(String),

    #[error("gate {gate} acts on {expected} qudit(s), but was applied to {got}")]
    WrongQuditCount { gate: String, expected: usize, got: usize },

    #[error("gate {gate} expects qudit {position} to have dimension {expected}, but {qid} has {got}")]
    WrongDimension { gate: String, position: usize, qid: Qid, expected: usize, got: usize },

    #[error("diagonal gate needs a power-of-two number of angles, but got {0}")]
    BadDiagonal(usize),

    #[error("control values error: {0}")]
    ControlValues(#[from] ControlValuesError),
}
pub type GateResult<T> = Result<T, GateError>;

pub(crate) mod operation;
pub use operation::*;

pub(crate) mod context;
pub use context::*;

/// Options passed to [`Gate::diagram_info`].
#[derive(Clone, Debug, PartialEq)]
pub struct DiagramArgs {
    /// The number of qudits the gate is drawn across, if known.
    pub known_qudit_count: Option<usize>,
    /// The qudits the gate is drawn across, if known.
    pub known_qudits: Option<Vec<Qid>>,
    /// Whether non-ASCII symbols may be used.
    pub use_unicode_characters: bool,
    /// Number of digits to print for numeric parameters.
    pub precision: Option<usize>,
}

impl Default for DiagramArgs {
    fn default() -> Self {
        Self {
            known_qudit_count: None,
            known_qudits: None,
            use_unicode_characters: true,
            precision: Some(3),
        }
    }
}

impl DiagramArgs {
    /// Return a copy of `self` describing only the qudits after the first
    /// `n`.
    pub fn skip_qudits(&self, n: usize) -> Self {
        Self {
            known_qudit_count:
                self.known_qudit_count.map(|k| k.saturating_sub(n)),
            known_qudits:
                self.known_qudits.as_ref()
                .map(|qids| qids.iter().skip(n).copied().collect()),
            use_unicode_characters: self.use_unicode_characters,
            precision: self.precision,
        }
    }

    /// Format a parameter according to `self.precision`.
    pub fn format_param(&self, param: &Param) -> String {
        match (param, self.precision) {
            (Param::Value(x), Some(p)) => format!("{:.*}", p, x),
            _ => param.to_string(),
        }
    }
}

/// Symbols used to draw a gate in a circuit diagram.
#[derive(Clone, Debug, PartialEq)]
pub struct DiagramInfo {
    /// One symbol per qudit wire.
    pub wire_symbols: Vec<String>,
    /// Exponent drawn next to the gate.
    pub exponent: Param,
}

impl DiagramInfo {
    /// Create a new `DiagramInfo` with unit exponent.
    pub fn new<I, S>(wire_symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            wire_symbols: wire_symbols.into_iter().map(|s| s.into()).collect(),
            exponent: Param::Value(1.0),
        }
    }

    /// Set the exponent.
    pub fn with_exponent(mut self, exponent: Param) -> Self {
        self.exponent = exponent;
        self
    }
}

/// Object-safe plumbing for [`Gate`] trait objects.
///
/// This is implemented automatically for every `'static` type implementing
/// `Gate + Clone + PartialEq + Hash`; there is no need to implement it by
/// hand.
pub trait GateBase {
    /// Upcast to [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Clone into a new box.
    fn clone_gate(&self) -> Box<dyn Gate>;

    /// Return `true` if `other` has the same concrete type as `self` and
    /// compares equal.
    fn eq_gate(&self, other: &dyn Gate) -> bool;

    /// Feed the concrete type and value of `self` to `state`.
    fn hash_gate(&self, state: &mut dyn Hasher);
}

impl<T> GateBase for T
where T: Gate + Clone + PartialEq + Hash + 'static
{
    fn as_any(&self) -> &dyn Any { self }

    fn clone_gate(&self) -> Box<dyn Gate> { Box::new(self.clone()) }

    fn eq_gate(&self, other: &dyn Gate) -> bool {
        other.as_any().downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn hash_gate(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// A quantum gate acting on a fixed register of qudits.
///
/// Every method besides [`qid_shape`][Gate::qid_shape] has a default
/// describing a gate that supports nothing; `None` is the "unsupported"
/// signal, never an error.
pub trait Gate: GateBase + fmt::Debug + fmt::Display + Send + Sync {
    /// Return the dimensions of the qudits `self` acts on.
    fn qid_shape(&self) -> Vec<usize>;

    /// Return the number of qudits `self` acts on.
    fn num_qudits(&self) -> usize { self.qid_shape().len() }

    /// Return `true` if `self` is a measurement.
    fn is_measurement(&self) -> bool { false }

    /// Return the unitary matrix of `self`, if it has one.
    fn unitary(&self) -> Option<nd::Array2<C64>> { None }

    /// Return `true` if `self` has a unitary matrix.
    fn has_unitary(&self) -> bool { self.unitary().is_some() }

    /// Return `self` as a probabilistic mixture of unitaries, if possible.
    fn mixture(&self) -> Option<Vec<(f64, nd::Array2<C64>)>> {
        self.unitary().map(|u| vec![(1.0, u)])
    }

    /// Return `true` if `self` is a probabilistic mixture of unitaries.
    fn has_mixture(&self) -> bool { self.has_unitary() }

    /// Decompose `self`, applied to `qudits`, into a sequence of simpler
    /// operations.
    ///
    /// `Ok(None)` means `self` cannot be decomposed further.
    fn decompose(&self, qudits: &[Qid], ctx: &DecompositionContext)
        -> GateResult<Option<Vec<Operation>>>
    {
        let _ = (qudits, ctx);
        Ok(None)
    }

    /// Return `true` if `self` depends on unresolved symbols.
    fn is_parameterized(&self) -> bool { false }

    /// Return the names of all unresolved symbols `self` depends on.
    fn parameter_names(&self) -> HashSet<String> { HashSet::default() }

    /// Return a copy of `self` with symbols replaced according to
    /// `resolver`.
    fn resolve_parameters(&self, resolver: &ParamResolver, recursive: bool)
        -> Box<dyn Gate>
    {
        let _ = (resolver, recursive);
        self.clone_gate()
    }

    /// Raise `self` to a power.
    fn pow(&self, exponent: f64) -> Option<Box<dyn Gate>> {
        let _ = exponent;
        None
    }

    /// Return a specialized gate implementing `self` controlled by
    /// `num_controls` qudits with the given condition and shape, if `self`
    /// has one.
    fn controlled(
        &self,
        num_controls: usize,
        control_values: &ControlValues,
        control_qid_shape: &[usize],
    ) -> Option<Box<dyn Gate>>
    {
        let _ = (num_controls, control_values, control_qid_shape);
        None
    }

    /// Return the symbols used to draw `self` in a circuit diagram.
    fn diagram_info(&self, args: &DiagramArgs) -> Option<DiagramInfo> {
        let _ = args;
        None
    }

    /// Apply `self` to a register of qudits.
    fn on(&self, qudits: &[Qid]) -> GateResult<Operation> {
        Operation::new(self.clone_gate(), qudits.to_vec())
    }
}

impl Clone for Box<dyn Gate> {
    fn clone(&self) -> Self { self.clone_gate() }
}

impl PartialEq for dyn Gate + '_ {
    fn eq(&self, other: &Self) -> bool { self.eq_gate(other) }
}

impl Eq for dyn Gate + '_ { }

impl Hash for dyn Gate + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) { self.hash_gate(state); }
}

impl dyn Gate + '_ {
    /// Attempt to downcast to a concrete gate type.
    pub fn downcast_ref<T: Gate + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Return `true` if the concrete type of `self` is `T`.
    pub fn is<T: Gate + 'static>(&self) -> bool { self.as_any().is::<T>() }
}

/// Check that `qudits` match the qudit shape of `gate`.
pub fn validate_qudits(gate: &dyn Gate, qudits: &[Qid]) -> GateResult<()> {
    let shape = gate.qid_shape();
    if shape.len() != qudits.len() {
        return Err(GateError::WrongQuditCount {
            gate: gate.to_string(),
            expected: shape.len(),
            got: qudits.len(),
        });
    }
    for (position, (qid, dim)) in qudits.iter().zip(&shape).enumerate() {
        if qid.dimension() != *dim {
            return Err(GateError::WrongDimension {
                gate: gate.to_string(),
                position,
                qid: *qid,
                expected: *dim,
                got: qid.dimension(),
            });
        }
    }
    Ok(())
}
