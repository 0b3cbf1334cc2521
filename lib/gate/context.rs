use std::{ fmt, sync::Arc };
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{ qid::Qid, synthesis::MultiControlledRotation };
use super::{ GateResult, Operation };

/// Synthesis of a single-qubit unitary controlled by any number of qubits,
/// each of which must be in state ∣1⟩ for the unitary to act.
pub trait RotationSynthesis: fmt::Debug + Send + Sync {
    /// Return a sequence of operations implementing the 2×2 unitary `matrix`
    /// on `target`, controlled by every qubit in `controls`.
    ///
    /// Rotations whose angles are within `atol` of zero may be left out.
    fn synthesize(
        &self,
        matrix: &nd::Array2<C64>,
        controls: &[Qid],
        target: Qid,
        atol: f64,
    ) -> GateResult<Vec<Operation>>;
}

/// Settings and collaborators shared by a decomposition.
#[derive(Clone, Debug)]
pub struct DecompositionContext {
    extract_global_phases: bool,
    atol: f64,
    synthesizer: Arc<dyn RotationSynthesis>,
}

impl Default for DecompositionContext {
    fn default() -> Self {
        Self {
            extract_global_phases: false,
            atol: 1e-10,
            synthesizer: Arc::new(MultiControlledRotation),
        }
    }
}

impl DecompositionContext {
    /// Create a new context with default settings.
    pub fn new() -> Self { Self::default() }

    /// Set the synthesizer used for multi-controlled single-qubit unitaries.
    pub fn with_synthesizer<S>(mut self, synthesizer: S) -> Self
    where S: RotationSynthesis + 'static
    {
        self.synthesizer = Arc::new(synthesizer);
        self
    }

    /// Set the numerical tolerance below which angles are treated as zero.
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// Return a copy of `self` that requests global phases to be emitted as
    /// separate operations.
    pub fn extracting_global_phases(&self) -> Self {
        Self { extract_global_phases: true, ..self.clone() }
    }

    /// Return `true` if global phases should be emitted as separate
    /// operations.
    pub fn extract_global_phases(&self) -> bool { self.extract_global_phases }

    /// Return the numerical tolerance.
    pub fn atol(&self) -> f64 { self.atol }

    /// Return the synthesizer for multi-controlled single-qubit unitaries.
    pub fn synthesizer(&self) -> &dyn RotationSynthesis { self.synthesizer.as_ref() }
}

/// Decompose every operation in `ops` recursively, depth-first, until no
/// operation can be decomposed further.
pub fn decompose_all<I>(ops: I, ctx: &DecompositionContext)
    -> GateResult<Vec<Operation>>
where I: IntoIterator<Item = Operation>
{
    let mut out: Vec<Operation> = Vec::new();
    let mut stack: Vec<Operation> = ops.into_iter().collect();
    stack.reverse();
    while let Some(op) = stack.pop() {
        match op.decompose(ctx)? {
            Some(sub) => { stack.extend(sub.into_iter().rev()); },
            None => { out.push(op); },
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use super::*;
    use crate::{
        control_values::ProductOfSums,
        controlled::ControlledGate,
        gate::Gate,
        gates::{ CXGate, RyGate, RzGate, XGate },
    };

    // counts the controls it is given and emits nothing
    #[derive(Debug)]
    struct Recorder(Arc<AtomicUsize>);

    impl RotationSynthesis for Recorder {
        fn synthesize(&self, _: &nd::Array2<C64>, controls: &[Qid], _: Qid, _: f64)
            -> GateResult<Vec<Operation>>
        {
            self.0.fetch_add(controls.len(), Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[test]
    fn settings() {
        let ctx = DecompositionContext::new().with_atol(1e-6);
        assert!(!ctx.extract_global_phases());
        assert_eq!(ctx.atol(), 1e-6);
        let extracting = ctx.extracting_global_phases();
        assert!(extracting.extract_global_phases());
        assert_eq!(extracting.atol(), 1e-6);
        assert!(!ctx.extract_global_phases());
    }

    #[test]
    fn injected_synthesizer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx =
            DecompositionContext::new()
            .with_synthesizer(Recorder(calls.clone()));
        let gate =
            ControlledGate::builder(RyGate::new(0.5))
            .control_values(ProductOfSums::from_sets([vec![1], vec![0, 1], vec![0]]))
            .build()
            .unwrap();
        let qubits = Qid::qubits(4);
        let ops = gate.decompose(&qubits, &ctx).unwrap().unwrap();
        // two controls reach the synthesizer; the flips on qubit 2 remain
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|op| op.gate().is::<XGate>() && op.qudits() == &qubits[2..3]));
    }

    #[test]
    fn decompose_all_keeps_order() {
        let qubits = Qid::qubits(2);
        let ops = vec![
            RzGate::new(0.1).on(&qubits[..1]).unwrap(),
            ControlledGate::new(XGate).unwrap().on(&qubits).unwrap().into(),
            RyGate::new(0.2).on(&qubits[1..]).unwrap(),
        ];
        let out = decompose_all(ops, &DecompositionContext::new()).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].gate().is::<RzGate>());
        assert!(out[1].gate().is::<CXGate>());
        assert!(out[2].gate().is::<RyGate>());
        assert!(decompose_all(Vec::new(), &DecompositionContext::new()).unwrap().is_empty());
    }
}
