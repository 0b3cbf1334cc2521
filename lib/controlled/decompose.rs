//! Rewriting of controlled gates into simpler operations.
//!
//! Strategies are tried in order, and the first that applies wins:
//!
//! 1. a specialized controlled form offered by the sub-gate itself (e.g. `X`
//!    under a single qubit control becomes `CX`);
//! 2. decomposing the sub-gate and controlling every resulting operation,
//!    with global phases extracted so that they become controlled phases;
//! 3. when every qudit is a qubit and the sub-gate has a unitary:
//!    - a diagonal phase gate if the sub-gate acts on no qudits;
//!    - multi-controlled single-qubit synthesis for a single-qubit sub-gate
//!      under a product-of-sums condition, with `X` flips around controls
//!      that accept only 0 and controls that accept anything dropped.

use tracing::debug;
use crate::{
    control_values::ControlValues,
    gate::{
        DecompositionContext,
        Gate,
        GateResult,
        Operation,
        validate_qudits,
    },
    gates::{ DiagonalGate, XGate },
    linalg,
    qid::Qid,
};
use super::ControlledGate;

/// Decompose `gate` applied to `qudits` one level.
///
/// Returns `Ok(None)` if no strategy applies.
pub fn decompose_controlled(
    gate: &ControlledGate,
    qudits: &[Qid],
    ctx: &DecompositionContext,
) -> GateResult<Option<Vec<Operation>>>
{
    validate_qudits(gate, qudits)?;
    let (controls, targets) = qudits.split_at(gate.num_controls());
    let sub_gate = gate.sub_gate();

    if let Some(native) =
        sub_gate.controlled(
            gate.num_controls(),
            gate.control_values(),
            gate.control_qid_shape(),
        )
    {
        if native.as_ref() != gate as &dyn Gate {
            debug!(gate = %gate, native = %native, "using native controlled form");
            return Ok(Some(vec![native.on(qudits)?]));
        }
    }

    if let Some(sub_ops) =
        sub_gate.decompose(targets, &ctx.extracting_global_phases())?
    {
        debug!(gate = %gate, num_ops = sub_ops.len(), "controlling sub-gate decomposition");
        let ops: Vec<Operation> =
            sub_ops.iter()
            .map(|op| {
                op.controlled_by(controls, Some(gate.control_values().clone()))
            })
            .collect::<GateResult<_>>()?;
        return Ok(Some(ops));
    }

    if !qudits.iter().all(|q| q.dimension() == 2) { return Ok(None); }
    let Some(u) = sub_gate.unitary() else { return Ok(None); };

    match (sub_gate.num_qudits(), gate.control_values()) {
        (0, cv) => {
            let angle = u[[0, 0]].arg();
            let shape = gate.control_qid_shape();
            let mut angles: Vec<f64> = vec![0.0; shape.iter().product()];
            cv.expand()
                .for_each(|hot| { angles[linalg::flat_index(&hot, shape)] = angle; });
            debug!(gate = %gate, angle, "controlled global phase as diagonal");
            let diag = DiagonalGate::new(angles)?;
            Ok(Some(vec![diag.on(qudits)?]))
        },
        (1, ControlValues::Product(pos)) => {
            let mut flips: Vec<Operation> = Vec::new();
            let mut active: Vec<Qid> = Vec::new();
            for (vals, qudit) in pos.iter().zip(controls) {
                match vals.as_slice() {
                    [] => {
                        debug!(gate = %gate, %qudit, "unsatisfiable control");
                        return Ok(Some(Vec::new()));
                    },
                    [0] => {
                        flips.push(XGate.on(&[*qudit])?);
                        active.push(*qudit);
                    },
                    [0, 1] => { },
                    _ => { active.push(*qudit); },
                }
            }
            debug!(
                gate = %gate,
                num_flips = flips.len(),
                num_active = active.len(),
                "synthesizing multi-controlled single-qubit unitary"
            );
            let synthesized =
                ctx.synthesizer().synthesize(&u, &active, targets[0], ctx.atol())?;
            let ops: Vec<Operation> =
                flips.iter().cloned()
                .chain(synthesized)
                .chain(flips.iter().cloned())
                .collect();
            Ok(Some(ops))
        },
        _ => Ok(None),
    }
}
