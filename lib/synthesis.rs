//! Synthesis of multi-controlled single-qubit unitaries into rotations, phase
//! shifts and CNOTs.
//!
//! The construction follows Barenco *et al.*, "Elementary gates for quantum
//! computation." [Phys. Rev. A **52**, 3457](https://arxiv.org/abs/quant-ph/9503016):
//!
//! - with one control, `U = exp(iα) A X B X C` with `ABC = I` (lemma 5.1 and
//!   corollary 5.3), using two CNOTs and a phase shift on the control;
//! - with `n > 1` controls, `C^n(U)` is built from `C(V)`, `C(V†)`,
//!   `C^{n-1}(V)` and two `C^{n-1}(X)`, where `V² = U` (lemma 7.5);
//! - each `C^{n-1}(X)` borrows the idle qubits of the register and costs a
//!   number of Toffolis linear in `n` (lemmas 7.2 and 7.3), so the whole
//!   circuit has `O(n²)` gates.

use std::iter;
use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::{ debug, trace };
use crate::{
    c,
    gate::{ Gate, GateResult, Operation, RotationSynthesis },
    gates::{ CXGate, MatrixGate, PhaseShiftGate, RyGate, RzGate, XGate },
    linalg::{ self, Zyz },
    qid::Qid,
};

/// Default [`RotationSynthesis`] using the construction of Barenco *et al.*
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MultiControlledRotation;

impl RotationSynthesis for MultiControlledRotation {
    fn synthesize(
        &self,
        matrix: &nd::Array2<C64>,
        controls: &[Qid],
        target: Qid,
        atol: f64,
    ) -> GateResult<Vec<Operation>>
    {
        debug!(num_controls = controls.len(), %target, "synthesizing controlled rotation");
        let mut emitter = Emitter { atol, ops: Vec::new() };
        emitter.controlled_rotation(matrix, controls, target, &[])?;
        Ok(emitter.ops)
    }
}

fn pauli_x() -> nd::Array2<C64> {
    nd::array![[c!(0.0), c!(1.0)], [c!(1.0), c!(0.0)]]
}

// accumulates operations; rotations with angles within `atol` of zero are
// left out
struct Emitter {
    atol: f64,
    ops: Vec<Operation>,
}

impl Emitter {
    fn rotation<G>(&mut self, gate: G, angle: f64, qudit: Qid) -> GateResult<()>
    where G: Gate
    {
        if angle.abs() > self.atol {
            self.ops.push(gate.on(&[qudit])?);
        }
        Ok(())
    }

    fn cnot(&mut self, control: Qid, target: Qid) -> GateResult<()> {
        self.ops.push(CXGate.on(&[control, target])?);
        Ok(())
    }

    // `borrowed` qubits may be in any state and are returned unchanged
    fn controlled_rotation(
        &mut self,
        u: &nd::Array2<C64>,
        controls: &[Qid],
        target: Qid,
        borrowed: &[Qid],
    ) -> GateResult<()>
    {
        match controls {
            [] => {
                trace!(%target, "bare single-qubit unitary");
                if let Some(gate) = MatrixGate::single_qubit(u.clone()) {
                    self.ops.push(gate.on(&[target])?);
                }
            },
            [control] => {
                if linalg::allclose(u, &pauli_x(), self.atol) {
                    trace!(%control, %target, "CNOT");
                    self.cnot(*control, target)?;
                } else {
                    trace!(%control, %target, "ABC decomposition");
                    self.abc(u, *control, target)?;
                }
            },
            [rest @ .., last] => {
                trace!(num_controls = controls.len(), %target, "square-root step");
                let v = linalg::sqrt_2x2(u);
                let v_dag = linalg::dagger(&v);
                let spare: Vec<Qid> =
                    iter::once(target).chain(borrowed.iter().copied()).collect();
                self.controlled_rotation(&v, &[*last], target, &[])?;
                self.multi_controlled_x(rest, *last, &spare)?;
                self.controlled_rotation(&v_dag, &[*last], target, &[])?;
                self.multi_controlled_x(rest, *last, &spare)?;
                let freed: Vec<Qid> =
                    iter::once(*last).chain(borrowed.iter().copied()).collect();
                self.controlled_rotation(&v, rest, target, &freed)?;
            },
        }
        Ok(())
    }

    // U = exp(iα) Rz(β) Ry(γ) Rz(δ) = exp(iα) A X B X C, with
    //   A = Rz(β) Ry(γ/2)
    //   B = Ry(-γ/2) Rz(-(δ + β)/2)
    //   C = Rz((δ - β)/2)
    fn abc(&mut self, u: &nd::Array2<C64>, control: Qid, target: Qid)
        -> GateResult<()>
    {
        let Zyz { alpha, beta, gamma, delta } = Zyz::from_unitary(u);
        let c_angle = (delta - beta) / 2.0;
        let b_angle = -(delta + beta) / 2.0;
        self.rotation(RzGate::new(c_angle), c_angle, target)?;
        self.cnot(control, target)?;
        self.rotation(RzGate::new(b_angle), b_angle, target)?;
        self.rotation(RyGate::new(-gamma / 2.0), gamma / 2.0, target)?;
        self.cnot(control, target)?;
        self.rotation(RyGate::new(gamma / 2.0), gamma / 2.0, target)?;
        self.rotation(RzGate::new(beta), beta, target)?;
        self.rotation(PhaseShiftGate::new(alpha), alpha, control)?;
        Ok(())
    }

    fn toffoli(&mut self, c0: Qid, c1: Qid, target: Qid) -> GateResult<()> {
        self.controlled_rotation(&pauli_x(), &[c0, c1], target, &[])
    }

    // X on `target` when every control is ∣1⟩, using `borrowed` qubits as
    // dirty workspace
    fn multi_controlled_x(&mut self, controls: &[Qid], target: Qid, borrowed: &[Qid])
        -> GateResult<()>
    {
        let m = controls.len();
        match (m, borrowed) {
            (0, _) => {
                self.ops.push(XGate.on(&[target])?);
            },
            (1, _) => {
                self.cnot(controls[0], target)?;
            },
            (2, _) => {
                self.toffoli(controls[0], controls[1], target)?;
            },
            (_, []) => {
                self.controlled_rotation(&pauli_x(), controls, target, &[])?;
            },
            (_, a) if a.len() + 2 >= m => {
                // lemma 7.2: a ladder of Toffolis through m - 2 borrowed
                // qubits, run twice
                trace!(num_controls = m, %target, "Toffoli ladder");
                let top = [controls[m - 1], a[m - 3], target];
                let ladder: Vec<[Qid; 3]> =
                    (0..m - 3)
                    .map(|i| [controls[m - 2 - i], a[m - 4 - i], a[m - 3 - i]])
                    .collect();
                let bottom = [controls[0], controls[1], a[0]];
                for _ in 0..2 {
                    self.toffoli(top[0], top[1], top[2])?;
                    for [c0, c1, t] in ladder.iter()
                        .chain(iter::once(&bottom))
                        .chain(ladder.iter().rev())
                    {
                        self.toffoli(*c0, *c1, *t)?;
                    }
                }
            },
            (_, a) => {
                // lemma 7.3: split the controls in two around one borrowed
                // qubit; each half then has enough idle qubits for a ladder
                trace!(num_controls = m, %target, "split");
                let m1 = (m + 1 + a.len()) / 2;
                let (head, tail) = controls.split_at(m1);
                let pivot = a[0];
                let free_head: Vec<Qid> =
                    tail.iter().copied()
                    .chain(iter::once(target))
                    .chain(a[1..].iter().copied())
                    .collect();
                let controls_tail: Vec<Qid> =
                    tail.iter().copied().chain(iter::once(pivot)).collect();
                let free_tail: Vec<Qid> =
                    head.iter().copied().chain(a[1..].iter().copied()).collect();
                for _ in 0..2 {
                    self.multi_controlled_x(head, pivot, &free_head)?;
                    self.multi_controlled_x(&controls_tail, target, &free_tail)?;
                }
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{ FRAC_1_SQRT_2, PI };
    use rand::{ Rng, SeedableRng, rngs::StdRng };
    use super::*;
    use crate::{
        control_values::{ ControlValues, ProductOfSums },
        gate::unitary_of,
        linalg::{ allclose, controlled_embedding, embed },
    };

    const ATOL: f64 = 1e-9;
    const SYNTH_ATOL: f64 = 1e-12;

    fn random_unitary(rng: &mut StdRng) -> nd::Array2<C64> {
        let zyz = Zyz {
            alpha: rng.gen_range(-PI..PI),
            beta: rng.gen_range(-PI..PI),
            gamma: rng.gen_range(0.0..PI),
            delta: rng.gen_range(-PI..PI),
        };
        zyz.to_unitary()
    }

    fn synthesize(u: &nd::Array2<C64>, num_controls: usize) -> Vec<Operation> {
        let qubits = Qid::qubits(num_controls + 1);
        let (controls, target) = qubits.split_at(num_controls);
        MultiControlledRotation.synthesize(u, controls, target[0], SYNTH_ATOL)
            .unwrap()
    }

    fn check(u: &nd::Array2<C64>, num_controls: usize) {
        let qubits = Qid::qubits(num_controls + 1);
        let ops = synthesize(u, num_controls);
        let cv: ControlValues = ProductOfSums::ones(num_controls).into();
        let expected = controlled_embedding(&vec![2; num_controls], &cv, u);
        let actual = unitary_of(&ops, &qubits).unwrap();
        assert!(allclose(&actual, &expected, ATOL));
    }

    // controls, then the target, then borrowed qubits that must come back
    // untouched whatever their state
    fn check_multi_controlled_x(num_controls: usize, num_borrowed: usize) {
        let qubits = Qid::qubits(num_controls + 1 + num_borrowed);
        let (controls, rest) = qubits.split_at(num_controls);
        let (target, borrowed) = rest.split_at(1);
        let mut emitter = Emitter { atol: SYNTH_ATOL, ops: Vec::new() };
        emitter.multi_controlled_x(controls, target[0], borrowed).unwrap();
        let cv: ControlValues = ProductOfSums::ones(num_controls).into();
        let cx = controlled_embedding(&vec![2; num_controls], &cv, &pauli_x());
        let positions: Vec<usize> = (0..num_controls + 1).collect();
        let expected = embed(&cx, &positions, &vec![2; qubits.len()]);
        let actual = unitary_of(&emitter.ops, &qubits).unwrap();
        assert!(allclose(&actual, &expected, ATOL));
    }

    #[test]
    fn no_controls() {
        let r = FRAC_1_SQRT_2;
        let h = nd::array![[c!(r), c!(r)], [c!(r), c!(-r)]];
        let ops = synthesize(&h, 0);
        assert_eq!(ops.len(), 1);
        assert!(ops[0].gate().is::<MatrixGate>());
        check(&h, 0);
    }

    #[test]
    fn single_control_x_is_cnot() {
        let ops = synthesize(&pauli_x(), 1);
        assert_eq!(ops.len(), 1);
        assert!(ops[0].gate().is::<CXGate>());
    }

    #[test]
    fn single_control() {
        let r = FRAC_1_SQRT_2;
        check(&nd::array![[c!(r), c!(r)], [c!(r), c!(-r)]], 1);
        check(&nd::array![[c!(1.0), c!(0.0)], [c!(0.0), c!(i 1.0)]], 1);
        let mut rng = StdRng::seed_from_u64(10546);
        (0..10).for_each(|_| check(&random_unitary(&mut rng), 1));
    }

    #[test]
    fn many_controls() {
        check(&pauli_x(), 2);
        check(&pauli_x(), 3);
        check(&pauli_x(), 4);
        let mut rng = StdRng::seed_from_u64(10547);
        (0..3).for_each(|_| check(&random_unitary(&mut rng), 2));
        check(&random_unitary(&mut rng), 3);
        check(&random_unitary(&mut rng), 4);
    }

    #[test]
    fn toffoli_ladder() {
        // enough borrowed qubits for a single ladder
        check_multi_controlled_x(3, 1);
        check_multi_controlled_x(4, 2);
    }

    #[test]
    fn split_around_borrowed_qubit() {
        // one borrowed qubit for four controls needs the split
        check_multi_controlled_x(4, 1);
    }

    #[test]
    fn no_borrowed_qubits() {
        check_multi_controlled_x(3, 0);
    }

    #[test]
    fn gate_count_is_quadratic() {
        let mut rng = StdRng::seed_from_u64(10548);
        let u = random_unitary(&mut rng);
        for n in 2..=10 {
            let count = synthesize(&u, n).len();
            assert!(count <= 250 * n * n, "{} controls: {} operations", n, count);
        }
    }

    #[test]
    fn tolerance_drops_small_rotations() {
        let u = Zyz { alpha: 0.0, beta: 1e-8, gamma: 0.5, delta: 0.0 }
            .to_unitary();
        let qubits = Qid::qubits(2);
        let coarse =
            MultiControlledRotation.synthesize(&u, &qubits[..1], qubits[1], 1e-6)
            .unwrap();
        let fine =
            MultiControlledRotation.synthesize(&u, &qubits[..1], qubits[1], 1e-12)
            .unwrap();
        assert!(coarse.len() < fine.len());
        assert!(coarse.iter().all(|op| !op.gate().is::<RzGate>()));
    }
}
