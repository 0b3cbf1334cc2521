use std::{
    f64::consts::PI,
    time::Instant,
};
use itertools::Itertools;
use rand::{ thread_rng, Rng };
use rustc_hash::FxHashMap as HashMap;
use qudit_control::{
    control_values::ProductOfSums,
    controlled::ControlledGate,
    gate::{ DecompositionContext, Gate, Operation, decompose_all, unitary_of },
    gates::MatrixGate,
    linalg::{ Zyz, allclose },
    qid::Qid,
};

fn timeit<F, T>(mut f: F) -> (T, f64)
where F: FnMut() -> T
{
    let t0 = Instant::now();
    let out: T = f();
    (out, (Instant::now() - t0).as_secs_f64())
}

// decompose a random single-qubit unitary under a mix of control conditions
// into rotations, phase shifts and CNOTs, and check the result
//
//   q0 ---(0)---
//   q1 ----@----
//   q2 --(0,1)--
//   q3 ----@----
//   q4 ----U----
//
fn main() -> anyhow::Result<()> {
    let mut rng = thread_rng();
    let u =
        Zyz {
            alpha: rng.gen_range(-PI..PI),
            beta: rng.gen_range(-PI..PI),
            gamma: rng.gen_range(0.0..PI),
            delta: rng.gen_range(-PI..PI),
        }
        .to_unitary();
    let sub_gate = MatrixGate::single_qubit(u)
        .ok_or_else(|| anyhow::anyhow!("bad matrix"))?;
    let gate =
        ControlledGate::builder(sub_gate)
        .control_values(ProductOfSums::from_sets([
            vec![0], vec![1], vec![0, 1], vec![1],
        ]))
        .build()?;
    println!("gate = {}", gate);
    println!("{:?}", gate);

    let qubits = Qid::qubits(gate.num_qudits());
    let op = Operation::from(gate.on(&qubits)?);
    let ctx = DecompositionContext::new().extracting_global_phases();

    print!("decompose ... ");
    let (res, t) = timeit(|| decompose_all([op.clone()], &ctx));
    println!("{:.3e} secs", t);
    let ops = res?;

    let mut counts: HashMap<String, usize> = HashMap::default();
    for op in ops.iter() {
        let name = op.gate().to_string();
        let label = name.split('(').next().unwrap_or("").to_string();
        *counts.entry(label).or_default() += 1;
    }
    println!("{} operations:", ops.len());
    counts.iter()
        .sorted()
        .for_each(|(label, n)| println!("  {:>12}: {}", label, n));

    print!("compare unitaries ... ");
    let (res, t) = timeit(|| {
        unitary_of(&ops, &qubits)
            .zip(gate.unitary())
            .map(|(actual, expected)| allclose(&actual, &expected, 1e-9))
    });
    println!("{:.3e} secs", t);
    println!("equal: {:?}", res);

    Ok(())
}
