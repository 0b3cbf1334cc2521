use std::f64::consts::PI;
use qudit_control::{
    control_values::{ ControlValues, ProductOfSums, SumOfProducts },
    controlled::ControlledGate,
    gate::{ DecompositionContext, DiagramArgs, Gate },
    gates::{ RzGate, XGate },
    param::ParamResolver,
    qid::Qid,
};

// conditions on qudits with more than two levels, and what they do to the
// unitary of a controlled gate
fn main() -> anyhow::Result<()> {
    // X on a qubit when the qutrit control is 0 or 2
    let gate =
        ControlledGate::builder(XGate)
        .control_values(ProductOfSums::from_sets([vec![0, 2]]))
        .control_qid_shape([3])
        .build()?;
    println!("gate = {}", gate);
    let u = gate.unitary().ok_or_else(|| anyhow::anyhow!("no unitary"))?;
    println!("unitary =\n{:.1}", u.mapv(|z| z.re));

    // an exclusive-or condition needs a sum of products
    let xor: ControlValues =
        SumOfProducts::from_assignments([vec![0, 1], vec![1, 0]])?.into();
    println!("xor = {}, accepts: {:?}", xor, xor.expand().collect::<Vec<_>>());
    let and: ControlValues = ProductOfSums::ones(2).into();
    let either = (&xor | &and)?;
    println!("xor | and = {}, accepts: {:?}", either, either.expand().collect::<Vec<_>>());
    let combined = &xor & &ControlValues::from(ProductOfSums::from_values([2]));
    println!("xor & C2 = {}", combined);

    // nested controls are flattened into a single gate
    let inner =
        ControlledGate::builder(RzGate::new("theta"))
        .control_values(xor)
        .build()?;
    let outer =
        ControlledGate::builder(inner)
        .control_values(ProductOfSums::from_values([2]))
        .control_qid_shape([3])
        .build()?;
    println!("outer = {}", outer);
    println!("control shape = {:?}", outer.control_qid_shape());
    let info =
        outer.diagram_info(&DiagramArgs::default())
        .ok_or_else(|| anyhow::anyhow!("no diagram info"))?;
    println!("wires = {:?}", info.wire_symbols);

    // symbols have to be resolved before there is anything to decompose
    let qudits = Qid::for_shape(&outer.qid_shape());
    let ctx = DecompositionContext::new();
    println!("decompose symbolic: {:?}", outer.decompose(&qudits, &ctx)?.map(|ops| ops.len()));
    let resolver: ParamResolver = [("theta", PI / 2.0)].into_iter().collect();
    let resolved = outer.resolve_parameters(&resolver, true);
    println!("resolved = {}", resolved);
    // a qutrit control rules out matrix-level synthesis
    println!("decompose resolved: {:?}", resolved.decompose(&qudits, &ctx)?.map(|ops| ops.len()));
    let u = resolved.unitary().ok_or_else(|| anyhow::anyhow!("no unitary"))?;
    println!("amplitude on ∣2,0,1,1⟩ = {:.3}", u[[19, 19]]);

    Ok(())
}
