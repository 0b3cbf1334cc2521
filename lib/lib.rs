//! This package provides controlled quantum gates over qudits: gates that act
//! on a set of target qudits only when a set of control qudits satisfies a
//! condition on their values.
//!
//! - [`control_values`] describes the conditions, either as one set of
//! accepted values per control qudit or as a disjunction of such
//! conjunctions.
//! - [`gate`] defines the capabilities a gate may offer through the [`Gate`]
//! trait, and binds gates to qudits as [`Operation`]s.
//! - [`controlled`] implements [`ControlledGate`], which wraps any gate with a
//! control condition, and rewrites it into simpler operations.
//! - [`gates`] and [`synthesis`] supply the concrete gates and the
//! multi-controlled rotation synthesis those rewrites emit.
//!
//! ```
//! use qudit_control::{
//!     control_values::ProductOfSums,
//!     controlled::ControlledGate,
//!     gate::{ DecompositionContext, Gate, Operation, decompose_all, unitary_of },
//!     gates::RyGate,
//!     linalg::allclose,
//!     qid::Qid,
//! };
//!
//! // Ry(0.5) on qubit 2, applied when qubit 0 is ∣0⟩ and qubit 1 is ∣1⟩
//! let gate =
//!     ControlledGate::builder(RyGate::new(0.5))
//!     .control_values(ProductOfSums::from_values([0, 1]))
//!     .build()
//!     .unwrap();
//! let qubits = Qid::qubits(3);
//! let op = Operation::from(gate.on(&qubits).unwrap());
//! let ops = decompose_all([op], &DecompositionContext::new()).unwrap();
//! let u = unitary_of(&ops, &qubits).unwrap();
//! assert!(allclose(&u, &gate.unitary().unwrap(), 1e-9));
//! ```
//!
//! # Further reading
//! - A. Barenco *et al.*, "Elementary gates for quantum computation."
//! [arXiv:quant-ph/9503016](https://arxiv.org/abs/quant-ph/9503016)
//! - M. A. Nielsen and I. L. Chuang, *Quantum Computation and Quantum
//! Information*, section 4.3.

pub mod qid;
pub mod param;
pub mod linalg;
pub mod control_values;
pub mod gate;
pub mod gates;
pub mod synthesis;
pub mod controlled;

pub use control_values::{ ControlValues, ProductOfSums, SumOfProducts };
pub use controlled::{ ControlledGate, ControlledOperation };
pub use gate::{ DecompositionContext, Gate, Operation };

pub extern crate num_complex;
/// Handy macro to create `num_complex::Complex64`s from more natural and
/// succinct syntax.
///
/// ```
/// use std::f64::consts::PI;
/// use num_complex::Complex64;
/// use qudit_control::c;
///
/// assert_eq!( c!(i (-1.0)),    Complex64::new(0.0, -1.0)      );
/// assert_eq!( c!(e PI),        Complex64::cis(PI)             );
/// assert_eq!( c!(1.0),         Complex64::new(1.0, 0.0)       );
/// assert_eq!( c!(1.0 + i 1.0), Complex64::new(1.0, 1.0)       );
/// assert_eq!( c!(1.0 - i 1.0), Complex64::new(1.0, -1.0)      );
/// assert_eq!( c!(1.0, 1.0),    Complex64::new(1.0, 1.0)       );
/// assert_eq!( c!(1.0, e PI),   Complex64::from_polar(1.0, PI) );
/// ```
#[macro_export]
macro_rules! c {
    ( i $im:expr )
        => { $crate::num_complex::Complex64::new(0.0, $im) };
    ( e $ph:expr )
        => { $crate::num_complex::Complex64::cis($ph) };
    ( $re:expr )
        => { $crate::num_complex::Complex64::new($re, 0.0) };
    ( $re:literal + i $im:literal )
        => { $crate::num_complex::Complex64::new($re, $im) };
    ( $re:literal - i $im:literal )
        => { $crate::num_complex::Complex64::new($re, -$im) };
    ( $r:expr, e $ph:expr )
        => { $crate::num_complex::Complex64::from_polar($r, $ph) };
    ( $re:expr, $im:expr )
        => { $crate::num_complex::Complex64::new($re, $im) };
}
