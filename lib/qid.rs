//! Qudit identifiers.

use std::fmt;

/// A single qudit on a line, identified by its index and carrying its
/// dimension (the number of levels it has).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qid {
    index: usize,
    dimension: usize,
}

impl Qid {
    /// Create a new qudit with index `index` and `dimension` levels.
    ///
    /// *Panics if `dimension` is zero.*
    pub fn new(index: usize, dimension: usize) -> Self {
        assert!(dimension > 0, "Qid::new: a qudit needs at least one level");
        Self { index, dimension }
    }

    /// Like [`new`][Self::new], returning `None` if `dimension` is zero.
    pub fn try_new(index: usize, dimension: usize) -> Option<Self> {
        (dimension > 0).then_some(Self { index, dimension })
    }

    /// Create a new two-level qudit.
    pub fn qubit(index: usize) -> Self { Self::new(index, 2) }

    /// Return the index of `self`.
    pub fn index(&self) -> usize { self.index }

    /// Return the dimension of `self`.
    pub fn dimension(&self) -> usize { self.dimension }

    /// Create a line of `n` qubits, indexed from 0.
    pub fn qubits(n: usize) -> Vec<Self> { (0..n).map(Self::qubit).collect() }

    /// Create a line of qudits, indexed from 0, with dimensions given by
    /// `shape`.
    ///
    /// *Panics if any dimension is zero.*
    pub fn for_shape(shape: &[usize]) -> Vec<Self> {
        shape.iter().enumerate()
            .map(|(k, d)| Self::new(k, *d))
            .collect()
    }
}

impl fmt::Display for Qid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dimension == 2 {
            write!(f, "q({})", self.index)
        } else {
            write!(f, "q({}) (d={})", self.index, self.dimension)
        }
    }
}

/// Return the dimensions of `qudits`.
pub fn dimensions(qudits: &[Qid]) -> Vec<usize> {
    qudits.iter().map(Qid::dimension).collect()
}
