//! Conditions on the values of control qudits.
//!
//! A controlled gate applies its sub-gate only when the joint assignment of
//! its control qudits satisfies a condition. Two forms of condition are
//! provided:
//!
//! - [`ProductOfSums`]: one set of accepted values per control qudit; the
//! condition holds when every qudit takes a value from its own set.
//! - [`SumOfProducts`]: a disjunction of such per-qudit conjunctions; the
//! condition holds when the assignment matches any one of them.
//!
//! Both are unified under the closed enum [`ControlValues`].
//!
//! ```
//! use qudit_control::control_values::{ ControlValues, ProductOfSums };
//!
//! let cv: ControlValues = ProductOfSums::from_sets([vec![1], vec![0, 1]]).into();
//! let hot: Vec<Vec<usize>> = cv.expand().collect();
//! assert_eq!(hot, vec![vec![1, 0], vec![1, 1]]);
//! ```

use std::{ fmt, ops::{ BitAnd, BitOr } };
use itertools::{ Either, Itertools };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlValuesError {
    #[error("control value {value} is out of range for control qudit {qudit} with dimension {dimension}")]
    OutOfRange { qudit: usize, value: usize, dimension: usize },

    #[error("control values cover {expected} qudit(s), but a shape for {got} was given")]
    ShapeLength { expected: usize, got: usize },

    #[error("a sum of products must contain at least one conjunction")]
    EmptySumOfProducts,

    #[error("conjunction {index} covers {got} qudit(s), but {expected} were expected")]
    ConjunctionLength { index: usize, expected: usize, got: usize },

    #[error("cannot take the union of conditions on {0} and {1} qudit(s)")]
    UnionLength(usize, usize),
}
pub type CVResult<T> = Result<T, ControlValuesError>;

/// Raw description of the values accepted by a single control qudit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ControlSpec {
    /// A single accepted value.
    Value(usize),
    /// A set of accepted values.
    Set(Vec<usize>),
}

impl From<usize> for ControlSpec {
    fn from(v: usize) -> Self { Self::Value(v) }
}

impl From<Vec<usize>> for ControlSpec {
    fn from(vals: Vec<usize>) -> Self { Self::Set(vals) }
}

impl From<&[usize]> for ControlSpec {
    fn from(vals: &[usize]) -> Self { Self::Set(vals.to_vec()) }
}

impl ControlSpec {
    fn into_set(self) -> Vec<usize> {
        match self {
            Self::Value(v) => vec![v],
            Self::Set(mut vals) => { vals.sort_unstable(); vals.dedup(); vals },
        }
    }
}

// shared by both forms, since a conjunction of a sum is itself a product
fn product_iter(sums: &[Vec<usize>])
    -> impl Iterator<Item = Vec<usize>> + Clone + '_
{
    if sums.is_empty() {
        Either::Left(std::iter::once(Vec::new()))
    } else {
        Either::Right(
            sums.iter()
            .map(|vals| vals.iter().copied())
            .multi_cartesian_product()
        )
    }
}

fn set_label(vals: &[usize]) -> String {
    vals.iter().map(|v| v.to_string()).join("")
}

/// Per-qudit sets of accepted control values.
///
/// Each set is kept sorted and free of duplicates; the order of the sets
/// follows the order of the control qudits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProductOfSums(Vec<Vec<usize>>);

impl ProductOfSums {
    /// Create a new `ProductOfSums` from raw per-qudit value sets.
    pub fn new<I>(specs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ControlSpec>,
    {
        Self(specs.into_iter().map(|s| s.into().into_set()).collect())
    }

    /// Create a new `ProductOfSums` where each control qudit accepts exactly
    /// one value.
    pub fn from_values<I>(values: I) -> Self
    where I: IntoIterator<Item = usize>
    {
        Self(values.into_iter().map(|v| vec![v]).collect())
    }

    /// Create a new `ProductOfSums` from one set of accepted values per
    /// control qudit.
    pub fn from_sets<I, S>(sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = usize>,
    {
        Self::new(sets.into_iter().map(|s| ControlSpec::Set(s.into_iter().collect())))
    }

    /// Create the conventional condition where each of `n` control qudits
    /// accepts only the value 1.
    pub fn ones(n: usize) -> Self { Self(vec![vec![1]; n]) }

    /// Return the number of control qudits.
    pub fn num_qudits(&self) -> usize { self.0.len() }

    /// Return an iterator over the per-qudit sets of accepted values.
    pub fn iter(&self) -> std::slice::Iter<'_, Vec<usize>> { self.0.iter() }

    /// Return the set of values accepted by the `k`-th control qudit.
    pub fn get(&self, k: usize) -> Option<&[usize]> {
        self.0.get(k).map(|vals| vals.as_slice())
    }

    /// Check that every accepted value is in range for its qudit.
    pub fn validate(&self, qid_shape: &[usize]) -> CVResult<()> {
        if qid_shape.len() != self.0.len() {
            return Err(ControlValuesError::ShapeLength {
                expected: self.0.len(),
                got: qid_shape.len(),
            });
        }
        for (qudit, (vals, dim)) in self.0.iter().zip(qid_shape).enumerate() {
            if let Some(value) = vals.iter().find(|v| **v >= *dim) {
                return Err(ControlValuesError::OutOfRange {
                    qudit,
                    value: *value,
                    dimension: *dim,
                });
            }
        }
        Ok(())
    }

    /// Return a lazy iterator over all satisfying assignments, in
    /// lexicographic order.
    pub fn expand(&self) -> impl Iterator<Item = Vec<usize>> + Clone + '_ {
        product_iter(&self.0)
    }

    /// Return `true` if the assignment `values` satisfies `self`.
    pub fn accepts(&self, values: &[usize]) -> bool {
        values.len() == self.0.len()
            && self.0.iter().zip(values).all(|(vals, v)| vals.contains(v))
    }

    /// Return `true` if every control qudit accepts exactly `{1}`.
    pub fn is_trivial(&self) -> bool {
        self.0.iter().all(|vals| vals.as_slice() == [1])
    }

    /// Concatenate `self` with `other`, which acts on the qudits following
    /// those of `self`.
    pub fn combine(&self, other: &Self) -> Self {
        Self(self.0.iter().chain(other.0.iter()).cloned().collect())
    }

    /// Return the per-qudit diagram symbols.
    pub fn wire_symbols(&self) -> Vec<String> {
        self.0.iter()
            .map(|vals| {
                if vals.as_slice() == [1] {
                    "@".to_string()
                } else {
                    format!("({})", vals.iter().join(","))
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ProductOfSums {
    type Item = &'a Vec<usize>;
    type IntoIter = std::slice::Iter<'a, Vec<usize>>;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl fmt::Display for ProductOfSums {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for vals in self.0.iter() {
            if vals.as_slice() == [1] {
                write!(f, "C")?;
            } else {
                write!(f, "C{}", set_label(vals))?;
            }
        }
        Ok(())
    }
}

/// A disjunction of per-qudit conjunctions over the same control qudits.
///
/// Conjunctions are kept sorted and free of duplicates, so equality does not
/// depend on the order in which they were given.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SumOfProducts {
    num_qudits: usize,
    conjunctions: Vec<ProductOfSums>,
}

impl SumOfProducts {
    /// Create a new `SumOfProducts`.
    ///
    /// Fails if no conjunctions are given or if they cover differing numbers
    /// of qudits.
    pub fn new<I>(conjunctions: I) -> CVResult<Self>
    where I: IntoIterator<Item = ProductOfSums>
    {
        let mut conjunctions: Vec<ProductOfSums> =
            conjunctions.into_iter().collect();
        let num_qudits =
            conjunctions.first()
            .map(|c| c.num_qudits())
            .ok_or(ControlValuesError::EmptySumOfProducts)?;
        if let Some((index, c)) =
            conjunctions.iter().enumerate()
            .find(|(_, c)| c.num_qudits() != num_qudits)
        {
            return Err(ControlValuesError::ConjunctionLength {
                index,
                expected: num_qudits,
                got: c.num_qudits(),
            });
        }
        conjunctions.sort_by(|l, r| l.0.cmp(&r.0));
        conjunctions.dedup();
        Ok(Self { num_qudits, conjunctions })
    }

    /// Create a new `SumOfProducts` from a list of full assignments, each of
    /// which enables the condition.
    pub fn from_assignments<I, A>(assignments: I) -> CVResult<Self>
    where
        I: IntoIterator<Item = A>,
        A: IntoIterator<Item = usize>,
    {
        Self::new(assignments.into_iter().map(ProductOfSums::from_values))
    }

    /// Return the number of control qudits.
    pub fn num_qudits(&self) -> usize { self.num_qudits }

    /// Return the conjunctions.
    pub fn conjunctions(&self) -> &[ProductOfSums] { &self.conjunctions }

    /// Check that every accepted value in every conjunction is in range for
    /// its qudit.
    pub fn validate(&self, qid_shape: &[usize]) -> CVResult<()> {
        self.conjunctions.iter()
            .try_for_each(|c| c.validate(qid_shape))
    }

    /// Return a lazy iterator over all satisfying assignments without
    /// repetition.
    pub fn expand(&self) -> impl Iterator<Item = Vec<usize>> + Clone + '_ {
        self.conjunctions.iter()
            .flat_map(|c| c.expand())
            .unique()
    }

    /// Return `true` if the assignment `values` satisfies `self`.
    pub fn accepts(&self, values: &[usize]) -> bool {
        self.conjunctions.iter().any(|c| c.accepts(values))
    }

    /// Return `true` if `self` holds only the conjunction where every control
    /// qudit accepts exactly `{1}`.
    pub fn is_trivial(&self) -> bool {
        self.conjunctions.len() == 1 && self.conjunctions[0].is_trivial()
    }

    /// Return the per-qudit diagram symbols.
    pub fn wire_symbols(&self) -> Vec<String> {
        vec!["@".to_string(); self.num_qudits]
    }
}

impl fmt::Display for SumOfProducts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms =
            self.conjunctions.iter()
            .map(|c| {
                c.iter()
                    .map(|vals| {
                        if vals.len() == 1 {
                            set_label(vals)
                        } else {
                            format!("({})", set_label(vals))
                        }
                    })
                    .join("")
            })
            .join("_");
        write!(f, "C_{}", terms)
    }
}

/// A condition on the joint values of a register of control qudits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ControlValues {
    /// Independent per-qudit sets of accepted values.
    Product(ProductOfSums),
    /// A disjunction of per-qudit conjunctions.
    Sum(SumOfProducts),
}

impl From<ProductOfSums> for ControlValues {
    fn from(pos: ProductOfSums) -> Self { Self::Product(pos) }
}

impl From<SumOfProducts> for ControlValues {
    fn from(sop: SumOfProducts) -> Self { Self::Sum(sop) }
}

impl ControlValues {
    /// Return `true` if `self` is `Product`.
    pub fn is_product(&self) -> bool { matches!(self, Self::Product(..)) }

    /// Return `true` if `self` is `Sum`.
    pub fn is_sum(&self) -> bool { matches!(self, Self::Sum(..)) }

    /// Return the number of control qudits.
    pub fn num_qudits(&self) -> usize {
        match self {
            Self::Product(pos) => pos.num_qudits(),
            Self::Sum(sop) => sop.num_qudits(),
        }
    }

    /// Check that every accepted value is in `[0, qid_shape[i])` for its
    /// qudit `i`.
    pub fn validate(&self, qid_shape: &[usize]) -> CVResult<()> {
        if qid_shape.len() != self.num_qudits() {
            return Err(ControlValuesError::ShapeLength {
                expected: self.num_qudits(),
                got: qid_shape.len(),
            });
        }
        match self {
            Self::Product(pos) => pos.validate(qid_shape),
            Self::Sum(sop) => sop.validate(qid_shape),
        }
    }

    /// Return a lazy iterator over all control assignments satisfying
    /// `self`.
    ///
    /// The iterator is finite and can be restarted by calling this method
    /// again (or by cloning it before consumption).
    pub fn expand(&self) -> impl Iterator<Item = Vec<usize>> + Clone + '_ {
        match self {
            Self::Product(pos) => Either::Left(pos.expand()),
            Self::Sum(sop) => Either::Right(sop.expand()),
        }
    }

    /// Return `true` if the assignment `values` satisfies `self`.
    pub fn accepts(&self, values: &[usize]) -> bool {
        match self {
            Self::Product(pos) => pos.accepts(values),
            Self::Sum(sop) => sop.accepts(values),
        }
    }

    /// Return `true` if every control qudit accepts exactly `{1}`.
    pub fn is_trivial(&self) -> bool {
        match self {
            Self::Product(pos) => pos.is_trivial(),
            Self::Sum(sop) => sop.is_trivial(),
        }
    }

    /// Collapse a `Sum` holding a single conjunction into the equivalent
    /// `Product`.
    pub fn simplified(self) -> Self {
        match self {
            Self::Sum(mut sop) if sop.conjunctions.len() == 1 => {
                Self::Product(sop.conjunctions.swap_remove(0))
            },
            other => other,
        }
    }

    fn conjunctions(&self) -> &[ProductOfSums] {
        match self {
            Self::Product(pos) => std::slice::from_ref(pos),
            Self::Sum(sop) => sop.conjunctions(),
        }
    }

    /// Combine `self` with `other`, which acts on the qudits following those
    /// of `self`.
    ///
    /// The result holds when both conditions hold on their own qudits.
    pub fn combine(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Product(l), Self::Product(r)) => Self::Product(l.combine(r)),
            (l, r) => {
                let conjunctions: Vec<ProductOfSums> =
                    l.conjunctions().iter()
                    .cartesian_product(r.conjunctions().iter())
                    .map(|(cl, cr)| cl.combine(cr))
                    .collect();
                let num_qudits = l.num_qudits() + r.num_qudits();
                Self::Sum(SumOfProducts { num_qudits, conjunctions })
                    .simplified()
            },
        }
    }

    /// Take the disjunction of `self` and `other`, which must act on the same
    /// number of qudits.
    pub fn union(&self, other: &Self) -> CVResult<Self> {
        if self.num_qudits() != other.num_qudits() {
            return Err(ControlValuesError::UnionLength(
                self.num_qudits(), other.num_qudits()));
        }
        let sop =
            SumOfProducts::new(
                self.conjunctions().iter()
                .chain(other.conjunctions())
                .cloned()
            )?;
        Ok(Self::Sum(sop).simplified())
    }

    /// Return the per-qudit diagram symbols: `@` for a qudit accepting only
    /// 1, and the list of accepted values otherwise.
    pub fn wire_symbols(&self) -> Vec<String> {
        match self {
            Self::Product(pos) => pos.wire_symbols(),
            Self::Sum(sop) => sop.wire_symbols(),
        }
    }
}

impl BitAnd for &ControlValues {
    type Output = ControlValues;

    fn bitand(self, rhs: &ControlValues) -> Self::Output { self.combine(rhs) }
}

impl BitAnd for ControlValues {
    type Output = ControlValues;

    fn bitand(self, rhs: ControlValues) -> Self::Output { self.combine(&rhs) }
}

impl BitOr for &ControlValues {
    type Output = CVResult<ControlValues>;

    fn bitor(self, rhs: &ControlValues) -> Self::Output { self.union(rhs) }
}

impl fmt::Display for ControlValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(pos) => pos.fmt(f),
            Self::Sum(sop) => sop.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(sets: &[&[usize]]) -> ControlValues {
        ProductOfSums::from_sets(sets.iter().map(|s| s.iter().copied())).into()
    }

    #[test]
    fn control_spec_normalization() {
        let p = ProductOfSums::new([
            ControlSpec::Value(1),
            ControlSpec::Set(vec![1, 0, 1]),
        ]);
        assert_eq!(p.get(0), Some([1].as_slice()));
        assert_eq!(p.get(1), Some([0, 1].as_slice()));
        assert_eq!(p, ProductOfSums::from_sets([vec![1], vec![0, 1]]));
        assert_eq!(ProductOfSums::ones(2), ProductOfSums::from_values([1, 1]));
    }

    #[test]
    fn expand_product() {
        let cv = pos(&[&[1], &[0, 1]]);
        let hot: Vec<Vec<usize>> = cv.expand().collect();
        assert_eq!(hot, vec![vec![1, 0], vec![1, 1]]);

        // restartable
        let again: Vec<Vec<usize>> = cv.expand().collect();
        assert_eq!(hot, again);

        let cv = pos(&[&[0, 2], &[1]]);
        let hot: Vec<Vec<usize>> = cv.expand().collect();
        assert_eq!(hot, vec![vec![0, 1], vec![2, 1]]);
    }

    #[test]
    fn expand_empty() {
        let cv: ControlValues = ProductOfSums::ones(0).into();
        let hot: Vec<Vec<usize>> = cv.expand().collect();
        assert_eq!(hot, vec![Vec::<usize>::new()]);

        let cv = pos(&[&[1], &[]]);
        assert_eq!(cv.expand().count(), 0);
    }

    #[test]
    fn expand_sum_dedup() {
        let sop = SumOfProducts::new([
            ProductOfSums::from_sets([vec![0, 1], vec![1]]),
            ProductOfSums::from_sets([vec![1], vec![1]]),
            ProductOfSums::from_sets([vec![0], vec![0]]),
        ]).unwrap();
        let cv: ControlValues = sop.into();
        let mut hot: Vec<Vec<usize>> = cv.expand().collect();
        hot.sort();
        assert_eq!(hot, vec![vec![0, 0], vec![0, 1], vec![1, 1]]);
        assert!(cv.accepts(&[0, 0]));
        assert!(!cv.accepts(&[1, 0]));
    }

    #[test]
    fn sum_construction() {
        assert!(matches!(
            SumOfProducts::new([]),
            Err(ControlValuesError::EmptySumOfProducts)
        ));
        assert!(matches!(
            SumOfProducts::from_assignments([vec![0, 1], vec![1]]),
            Err(ControlValuesError::ConjunctionLength { index: 1, expected: 2, got: 1 })
        ));
        let a = SumOfProducts::from_assignments([vec![0, 1], vec![1, 0]]).unwrap();
        let b = SumOfProducts::from_assignments([vec![1, 0], vec![0, 1], vec![1, 0]]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.conjunctions().len(), 2);
    }

    #[test]
    fn validate() {
        let cv = pos(&[&[1], &[0, 2]]);
        assert!(cv.validate(&[2, 3]).is_ok());
        assert!(matches!(
            cv.validate(&[2, 2]),
            Err(ControlValuesError::OutOfRange { qudit: 1, value: 2, dimension: 2 })
        ));
        assert!(matches!(
            cv.validate(&[2]),
            Err(ControlValuesError::ShapeLength { expected: 2, got: 1 })
        ));

        let sop: ControlValues =
            SumOfProducts::from_assignments([vec![0], vec![2]]).unwrap().into();
        assert!(sop.validate(&[3]).is_ok());
        assert!(matches!(
            sop.validate(&[2]),
            Err(ControlValuesError::OutOfRange { qudit: 0, value: 2, dimension: 2 })
        ));
    }

    #[test]
    fn combine_products() {
        let a = pos(&[&[1]]);
        let b = pos(&[&[0, 1], &[0]]);
        let ab = &a & &b;
        assert_eq!(ab, pos(&[&[1], &[0, 1], &[0]]));
        assert_eq!(ab.num_qudits(), 3);
        let c = pos(&[&[2]]);
        assert_eq!((&ab & &c), (&a & &(&b & &c)));
    }

    #[test]
    fn combine_sums() {
        let a: ControlValues =
            SumOfProducts::from_assignments([vec![0], vec![1]]).unwrap().into();
        let b = pos(&[&[1]]);
        let ab = &a & &b;
        assert!(ab.is_sum());
        assert_eq!(ab.num_qudits(), 2);
        let mut hot: Vec<Vec<usize>> = ab.expand().collect();
        hot.sort();
        assert_eq!(hot, vec![vec![0, 1], vec![1, 1]]);

        let c: ControlValues =
            SumOfProducts::from_assignments([vec![0, 0], vec![1, 1]]).unwrap().into();
        let left = (&ab & &c) & b.clone();
        let right = &ab & &(&c & &b);
        assert_eq!(left, right);
        assert_eq!(left.expand().count(), 4);

        // a single conjunction collapses back into a product
        let single: ControlValues =
            SumOfProducts::from_assignments([vec![0]]).unwrap().into();
        assert_eq!(&single & &b, pos(&[&[0], &[1]]));
    }

    #[test]
    fn union() {
        let a = pos(&[&[0], &[1]]);
        let b = pos(&[&[1], &[0]]);
        let ab = (&a | &b).unwrap();
        assert!(ab.is_sum());
        assert!(ab.accepts(&[0, 1]));
        assert!(ab.accepts(&[1, 0]));
        assert!(!ab.accepts(&[1, 1]));
        assert_eq!((&a | &a).unwrap(), a);
        assert!(matches!(
            &a | &pos(&[&[1]]),
            Err(ControlValuesError::UnionLength(2, 1))
        ));
    }

    #[test]
    fn trivial_and_simplified() {
        assert!(pos(&[&[1], &[1]]).is_trivial());
        assert!(!pos(&[&[1], &[0, 1]]).is_trivial());
        assert!(ControlValues::from(ProductOfSums::ones(0)).is_trivial());
        let sop: ControlValues =
            SumOfProducts::from_assignments([vec![1, 1]]).unwrap().into();
        assert!(sop.is_trivial());
        assert_eq!(sop.simplified(), pos(&[&[1], &[1]]));
    }

    #[test]
    fn symbols_and_display() {
        let cv = pos(&[&[1], &[0], &[0, 1]]);
        assert_eq!(cv.wire_symbols(), vec!["@", "(0)", "(0,1)"]);
        assert_eq!(cv.to_string(), "CC0C01");
        let sop: ControlValues =
            SumOfProducts::new([
                ProductOfSums::from_values([0, 1]),
                ProductOfSums::from_sets([vec![1], vec![0, 1]]),
            ])
            .unwrap()
            .into();
        assert_eq!(sop.wire_symbols(), vec!["@", "@"]);
        assert_eq!(sop.to_string(), "C_01_1(01)");
    }
}
