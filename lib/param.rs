//! Gate parameters that may be either concrete numbers or named symbols.

use std::{
    fmt,
    hash::{ Hash, Hasher },
};
use rustc_hash::FxHashMap as HashMap;

/// A real gate parameter.
///
/// Equality and hashing of numeric values are defined bitwise, so that
/// parameterized gates can be compared and hashed as plain values.
#[derive(Clone, Debug)]
pub enum Param {
    /// A concrete real value.
    Value(f64),
    /// A named, unresolved symbol.
    Symbol(String),
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a.to_bits() == b.to_bits(),
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Param { }

impl Hash for Param {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Value(x) => { 0_u8.hash(state); x.to_bits().hash(state); },
            Self::Symbol(s) => { 1_u8.hash(state); s.hash(state); },
        }
    }
}

impl From<f64> for Param {
    fn from(x: f64) -> Self { Self::Value(x) }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self { Self::Symbol(s.to_string()) }
}

impl From<String> for Param {
    fn from(s: String) -> Self { Self::Symbol(s) }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(x) => write!(f, "{}", x),
            Self::Symbol(s) => write!(f, "{}", s),
        }
    }
}

impl Param {
    /// Return `true` if `self` is `Symbol`.
    pub fn is_symbol(&self) -> bool { matches!(self, Self::Symbol(_)) }

    /// Return the concrete value of `self`, if it has one.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(x) => Some(*x),
            Self::Symbol(_) => None,
        }
    }

    /// Return the symbol name of `self`, if it has one.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::Value(_) => None,
            Self::Symbol(s) => Some(s.as_str()),
        }
    }

    /// Multiply a concrete value by `a`. Returns `None` for symbols.
    pub fn scaled(&self, a: f64) -> Option<Self> {
        self.value().map(|x| Self::Value(a * x))
    }
}

/// Maps symbol names to replacement parameters.
#[derive(Clone, Debug, Default)]
pub struct ParamResolver {
    table: HashMap<String, Param>,
}

impl<S, P> FromIterator<(S, P)> for ParamResolver
where
    S: Into<String>,
    P: Into<Param>,
{
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = (S, P)>
    {
        let table: HashMap<String, Param> =
            iter.into_iter()
            .map(|(s, p)| (s.into(), p.into()))
            .collect();
        Self { table }
    }
}

impl ParamResolver {
    /// Create a new, empty resolver.
    pub fn new() -> Self { Self::default() }

    /// Add a replacement for symbol `name`.
    pub fn insert<S, P>(&mut self, name: S, value: P) -> &mut Self
    where
        S: Into<String>,
        P: Into<Param>,
    {
        self.table.insert(name.into(), value.into());
        self
    }

    /// Resolve a single parameter.
    ///
    /// Numeric values and unknown symbols are returned unchanged. If
    /// `recursive` is `true`, symbols resolving to other symbols are followed
    /// until a value or an unknown symbol is reached; a cycle stops at the
    /// symbol that closes it.
    pub fn resolve(&self, param: &Param, recursive: bool) -> Param {
        let mut cur = param.clone();
        let mut visited: Vec<String> = Vec::new();
        while let Param::Symbol(name) = &cur {
            if visited.contains(name) { break; }
            let Some(next) = self.table.get(name) else { break; };
            visited.push(name.clone());
            cur = next.clone();
            if !recursive { break; }
        }
        cur
    }
}
